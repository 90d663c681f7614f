//! Per-domain document aggregation
//!
//! Every source domain gets exactly one markdown document per run. Documents
//! are created lazily on the first page for their domain, and every page
//! section is written in one call and synced to disk before `append` returns,
//! so a crash loses at most the page being written.

use crate::crawler::PageRecord;
use crate::output::markdown::{format_domain_header, format_page_section};
use crate::HarvestError;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug)]
enum DocumentFile {
    /// Registered, nothing written yet
    Unopened,
    Open(File),
    Closed,
}

/// The output document for one domain
#[derive(Debug)]
pub struct DomainDocument {
    domain: String,
    path: PathBuf,
    file: DocumentFile,
    page_count: usize,
}

impl DomainDocument {
    fn new(domain: &str, path: PathBuf) -> Self {
        Self {
            domain: domain.to_string(),
            path,
            file: DocumentFile::Unopened,
            page_count: 0,
        }
    }

    /// Creates (truncating) the document file and writes its header
    fn create_file(&self) -> io::Result<File> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        file.write_all(format_domain_header(&self.domain, Utc::now()).as_bytes())?;
        file.flush()?;
        file.sync_data()?;

        tracing::debug!(
            "Created domain document {} for {}",
            self.path.display(),
            self.domain
        );
        Ok(file)
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pages appended so far
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// True once the file exists on disk
    pub fn is_created(&self) -> bool {
        !matches!(self.file, DocumentFile::Unopened)
    }

    /// Writes the next page section and returns its page number
    fn append(&mut self, record: &PageRecord) -> io::Result<usize> {
        if matches!(self.file, DocumentFile::Unopened) {
            self.file = DocumentFile::Open(self.create_file()?);
        }
        let DocumentFile::Open(file) = &mut self.file else {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "domain document is closed",
            ));
        };

        let page_number = self.page_count + 1;
        let section = format_page_section(page_number, record);
        file.write_all(section.as_bytes())?;
        file.flush()?;
        file.sync_data()?;

        // Only count the page once it is durable
        self.page_count = page_number;
        Ok(page_number)
    }

    fn close(&mut self) -> io::Result<()> {
        if let DocumentFile::Open(file) = std::mem::replace(&mut self.file, DocumentFile::Closed) {
            file.sync_all()?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
struct AggregatorState {
    documents: HashMap<String, Arc<Mutex<DomainDocument>>>,
    /// File stems already claimed this run, so two domains never share a file
    file_stems: HashSet<String>,
    closed: bool,
}

/// Owns one append-only document per source domain
///
/// The domain map is locked only long enough to find or register a document.
/// Creating the file and writing to it happen under that document's own lock,
/// so different domains are written in parallel while pages of one domain
/// stay ordered.
#[derive(Debug)]
pub struct DomainAggregator {
    output_dir: PathBuf,
    state: Mutex<AggregatorState>,
}

impl DomainAggregator {
    /// Creates the output directory if needed
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self, HarvestError> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;

        Ok(Self {
            output_dir,
            state: Mutex::new(AggregatorState::default()),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn lock_state(&self, domain: &str) -> Result<MutexGuard<'_, AggregatorState>, HarvestError> {
        self.state
            .lock()
            .map_err(|_| storage_error(domain, "aggregator lock poisoned"))
    }

    /// Appends `record` to its domain's document
    ///
    /// Returns the page number the record was written under (1-based, gapless
    /// per domain). Any write failure is a `DomainStorage` error, which is fatal
    /// to the crawl.
    pub fn append(&self, record: &PageRecord) -> Result<usize, HarvestError> {
        let domain = record.domain.as_str();
        let document = self.document_for(domain)?;

        let mut document = document
            .lock()
            .map_err(|_| storage_error(domain, "domain document lock poisoned"))?;

        let page_number = document
            .append(record)
            .map_err(|source| HarvestError::DomainStorage {
                domain: domain.to_string(),
                source,
            })?;

        tracing::debug!(
            "Appended page {} for {} ({})",
            page_number,
            domain,
            record.url
        );
        Ok(page_number)
    }

    /// Finds the document for `domain`, registering it on first use
    ///
    /// Only the file name is claimed here; the file itself is created by the
    /// first append, under the document's lock.
    fn document_for(&self, domain: &str) -> Result<Arc<Mutex<DomainDocument>>, HarvestError> {
        let mut state = self.lock_state(domain)?;
        if state.closed {
            return Err(storage_error(domain, "aggregator already finished"));
        }

        if let Some(document) = state.documents.get(domain) {
            return Ok(Arc::clone(document));
        }

        let stem = unique_file_stem(domain, &state.file_stems);
        let path = self.output_dir.join(format!("{}.md", stem));
        let document = Arc::new(Mutex::new(DomainDocument::new(domain, path)));

        state.file_stems.insert(stem);
        state
            .documents
            .insert(domain.to_string(), Arc::clone(&document));
        Ok(document)
    }

    /// Pages appended for `domain` so far
    pub fn page_count(&self, domain: &str) -> usize {
        let document = match self.state.lock() {
            Ok(state) => state.documents.get(domain).cloned(),
            Err(_) => None,
        };
        let Some(document) = document else {
            return 0;
        };
        let count = document.lock().map(|d| d.page_count()).unwrap_or(0);
        count
    }

    /// Domains that have been routed a page, sorted
    pub fn domains(&self) -> Vec<String> {
        let mut domains: Vec<String> = match self.state.lock() {
            Ok(state) => state.documents.keys().cloned().collect(),
            Err(_) => Vec::new(),
        };
        domains.sort();
        domains
    }

    /// Path of the document for `domain`, if one was created
    pub fn document_path(&self, domain: &str) -> Option<PathBuf> {
        let state = self.state.lock().ok()?;
        let document = state.documents.get(domain)?;
        let document = document.lock().ok()?;
        Some(document.path().to_path_buf())
    }

    /// Syncs and closes every document
    ///
    /// Returns the final page count per domain. Later appends are refused.
    pub fn finish(&self) -> Result<BTreeMap<String, usize>, HarvestError> {
        let documents: Vec<Arc<Mutex<DomainDocument>>> = {
            let mut state = self
                .state
                .lock()
                .map_err(|_| storage_error("*", "aggregator lock poisoned"))?;
            state.closed = true;
            state.documents.values().cloned().collect()
        };

        let mut counts = BTreeMap::new();
        for document in documents {
            let mut document = document
                .lock()
                .map_err(|_| storage_error("*", "domain document lock poisoned"))?;
            let domain = document.domain().to_string();
            let created = document.is_created();
            document
                .close()
                .map_err(|source| HarvestError::DomainStorage {
                    domain: domain.clone(),
                    source,
                })?;
            if created {
                counts.insert(domain, document.page_count());
            }
        }

        tracing::info!("Closed {} domain documents", counts.len());
        Ok(counts)
    }
}

fn storage_error(domain: &str, message: &str) -> HarvestError {
    HarvestError::DomainStorage {
        domain: domain.to_string(),
        source: io::Error::new(io::ErrorKind::Other, message.to_string()),
    }
}

/// Replaces every run of non-word characters with `_`
///
/// ```
/// use knowledge_harvester::output::domain_file_stem;
///
/// assert_eq!(domain_file_stem("www.example.ac.in"), "www_example_ac_in");
/// ```
pub fn domain_file_stem(domain: &str) -> String {
    let mut stem = String::with_capacity(domain.len());
    let mut in_separator = false;
    for c in domain.chars() {
        if c.is_alphanumeric() || c == '_' {
            stem.push(c);
            in_separator = false;
        } else if !in_separator {
            stem.push('_');
            in_separator = true;
        }
    }
    if stem.is_empty() {
        stem.push_str("unknown");
    }
    stem
}

fn unique_file_stem(domain: &str, taken: &HashSet<String>) -> String {
    let base = domain_file_stem(domain);
    if !taken.contains(&base) {
        return base;
    }
    (2..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(base)
}
