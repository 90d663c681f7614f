//! State module for tracking crawl progress
//!
//! Every normalized URL the crawler has seen carries a `UrlState` recording how
//! far it got through the fetch / classify / extract pipeline.

mod url_state;

pub use url_state::UrlState;
