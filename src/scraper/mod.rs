//! Fetch → parse → summarize for a single URL.
//!
//! The extractor holds no per-request state; one instance can serve any
//! number of concurrent extractions.

pub mod document;
pub mod fetcher;
pub mod parser;
pub mod summary;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use document::{Heading, Link, RawDocument, StructuredDocument};
pub use fetcher::Fetcher;
pub use parser::parse;
pub use summary::{summarize, Summary};

use crate::error::{ExtractError, FetchError, ParseError};

/// Limits applied to every extraction.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Budget for the whole fetch, redirects and body included
    pub timeout: Duration,
    /// Budget for parsing and summarizing once the body has arrived
    pub parse_timeout: Duration,
    pub connect_timeout: Duration,
    pub max_redirects: usize,
    pub max_body_bytes: usize,
    pub user_agent: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            parse_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(5),
            max_redirects: 5,
            max_body_bytes: 5 * 1024 * 1024,
            user_agent: concat!("page-extractor/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Structured content of one page plus its derived metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    pub document: StructuredDocument,
    pub summary: Summary,
}

#[derive(Debug, Clone)]
pub struct Extractor {
    fetcher: Fetcher,
    parse_timeout: Duration,
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Result<Self, FetchError> {
        Ok(Self {
            fetcher: Fetcher::new(&config)?,
            parse_timeout: config.parse_timeout,
        })
    }

    pub async fn extract(&self, url: &str) -> Result<Extraction, ExtractError> {
        let raw = self.fetcher.fetch(url).await?;

        // Parsing is CPU bound and its cost is set by the remote page, so it
        // runs on the blocking pool under its own budget.
        let parsing = tokio::task::spawn_blocking(move || {
            let document = parse(&raw)?;
            let summary = summarize(&document);
            Ok::<_, ParseError>(Extraction { document, summary })
        });

        match tokio::time::timeout(self.parse_timeout, parsing).await {
            Ok(Ok(extraction)) => Ok(extraction?),
            Ok(Err(join_error)) => Err(ParseError::Aborted(join_error.to_string()).into()),
            Err(_) => Err(ParseError::Timeout(self.parse_timeout).into()),
        }
    }
}
