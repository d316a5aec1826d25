pub mod api;
pub mod config;
pub mod error;
pub mod export;
pub mod scraper;
pub mod store;

use std::sync::Arc;

use crate::scraper::Extractor;
use crate::store::ScrapeStore;

/// Application state that will be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub extractor: Extractor,
    pub store: Arc<dyn ScrapeStore>,
}

impl AppState {
    pub fn new(extractor: Extractor, store: Arc<dyn ScrapeStore>) -> Self {
        Self { extractor, store }
    }
}
