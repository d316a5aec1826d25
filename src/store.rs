use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

use crate::error::StoreError;
use crate::scraper::{Extraction, StructuredDocument, Summary};

/// A record about to be persisted; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewScrape {
    pub user_id: String,
    pub url: String,
    pub extraction: Extraction,
    pub created_at: DateTime<Utc>,
}

/// One persisted scrape. Never modified after insertion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapeRecord {
    pub id: Uuid,
    pub user_id: String,
    pub url: String,
    pub document: StructuredDocument,
    pub summary: Summary,
    pub created_at: DateTime<Utc>,
}

pub trait ScrapeStore: Send + Sync {
    fn insert(&self, scrape: NewScrape) -> Result<ScrapeRecord, StoreError>;

    fn get(&self, id: Uuid) -> Result<Option<ScrapeRecord>, StoreError>;

    /// Records owned by `user_id`, newest first.
    fn list_for_user(&self, user_id: &str) -> Result<Vec<ScrapeRecord>, StoreError>;

    /// Returns whether a record was removed.
    fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: RwLock<HashMap<Uuid, ScrapeRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ScrapeStore for InMemoryStore {
    fn insert(&self, scrape: NewScrape) -> Result<ScrapeRecord, StoreError> {
        let record = ScrapeRecord {
            id: Uuid::new_v4(),
            user_id: scrape.user_id,
            url: scrape.url,
            document: scrape.extraction.document,
            summary: scrape.extraction.summary,
            created_at: scrape.created_at,
        };

        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        records.insert(record.id, record.clone());
        Ok(record)
    }

    fn get(&self, id: Uuid) -> Result<Option<ScrapeRecord>, StoreError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        Ok(records.get(&id).cloned())
    }

    fn list_for_user(&self, user_id: &str) -> Result<Vec<ScrapeRecord>, StoreError> {
        let records = self.records.read().unwrap_or_else(PoisonError::into_inner);
        let mut owned: Vec<ScrapeRecord> = records
            .values()
            .filter(|record| record.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        Ok(owned)
    }

    fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        Ok(records.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn scrape(user: &str, url: &str, created_at: DateTime<Utc>) -> NewScrape {
        NewScrape {
            user_id: user.to_string(),
            url: url.to_string(),
            extraction: Extraction {
                document: StructuredDocument::default(),
                summary: Summary::default(),
            },
            created_at,
        }
    }

    #[test]
    fn insert_assigns_distinct_ids() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        let a = store.insert(scrape("u1", "http://a/", now)).unwrap();
        let b = store.insert(scrape("u1", "http://a/", now)).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.get(a.id).unwrap(), Some(a));
    }

    #[test]
    fn history_is_per_user_and_newest_first() {
        let store = InMemoryStore::new();
        let now = Utc::now();
        store.insert(scrape("u1", "http://old/", now - Duration::minutes(5))).unwrap();
        store.insert(scrape("u2", "http://other/", now)).unwrap();
        store.insert(scrape("u1", "http://new/", now)).unwrap();

        let urls: Vec<String> = store
            .list_for_user("u1")
            .unwrap()
            .into_iter()
            .map(|r| r.url)
            .collect();
        assert_eq!(urls, vec!["http://new/", "http://old/"]);
        assert!(store.list_for_user("nobody").unwrap().is_empty());
    }

    #[test]
    fn delete_reports_whether_anything_was_removed() {
        let store = InMemoryStore::new();
        let record = store.insert(scrape("u1", "http://a/", Utc::now())).unwrap();
        assert!(store.delete(record.id).unwrap());
        assert!(!store.delete(record.id).unwrap());
        assert_eq!(store.get(record.id).unwrap(), None);
    }
}
