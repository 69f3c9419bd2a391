//! In-memory [`ContentStore`] for tests and demo sessions.

use std::collections::BTreeMap;

use async_trait::async_trait;
use sitecms_shared::{ContentRecord, ContentStore, Result};
use tokio::sync::RwLock;

/// A process-local content store. Records are cloned on the way in and out,
/// so callers never share state with the store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<String, ContentRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `(section, record)` pairs.
    pub fn with_records<I, S>(records: I) -> Self
    where
        I: IntoIterator<Item = (S, ContentRecord)>,
        S: Into<String>,
    {
        Self {
            records: RwLock::new(records.into_iter().map(|(s, r)| (s.into(), r)).collect()),
        }
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get(&self, section: &str) -> Result<Option<ContentRecord>> {
        Ok(self.records.read().await.get(section).cloned())
    }

    async fn put(&self, section: &str, record: &ContentRecord) -> Result<()> {
        self.records
            .write()
            .await
            .insert(section.to_string(), record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_put_roundtrip() {
        let store = MemoryStore::new();
        assert!(store.get("hero").await.unwrap().is_none());

        let record = ContentRecord::new().with("title", "Hello");
        store.put("hero", &record).await.unwrap();
        assert_eq!(store.get("hero").await.unwrap(), Some(record));
        assert!(store.get("about").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn seeded_records_are_visible() {
        let store = MemoryStore::with_records([
            ("about", ContentRecord::new().with("title", "About")),
            ("cta", ContentRecord::new()),
        ]);
        assert_eq!(store.get("cta").await.unwrap(), Some(ContentRecord::new()));
        assert_eq!(store.get("about").await.unwrap().unwrap().text("title"), "About");
    }
}
