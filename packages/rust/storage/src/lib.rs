//! Content store implementations for SiteCMS.
//!
//! The [`Storage`] struct wraps a local libSQL database holding one JSON
//! document per section. [`MemoryStore`] keeps documents in memory for tests
//! and demo sessions. Both implement [`ContentStore`].
//!
//! **Access rules:**
//! - Admin tools: read-write via [`Storage::open`]
//! - Read-only consumers (export, preview): [`Storage::open_readonly`]

mod memory;
mod migrations;

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database, params};
use sitecms_shared::{ContentRecord, ContentStore, Result, SiteCmsError};

pub use memory::MemoryStore;

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

/// Summary of one stored section, for dashboard listings.
#[derive(Debug, Clone)]
pub struct StoredSection {
    /// Section identifier.
    pub section: String,
    /// When the section was last saved.
    pub updated_at: DateTime<Utc>,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| SiteCmsError::io(parent, e))?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(SiteCmsError::storage)?;

        let conn = db.connect().map_err(SiteCmsError::storage)?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        tracing::debug!(?path, "content database opened");
        Ok(storage)
    }

    /// Open a database at `path` in read-only mode.
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(SiteCmsError::storage)?;

        let conn = db.connect().map_err(SiteCmsError::storage)?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    SiteCmsError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(SiteCmsError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Section documents
    // -----------------------------------------------------------------------

    /// Load the stored document for `section`.
    pub async fn load_section(&self, section: &str) -> Result<Option<ContentRecord>> {
        let mut rows = self
            .conn
            .query(
                "SELECT data_json FROM content WHERE section = ?1",
                params![section],
            )
            .await
            .map_err(SiteCmsError::storage)?;

        match rows.next().await {
            Ok(Some(row)) => {
                let json: String = row.get(0).map_err(SiteCmsError::storage)?;
                Ok(Some(serde_json::from_str(&json)?))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(SiteCmsError::storage(e)),
        }
    }

    /// Replace the stored document for `section` (insert or overwrite).
    pub async fn save_section(&self, section: &str, record: &ContentRecord) -> Result<()> {
        self.check_writable()?;
        let json = serde_json::to_string(record)?;
        let now = Utc::now().to_rfc3339();
        self.conn
            .execute(
                "INSERT INTO content (section, data_json, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(section) DO UPDATE SET
                   data_json = excluded.data_json,
                   updated_at = excluded.updated_at",
                params![section, json.as_str(), now.as_str()],
            )
            .await
            .map_err(SiteCmsError::storage)?;
        tracing::debug!(section, bytes = json.len(), "section saved");
        Ok(())
    }

    /// Delete the stored document for `section`. Returns whether a row existed.
    pub async fn delete_section(&self, section: &str) -> Result<bool> {
        self.check_writable()?;
        let affected = self
            .conn
            .execute("DELETE FROM content WHERE section = ?1", params![section])
            .await
            .map_err(SiteCmsError::storage)?;
        Ok(affected > 0)
    }

    /// List every stored section with its last save time, ordered by name.
    pub async fn list_sections(&self) -> Result<Vec<StoredSection>> {
        let mut rows = self
            .conn
            .query(
                "SELECT section, updated_at FROM content ORDER BY section",
                params![],
            )
            .await
            .map_err(SiteCmsError::storage)?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let section: String = row.get(0).map_err(SiteCmsError::storage)?;
            let updated_at: String = row.get(1).map_err(SiteCmsError::storage)?;
            let updated_at = DateTime::parse_from_rfc3339(&updated_at)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| SiteCmsError::Storage(format!("invalid date: {e}")))?;
            results.push(StoredSection {
                section,
                updated_at,
            });
        }
        Ok(results)
    }
}

#[async_trait]
impl ContentStore for Storage {
    async fn get(&self, section: &str) -> Result<Option<ContentRecord>> {
        self.load_section(section).await
    }

    async fn put(&self, section: &str, record: &ContentRecord) -> Result<()> {
        self.save_section(section, record).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    /// Create a temp file storage for testing.
    async fn test_storage() -> Storage {
        let tmp = std::env::temp_dir().join(format!("sitecms_test_{}.db", Uuid::now_v7()));
        Storage::open(&tmp).await.expect("open test db")
    }

    #[tokio::test]
    async fn open_and_migrate() {
        let storage = test_storage().await;
        let version = storage.get_schema_version().await;
        assert_eq!(version, 1);
    }

    #[tokio::test]
    async fn missing_section_is_none() {
        let storage = test_storage().await;
        let found = storage.get("hero").await.expect("get");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn put_replaces_whole_record() {
        let storage = test_storage().await;

        let first = ContentRecord::new()
            .with("title", "Old")
            .with("subtitle", "Kept?");
        storage.put("hero", &first).await.expect("put first");

        let second = ContentRecord::new().with("title", "New");
        storage.put("hero", &second).await.expect("put second");

        let found = storage.get("hero").await.unwrap().unwrap();
        assert_eq!(found, second);
        assert_eq!(found.text("subtitle"), "");
    }

    #[tokio::test]
    async fn nested_records_roundtrip() {
        let storage = test_storage().await;
        let record = ContentRecord::new().with("title", "Services").with(
            "services",
            vec![
                ContentRecord::new()
                    .with("title", "Web Design")
                    .with("features", vec!["Responsive".to_string()]),
            ],
        );
        storage.put("services", &record).await.unwrap();
        assert_eq!(storage.get("services").await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn list_and_delete_sections() {
        let storage = test_storage().await;
        storage
            .put("hero", &ContentRecord::new().with("title", "Hi"))
            .await
            .unwrap();
        storage
            .put("about", &ContentRecord::new().with("title", "Us"))
            .await
            .unwrap();

        let listed = storage.list_sections().await.expect("list");
        let names: Vec<_> = listed.iter().map(|s| s.section.as_str()).collect();
        assert_eq!(names, ["about", "hero"]);

        assert!(storage.delete_section("hero").await.unwrap());
        assert!(!storage.delete_section("hero").await.unwrap());
        assert_eq!(storage.list_sections().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn readonly_rejects_writes() {
        let tmp = std::env::temp_dir().join(format!("sitecms_test_{}.db", Uuid::now_v7()));
        let rw = Storage::open(&tmp).await.unwrap();
        rw.put("cta", &ContentRecord::new().with("title", "Talk to us"))
            .await
            .unwrap();
        drop(rw);

        let ro = Storage::open_readonly(&tmp).await.unwrap();
        let found = ro.get("cta").await.unwrap().unwrap();
        assert_eq!(found.text("title"), "Talk to us");

        let result = ro.put("cta", &ContentRecord::new()).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("read-only"));
    }
}
