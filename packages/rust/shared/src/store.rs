//! The content store capability.
//!
//! Every consumer (admin editor, CLI, site sections) receives one shared
//! `Arc<dyn ContentStore>` instead of building its own client handle.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::ContentRecord;

/// A key-value document store addressed by section name.
///
/// There is no versioning and no partial update: `put` replaces the whole
/// record stored under `section`.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch the record for `section`, or `None` if it was never saved.
    async fn get(&self, section: &str) -> Result<Option<ContentRecord>>;

    /// Replace the record stored for `section`.
    async fn put(&self, section: &str, record: &ContentRecord) -> Result<()>;
}
