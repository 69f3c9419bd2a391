//! Read-side helpers for the public site sections.
//!
//! Site sections never block on a broken store: a failed load is logged and
//! the section renders from an empty record.

use std::fmt::Write as _;

use serde::Serialize;
use sitecms_shared::{ContentRecord, ContentStore};
use tracing::warn;

use crate::schema::{FieldDescriptor, FieldKind, SERVICE_ICONS, schema_for, section_name};

/// Icon used when a service names no icon or one the site cannot draw.
pub const DEFAULT_SERVICE_ICON: &str = "Code";

/// Load the published record for `section`, falling back to an empty record.
pub async fn load_published(store: &dyn ContentStore, section: &str) -> ContentRecord {
    match store.get(section).await {
        Ok(found) => found.unwrap_or_default(),
        Err(e) => {
            warn!(section, error = %e, "error fetching published content");
            ContentRecord::new()
        }
    }
}

/// One card in the services grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceCard {
    pub icon: &'static str,
    pub title: String,
    pub description: String,
    pub features: Vec<String>,
    pub href: String,
}

/// One card in the featured-work grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectCard {
    pub title: String,
    pub category: String,
    pub image: String,
    pub description: String,
    pub link: String,
    pub tags: Vec<String>,
}

/// Service cards from a `services` record.
pub fn service_cards(record: &ContentRecord) -> Vec<ServiceCard> {
    record
        .records("services")
        .iter()
        .map(|entry| ServiceCard {
            icon: SERVICE_ICONS
                .iter()
                .copied()
                .find(|icon| *icon == entry.text("icon"))
                .unwrap_or(DEFAULT_SERVICE_ICON),
            title: entry.text("title").to_string(),
            description: entry.text("description").to_string(),
            features: entry.list("features").to_vec(),
            href: entry.text("href").to_string(),
        })
        .collect()
}

/// Project cards from a `work` record.
pub fn project_cards(record: &ContentRecord) -> Vec<ProjectCard> {
    record
        .records("projects")
        .iter()
        .map(|entry| ProjectCard {
            title: entry.text("title").to_string(),
            category: entry.text("category").to_string(),
            image: entry.text("image").to_string(),
            description: entry.text("description").to_string(),
            link: entry.text("link").to_string(),
            tags: entry.list("tags").to_vec(),
        })
        .collect()
}

/// Plain-text preview of a section as the site would lay it out.
pub fn render_preview(section: &str, record: &ContentRecord) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", section_name(section));
    preview_fields(&mut out, schema_for(section), record, 0);
    out
}

fn preview_fields(out: &mut String, schema: &[FieldDescriptor], record: &ContentRecord, depth: usize) {
    let pad = "  ".repeat(depth);
    for field in schema {
        match field.kind {
            FieldKind::Text | FieldKind::Select { .. } => {
                let value = record.text(field.name);
                if !value.is_empty() {
                    let _ = writeln!(out, "{pad}{}: {value}", field.label);
                }
            }
            FieldKind::Multiline => {
                let value = record.text(field.name);
                if !value.is_empty() {
                    let _ = writeln!(out, "{pad}{}:", field.label);
                    for line in value.lines() {
                        let _ = writeln!(out, "{pad}  {line}");
                    }
                }
            }
            FieldKind::TextList { .. } => {
                let items = record.list(field.name);
                if !items.is_empty() {
                    let _ = writeln!(out, "{pad}{}:", field.label);
                    for item in items {
                        let _ = writeln!(out, "{pad}  - {item}");
                    }
                }
            }
            FieldKind::ObjectList { item_schema } => {
                for (i, entry) in record.records(field.name).iter().enumerate() {
                    let _ = writeln!(out, "{pad}{} #{}", field.label, i + 1);
                    preview_fields(out, item_schema, entry, depth + 1);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use sitecms_shared::{Result, SiteCmsError};
    use sitecms_storage::MemoryStore;

    use super::*;

    struct Offline;

    #[async_trait]
    impl ContentStore for Offline {
        async fn get(&self, _section: &str) -> Result<Option<ContentRecord>> {
            Err(SiteCmsError::storage("offline"))
        }

        async fn put(&self, _section: &str, _record: &ContentRecord) -> Result<()> {
            Err(SiteCmsError::storage("offline"))
        }
    }

    #[tokio::test]
    async fn failed_load_yields_empty_record() {
        let record = load_published(&Offline, "services").await;
        assert!(record.is_empty());
        assert!(service_cards(&record).is_empty());
    }

    #[tokio::test]
    async fn stored_record_is_published() {
        let store = MemoryStore::with_records([("cta", ContentRecord::new().with("title", "Start"))]);
        assert_eq!(load_published(&store, "cta").await.text("title"), "Start");
        assert!(load_published(&store, "hero").await.is_empty());
    }

    #[test]
    fn service_icons_fall_back() {
        let record = ContentRecord::new().with(
            "services",
            vec![
                ContentRecord::new().with("icon", "Rocket").with("title", "Launch"),
                ContentRecord::new().with("icon", "Sparkles"),
                ContentRecord::new().with("title", "No icon"),
            ],
        );
        let icons: Vec<_> = service_cards(&record).iter().map(|c| c.icon).collect();
        assert_eq!(icons, ["Rocket", "Code", "Code"]);
    }

    #[test]
    fn project_cards_read_all_fields() {
        let record = ContentRecord::new().with(
            "projects",
            vec![
                ContentRecord::new()
                    .with("title", "E-commerce Platform")
                    .with("category", "Web Development")
                    .with("tags", vec!["Next.js".to_string()]),
            ],
        );
        let cards = project_cards(&record);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].category, "Web Development");
        assert_eq!(cards[0].tags, ["Next.js"]);
        assert_eq!(cards[0].link, "");
    }

    #[test]
    fn preview_lists_nested_entries() {
        let record = ContentRecord::new()
            .with("title", "Services")
            .with(
                "services",
                vec![
                    ContentRecord::new()
                        .with("title", "SEO")
                        .with("features", vec!["Audits".to_string()]),
                ],
            );
        let preview = render_preview("services", &record);
        assert!(preview.starts_with("== Services =="));
        assert!(preview.contains("Section Title: Services"));
        assert!(preview.contains("Services #1"));
        assert!(preview.contains("    - Audits"));
    }
}
