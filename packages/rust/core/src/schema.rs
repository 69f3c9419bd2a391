//! Field schema registry: which fields each editable section has.
//!
//! Schemas are static, hand-authored configuration. Adding an editable
//! section means adding one entry to [`schema_for`] and [`SECTIONS`].

use serde::Serialize;
use sitecms_shared::FieldValue;

/// The shape and constraints of one editable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldKind {
    /// Single-line text.
    Text,
    /// Multi-line text.
    Multiline,
    /// One value out of a fixed option list.
    Select { options: &'static [&'static str] },
    /// Ordered list of strings, optionally capped.
    TextList { max_items: Option<usize> },
    /// Ordered list of nested records, each shaped by `item_schema`.
    ObjectList {
        item_schema: &'static [FieldDescriptor],
    },
}

/// Schema entry describing one editable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldDescriptor {
    /// Record key; unique within its parent schema.
    pub name: &'static str,
    /// Human-readable label.
    pub label: &'static str,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDescriptor {
    const fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self { name, label, kind }
    }

    /// Zero value for this field, used when a new list entry is created.
    pub fn empty_value(&self) -> FieldValue {
        match self.kind {
            FieldKind::Text | FieldKind::Multiline | FieldKind::Select { .. } => {
                FieldValue::Text(String::new())
            }
            FieldKind::TextList { .. } => FieldValue::List(Vec::new()),
            FieldKind::ObjectList { .. } => FieldValue::Records(Vec::new()),
        }
    }
}

/// Look up a descriptor by name within a schema.
pub fn find_field<'a>(schema: &'a [FieldDescriptor], name: &str) -> Option<&'a FieldDescriptor> {
    schema.iter().find(|f| f.name == name)
}

// ---------------------------------------------------------------------------
// Section registry
// ---------------------------------------------------------------------------

/// Every editable section, in sidebar order.
pub const SECTIONS: &[&str] = &["hero", "about", "services", "work", "cta"];

/// Display name for a section, falling back to the identifier itself.
pub fn section_name(section: &str) -> &str {
    match section {
        "hero" => "Hero Section",
        "about" => "About Company",
        "services" => "Services",
        "work" => "Featured Work",
        "cta" => "CTA Section",
        other => other,
    }
}

/// Icons the site knows how to draw for a service card.
pub const SERVICE_ICONS: &[&str] = &["Palette", "Code", "Layout", "Megaphone", "Rocket", "Shield"];

/// Project categories shown on portfolio cards.
pub const PROJECT_CATEGORIES: &[&str] = &[
    "Web Development",
    "UI/UX Design",
    "App Development",
    "E-commerce",
    "Branding",
];

const HERO: &[FieldDescriptor] = &[
    FieldDescriptor::new("title", "Title", FieldKind::Text),
    FieldDescriptor::new("subtitle", "Subtitle", FieldKind::Text),
    FieldDescriptor::new("description", "Description", FieldKind::Multiline),
    FieldDescriptor::new("buttonText", "Button Text", FieldKind::Text),
    FieldDescriptor::new("buttonLink", "Button Link", FieldKind::Text),
];

const ABOUT: &[FieldDescriptor] = &[
    FieldDescriptor::new("title", "Title", FieldKind::Text),
    FieldDescriptor::new("content", "Content", FieldKind::Multiline),
    FieldDescriptor::new("mission", "Mission Statement", FieldKind::Multiline),
    FieldDescriptor::new("vision", "Vision Statement", FieldKind::Multiline),
];

const SERVICE_ITEM: &[FieldDescriptor] = &[
    FieldDescriptor::new(
        "icon",
        "Icon",
        FieldKind::Select {
            options: SERVICE_ICONS,
        },
    ),
    FieldDescriptor::new("title", "Title", FieldKind::Text),
    FieldDescriptor::new("description", "Description", FieldKind::Multiline),
    FieldDescriptor::new(
        "features",
        "Features",
        FieldKind::TextList { max_items: Some(6) },
    ),
    FieldDescriptor::new("href", "Link", FieldKind::Text),
];

const SERVICES: &[FieldDescriptor] = &[
    FieldDescriptor::new("title", "Section Title", FieldKind::Text),
    FieldDescriptor::new("description", "Section Description", FieldKind::Multiline),
    FieldDescriptor::new(
        "services",
        "Services",
        FieldKind::ObjectList {
            item_schema: SERVICE_ITEM,
        },
    ),
];

const PROJECT_ITEM: &[FieldDescriptor] = &[
    FieldDescriptor::new("title", "Title", FieldKind::Text),
    FieldDescriptor::new(
        "category",
        "Category",
        FieldKind::Select {
            options: PROJECT_CATEGORIES,
        },
    ),
    FieldDescriptor::new("image", "Image URL", FieldKind::Text),
    FieldDescriptor::new("description", "Description", FieldKind::Multiline),
    FieldDescriptor::new("link", "Project Link", FieldKind::Text),
    FieldDescriptor::new("tags", "Tags", FieldKind::TextList { max_items: Some(5) }),
];

const WORK: &[FieldDescriptor] = &[
    FieldDescriptor::new("title", "Section Title", FieldKind::Text),
    FieldDescriptor::new("description", "Section Description", FieldKind::Multiline),
    FieldDescriptor::new(
        "projects",
        "Projects",
        FieldKind::ObjectList {
            item_schema: PROJECT_ITEM,
        },
    ),
];

const CTA: &[FieldDescriptor] = &[
    FieldDescriptor::new("title", "Title", FieldKind::Text),
    FieldDescriptor::new("description", "Description", FieldKind::Multiline),
    FieldDescriptor::new("buttonText", "Button Text", FieldKind::Text),
    FieldDescriptor::new("buttonLink", "Button Link", FieldKind::Text),
];

/// Ordered field descriptors for `section`. Unknown sections have no fields.
pub fn schema_for(section: &str) -> &'static [FieldDescriptor] {
    match section {
        "hero" => HERO,
        "about" => ABOUT,
        "services" => SERVICES,
        "work" => WORK,
        "cta" => CTA,
        _ => &[],
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn schema_lookup_is_deterministic() {
        for section in SECTIONS.iter().copied().chain(["", "unknown", "HERO"]) {
            assert_eq!(schema_for(section), schema_for(section));
        }
    }

    #[test]
    fn unknown_section_has_no_fields() {
        assert!(schema_for("pricing").is_empty());
        assert_eq!(section_name("pricing"), "pricing");
    }

    #[test]
    fn every_known_section_has_fields_and_a_name() {
        for section in SECTIONS {
            assert!(!schema_for(section).is_empty(), "{section} has no schema");
            assert_ne!(section_name(section), *section);
        }
    }

    fn assert_unique_names(schema: &[FieldDescriptor]) {
        let mut seen = HashSet::new();
        for field in schema {
            assert!(seen.insert(field.name), "duplicate field {}", field.name);
        }
    }

    #[test]
    fn field_names_unique_and_nesting_is_one_level() {
        for section in SECTIONS {
            let schema = schema_for(section);
            assert_unique_names(schema);
            for field in schema {
                if let FieldKind::ObjectList { item_schema } = field.kind {
                    assert_unique_names(item_schema);
                    assert!(
                        item_schema
                            .iter()
                            .all(|f| !matches!(f.kind, FieldKind::ObjectList { .. })),
                        "{section}.{} nests object lists",
                        field.name
                    );
                }
            }
        }
    }

    #[test]
    fn services_field_order() {
        let names: Vec<_> = schema_for("services").iter().map(|f| f.name).collect();
        assert_eq!(names, ["title", "description", "services"]);
        let features = match find_field(SERVICE_ITEM, "features").map(|f| f.kind) {
            Some(FieldKind::TextList { max_items }) => max_items,
            other => panic!("unexpected kind {other:?}"),
        };
        assert_eq!(features, Some(6));
    }

    #[test]
    fn empty_values_match_kind() {
        let services = find_field(SERVICES, "services").unwrap();
        assert_eq!(services.empty_value(), FieldValue::Records(vec![]));
        let features = find_field(SERVICE_ITEM, "features").unwrap();
        assert_eq!(features.empty_value(), FieldValue::List(vec![]));
        let icon = find_field(SERVICE_ITEM, "icon").unwrap();
        assert_eq!(icon.empty_value(), FieldValue::Text(String::new()));
    }

    #[test]
    fn schema_serializes_with_kind_tag() {
        let json = serde_json::to_value(schema_for("cta")).expect("serialize");
        assert_eq!(json[0]["name"], "title");
        assert_eq!(json[0]["kind"], "text");
        assert_eq!(json[1]["kind"], "multiline");
    }
}
