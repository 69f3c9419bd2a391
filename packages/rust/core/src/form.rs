//! Schema-driven form rendering and whole-record edits.
//!
//! [`render`] turns a schema plus the current working copy into a flat list
//! of [`Control`]s that any front-end can draw. [`apply`] takes one [`Edit`]
//! and returns a new record: untouched siblings are copied, only the edited
//! path is replaced. Nothing here talks to the store.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use sitecms_shared::{ContentRecord, FieldValue, Result, SiteCmsError};

use crate::schema::{FieldDescriptor, FieldKind, find_field};

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// One step into a record: a field name or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Field(String),
    Index(usize),
}

/// Address of a value inside a record, e.g. `services[1].features[0]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FieldPath(Vec<PathSegment>);

impl FieldPath {
    /// Path to a top-level field.
    pub fn field(name: impl Into<String>) -> Self {
        Self(vec![PathSegment::Field(name.into())])
    }

    /// Extend with a nested field name.
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Field(name.into()));
        Self(segments)
    }

    /// Extend with a list index.
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// The path without its last segment, together with that segment.
    pub fn split_last(&self) -> Option<(FieldPath, &PathSegment)> {
        let (last, rest) = self.0.split_last()?;
        Some((Self(rest.to_vec()), last))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => write!(f, "{name}")?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

impl FromStr for FieldPath {
    type Err = SiteCmsError;

    /// Parse the display form: `title`, `services[0].features[2]`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || SiteCmsError::validation(format!("invalid field path `{s}`"));
        let mut segments = Vec::new();

        for part in s.split('.') {
            let (name, mut rest) = match part.find('[') {
                Some(pos) => part.split_at(pos),
                None => (part, ""),
            };
            if name.is_empty() {
                return Err(invalid());
            }
            segments.push(PathSegment::Field(name.to_string()));

            while !rest.is_empty() {
                let close = rest.find(']').ok_or_else(invalid)?;
                let idx = rest[1..close].parse::<usize>().map_err(|_| invalid())?;
                segments.push(PathSegment::Index(idx));
                rest = &rest[close + 1..];
                if !rest.is_empty() && !rest.starts_with('[') {
                    return Err(invalid());
                }
            }
        }

        Ok(Self(segments))
    }
}

// ---------------------------------------------------------------------------
// Controls
// ---------------------------------------------------------------------------

/// What a control shows and accepts.
#[derive(Debug, Clone, PartialEq)]
pub enum Widget {
    /// Single- or multi-line text bound to a field or list entry.
    Text { value: String, multiline: bool },
    /// Choice among fixed options; `None` when nothing valid is stored.
    Select {
        options: &'static [&'static str],
        selected: Option<usize>,
    },
    /// Heading of a list field.
    ListHeader { len: usize, max_items: Option<usize> },
    /// One string in a text list. Removable.
    ListEntry { index: usize, value: String },
    /// One record in an object list. Removable and collapsible.
    Group {
        index: usize,
        collapsed: bool,
        summary: String,
    },
    /// "Add entry" affordance for the list at this control's path.
    Append { enabled: bool },
}

/// One renderable, addressable element of the form.
#[derive(Debug, Clone, PartialEq)]
pub struct Control {
    /// Where edits from this control apply.
    pub path: FieldPath,
    pub label: String,
    /// Nesting level (0 for top-level fields).
    pub depth: usize,
    pub widget: Widget,
}

impl Control {
    /// Edit that replaces this control's text, if it holds text.
    pub fn set_text(&self, value: impl Into<String>) -> Option<Edit> {
        match self.widget {
            Widget::Text { .. } | Widget::ListEntry { .. } => {
                Some(Edit::set_text(self.path.clone(), value))
            }
            _ => None,
        }
    }

    /// Edit that removes this list entry or group from its parent list.
    pub fn remove(&self) -> Option<Edit> {
        match self.widget {
            Widget::ListEntry { index, .. } | Widget::Group { index, .. } => {
                let (list, _) = self.path.split_last()?;
                Some(Edit::remove(list, index))
            }
            _ => None,
        }
    }

    /// Edit that appends to the list, if this is an enabled append control.
    pub fn append(&self) -> Option<Edit> {
        match self.widget {
            Widget::Append { enabled: true } => Some(Edit::append(self.path.clone())),
            _ => None,
        }
    }

    /// Edit that moves a select to the next (`forward`) or previous option.
    pub fn cycle_select(&self, forward: bool) -> Option<Edit> {
        let Widget::Select { options, selected } = self.widget else {
            return None;
        };
        if options.is_empty() {
            return None;
        }
        let last = options.len() - 1;
        let next = match (selected, forward) {
            (None, true) => 0,
            (None, false) => last,
            (Some(i), true) if i >= last => 0,
            (Some(i), true) => i + 1,
            (Some(0), false) => last,
            (Some(i), false) => i - 1,
        };
        Some(Edit::select(self.path.clone(), Some(next)))
    }
}

/// Which object-list groups are folded away.
#[derive(Debug, Clone, Default)]
pub struct CollapseState(HashSet<FieldPath>);

impl CollapseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_collapsed(&self, path: &FieldPath) -> bool {
        self.0.contains(path)
    }

    /// Flip a group between collapsed and expanded.
    pub fn toggle(&mut self, path: &FieldPath) {
        if !self.0.remove(path) {
            self.0.insert(path.clone());
        }
    }

    /// Follow a removal of `list[index]`: its fold state (and that of anything
    /// inside it) is dropped, and later entries keep theirs at `j - 1`.
    pub fn removed(&mut self, list: &FieldPath, index: usize) {
        let depth = list.0.len();
        self.0 = std::mem::take(&mut self.0)
            .into_iter()
            .filter_map(|path| {
                if !path.0.starts_with(&list.0) {
                    return Some(path);
                }
                let slot = match path.0.get(depth) {
                    Some(PathSegment::Index(j)) => Some(*j),
                    _ => None,
                };
                match slot {
                    Some(j) if j == index => None,
                    Some(j) if j > index => {
                        let mut segments = path.0;
                        segments[depth] = PathSegment::Index(j - 1);
                        Some(FieldPath(segments))
                    }
                    _ => Some(path),
                }
            })
            .collect();
    }

    /// Forget all collapse state, e.g. after switching sections.
    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// Produce the controls for `record` laid out by `schema`.
pub fn render(
    schema: &[FieldDescriptor],
    record: &ContentRecord,
    collapsed: &CollapseState,
) -> Vec<Control> {
    let mut controls = Vec::new();
    render_into(&mut controls, schema, record, &FieldPath::default(), 0, collapsed);
    controls
}

fn render_into(
    out: &mut Vec<Control>,
    schema: &[FieldDescriptor],
    record: &ContentRecord,
    base: &FieldPath,
    depth: usize,
    collapsed: &CollapseState,
) {
    for field in schema {
        let path = base.child(field.name);
        let label = field.label.to_string();

        match field.kind {
            FieldKind::Text | FieldKind::Multiline => out.push(Control {
                path,
                label,
                depth,
                widget: Widget::Text {
                    value: record.text(field.name).to_string(),
                    multiline: matches!(field.kind, FieldKind::Multiline),
                },
            }),
            FieldKind::Select { options } => {
                let current = record.text(field.name);
                out.push(Control {
                    path,
                    label,
                    depth,
                    widget: Widget::Select {
                        options,
                        selected: options.iter().position(|o| *o == current),
                    },
                });
            }
            FieldKind::TextList { max_items } => {
                let items = record.list(field.name);
                out.push(Control {
                    path: path.clone(),
                    label: label.clone(),
                    depth,
                    widget: Widget::ListHeader {
                        len: items.len(),
                        max_items,
                    },
                });
                for (index, value) in items.iter().enumerate() {
                    out.push(Control {
                        path: path.index(index),
                        label: format!("{label} #{}", index + 1),
                        depth: depth + 1,
                        widget: Widget::ListEntry {
                            index,
                            value: value.clone(),
                        },
                    });
                }
                out.push(Control {
                    path,
                    label: format!("Add {label}"),
                    depth: depth + 1,
                    widget: Widget::Append {
                        enabled: can_append(max_items, items.len()),
                    },
                });
            }
            FieldKind::ObjectList { item_schema } => {
                let entries = record.records(field.name);
                out.push(Control {
                    path: path.clone(),
                    label: label.clone(),
                    depth,
                    widget: Widget::ListHeader {
                        len: entries.len(),
                        max_items: None,
                    },
                });
                for (index, entry) in entries.iter().enumerate() {
                    let entry_path = path.index(index);
                    let is_collapsed = collapsed.is_collapsed(&entry_path);
                    out.push(Control {
                        path: entry_path.clone(),
                        label: format!("{label} #{}", index + 1),
                        depth: depth + 1,
                        widget: Widget::Group {
                            index,
                            collapsed: is_collapsed,
                            summary: group_summary(item_schema, entry),
                        },
                    });
                    if !is_collapsed {
                        render_into(out, item_schema, entry, &entry_path, depth + 2, collapsed);
                    }
                }
                out.push(Control {
                    path,
                    label: format!("Add {label}"),
                    depth: depth + 1,
                    widget: Widget::Append { enabled: true },
                });
            }
        }
    }
}

/// First non-empty single-line text of an entry, used as its group title.
fn group_summary(item_schema: &[FieldDescriptor], entry: &ContentRecord) -> String {
    item_schema
        .iter()
        .filter(|f| matches!(f.kind, FieldKind::Text))
        .map(|f| entry.text(f.name))
        .find(|v| !v.is_empty())
        .unwrap_or("(untitled)")
        .to_string()
}

fn can_append(max_items: Option<usize>, len: usize) -> bool {
    max_items.is_none_or(|max| len < max)
}

// ---------------------------------------------------------------------------
// Edits
// ---------------------------------------------------------------------------

/// The change an [`Edit`] makes at its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    /// Replace a text field or a text-list entry.
    SetText(String),
    /// Choose a select option by index; `None` clears the selection.
    Select(Option<usize>),
    /// Add an empty entry to a list.
    Append,
    /// Remove the entry at an index, shifting later entries down.
    Remove(usize),
}

/// One user edit against the working copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub path: FieldPath,
    pub action: EditAction,
}

impl Edit {
    pub fn set_text(path: FieldPath, value: impl Into<String>) -> Self {
        Self {
            path,
            action: EditAction::SetText(value.into()),
        }
    }

    pub fn select(path: FieldPath, option: Option<usize>) -> Self {
        Self {
            path,
            action: EditAction::Select(option),
        }
    }

    pub fn append(path: FieldPath) -> Self {
        Self {
            path,
            action: EditAction::Append,
        }
    }

    pub fn remove(path: FieldPath, index: usize) -> Self {
        Self {
            path,
            action: EditAction::Remove(index),
        }
    }
}

/// Apply `edit` to `record`, returning the replacement record.
///
/// Appending to a list already at its `max_items` leaves it unchanged.
pub fn apply(
    schema: &[FieldDescriptor],
    record: &ContentRecord,
    edit: &Edit,
) -> Result<ContentRecord> {
    update_record(schema, record, edit.path.segments(), &edit.action)
        .map_err(|e| match e {
            SiteCmsError::Validation { message } => {
                SiteCmsError::validation(format!("{message} (at `{}`)", edit.path))
            }
            other => other,
        })
}

fn update_record(
    schema: &[FieldDescriptor],
    record: &ContentRecord,
    path: &[PathSegment],
    action: &EditAction,
) -> Result<ContentRecord> {
    let Some((PathSegment::Field(name), rest)) = path.split_first() else {
        return Err(SiteCmsError::validation("path must start with a field name"));
    };
    let field = find_field(schema, name)
        .ok_or_else(|| SiteCmsError::validation(format!("unknown field `{name}`")))?;

    let value = match (field.kind, rest, action) {
        (FieldKind::Text | FieldKind::Multiline, [], EditAction::SetText(value)) => {
            FieldValue::Text(value.clone())
        }
        (FieldKind::Select { options }, [], EditAction::Select(choice)) => match choice {
            None => FieldValue::Text(String::new()),
            Some(i) => {
                let option = options.get(*i).ok_or_else(|| {
                    SiteCmsError::validation(format!("option {i} out of range"))
                })?;
                FieldValue::Text((*option).to_string())
            }
        },
        (FieldKind::TextList { max_items }, [], EditAction::Append) => {
            let mut items = record.list(name).to_vec();
            if !can_append(max_items, items.len()) {
                return Ok(record.clone());
            }
            items.push(String::new());
            FieldValue::List(items)
        }
        (FieldKind::TextList { .. }, [], EditAction::Remove(index)) => {
            FieldValue::List(remove_at(record.list(name), *index)?)
        }
        (FieldKind::TextList { .. }, [PathSegment::Index(i)], EditAction::SetText(value)) => {
            let mut items = record.list(name).to_vec();
            let slot = items
                .get_mut(*i)
                .ok_or_else(|| SiteCmsError::validation(format!("no entry {i}")))?;
            *slot = value.clone();
            FieldValue::List(items)
        }
        (FieldKind::ObjectList { item_schema }, [], EditAction::Append) => {
            let mut entries = record.records(name).to_vec();
            entries.push(empty_entry(item_schema));
            FieldValue::Records(entries)
        }
        (FieldKind::ObjectList { .. }, [], EditAction::Remove(index)) => {
            FieldValue::Records(remove_at(record.records(name), *index)?)
        }
        (FieldKind::ObjectList { item_schema }, [PathSegment::Index(i), nested @ ..], _)
            if !nested.is_empty() =>
        {
            let mut entries = record.records(name).to_vec();
            let entry = entries
                .get(*i)
                .ok_or_else(|| SiteCmsError::validation(format!("no entry {i}")))?;
            let replaced = update_record(item_schema, entry, nested, action)?;
            entries[*i] = replaced;
            FieldValue::Records(entries)
        }
        _ => {
            return Err(SiteCmsError::validation(format!(
                "{action:?} does not apply to field `{name}`"
            )));
        }
    };

    let mut updated = record.clone();
    updated.insert(name.clone(), value);
    Ok(updated)
}

fn remove_at<T: Clone>(items: &[T], index: usize) -> Result<Vec<T>> {
    if index >= items.len() {
        return Err(SiteCmsError::validation(format!(
            "cannot remove entry {index} of {}",
            items.len()
        )));
    }
    let mut items = items.to_vec();
    items.remove(index);
    Ok(items)
}

/// A new object-list entry with every item field at its zero value.
pub fn empty_entry(item_schema: &[FieldDescriptor]) -> ContentRecord {
    let mut entry = ContentRecord::new();
    for field in item_schema {
        entry.insert(field.name, field.empty_value());
    }
    entry
}
