//! Column entity and per-column display settings.

use serde::{Deserialize, Serialize};

use crate::cell::render_text;
use crate::id::{ColumnId, TagId};

/// Default column width setting, in pixels.
pub const DEFAULT_COLUMN_WIDTH: u32 = 100;

/// Display type of a column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    #[default]
    Text,
    Number,
    Checkbox,
    Date,
    Tag,
}

/// Sort direction of a column. At most one column sorts the table at a time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDir {
    #[default]
    None,
    Asc,
    Desc,
}

/// A column. Position in the model's column sequence is the visual
/// left-to-right order; reordering is a first-class operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub column_type: ColumnType,
    header_source: String,
    header_rendered: String,
    /// Display width in pixels. Ignored while `auto_width` is set.
    pub width: u32,
    pub wrap_overflow: bool,
    pub auto_width: bool,
    pub sort_dir: SortDir,
    tag_ids: Vec<TagId>,
}

impl Column {
    pub(crate) fn new(header: &str, column_type: ColumnType) -> Self {
        Self {
            id: ColumnId::generate(),
            column_type,
            header_source: header.to_string(),
            header_rendered: render_text(header),
            width: DEFAULT_COLUMN_WIDTH,
            wrap_overflow: false,
            auto_width: false,
            sort_dir: SortDir::None,
            tag_ids: Vec::new(),
        }
    }

    pub fn header_source(&self) -> &str {
        &self.header_source
    }

    pub fn header_rendered(&self) -> &str {
        &self.header_rendered
    }

    /// Tags valid for this column, in creation order.
    pub fn tag_ids(&self) -> &[TagId] {
        &self.tag_ids
    }

    pub(crate) fn set_header(&mut self, source: &str) {
        self.header_source = source.to_string();
        self.header_rendered = render_text(source);
    }

    pub(crate) fn push_tag(&mut self, tag_id: TagId) {
        self.tag_ids.push(tag_id);
    }

    pub(crate) fn insert_tag(&mut self, index: usize, tag_id: TagId) {
        self.tag_ids.insert(index.min(self.tag_ids.len()), tag_id);
    }

    pub(crate) fn remove_tag(&mut self, tag_id: &TagId) -> Option<usize> {
        let index = self.tag_ids.iter().position(|id| id == tag_id)?;
        self.tag_ids.remove(index);
        Some(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_column_defaults() {
        let col = Column::new("Name", ColumnType::Text);
        assert_eq!(col.column_type, ColumnType::Text);
        assert_eq!(col.width, DEFAULT_COLUMN_WIDTH);
        assert!(!col.wrap_overflow);
        assert!(!col.auto_width);
        assert_eq!(col.sort_dir, SortDir::None);
        assert!(col.tag_ids().is_empty());
    }

    #[test]
    fn test_header_rendered_tracks_source() {
        let mut col = Column::new("  Name  ", ColumnType::Text);
        assert_eq!(col.header_source(), "  Name  ");
        assert_eq!(col.header_rendered(), "Name");

        col.set_header("Age\n(years)");
        assert_eq!(col.header_rendered(), "Age (years)");
    }

    #[test]
    fn test_tag_list_order() {
        let mut col = Column::new("Status", ColumnType::Tag);
        let a = TagId::generate();
        let b = TagId::generate();
        let c = TagId::generate();
        col.push_tag(a.clone());
        col.push_tag(b.clone());
        assert_eq!(col.remove_tag(&a), Some(0));
        col.insert_tag(0, c.clone());
        assert_eq!(col.tag_ids(), &[c, b]);
    }
}
