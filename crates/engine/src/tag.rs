//! Tag entity and colors.
//!
//! A tag is a labeled, colored marker owned by one column and attachable to
//! any number of that column's cells. The relation is stored on both sides
//! (cell's selected list, tag's reference list) and kept mirrored by the
//! model primitives.

use serde::{Deserialize, Serialize};

use crate::id::{CellId, ColumnId, TagId};

/// Tag color palette.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    LightGray,
    #[default]
    Gray,
    Brown,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
    Red,
}

impl Color {
    /// The full palette, in menu order.
    pub fn palette() -> &'static [Color] {
        &[
            Color::LightGray,
            Color::Gray,
            Color::Brown,
            Color::Orange,
            Color::Yellow,
            Color::Green,
            Color::Blue,
            Color::Purple,
            Color::Pink,
            Color::Red,
        ]
    }
}

/// A tag definition within a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub id: TagId,
    pub column_id: ColumnId,
    label_source: String,
    label_rendered: String,
    pub color: Color,
    cell_ids: Vec<CellId>,
}

impl Tag {
    pub(crate) fn new(column_id: ColumnId, label: &str, color: Color) -> Self {
        let label = normalize_label(label);
        Self {
            id: TagId::generate(),
            column_id,
            label_rendered: label.clone(),
            label_source: label,
            color,
            cell_ids: Vec::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label_rendered
    }

    /// Cells currently referencing this tag.
    pub fn cell_ids(&self) -> &[CellId] {
        &self.cell_ids
    }

    pub fn references(&self, cell_id: &CellId) -> bool {
        self.cell_ids.contains(cell_id)
    }

    pub(crate) fn push_cell(&mut self, cell_id: CellId) {
        self.cell_ids.push(cell_id);
    }

    pub(crate) fn remove_cell(&mut self, cell_id: &CellId) {
        self.cell_ids.retain(|id| id != cell_id);
    }

    pub(crate) fn set_cell_ids(&mut self, cell_ids: Vec<CellId>) {
        self.cell_ids = cell_ids;
    }
}

/// Normalize a tag label to what the text format can represent.
///
/// Labels are joined with single spaces when a tag cell is serialized, so a
/// label must not itself contain whitespace: runs of whitespace become a
/// single `-`.
pub fn normalize_label(label: &str) -> String {
    label
        .trim()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_label_plain() {
        assert_eq!(normalize_label("urgent"), "urgent");
        assert_eq!(normalize_label("  done "), "done");
    }

    #[test]
    fn test_normalize_label_whitespace() {
        assert_eq!(normalize_label("in progress"), "in-progress");
        assert_eq!(normalize_label("a \t b\nc"), "a-b-c");
    }

    #[test]
    fn test_tag_reference_list() {
        let mut tag = Tag::new(ColumnId::generate(), "todo", Color::Blue);
        let cell = CellId::generate();
        assert!(!tag.references(&cell));
        tag.push_cell(cell.clone());
        assert!(tag.references(&cell));
        tag.remove_cell(&cell);
        assert!(tag.cell_ids().is_empty());
    }

    #[test]
    fn test_palette_has_distinct_colors() {
        use std::collections::HashSet;
        let set: HashSet<_> = Color::palette().iter().map(|c| format!("{c:?}")).collect();
        assert_eq!(set.len(), Color::palette().len());
    }
}
