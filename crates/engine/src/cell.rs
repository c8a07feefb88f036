//! Cell entity and text rendering.

use serde::{Deserialize, Serialize};

use crate::id::{CellId, ColumnId, RowId, TagId};

/// Source text of a checked checkbox cell.
pub const CHECKBOX_CHECKED: &str = "[x]";
/// Source text of an unchecked checkbox cell.
pub const CHECKBOX_UNCHECKED: &str = "[ ]";

/// A single cell, owned by exactly one (row, column) pair.
///
/// `source` is the text as typed/loaded; `rendered` is the single-line form
/// used for display and width computation. For tag-typed columns the cell
/// text is empty and the content lives in `tag_ids` (ordered by attachment).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub row_id: RowId,
    pub column_id: ColumnId,
    source: String,
    rendered: String,
    tag_ids: Vec<TagId>,
}

impl Cell {
    pub(crate) fn new(row_id: RowId, column_id: ColumnId) -> Self {
        Self {
            id: CellId::generate(),
            row_id,
            column_id,
            source: String::new(),
            rendered: String::new(),
            tag_ids: Vec::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    /// Selected tags, in attachment order.
    pub fn tag_ids(&self) -> &[TagId] {
        &self.tag_ids
    }

    pub fn has_tag(&self, tag_id: &TagId) -> bool {
        self.tag_ids.contains(tag_id)
    }

    pub(crate) fn set_content(&mut self, source: &str) {
        self.source = source.to_string();
        self.rendered = render_text(source);
    }

    pub(crate) fn push_tag(&mut self, tag_id: TagId) {
        self.tag_ids.push(tag_id);
    }

    pub(crate) fn remove_tag(&mut self, tag_id: &TagId) {
        self.tag_ids.retain(|id| id != tag_id);
    }

    pub(crate) fn set_tag_ids(&mut self, tag_ids: Vec<TagId>) {
        self.tag_ids = tag_ids;
    }
}

/// Single-line rendered form of a source text.
///
/// The persisted table is line-oriented, so a cell cannot span lines:
/// surrounding whitespace is trimmed and embedded newlines collapse to
/// single spaces.
pub fn render_text(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    for (i, line) in source.trim().lines().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(line.trim());
    }
    out
}

/// Whether a checkbox cell's source reads as checked.
pub fn checkbox_checked(source: &str) -> bool {
    source.trim() == CHECKBOX_CHECKED
}
