//! The table model: one versioned snapshot of columns, rows, cells and tags.
//!
//! A `TableModel` is plain data. Commands clone the previous version and
//! mutate the clone through the primitives below, so observers holding the
//! old version never see a torn state. The same creation primitives serve
//! the text loader — there is exactly one code path that builds entities,
//! and it is the one that upholds the invariants:
//!
//! 1. the cell set is exactly rows x columns;
//! 2. every tag's owning column exists and every referenced cell belongs
//!    to that column;
//! 3. cell selected-tag lists and tag cell-reference lists mirror each
//!    other;
//! 4. ids are never reused.
//!
//! Destructive primitives return a removal record (entities + positions +
//! detached references) that the matching restore primitive consumes to
//! rebuild the prior state exactly — including vector positions, so deep
//! equality holds after an undo.

use chrono::{DateTime, Utc};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::cell::Cell;
use crate::column::{Column, ColumnType};
use crate::error::EngineError;
use crate::id::{CellId, ColumnId, RowId, TagId};
use crate::row::Row;
use crate::tag::{Color, Tag};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableModel {
    columns: Vec<Column>,
    rows: Vec<Row>,
    cells: Vec<Cell>,
    tags: Vec<Tag>,
}

/// Everything `remove_row` takes out of the model, positioned for restore.
#[derive(Debug, Clone)]
pub struct RemovedRow {
    pub index: usize,
    pub row: Row,
    /// Removed cells with their original positions in the cell vector.
    pub cells: Vec<(usize, Cell)>,
    /// Full prior reference list of every tag that pointed at a removed cell.
    pub tag_refs: Vec<(TagId, Vec<CellId>)>,
}

/// Everything `remove_column` takes out of the model.
#[derive(Debug, Clone)]
pub struct RemovedColumn {
    pub index: usize,
    pub column: Column,
    pub cells: Vec<(usize, Cell)>,
    /// Tags owned by the column, with their original positions in the tag
    /// vector. Their reference lists are preserved as-is.
    pub tags: Vec<(usize, Tag)>,
}

/// Everything `remove_tag` takes out of the model.
#[derive(Debug, Clone)]
pub struct RemovedTag {
    /// Position in the tag vector.
    pub tags_index: usize,
    /// Position in the owning column's ordered tag list.
    pub list_index: usize,
    pub tag: Tag,
    /// Full prior selected-tag list of every cell that held the tag.
    pub prior_cell_tag_ids: Vec<(CellId, Vec<TagId>)>,
}

impl TableModel {
    pub fn new() -> Self {
        Self::default()
    }

    // Queries

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn column(&self, id: &ColumnId) -> Option<&Column> {
        self.columns.iter().find(|c| &c.id == id)
    }

    pub fn column_index(&self, id: &ColumnId) -> Option<usize> {
        self.columns.iter().position(|c| &c.id == id)
    }

    pub fn row(&self, id: &RowId) -> Option<&Row> {
        self.rows.iter().find(|r| &r.id == id)
    }

    pub fn row_index(&self, id: &RowId) -> Option<usize> {
        self.rows.iter().position(|r| &r.id == id)
    }

    pub fn cell(&self, id: &CellId) -> Option<&Cell> {
        self.cells.iter().find(|c| &c.id == id)
    }

    /// The unique cell at a (row, column) pair.
    pub fn cell_at(&self, row_id: &RowId, column_id: &ColumnId) -> Option<&Cell> {
        self.cells
            .iter()
            .find(|c| &c.row_id == row_id && &c.column_id == column_id)
    }

    pub fn tag(&self, id: &TagId) -> Option<&Tag> {
        self.tags.iter().find(|t| &t.id == id)
    }

    /// Tags of a column in the column's list order.
    pub fn tags_of_column(&self, column_id: &ColumnId) -> Vec<&Tag> {
        match self.column(column_id) {
            Some(column) => column
                .tag_ids()
                .iter()
                .filter_map(|id| self.tag(id))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn tag_by_label(&self, column_id: &ColumnId, label: &str) -> Option<&Tag> {
        self.tags
            .iter()
            .find(|t| &t.column_id == column_id && t.label() == label)
    }

    /// Single-line text a cell displays and serializes as. Tag cells render
    /// their selected tags' labels joined by single spaces in attachment
    /// order, skipping empty labels.
    pub fn rendered_cell_text(&self, cell: &Cell) -> String {
        let is_tag_column = self
            .column(&cell.column_id)
            .map(|c| c.column_type == ColumnType::Tag)
            .unwrap_or(false);
        if !is_tag_column {
            return cell.rendered().to_string();
        }

        let mut out = String::new();
        for tag_id in cell.tag_ids() {
            let Some(tag) = self.tag(tag_id) else { continue };
            if tag.label().is_empty() {
                continue;
            }
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(tag.label());
        }
        out
    }

    // Internal mutable access

    pub(crate) fn column_mut(&mut self, id: &ColumnId) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| &c.id == id)
    }

    pub(crate) fn row_mut(&mut self, id: &RowId) -> Option<&mut Row> {
        self.rows.iter_mut().find(|r| &r.id == id)
    }

    pub(crate) fn cell_mut(&mut self, id: &CellId) -> Option<&mut Cell> {
        self.cells.iter_mut().find(|c| &c.id == id)
    }

    pub(crate) fn tag_mut(&mut self, id: &TagId) -> Option<&mut Tag> {
        self.tags.iter_mut().find(|t| &t.id == id)
    }

    // Creation primitives (shared by commands and the loader)

    /// Append a row and a fresh cell for every column.
    pub fn add_row(&mut self, now: DateTime<Utc>) -> RowId {
        let row = Row::new(now);
        let row_id = row.id.clone();
        self.rows.push(row);

        let column_ids: Vec<ColumnId> = self.columns.iter().map(|c| c.id.clone()).collect();
        for column_id in column_ids {
            self.cells.push(Cell::new(row_id.clone(), column_id));
        }
        row_id
    }

    /// Append a column (header `Column N`) and a fresh cell for every row.
    pub fn add_column(&mut self, column_type: ColumnType) -> ColumnId {
        self.insert_column_at(self.columns.len(), column_type)
    }

    /// Insert a column at a position in the visual order.
    pub fn insert_column_at(&mut self, index: usize, column_type: ColumnType) -> ColumnId {
        let header = format!("Column {}", self.columns.len());
        let column = Column::new(&header, column_type);
        let column_id = column.id.clone();
        self.columns.insert(index.min(self.columns.len()), column);

        let row_ids: Vec<RowId> = self.rows.iter().map(|r| r.id.clone()).collect();
        for row_id in row_ids {
            self.cells.push(Cell::new(row_id, column_id.clone()));
        }
        column_id
    }

    /// Create a tag on a column. The label is normalized to the
    /// single-token form the text format can hold.
    pub fn create_tag(
        &mut self,
        column_id: &ColumnId,
        label: &str,
        color: Color,
    ) -> Result<TagId, EngineError> {
        let column = self
            .column_mut(column_id)
            .ok_or_else(|| EngineError::ColumnNotFound(column_id.clone()))?;
        let tag = Tag::new(column_id.clone(), label, color);
        let tag_id = tag.id.clone();
        column.push_tag(tag_id.clone());
        self.tags.push(tag);
        Ok(tag_id)
    }

    // Update primitives

    pub fn set_cell_content(&mut self, cell_id: &CellId, source: &str) -> Result<(), EngineError> {
        let cell = self
            .cell_mut(cell_id)
            .ok_or_else(|| EngineError::CellNotFound(cell_id.clone()))?;
        cell.set_content(source);
        Ok(())
    }

    pub fn set_header(&mut self, column_id: &ColumnId, source: &str) -> Result<(), EngineError> {
        let column = self
            .column_mut(column_id)
            .ok_or_else(|| EngineError::ColumnNotFound(column_id.clone()))?;
        column.set_header(source);
        Ok(())
    }

    /// Change a column's display type, returning the previous type.
    pub fn set_column_type(
        &mut self,
        column_id: &ColumnId,
        column_type: ColumnType,
    ) -> Result<ColumnType, EngineError> {
        let column = self
            .column_mut(column_id)
            .ok_or_else(|| EngineError::ColumnNotFound(column_id.clone()))?;
        let prev = column.column_type;
        column.column_type = column_type;
        Ok(prev)
    }

    /// Attach a tag to a cell, updating both sides of the relation.
    /// Attaching an already-attached tag is a no-op.
    pub fn attach_tag(&mut self, cell_id: &CellId, tag_id: &TagId) -> Result<(), EngineError> {
        if self.tag(tag_id).is_none() {
            return Err(EngineError::TagNotFound(tag_id.clone()));
        }
        let cell = self
            .cell_mut(cell_id)
            .ok_or_else(|| EngineError::CellNotFound(cell_id.clone()))?;
        if cell.has_tag(tag_id) {
            return Ok(());
        }
        cell.push_tag(tag_id.clone());
        // Checked present above.
        if let Some(tag) = self.tag_mut(tag_id) {
            tag.push_cell(cell_id.clone());
        }
        Ok(())
    }

    /// Detach a tag from a cell, updating both sides of the relation.
    pub(crate) fn detach_tag(&mut self, cell_id: &CellId, tag_id: &TagId) -> Result<(), EngineError> {
        if self.tag(tag_id).is_none() {
            return Err(EngineError::TagNotFound(tag_id.clone()));
        }
        let cell = self
            .cell_mut(cell_id)
            .ok_or_else(|| EngineError::CellNotFound(cell_id.clone()))?;
        cell.remove_tag(tag_id);
        if let Some(tag) = self.tag_mut(tag_id) {
            tag.remove_cell(cell_id);
        }
        Ok(())
    }

    /// Refresh a row's last-edited time, returning the previous value.
    pub(crate) fn touch_row(
        &mut self,
        row_id: &RowId,
        when: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, EngineError> {
        let row = self
            .row_mut(row_id)
            .ok_or_else(|| EngineError::RowNotFound(row_id.clone()))?;
        let prev = row.edited_at;
        row.edited_at = when;
        Ok(prev)
    }

    pub(crate) fn set_row_edited(
        &mut self,
        row_id: &RowId,
        when: DateTime<Utc>,
    ) -> Result<(), EngineError> {
        self.touch_row(row_id, when).map(|_| ())
    }

    pub(crate) fn set_cell_tag_ids(
        &mut self,
        cell_id: &CellId,
        tag_ids: Vec<TagId>,
    ) -> Result<(), EngineError> {
        let cell = self
            .cell_mut(cell_id)
            .ok_or_else(|| EngineError::CellNotFound(cell_id.clone()))?;
        cell.set_tag_ids(tag_ids);
        Ok(())
    }

    // Destructive primitives and their restores

    pub(crate) fn remove_row(&mut self, row_id: &RowId) -> Result<RemovedRow, EngineError> {
        let index = self
            .row_index(row_id)
            .ok_or_else(|| EngineError::RowNotFound(row_id.clone()))?;
        let row = self.rows.remove(index);

        let cell_indices: Vec<usize> = self
            .cells
            .iter()
            .enumerate()
            .filter(|(_, c)| &c.row_id == row_id)
            .map(|(i, _)| i)
            .collect();
        let mut cells = Vec::with_capacity(cell_indices.len());
        for &i in cell_indices.iter().rev() {
            cells.push((i, self.cells.remove(i)));
        }
        cells.reverse();

        let removed_ids: FxHashSet<&CellId> = cells.iter().map(|(_, c)| &c.id).collect();
        let mut tag_refs = Vec::new();
        for tag in &mut self.tags {
            if tag.cell_ids().iter().any(|id| removed_ids.contains(id)) {
                tag_refs.push((tag.id.clone(), tag.cell_ids().to_vec()));
                let kept: Vec<CellId> = tag
                    .cell_ids()
                    .iter()
                    .filter(|id| !removed_ids.contains(*id))
                    .cloned()
                    .collect();
                tag.set_cell_ids(kept);
            }
        }

        Ok(RemovedRow {
            index,
            row,
            cells,
            tag_refs,
        })
    }

    pub(crate) fn restore_row(&mut self, removed: RemovedRow) {
        let RemovedRow {
            index,
            row,
            cells,
            tag_refs,
        } = removed;
        self.rows.insert(index.min(self.rows.len()), row);
        for (i, cell) in cells {
            self.cells.insert(i.min(self.cells.len()), cell);
        }
        for (tag_id, cell_ids) in tag_refs {
            if let Some(tag) = self.tag_mut(&tag_id) {
                tag.set_cell_ids(cell_ids);
            }
        }
    }

    pub(crate) fn remove_column(
        &mut self,
        column_id: &ColumnId,
    ) -> Result<RemovedColumn, EngineError> {
        let index = self
            .column_index(column_id)
            .ok_or_else(|| EngineError::ColumnNotFound(column_id.clone()))?;
        let column = self.columns.remove(index);

        let cell_indices: Vec<usize> = self
            .cells
            .iter()
            .enumerate()
            .filter(|(_, c)| &c.column_id == column_id)
            .map(|(i, _)| i)
            .collect();
        let mut cells = Vec::with_capacity(cell_indices.len());
        for &i in cell_indices.iter().rev() {
            cells.push((i, self.cells.remove(i)));
        }
        cells.reverse();

        let tag_indices: Vec<usize> = self
            .tags
            .iter()
            .enumerate()
            .filter(|(_, t)| &t.column_id == column_id)
            .map(|(i, _)| i)
            .collect();
        let mut tags = Vec::with_capacity(tag_indices.len());
        for &i in tag_indices.iter().rev() {
            tags.push((i, self.tags.remove(i)));
        }
        tags.reverse();

        Ok(RemovedColumn {
            index,
            column,
            cells,
            tags,
        })
    }

    pub(crate) fn restore_column(&mut self, removed: RemovedColumn) {
        let RemovedColumn {
            index,
            column,
            cells,
            tags,
        } = removed;
        self.columns.insert(index.min(self.columns.len()), column);
        for (i, cell) in cells {
            self.cells.insert(i.min(self.cells.len()), cell);
        }
        for (i, tag) in tags {
            self.tags.insert(i.min(self.tags.len()), tag);
        }
    }

    /// Move a column to a new position, returning its previous index.
    pub(crate) fn move_column(
        &mut self,
        column_id: &ColumnId,
        to_index: usize,
    ) -> Result<usize, EngineError> {
        let from = self
            .column_index(column_id)
            .ok_or_else(|| EngineError::ColumnNotFound(column_id.clone()))?;
        let column = self.columns.remove(from);
        self.columns.insert(to_index.min(self.columns.len()), column);
        Ok(from)
    }

    pub(crate) fn remove_tag(
        &mut self,
        column_id: &ColumnId,
        tag_id: &TagId,
    ) -> Result<RemovedTag, EngineError> {
        let tags_index = self
            .tags
            .iter()
            .position(|t| &t.id == tag_id && &t.column_id == column_id)
            .ok_or_else(|| EngineError::TagNotFound(tag_id.clone()))?;
        let column = self
            .column_mut(column_id)
            .ok_or_else(|| EngineError::ColumnNotFound(column_id.clone()))?;
        let list_index = column
            .remove_tag(tag_id)
            .ok_or_else(|| EngineError::TagNotFound(tag_id.clone()))?;
        let tag = self.tags.remove(tags_index);

        let mut prior_cell_tag_ids = Vec::new();
        for cell in &mut self.cells {
            if cell.has_tag(tag_id) {
                prior_cell_tag_ids.push((cell.id.clone(), cell.tag_ids().to_vec()));
                cell.remove_tag(tag_id);
            }
        }

        Ok(RemovedTag {
            tags_index,
            list_index,
            tag,
            prior_cell_tag_ids,
        })
    }

    pub(crate) fn restore_tag(&mut self, removed: RemovedTag) {
        let RemovedTag {
            tags_index,
            list_index,
            tag,
            prior_cell_tag_ids,
        } = removed;
        let column_id = tag.column_id.clone();
        let tag_id = tag.id.clone();
        self.tags.insert(tags_index.min(self.tags.len()), tag);
        if let Some(column) = self.column_mut(&column_id) {
            column.insert_tag(list_index, tag_id);
        }
        for (cell_id, tag_ids) in prior_cell_tag_ids {
            if let Some(cell) = self.cell_mut(&cell_id) {
                cell.set_tag_ids(tag_ids);
            }
        }
    }
}
