//! Tag commands.
//!
//! Tag mutations touch both sides of the cell <-> tag relation, so their
//! deltas store the affected entities' full prior reference lists rather
//! than single ids: restoring a whole list is the only way undo reproduces
//! the original list order exactly. Single-select displacement (a cell in a
//! `can_add_multiple = false` column losing its previous tag when a new one
//! is attached) happens inside the owning command's delta, never as a
//! separate step.

use chrono::{DateTime, Utc};

use crate::command::{require_delta, Command, Sequencer};
use crate::error::EngineError;
use crate::id::{CellId, ColumnId, RowId, TagId};
use crate::model::{RemovedTag, TableModel};
use crate::tag::Color;

/// Prior reference lists of tags a single-select attachment displaced.
type DisplacedTags = Vec<(TagId, Vec<CellId>)>;

fn displace_current_tags(
    next: &mut TableModel,
    cell_id: &CellId,
) -> Result<DisplacedTags, EngineError> {
    let current: Vec<TagId> = match next.cell(cell_id) {
        Some(cell) => cell.tag_ids().to_vec(),
        None => return Err(EngineError::CellNotFound(cell_id.clone())),
    };
    let mut displaced = Vec::with_capacity(current.len());
    for tag_id in current {
        let prior = match next.tag(&tag_id) {
            Some(tag) => tag.cell_ids().to_vec(),
            None => return Err(EngineError::TagNotFound(tag_id.clone())),
        };
        next.detach_tag(cell_id, &tag_id)?;
        displaced.push((tag_id, prior));
    }
    Ok(displaced)
}

/// Create a new tag on a cell's column and attach it to the cell.
#[derive(Debug)]
pub struct TagAddCommand {
    seq: Sequencer,
    cell_id: CellId,
    label: String,
    color: Color,
    can_add_multiple: bool,
    row_id: Option<RowId>,
    executed_at: Option<DateTime<Utc>>,
    prev_edited: Option<DateTime<Utc>>,
    tag_id: Option<TagId>,
    prior_cell_tag_ids: Option<Vec<TagId>>,
    displaced: DisplacedTags,
    /// Captured on undo so redo reinserts the same tag entity.
    removed: Option<RemovedTag>,
}

impl TagAddCommand {
    pub fn new(
        cell_id: CellId,
        label: impl Into<String>,
        color: Color,
        can_add_multiple: bool,
    ) -> Self {
        Self {
            seq: Sequencer::default(),
            cell_id,
            label: label.into(),
            color,
            can_add_multiple,
            row_id: None,
            executed_at: None,
            prev_edited: None,
            tag_id: None,
            prior_cell_tag_ids: None,
            displaced: Vec::new(),
            removed: None,
        }
    }

    /// Id of the created tag, available after execute.
    pub fn tag_id(&self) -> Option<&TagId> {
        self.tag_id.as_ref()
    }
}

impl Command for TagAddCommand {
    fn describe(&self) -> String {
        "add tag".to_string()
    }

    fn execute(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_execute()?;
        let mut next = prev.clone();

        let cell = next
            .cell(&self.cell_id)
            .ok_or_else(|| EngineError::CellNotFound(self.cell_id.clone()))?;
        let column_id = cell.column_id.clone();
        let row_id = cell.row_id.clone();
        self.prior_cell_tag_ids = Some(cell.tag_ids().to_vec());

        if !self.can_add_multiple {
            self.displaced = displace_current_tags(&mut next, &self.cell_id)?;
        }

        let tag_id = next.create_tag(&column_id, &self.label, self.color)?;
        next.attach_tag(&self.cell_id, &tag_id)?;
        self.tag_id = Some(tag_id);

        let now = Utc::now();
        self.prev_edited = Some(next.touch_row(&row_id, now)?);
        self.executed_at = Some(now);
        self.row_id = Some(row_id);
        Ok(next)
    }

    fn undo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_undo()?;
        let tag_id = require_delta(&self.tag_id, "undo")?.clone();
        let row_id = require_delta(&self.row_id, "undo")?.clone();
        let prev_edited = *require_delta(&self.prev_edited, "undo")?;
        let prior_tags = require_delta(&self.prior_cell_tag_ids, "undo")?.clone();

        let mut next = prev.clone();
        let column_id = next
            .tag(&tag_id)
            .map(|t| t.column_id.clone())
            .ok_or_else(|| EngineError::TagNotFound(tag_id.clone()))?;
        self.removed = Some(next.remove_tag(&column_id, &tag_id)?);

        next.set_cell_tag_ids(&self.cell_id, prior_tags)?;
        for (displaced_id, cell_ids) in &self.displaced {
            match next.tag_mut(displaced_id) {
                Some(tag) => tag.set_cell_ids(cell_ids.clone()),
                None => return Err(EngineError::TagNotFound(displaced_id.clone())),
            }
        }
        next.set_row_edited(&row_id, prev_edited)?;
        Ok(next)
    }

    fn redo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_redo()?;
        let removed = require_delta(&self.removed, "redo")?.clone();
        let row_id = require_delta(&self.row_id, "redo")?.clone();
        let executed_at = *require_delta(&self.executed_at, "redo")?;

        let mut next = prev.clone();
        for (displaced_id, _) in &self.displaced {
            next.detach_tag(&self.cell_id, displaced_id)?;
        }
        next.restore_tag(removed);
        next.set_row_edited(&row_id, executed_at)?;
        Ok(next)
    }
}

/// Attach an existing tag to a cell.
#[derive(Debug)]
pub struct TagAddToCellCommand {
    seq: Sequencer,
    cell_id: CellId,
    tag_id: TagId,
    can_add_multiple: bool,
    row_id: Option<RowId>,
    executed_at: Option<DateTime<Utc>>,
    prev_edited: Option<DateTime<Utc>>,
    already_attached: bool,
    prior_cell_tag_ids: Option<Vec<TagId>>,
    prior_tag_cell_ids: Option<Vec<CellId>>,
    displaced: DisplacedTags,
}

impl TagAddToCellCommand {
    pub fn new(cell_id: CellId, tag_id: TagId, can_add_multiple: bool) -> Self {
        Self {
            seq: Sequencer::default(),
            cell_id,
            tag_id,
            can_add_multiple,
            row_id: None,
            executed_at: None,
            prev_edited: None,
            already_attached: false,
            prior_cell_tag_ids: None,
            prior_tag_cell_ids: None,
            displaced: Vec::new(),
        }
    }
}

impl Command for TagAddToCellCommand {
    fn describe(&self) -> String {
        "select tag".to_string()
    }

    fn execute(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_execute()?;

        let cell = prev
            .cell(&self.cell_id)
            .ok_or_else(|| EngineError::CellNotFound(self.cell_id.clone()))?;
        let tag = prev
            .tag(&self.tag_id)
            .ok_or_else(|| EngineError::TagNotFound(self.tag_id.clone()))?;
        if tag.column_id != cell.column_id {
            return Err(EngineError::TagNotFound(self.tag_id.clone()));
        }

        // Selecting a tag the cell already holds changes nothing, and undo
        // must change nothing back.
        if cell.has_tag(&self.tag_id) {
            self.already_attached = true;
            return Ok(prev.clone());
        }

        let row_id = cell.row_id.clone();
        self.prior_cell_tag_ids = Some(cell.tag_ids().to_vec());
        self.prior_tag_cell_ids = Some(tag.cell_ids().to_vec());

        let mut next = prev.clone();
        if !self.can_add_multiple {
            self.displaced = displace_current_tags(&mut next, &self.cell_id)?;
        }
        next.attach_tag(&self.cell_id, &self.tag_id)?;

        let now = Utc::now();
        self.prev_edited = Some(next.touch_row(&row_id, now)?);
        self.executed_at = Some(now);
        self.row_id = Some(row_id);
        Ok(next)
    }

    fn undo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_undo()?;
        if self.already_attached {
            return Ok(prev.clone());
        }
        let row_id = require_delta(&self.row_id, "undo")?.clone();
        let prev_edited = *require_delta(&self.prev_edited, "undo")?;
        let prior_tags = require_delta(&self.prior_cell_tag_ids, "undo")?.clone();
        let prior_cells = require_delta(&self.prior_tag_cell_ids, "undo")?.clone();

        let mut next = prev.clone();
        next.set_cell_tag_ids(&self.cell_id, prior_tags)?;
        match next.tag_mut(&self.tag_id) {
            Some(tag) => tag.set_cell_ids(prior_cells),
            None => return Err(EngineError::TagNotFound(self.tag_id.clone())),
        }
        for (displaced_id, cell_ids) in &self.displaced {
            match next.tag_mut(displaced_id) {
                Some(tag) => tag.set_cell_ids(cell_ids.clone()),
                None => return Err(EngineError::TagNotFound(displaced_id.clone())),
            }
        }
        next.set_row_edited(&row_id, prev_edited)?;
        Ok(next)
    }

    fn redo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_redo()?;
        if self.already_attached {
            return Ok(prev.clone());
        }
        let row_id = require_delta(&self.row_id, "redo")?.clone();
        let executed_at = *require_delta(&self.executed_at, "redo")?;

        let mut next = prev.clone();
        for (displaced_id, _) in &self.displaced {
            next.detach_tag(&self.cell_id, displaced_id)?;
        }
        next.attach_tag(&self.cell_id, &self.tag_id)?;
        next.set_row_edited(&row_id, executed_at)?;
        Ok(next)
    }
}

/// Detach a tag from a cell.
#[derive(Debug)]
pub struct TagRemoveFromCellCommand {
    seq: Sequencer,
    cell_id: CellId,
    tag_id: TagId,
    row_id: Option<RowId>,
    executed_at: Option<DateTime<Utc>>,
    prev_edited: Option<DateTime<Utc>>,
    prior_cell_tag_ids: Option<Vec<TagId>>,
    prior_tag_cell_ids: Option<Vec<CellId>>,
}

impl TagRemoveFromCellCommand {
    pub fn new(cell_id: CellId, tag_id: TagId) -> Self {
        Self {
            seq: Sequencer::default(),
            cell_id,
            tag_id,
            row_id: None,
            executed_at: None,
            prev_edited: None,
            prior_cell_tag_ids: None,
            prior_tag_cell_ids: None,
        }
    }
}

impl Command for TagRemoveFromCellCommand {
    fn describe(&self) -> String {
        "deselect tag".to_string()
    }

    fn execute(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_execute()?;

        let cell = prev
            .cell(&self.cell_id)
            .ok_or_else(|| EngineError::CellNotFound(self.cell_id.clone()))?;
        let tag = prev
            .tag(&self.tag_id)
            .ok_or_else(|| EngineError::TagNotFound(self.tag_id.clone()))?;
        let row_id = cell.row_id.clone();
        self.prior_cell_tag_ids = Some(cell.tag_ids().to_vec());
        self.prior_tag_cell_ids = Some(tag.cell_ids().to_vec());

        let mut next = prev.clone();
        next.detach_tag(&self.cell_id, &self.tag_id)?;

        let now = Utc::now();
        self.prev_edited = Some(next.touch_row(&row_id, now)?);
        self.executed_at = Some(now);
        self.row_id = Some(row_id);
        Ok(next)
    }

    fn undo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_undo()?;
        let row_id = require_delta(&self.row_id, "undo")?.clone();
        let prev_edited = *require_delta(&self.prev_edited, "undo")?;
        let prior_tags = require_delta(&self.prior_cell_tag_ids, "undo")?.clone();
        let prior_cells = require_delta(&self.prior_tag_cell_ids, "undo")?.clone();

        let mut next = prev.clone();
        next.set_cell_tag_ids(&self.cell_id, prior_tags)?;
        match next.tag_mut(&self.tag_id) {
            Some(tag) => tag.set_cell_ids(prior_cells),
            None => return Err(EngineError::TagNotFound(self.tag_id.clone())),
        }
        next.set_row_edited(&row_id, prev_edited)?;
        Ok(next)
    }

    fn redo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_redo()?;
        let row_id = require_delta(&self.row_id, "redo")?.clone();
        let executed_at = *require_delta(&self.executed_at, "redo")?;

        let mut next = prev.clone();
        next.detach_tag(&self.cell_id, &self.tag_id)?;
        next.set_row_edited(&row_id, executed_at)?;
        Ok(next)
    }
}

/// Delete a tag from its column, detaching it from every cell.
#[derive(Debug)]
pub struct TagDeleteCommand {
    seq: Sequencer,
    column_id: ColumnId,
    tag_id: TagId,
    removed: Option<RemovedTag>,
}

impl TagDeleteCommand {
    pub fn new(column_id: ColumnId, tag_id: TagId) -> Self {
        Self {
            seq: Sequencer::default(),
            column_id,
            tag_id,
            removed: None,
        }
    }
}

impl Command for TagDeleteCommand {
    fn describe(&self) -> String {
        "delete tag".to_string()
    }

    fn execute(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_execute()?;
        let mut next = prev.clone();
        self.removed = Some(next.remove_tag(&self.column_id, &self.tag_id)?);
        Ok(next)
    }

    fn undo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_undo()?;
        let removed = require_delta(&self.removed, "undo")?.clone();
        let mut next = prev.clone();
        next.restore_tag(removed);
        Ok(next)
    }

    fn redo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_redo()?;
        let mut next = prev.clone();
        self.removed = Some(next.remove_tag(&self.column_id, &self.tag_id)?);
        Ok(next)
    }
}

/// Recolor a tag.
#[derive(Debug)]
pub struct TagColorChangeCommand {
    seq: Sequencer,
    tag_id: TagId,
    color: Color,
    prev: Option<Color>,
}

impl TagColorChangeCommand {
    pub fn new(tag_id: TagId, color: Color) -> Self {
        Self {
            seq: Sequencer::default(),
            tag_id,
            color,
            prev: None,
        }
    }
}

impl Command for TagColorChangeCommand {
    fn describe(&self) -> String {
        "change tag color".to_string()
    }

    fn execute(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_execute()?;
        let mut next = prev.clone();
        match next.tag_mut(&self.tag_id) {
            Some(tag) => {
                self.prev = Some(tag.color);
                tag.color = self.color;
            }
            None => return Err(EngineError::TagNotFound(self.tag_id.clone())),
        }
        Ok(next)
    }

    fn undo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_undo()?;
        let previous = *require_delta(&self.prev, "undo")?;
        let mut next = prev.clone();
        match next.tag_mut(&self.tag_id) {
            Some(tag) => tag.color = previous,
            None => return Err(EngineError::TagNotFound(self.tag_id.clone())),
        }
        Ok(next)
    }

    fn redo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_redo()?;
        let mut next = prev.clone();
        match next.tag_mut(&self.tag_id) {
            Some(tag) => tag.color = self.color,
            None => return Err(EngineError::TagNotFound(self.tag_id.clone())),
        }
        Ok(next)
    }
}
