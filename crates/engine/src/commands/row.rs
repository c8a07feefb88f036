//! Row commands.

use chrono::Utc;

use crate::command::{require_delta, Command, Sequencer};
use crate::error::EngineError;
use crate::id::RowId;
use crate::model::{RemovedRow, TableModel};

/// Append an empty row (one fresh cell per column).
#[derive(Debug, Default)]
pub struct AddRowCommand {
    seq: Sequencer,
    row_id: Option<RowId>,
    /// Captured on undo so redo restores the same entities (same ids,
    /// same creation time) instead of generating new ones.
    removed: Option<RemovedRow>,
}

impl AddRowCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the created row, available after execute.
    pub fn row_id(&self) -> Option<&RowId> {
        self.row_id.as_ref()
    }
}

impl Command for AddRowCommand {
    fn describe(&self) -> String {
        "add row".to_string()
    }

    fn execute(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_execute()?;
        let mut next = prev.clone();
        self.row_id = Some(next.add_row(Utc::now()));
        Ok(next)
    }

    fn undo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_undo()?;
        let row_id = require_delta(&self.row_id, "undo")?.clone();
        let mut next = prev.clone();
        self.removed = Some(next.remove_row(&row_id)?);
        Ok(next)
    }

    fn redo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_redo()?;
        let removed = require_delta(&self.removed, "redo")?.clone();
        let mut next = prev.clone();
        next.restore_row(removed);
        Ok(next)
    }
}

/// Delete a row and all of its cells, detaching their tag references.
#[derive(Debug)]
pub struct DeleteRowCommand {
    seq: Sequencer,
    row_id: RowId,
    removed: Option<RemovedRow>,
}

impl DeleteRowCommand {
    pub fn new(row_id: RowId) -> Self {
        Self {
            seq: Sequencer::default(),
            row_id,
            removed: None,
        }
    }
}

impl Command for DeleteRowCommand {
    fn describe(&self) -> String {
        "delete row".to_string()
    }

    fn execute(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_execute()?;
        let mut next = prev.clone();
        self.removed = Some(next.remove_row(&self.row_id)?);
        Ok(next)
    }

    fn undo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_undo()?;
        let removed = require_delta(&self.removed, "undo")?.clone();
        let mut next = prev.clone();
        next.restore_row(removed);
        Ok(next)
    }

    fn redo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_redo()?;
        let mut next = prev.clone();
        self.removed = Some(next.remove_row(&self.row_id)?);
        Ok(next)
    }
}
