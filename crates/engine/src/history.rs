//! Linear undo/redo history over the live table model.
//!
//! A single stack of executed commands with a cursor. Submitting after one
//! or more undos discards the forward portion — linear semantics, not a
//! branching history. Undo/redo at a stack boundary is a no-op reported as
//! `Ok(None)`, never an error.

use crate::command::Command;
use crate::error::EngineError;
use crate::model::TableModel;
use crate::validate;

/// Retained command limit. The oldest entry is dropped past this point and
/// is no longer undoable.
pub const MAX_HISTORY_ENTRIES: usize = 100;

pub struct CommandHistory {
    commands: Vec<Box<dyn Command>>,
    /// Number of commands currently applied; everything past it is the
    /// redo tail.
    cursor: usize,
    current: TableModel,
    max_entries: usize,
}

impl CommandHistory {
    pub fn new(model: TableModel) -> Self {
        Self {
            commands: Vec::new(),
            cursor: 0,
            current: model,
            max_entries: MAX_HISTORY_ENTRIES,
        }
    }

    pub fn model(&self) -> &TableModel {
        &self.current
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.commands.len()
    }

    /// Description of the command `undo` would reverse next.
    pub fn undo_description(&self) -> Option<String> {
        self.cursor
            .checked_sub(1)
            .and_then(|i| self.commands.get(i))
            .map(|c| c.describe())
    }

    /// Description of the command `redo` would re-apply next.
    pub fn redo_description(&self) -> Option<String> {
        self.commands.get(self.cursor).map(|c| c.describe())
    }

    /// Execute a command against the current model and append it to the
    /// history, discarding any redo tail. The new model is validated
    /// before it becomes current; a violation means the command's delta
    /// logic is defective and surfaces as `EngineError::Consistency`.
    pub fn submit(&mut self, mut command: Box<dyn Command>) -> Result<&TableModel, EngineError> {
        let next = command.execute(&self.current)?;
        validate::assert_consistent(&next)?;

        self.commands.truncate(self.cursor);
        self.commands.push(command);
        if self.commands.len() > self.max_entries {
            self.commands.remove(0);
        }
        self.cursor = self.commands.len();
        self.current = next;
        Ok(&self.current)
    }

    /// Reverse the most recent applied command. `Ok(None)` when there is
    /// nothing to undo.
    pub fn undo(&mut self) -> Result<Option<&TableModel>, EngineError> {
        if self.cursor == 0 {
            return Ok(None);
        }
        let next = self.commands[self.cursor - 1].undo(&self.current)?;
        self.cursor -= 1;
        self.current = next;
        Ok(Some(&self.current))
    }

    /// Re-apply the most recently undone command. `Ok(None)` when there is
    /// nothing to redo.
    pub fn redo(&mut self) -> Result<Option<&TableModel>, EngineError> {
        if self.cursor == self.commands.len() {
            return Ok(None);
        }
        let next = self.commands[self.cursor].redo(&self.current)?;
        self.cursor += 1;
        self.current = next;
        Ok(Some(&self.current))
    }
}
