//! Column commands: add/insert/delete/move, header edits, display settings.

use crate::column::{ColumnType, SortDir};
use crate::command::{require_delta, Command, Sequencer};
use crate::error::EngineError;
use crate::id::ColumnId;
use crate::model::{RemovedColumn, TableModel};

/// Append a text column (one fresh cell per row).
#[derive(Debug, Default)]
pub struct AddColumnCommand {
    seq: Sequencer,
    column_id: Option<ColumnId>,
    removed: Option<RemovedColumn>,
}

impl AddColumnCommand {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id of the created column, available after execute.
    pub fn column_id(&self) -> Option<&ColumnId> {
        self.column_id.as_ref()
    }
}

impl Command for AddColumnCommand {
    fn describe(&self) -> String {
        "add column".to_string()
    }

    fn execute(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_execute()?;
        let mut next = prev.clone();
        self.column_id = Some(next.add_column(ColumnType::Text));
        Ok(next)
    }

    fn undo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_undo()?;
        let column_id = require_delta(&self.column_id, "undo")?.clone();
        let mut next = prev.clone();
        self.removed = Some(next.remove_column(&column_id)?);
        Ok(next)
    }

    fn redo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_redo()?;
        let removed = require_delta(&self.removed, "redo")?.clone();
        let mut next = prev.clone();
        next.restore_column(removed);
        Ok(next)
    }
}

/// Insert a text column at a position in the visual order.
#[derive(Debug)]
pub struct InsertColumnCommand {
    seq: Sequencer,
    index: usize,
    column_id: Option<ColumnId>,
    removed: Option<RemovedColumn>,
}

impl InsertColumnCommand {
    pub fn new(index: usize) -> Self {
        Self {
            seq: Sequencer::default(),
            index,
            column_id: None,
            removed: None,
        }
    }

    pub fn column_id(&self) -> Option<&ColumnId> {
        self.column_id.as_ref()
    }
}

impl Command for InsertColumnCommand {
    fn describe(&self) -> String {
        "insert column".to_string()
    }

    fn execute(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_execute()?;
        let mut next = prev.clone();
        self.column_id = Some(next.insert_column_at(self.index, ColumnType::Text));
        Ok(next)
    }

    fn undo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_undo()?;
        let column_id = require_delta(&self.column_id, "undo")?.clone();
        let mut next = prev.clone();
        self.removed = Some(next.remove_column(&column_id)?);
        Ok(next)
    }

    fn redo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_redo()?;
        let removed = require_delta(&self.removed, "redo")?.clone();
        let mut next = prev.clone();
        next.restore_column(removed);
        Ok(next)
    }
}

/// Delete a column with its cells and every tag it owns.
#[derive(Debug)]
pub struct DeleteColumnCommand {
    seq: Sequencer,
    column_id: ColumnId,
    removed: Option<RemovedColumn>,
}

impl DeleteColumnCommand {
    pub fn new(column_id: ColumnId) -> Self {
        Self {
            seq: Sequencer::default(),
            column_id,
            removed: None,
        }
    }
}

impl Command for DeleteColumnCommand {
    fn describe(&self) -> String {
        "delete column".to_string()
    }

    fn execute(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_execute()?;
        let mut next = prev.clone();
        self.removed = Some(next.remove_column(&self.column_id)?);
        Ok(next)
    }

    fn undo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_undo()?;
        let removed = require_delta(&self.removed, "undo")?.clone();
        let mut next = prev.clone();
        next.restore_column(removed);
        Ok(next)
    }

    fn redo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_redo()?;
        let mut next = prev.clone();
        self.removed = Some(next.remove_column(&self.column_id)?);
        Ok(next)
    }
}

/// Move a column to a new position in the visual order.
#[derive(Debug)]
pub struct MoveColumnCommand {
    seq: Sequencer,
    column_id: ColumnId,
    to_index: usize,
    from_index: Option<usize>,
}

impl MoveColumnCommand {
    pub fn new(column_id: ColumnId, to_index: usize) -> Self {
        Self {
            seq: Sequencer::default(),
            column_id,
            to_index,
            from_index: None,
        }
    }
}

impl Command for MoveColumnCommand {
    fn describe(&self) -> String {
        "move column".to_string()
    }

    fn execute(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_execute()?;
        let mut next = prev.clone();
        self.from_index = Some(next.move_column(&self.column_id, self.to_index)?);
        Ok(next)
    }

    fn undo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_undo()?;
        let from = *require_delta(&self.from_index, "undo")?;
        let mut next = prev.clone();
        next.move_column(&self.column_id, from)?;
        Ok(next)
    }

    fn redo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_redo()?;
        let mut next = prev.clone();
        next.move_column(&self.column_id, self.to_index)?;
        Ok(next)
    }
}

/// Rename a column header.
#[derive(Debug)]
pub struct HeaderContentChangeCommand {
    seq: Sequencer,
    column_id: ColumnId,
    content: String,
    prev: Option<String>,
}

impl HeaderContentChangeCommand {
    pub fn new(column_id: ColumnId, content: impl Into<String>) -> Self {
        Self {
            seq: Sequencer::default(),
            column_id,
            content: content.into(),
            prev: None,
        }
    }
}

impl Command for HeaderContentChangeCommand {
    fn describe(&self) -> String {
        "rename column".to_string()
    }

    fn execute(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_execute()?;
        let mut next = prev.clone();
        let column = next
            .column(&self.column_id)
            .ok_or_else(|| EngineError::ColumnNotFound(self.column_id.clone()))?;
        self.prev = Some(column.header_source().to_string());
        next.set_header(&self.column_id, &self.content)?;
        Ok(next)
    }

    fn undo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_undo()?;
        let previous = require_delta(&self.prev, "undo")?.clone();
        let mut next = prev.clone();
        next.set_header(&self.column_id, &previous)?;
        Ok(next)
    }

    fn redo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_redo()?;
        let mut next = prev.clone();
        next.set_header(&self.column_id, &self.content)?;
        Ok(next)
    }
}

/// Change a column's display type.
#[derive(Debug)]
pub struct HeaderTypeChangeCommand {
    seq: Sequencer,
    column_id: ColumnId,
    column_type: ColumnType,
    prev: Option<ColumnType>,
}

impl HeaderTypeChangeCommand {
    pub fn new(column_id: ColumnId, column_type: ColumnType) -> Self {
        Self {
            seq: Sequencer::default(),
            column_id,
            column_type,
            prev: None,
        }
    }
}

impl Command for HeaderTypeChangeCommand {
    fn describe(&self) -> String {
        "change column type".to_string()
    }

    fn execute(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_execute()?;
        let mut next = prev.clone();
        self.prev = Some(next.set_column_type(&self.column_id, self.column_type)?);
        Ok(next)
    }

    fn undo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_undo()?;
        let previous = *require_delta(&self.prev, "undo")?;
        let mut next = prev.clone();
        next.set_column_type(&self.column_id, previous)?;
        Ok(next)
    }

    fn redo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_redo()?;
        let mut next = prev.clone();
        next.set_column_type(&self.column_id, self.column_type)?;
        Ok(next)
    }
}

/// One per-column display setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSetting {
    Width(u32),
    Wrap(bool),
    AutoWidth(bool),
    Sort(SortDir),
}

/// Change one display setting on a column, storing only the replaced
/// scalar. Setting a sort direction clears every other column's direction
/// in the same delta (one sorted column at a time).
#[derive(Debug)]
pub struct ColumnSettingChangeCommand {
    seq: Sequencer,
    column_id: ColumnId,
    setting: ColumnSetting,
    prev: Option<ColumnSetting>,
    /// Other columns whose sort direction a Sort change cleared.
    cleared_sorts: Vec<(ColumnId, SortDir)>,
}

impl ColumnSettingChangeCommand {
    pub fn new(column_id: ColumnId, setting: ColumnSetting) -> Self {
        Self {
            seq: Sequencer::default(),
            column_id,
            setting,
            prev: None,
            cleared_sorts: Vec::new(),
        }
    }
}

fn apply_setting(
    next: &mut TableModel,
    column_id: &ColumnId,
    setting: ColumnSetting,
) -> Result<ColumnSetting, EngineError> {
    let column = next
        .column_mut(column_id)
        .ok_or_else(|| EngineError::ColumnNotFound(column_id.clone()))?;
    let prev = match setting {
        ColumnSetting::Width(width) => {
            let prev = ColumnSetting::Width(column.width);
            column.width = width;
            prev
        }
        ColumnSetting::Wrap(wrap) => {
            let prev = ColumnSetting::Wrap(column.wrap_overflow);
            column.wrap_overflow = wrap;
            prev
        }
        ColumnSetting::AutoWidth(auto) => {
            let prev = ColumnSetting::AutoWidth(column.auto_width);
            column.auto_width = auto;
            prev
        }
        ColumnSetting::Sort(dir) => {
            let prev = ColumnSetting::Sort(column.sort_dir);
            column.sort_dir = dir;
            prev
        }
    };
    Ok(prev)
}

fn clear_other_sorts(next: &mut TableModel, column_id: &ColumnId) -> Vec<(ColumnId, SortDir)> {
    let others: Vec<ColumnId> = next
        .columns()
        .iter()
        .filter(|c| &c.id != column_id && c.sort_dir != SortDir::None)
        .map(|c| c.id.clone())
        .collect();
    let mut cleared = Vec::with_capacity(others.len());
    for id in others {
        if let Some(column) = next.column_mut(&id) {
            cleared.push((id.clone(), column.sort_dir));
            column.sort_dir = SortDir::None;
        }
    }
    cleared
}

impl Command for ColumnSettingChangeCommand {
    fn describe(&self) -> String {
        match self.setting {
            ColumnSetting::Width(_) => "change column width".to_string(),
            ColumnSetting::Wrap(_) => "change column wrapping".to_string(),
            ColumnSetting::AutoWidth(_) => "change column auto-width".to_string(),
            ColumnSetting::Sort(_) => "sort column".to_string(),
        }
    }

    fn execute(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_execute()?;
        let mut next = prev.clone();
        self.prev = Some(apply_setting(&mut next, &self.column_id, self.setting)?);
        if matches!(self.setting, ColumnSetting::Sort(_)) {
            self.cleared_sorts = clear_other_sorts(&mut next, &self.column_id);
        }
        Ok(next)
    }

    fn undo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_undo()?;
        let previous = *require_delta(&self.prev, "undo")?;
        let mut next = prev.clone();
        apply_setting(&mut next, &self.column_id, previous)?;
        for (id, dir) in &self.cleared_sorts {
            if let Some(column) = next.column_mut(id) {
                column.sort_dir = *dir;
            }
        }
        Ok(next)
    }

    fn redo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_redo()?;
        let mut next = prev.clone();
        apply_setting(&mut next, &self.column_id, self.setting)?;
        if matches!(self.setting, ColumnSetting::Sort(_)) {
            clear_other_sorts(&mut next, &self.column_id);
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn model_with_rows() -> TableModel {
        let mut model = TableModel::new();
        model.add_column(ColumnType::Text);
        model.add_column(ColumnType::Number);
        model.add_row(Utc::now());
        model
    }

    #[test]
    fn test_add_column_execute_undo_redo() {
        let s0 = model_with_rows();
        let mut cmd = AddColumnCommand::new();

        let s1 = cmd.execute(&s0).unwrap();
        assert_eq!(s1.columns().len(), 3);
        assert_eq!(s1.cells().len(), 3);

        let s2 = cmd.undo(&s1).unwrap();
        assert_eq!(s2, s0);
        assert_eq!(cmd.redo(&s2).unwrap(), s1);
    }

    #[test]
    fn test_insert_column_at_front() {
        let s0 = model_with_rows();
        let mut cmd = InsertColumnCommand::new(0);
        let s1 = cmd.execute(&s0).unwrap();
        assert_eq!(&s1.columns()[0].id, cmd.column_id().unwrap());
        assert_eq!(cmd.undo(&s1).unwrap(), s0);
    }

    #[test]
    fn test_add_then_delete_then_undo_twice_restores_original_ids() {
        let s0 = model_with_rows();

        let mut add = AddColumnCommand::new();
        let s1 = add.execute(&s0).unwrap();
        let new_id = add.column_id().unwrap().clone();

        let mut del = DeleteColumnCommand::new(new_id);
        let s2 = del.execute(&s1).unwrap();

        let s3 = del.undo(&s2).unwrap();
        assert_eq!(s3, s1);
        let s4 = add.undo(&s3).unwrap();
        assert_eq!(s4, s0);
    }

    #[test]
    fn test_move_column_undo_restores_order() {
        let s0 = model_with_rows();
        let first = s0.columns()[0].id.clone();

        let mut cmd = MoveColumnCommand::new(first.clone(), 1);
        let s1 = cmd.execute(&s0).unwrap();
        assert_eq!(s1.columns()[1].id, first);
        assert_eq!(cmd.undo(&s1).unwrap(), s0);
    }

    #[test]
    fn test_header_rename_round_trip() {
        let s0 = model_with_rows();
        let col = s0.columns()[0].id.clone();

        let mut cmd = HeaderContentChangeCommand::new(col.clone(), "Name");
        let s1 = cmd.execute(&s0).unwrap();
        assert_eq!(s1.column(&col).unwrap().header_rendered(), "Name");
        assert_eq!(cmd.undo(&s1).unwrap(), s0);
        assert_eq!(cmd.redo(&s0).unwrap(), s1);
    }

    #[test]
    fn test_type_change_stores_prior_type() {
        let s0 = model_with_rows();
        let col = s0.columns()[1].id.clone();

        let mut cmd = HeaderTypeChangeCommand::new(col.clone(), ColumnType::Checkbox);
        let s1 = cmd.execute(&s0).unwrap();
        assert_eq!(s1.column(&col).unwrap().column_type, ColumnType::Checkbox);
        let s2 = cmd.undo(&s1).unwrap();
        assert_eq!(s2.column(&col).unwrap().column_type, ColumnType::Number);
        assert_eq!(s2, s0);
    }

    #[test]
    fn test_width_change_round_trip() {
        let s0 = model_with_rows();
        let col = s0.columns()[0].id.clone();

        let mut cmd = ColumnSettingChangeCommand::new(col.clone(), ColumnSetting::Width(250));
        let s1 = cmd.execute(&s0).unwrap();
        assert_eq!(s1.column(&col).unwrap().width, 250);
        assert_eq!(cmd.undo(&s1).unwrap(), s0);
    }

    #[test]
    fn test_sort_clears_other_columns() {
        let s0 = model_with_rows();
        let first = s0.columns()[0].id.clone();
        let second = s0.columns()[1].id.clone();

        let mut sort_first =
            ColumnSettingChangeCommand::new(first.clone(), ColumnSetting::Sort(SortDir::Asc));
        let s1 = sort_first.execute(&s0).unwrap();

        let mut sort_second =
            ColumnSettingChangeCommand::new(second.clone(), ColumnSetting::Sort(SortDir::Desc));
        let s2 = sort_second.execute(&s1).unwrap();
        assert_eq!(s2.column(&first).unwrap().sort_dir, SortDir::None);
        assert_eq!(s2.column(&second).unwrap().sort_dir, SortDir::Desc);

        // undo restores the first column's direction in the same step
        let s3 = sort_second.undo(&s2).unwrap();
        assert_eq!(s3, s1);
        assert_eq!(sort_second.redo(&s3).unwrap(), s2);
    }

    #[test]
    fn test_delete_missing_column_fails() {
        let s0 = model_with_rows();
        let mut cmd = DeleteColumnCommand::new(ColumnId::generate());
        assert!(matches!(
            cmd.execute(&s0),
            Err(EngineError::ColumnNotFound(_))
        ));
    }
}
