//! Cell content command.

use chrono::{DateTime, Utc};

use crate::command::{require_delta, Command, Sequencer};
use crate::error::EngineError;
use crate::id::{CellId, RowId};
use crate::model::TableModel;

/// Replace a cell's source content.
///
/// Also refreshes the owning row's last-edited time; the prior time is part
/// of the delta and undo restores it along with the prior content.
#[derive(Debug)]
pub struct CellContentChangeCommand {
    seq: Sequencer,
    cell_id: CellId,
    content: String,
    row_id: Option<RowId>,
    prev_content: Option<String>,
    prev_edited: Option<DateTime<Utc>>,
    executed_at: Option<DateTime<Utc>>,
}

impl CellContentChangeCommand {
    pub fn new(cell_id: CellId, content: impl Into<String>) -> Self {
        Self {
            seq: Sequencer::default(),
            cell_id,
            content: content.into(),
            row_id: None,
            prev_content: None,
            prev_edited: None,
            executed_at: None,
        }
    }
}

impl Command for CellContentChangeCommand {
    fn describe(&self) -> String {
        "edit cell".to_string()
    }

    fn execute(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_execute()?;

        let cell = prev
            .cell(&self.cell_id)
            .ok_or_else(|| EngineError::CellNotFound(self.cell_id.clone()))?;
        let row_id = cell.row_id.clone();
        self.prev_content = Some(cell.source().to_string());

        let mut next = prev.clone();
        next.set_cell_content(&self.cell_id, &self.content)?;

        let now = Utc::now();
        self.prev_edited = Some(next.touch_row(&row_id, now)?);
        self.executed_at = Some(now);
        self.row_id = Some(row_id);
        Ok(next)
    }

    fn undo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_undo()?;
        let row_id = require_delta(&self.row_id, "undo")?.clone();
        let prev_content = require_delta(&self.prev_content, "undo")?.clone();
        let prev_edited = *require_delta(&self.prev_edited, "undo")?;

        let mut next = prev.clone();
        next.set_cell_content(&self.cell_id, &prev_content)?;
        next.set_row_edited(&row_id, prev_edited)?;
        Ok(next)
    }

    fn redo(&mut self, prev: &TableModel) -> Result<TableModel, EngineError> {
        self.seq.begin_redo()?;
        let row_id = require_delta(&self.row_id, "redo")?.clone();
        let executed_at = *require_delta(&self.executed_at, "redo")?;

        let mut next = prev.clone();
        next.set_cell_content(&self.cell_id, &self.content)?;
        next.set_row_edited(&row_id, executed_at)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnType;

    fn one_cell_model() -> (TableModel, CellId, RowId) {
        let mut model = TableModel::new();
        let col = model.add_column(ColumnType::Text);
        let row = model.add_row(Utc::now());
        let cell = model.cell_at(&row, &col).unwrap().id.clone();
        (model, cell, row)
    }

    #[test]
    fn test_execute_undo_redo_round_trip() {
        let (mut s0, cell, _) = one_cell_model();
        s0.set_cell_content(&cell, "before").unwrap();

        let mut cmd = CellContentChangeCommand::new(cell.clone(), "after");
        let s1 = cmd.execute(&s0).unwrap();
        assert_eq!(s1.cell(&cell).unwrap().source(), "after");

        let s2 = cmd.undo(&s1).unwrap();
        assert_eq!(s2, s0);

        // redo reproduces the executed state exactly, timestamps included
        let s3 = cmd.redo(&s2).unwrap();
        assert_eq!(s3, s1);
    }

    #[test]
    fn test_updates_row_edited_time() {
        let (s0, cell, row) = one_cell_model();
        let before = s0.row(&row).unwrap().edited_at;

        let mut cmd = CellContentChangeCommand::new(cell, "x");
        let s1 = cmd.execute(&s0).unwrap();
        assert!(s1.row(&row).unwrap().edited_at >= before);

        let s2 = cmd.undo(&s1).unwrap();
        assert_eq!(s2.row(&row).unwrap().edited_at, before);
    }

    #[test]
    fn test_stale_cell_id_fails() {
        let (s0, _, _) = one_cell_model();
        let mut cmd = CellContentChangeCommand::new(CellId::generate(), "x");
        assert!(matches!(
            cmd.execute(&s0),
            Err(EngineError::CellNotFound(_))
        ));
    }
}
