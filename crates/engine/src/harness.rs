//! Test harness for command sequences.
//!
//! `EngineHarness` drives a `CommandHistory` through a scripted operation
//! sequence, recording every intermediate model version. It can then unwind
//! the whole history, asserting each undo reproduces the recorded prior
//! version exactly (deep equality, ids and timestamps included), and replay
//! it forward again asserting each redo reproduces the executed version.
//! The invariant validator runs at every step.

use crate::column::{ColumnType, SortDir};
use crate::command::Command;
use crate::commands::{
    AddColumnCommand, AddRowCommand, CellContentChangeCommand, ColumnSetting,
    ColumnSettingChangeCommand, DeleteColumnCommand, DeleteRowCommand, HeaderContentChangeCommand,
    HeaderTypeChangeCommand, MoveColumnCommand, TagAddCommand,
};
use crate::history::CommandHistory;
use crate::model::TableModel;
use crate::tag::Color;
use crate::validate;

/// One scripted operation, addressed by row/column position.
#[derive(Debug, Clone)]
pub enum Op {
    AddRow,
    AddColumn,
    DeleteRow(usize),
    DeleteColumn(usize),
    MoveColumn { from: usize, to: usize },
    SetCell { row: usize, col: usize, content: &'static str },
    RenameHeader { col: usize, content: &'static str },
    Retype { col: usize, column_type: ColumnType },
    SetSort { col: usize, dir: SortDir },
    AddTag { row: usize, col: usize, label: &'static str, multiple: bool },
}

pub struct EngineHarness {
    history: CommandHistory,
    /// `versions[i]` is the model after `i` applied operations.
    versions: Vec<TableModel>,
}

impl EngineHarness {
    pub fn new(model: TableModel) -> Self {
        Self {
            versions: vec![model.clone()],
            history: CommandHistory::new(model),
        }
    }

    pub fn model(&self) -> &TableModel {
        self.history.model()
    }

    pub fn run(&mut self, script: &[Op]) {
        for op in script {
            self.apply(op);
        }
    }

    pub fn apply(&mut self, op: &Op) {
        let command = self.build(op);
        self.history.submit(command).unwrap();
        self.versions.push(self.history.model().clone());
    }

    fn build(&self, op: &Op) -> Box<dyn Command> {
        let model = self.history.model();
        match *op {
            Op::AddRow => Box::new(AddRowCommand::new()),
            Op::AddColumn => Box::new(AddColumnCommand::new()),
            Op::DeleteRow(index) => {
                Box::new(DeleteRowCommand::new(model.rows()[index].id.clone()))
            }
            Op::DeleteColumn(index) => {
                Box::new(DeleteColumnCommand::new(model.columns()[index].id.clone()))
            }
            Op::MoveColumn { from, to } => Box::new(MoveColumnCommand::new(
                model.columns()[from].id.clone(),
                to,
            )),
            Op::SetCell { row, col, content } => {
                let cell = model
                    .cell_at(&model.rows()[row].id, &model.columns()[col].id)
                    .unwrap()
                    .id
                    .clone();
                Box::new(CellContentChangeCommand::new(cell, content))
            }
            Op::RenameHeader { col, content } => Box::new(HeaderContentChangeCommand::new(
                model.columns()[col].id.clone(),
                content,
            )),
            Op::Retype { col, column_type } => Box::new(HeaderTypeChangeCommand::new(
                model.columns()[col].id.clone(),
                column_type,
            )),
            Op::SetSort { col, dir } => Box::new(ColumnSettingChangeCommand::new(
                model.columns()[col].id.clone(),
                ColumnSetting::Sort(dir),
            )),
            Op::AddTag {
                row,
                col,
                label,
                multiple,
            } => {
                let cell = model
                    .cell_at(&model.rows()[row].id, &model.columns()[col].id)
                    .unwrap()
                    .id
                    .clone();
                Box::new(TagAddCommand::new(cell, label, Color::Blue, multiple))
            }
        }
    }

    /// Undo everything, checking each restored version, then redo
    /// everything, checking each re-executed version.
    pub fn unwind_and_replay(&mut self) {
        let applied = self.versions.len() - 1;

        for i in (0..applied).rev() {
            let model = self
                .history
                .undo()
                .unwrap()
                .expect("history should have entries to undo")
                .clone();
            assert_eq!(model, self.versions[i], "undo must restore version {i}");
            validate::assert_consistent(&model).unwrap();
        }
        assert!(self.history.undo().unwrap().is_none());

        for i in 0..applied {
            let model = self
                .history
                .redo()
                .unwrap()
                .expect("history should have entries to redo")
                .clone();
            assert_eq!(
                model,
                self.versions[i + 1],
                "redo must restore version {}",
                i + 1
            );
            validate::assert_consistent(&model).unwrap();
        }
        assert!(self.history.redo().unwrap().is_none());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn seed() -> TableModel {
        let mut model = TableModel::new();
        model.add_column(ColumnType::Text);
        model.add_column(ColumnType::Text);
        model.add_row(Utc::now());
        model.add_row(Utc::now());
        model
    }

    #[test]
    fn test_content_script_unwinds_exactly() {
        let mut harness = EngineHarness::new(seed());
        harness.run(&[
            Op::RenameHeader { col: 0, content: "Name" },
            Op::RenameHeader { col: 1, content: "Age" },
            Op::SetCell { row: 0, col: 0, content: "Ann" },
            Op::SetCell { row: 0, col: 1, content: "30" },
            Op::SetCell { row: 1, col: 0, content: "Bea" },
            Op::SetCell { row: 0, col: 0, content: "Anna" },
        ]);
        harness.unwind_and_replay();
    }

    #[test]
    fn test_structural_script_unwinds_exactly() {
        let mut harness = EngineHarness::new(seed());
        harness.run(&[
            Op::AddColumn,
            Op::AddRow,
            Op::SetCell { row: 2, col: 2, content: "corner" },
            Op::MoveColumn { from: 2, to: 0 },
            Op::DeleteRow(0),
            Op::DeleteColumn(1),
            Op::AddRow,
            Op::DeleteColumn(0),
        ]);
        harness.unwind_and_replay();
    }

    #[test]
    fn test_tag_script_unwinds_exactly() {
        let mut harness = EngineHarness::new(seed());
        harness.run(&[
            Op::Retype { col: 1, column_type: ColumnType::Tag },
            Op::AddTag { row: 0, col: 1, label: "urgent", multiple: false },
            Op::AddTag { row: 0, col: 1, label: "later", multiple: false },
            Op::AddTag { row: 1, col: 1, label: "urgent", multiple: true },
            Op::AddTag { row: 1, col: 1, label: "review", multiple: true },
            Op::DeleteRow(0),
        ]);
        harness.unwind_and_replay();
    }

    #[test]
    fn test_sort_script_unwinds_exactly() {
        let mut harness = EngineHarness::new(seed());
        harness.run(&[
            Op::SetCell { row: 0, col: 0, content: "b" },
            Op::SetCell { row: 1, col: 0, content: "a" },
            Op::SetSort { col: 0, dir: SortDir::Asc },
            Op::SetSort { col: 1, dir: SortDir::Desc },
            Op::SetSort { col: 1, dir: SortDir::None },
        ]);
        harness.unwind_and_replay();
    }

    #[test]
    fn test_cross_product_holds_at_every_version() {
        let mut harness = EngineHarness::new(seed());
        harness.run(&[
            Op::AddColumn,
            Op::AddRow,
            Op::DeleteColumn(0),
            Op::AddColumn,
            Op::DeleteRow(1),
        ]);
        let model = harness.model();
        assert_eq!(
            model.cells().len(),
            model.rows().len() * model.columns().len()
        );
        assert!(validate::check(model).is_empty());
        harness.unwind_and_replay();
    }
}
