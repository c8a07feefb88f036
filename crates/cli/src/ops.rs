//! Subcommand implementations.
//!
//! Every mutating operation follows the same shape: load the table with
//! its stored settings, run one command through a `CommandHistory` (which
//! validates the resulting model), write the canonical text back, and
//! persist the captured settings.

use std::fmt;
use std::path::Path;

use textgrid_config::SettingsStore;
use textgrid_engine::commands::{
    AddColumnCommand, AddRowCommand, CellContentChangeCommand, DeleteColumnCommand,
    DeleteRowCommand, MoveColumnCommand,
};
use textgrid_engine::error::EngineError;
use textgrid_engine::history::CommandHistory;
use textgrid_engine::id::{CellId, ColumnId, RowId};
use textgrid_engine::model::TableModel;
use textgrid_engine::settings::TableSettings;
use textgrid_engine::validate;
use textgrid_io::table_text::{self, MalformedTableError};
use textgrid_io::json;

use crate::exit_codes::{EXIT_ERROR, EXIT_IO_ERROR, EXIT_PARSE_ERROR, EXIT_USAGE};

#[derive(Debug)]
pub enum OpError {
    Usage(String),
    Io(String),
    Parse(String),
    Engine(String),
}

impl OpError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Usage(_) => EXIT_USAGE,
            Self::Io(_) => EXIT_IO_ERROR,
            Self::Parse(_) => EXIT_PARSE_ERROR,
            Self::Engine(_) => EXIT_ERROR,
        }
    }
}

impl fmt::Display for OpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Usage(msg) | Self::Io(msg) | Self::Parse(msg) | Self::Engine(msg) => {
                f.write_str(msg)
            }
        }
    }
}

impl From<MalformedTableError> for OpError {
    fn from(err: MalformedTableError) -> Self {
        match err {
            MalformedTableError::Io(msg) => Self::Io(msg),
            other => Self::Parse(other.to_string()),
        }
    }
}

impl From<EngineError> for OpError {
    fn from(err: EngineError) -> Self {
        Self::Engine(err.to_string())
    }
}

fn load(path: &Path, store: &SettingsStore) -> Result<TableModel, OpError> {
    let settings = store
        .table_settings(path)
        .cloned()
        .unwrap_or_default();
    Ok(table_text::import_with_settings(path, &settings)?)
}

fn save(path: &Path, model: &TableModel, store: &mut SettingsStore) -> Result<(), OpError> {
    table_text::export(model, path)?;
    store.set_table_settings(path, TableSettings::capture(model));
    store.save().map_err(OpError::Io)
}

fn row_at(model: &TableModel, index: usize) -> Result<RowId, OpError> {
    model
        .rows()
        .get(index)
        .map(|r| r.id.clone())
        .ok_or_else(|| {
            OpError::Usage(format!(
                "row index {index} out of range (table has {} rows)",
                model.rows().len()
            ))
        })
}

fn column_at(model: &TableModel, index: usize) -> Result<ColumnId, OpError> {
    model
        .columns()
        .get(index)
        .map(|c| c.id.clone())
        .ok_or_else(|| {
            OpError::Usage(format!(
                "column index {index} out of range (table has {} columns)",
                model.columns().len()
            ))
        })
}

fn cell_at(model: &TableModel, row: &RowId, column: &ColumnId) -> Result<CellId, OpError> {
    model
        .cell_at(row, column)
        .map(|c| c.id.clone())
        .ok_or_else(|| OpError::Engine("no cell at the requested position".to_string()))
}

pub fn show(path: &Path, store: &SettingsStore) -> Result<String, OpError> {
    let model = load(path, store)?;
    Ok(table_text::serialize(&model))
}

pub fn fmt(path: &Path, write: bool, store: &mut SettingsStore) -> Result<String, OpError> {
    let model = load(path, store)?;
    if write {
        save(path, &model, store)?;
        Ok(format!("fmt: rewrote {}", path.display()))
    } else {
        Ok(table_text::serialize(&model))
    }
}

pub fn check(path: &Path, store: &SettingsStore) -> Result<String, OpError> {
    let model = load(path, store)?;
    let violations = validate::check(&model);
    if violations.is_empty() {
        Ok(format!(
            "ok: {} columns, {} rows, {} tags",
            model.columns().len(),
            model.rows().len(),
            model.tags().len()
        ))
    } else {
        let joined = violations
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join("\n");
        Err(OpError::Engine(joined))
    }
}

pub fn set_cell(
    path: &Path,
    row_index: usize,
    col_index: usize,
    content: &str,
    store: &mut SettingsStore,
) -> Result<String, OpError> {
    let model = load(path, store)?;
    let row = row_at(&model, row_index)?;
    let column = column_at(&model, col_index)?;
    let cell = cell_at(&model, &row, &column)?;

    let mut history = CommandHistory::new(model);
    history.submit(Box::new(CellContentChangeCommand::new(cell, content)))?;
    save(path, history.model(), store)?;
    Ok(format!("set cell ({row_index},{col_index})"))
}

pub fn add_row(path: &Path, store: &mut SettingsStore) -> Result<String, OpError> {
    let model = load(path, store)?;
    let mut history = CommandHistory::new(model);
    history.submit(Box::new(AddRowCommand::new()))?;
    save(path, history.model(), store)?;
    Ok(format!("added row {}", history.model().rows().len() - 1))
}

pub fn add_col(path: &Path, store: &mut SettingsStore) -> Result<String, OpError> {
    let model = load(path, store)?;
    let mut history = CommandHistory::new(model);
    history.submit(Box::new(AddColumnCommand::new()))?;
    save(path, history.model(), store)?;
    Ok(format!(
        "added column {}",
        history.model().columns().len() - 1
    ))
}

pub fn del_row(path: &Path, index: usize, store: &mut SettingsStore) -> Result<String, OpError> {
    let model = load(path, store)?;
    let row = row_at(&model, index)?;
    let mut history = CommandHistory::new(model);
    history.submit(Box::new(DeleteRowCommand::new(row)))?;
    save(path, history.model(), store)?;
    Ok(format!("deleted row {index}"))
}

pub fn del_col(path: &Path, index: usize, store: &mut SettingsStore) -> Result<String, OpError> {
    let model = load(path, store)?;
    let column = column_at(&model, index)?;
    let mut history = CommandHistory::new(model);
    history.submit(Box::new(DeleteColumnCommand::new(column)))?;
    save(path, history.model(), store)?;
    Ok(format!("deleted column {index}"))
}

pub fn move_col(
    path: &Path,
    from: usize,
    to: usize,
    store: &mut SettingsStore,
) -> Result<String, OpError> {
    let model = load(path, store)?;
    let column = column_at(&model, from)?;
    if to >= model.columns().len() {
        return Err(OpError::Usage(format!(
            "column index {to} out of range (table has {} columns)",
            model.columns().len()
        )));
    }
    let mut history = CommandHistory::new(model);
    history.submit(Box::new(MoveColumnCommand::new(column, to)))?;
    save(path, history.model(), store)?;
    Ok(format!("moved column {from} to {to}"))
}

pub fn export_json(
    path: &Path,
    output: Option<&Path>,
    store: &SettingsStore,
) -> Result<String, OpError> {
    let model = load(path, store)?;
    let out = match output {
        Some(p) => p.to_path_buf(),
        None => path.with_extension("json"),
    };
    json::export(&model, &out).map_err(OpError::Io)?;
    Ok(format!("exported {}", out.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const TABLE: &str = "| Name | Age |\n| ---- | --- |\n| Ann  | 30  |\n";

    struct Env {
        _dir: tempfile::TempDir,
        table: std::path::PathBuf,
        store: SettingsStore,
    }

    fn env() -> Env {
        let dir = tempdir().unwrap();
        let table = dir.path().join("table.md");
        fs::write(&table, TABLE).unwrap();
        let store = SettingsStore::load_from(dir.path().join("tables.json"));
        Env {
            table,
            store,
            _dir: dir,
        }
    }

    #[test]
    fn test_show_prints_canonical_table() {
        let e = env();
        let out = show(&e.table, &e.store).unwrap();
        assert_eq!(out, TABLE.trim_end());
    }

    #[test]
    fn test_set_cell_rewrites_file_and_widths() {
        let mut e = env();
        set_cell(&e.table, 0, 0, "Alexandria", &mut e.store).unwrap();
        let content = fs::read_to_string(&e.table).unwrap();
        assert_eq!(
            content,
            "| Name       | Age |\n| ---------- | --- |\n| Alexandria | 30  |\n"
        );
    }

    #[test]
    fn test_add_and_delete_round_trip() {
        let mut e = env();
        add_row(&e.table, &mut e.store).unwrap();
        add_col(&e.table, &mut e.store).unwrap();
        let model = load(&e.table, &e.store).unwrap();
        assert_eq!(model.rows().len(), 2);
        assert_eq!(model.columns().len(), 3);

        del_col(&e.table, 2, &mut e.store).unwrap();
        del_row(&e.table, 1, &mut e.store).unwrap();
        let out = show(&e.table, &e.store).unwrap();
        assert_eq!(out, TABLE.trim_end());
    }

    #[test]
    fn test_move_col_swaps_order() {
        let mut e = env();
        move_col(&e.table, 0, 1, &mut e.store).unwrap();
        let out = show(&e.table, &e.store).unwrap();
        assert_eq!(out, "| Age | Name |\n| --- | ---- |\n| 30  | Ann  |");
    }

    #[test]
    fn test_check_reports_shape() {
        let e = env();
        let out = check(&e.table, &e.store).unwrap();
        assert_eq!(out, "ok: 2 columns, 1 rows, 0 tags");
    }

    #[test]
    fn test_out_of_range_is_usage_error() {
        let mut e = env();
        let err = del_row(&e.table, 5, &mut e.store).unwrap_err();
        assert!(matches!(err, OpError::Usage(_)));
        assert_eq!(err.exit_code(), EXIT_USAGE);
    }

    #[test]
    fn test_malformed_table_is_parse_error() {
        let e = env();
        fs::write(&e.table, "| A |\n| 1 |\n").unwrap();
        let err = show(&e.table, &e.store).unwrap_err();
        assert!(matches!(err, OpError::Parse(_)));
        assert_eq!(err.exit_code(), EXIT_PARSE_ERROR);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let e = env();
        let err = show(Path::new("/no/such/table.md"), &e.store).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_IO_ERROR);
    }

    #[test]
    fn test_settings_survive_edits() {
        use textgrid_engine::column::ColumnType;
        use textgrid_engine::settings::{ColumnSettings, TableSettings};

        let mut e = env();
        // mark the Age column as a number column in the external settings
        let mut settings = TableSettings::default();
        settings.columns.push(ColumnSettings::default());
        settings.columns.push(ColumnSettings {
            column_type: ColumnType::Number,
            ..ColumnSettings::default()
        });
        e.store.set_table_settings(&e.table, settings);

        add_row(&e.table, &mut e.store).unwrap();
        let stored = e.store.table_settings(&e.table).unwrap();
        assert_eq!(stored.columns[1].column_type, ColumnType::Number);
    }

    #[test]
    fn test_export_json_writes_sidecar() {
        let e = env();
        let out_path = e.table.with_extension("json");
        export_json(&e.table, None, &e.store).unwrap();
        let loaded = json::import(&out_path).unwrap();
        assert_eq!(loaded.columns().len(), 2);
    }
}
