//! Model invariant validation.
//!
//! A full sweep over one `TableModel`, independent of any command:
//!
//! - the cell set is exactly rows x columns, no duplicates;
//! - ids are unique per entity kind;
//! - every tag's owning column exists, every referenced cell belongs to
//!   that column, and the reference is mirrored on the cell;
//! - every selected tag on a cell exists, belongs to the cell's column,
//!   and mirrors back;
//! - a column's ordered tag list and the tags owned by that column agree.
//!
//! `CommandHistory` runs this after every execute; a violation there means
//! a command's delta logic is wrong, which is fatal, not recoverable.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::EngineError;
use crate::model::TableModel;

/// One broken invariant, with enough context to locate it.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    DuplicateId(String),
    CellCountMismatch { expected: usize, actual: usize },
    MissingCell { row: String, column: String },
    DuplicateCell { row: String, column: String },
    CellOwnerMissing { cell: String },
    TagColumnMissing { tag: String },
    TagReferenceBroken { tag: String, cell: String },
    CellTagBroken { cell: String, tag: String },
    ColumnTagListBroken { column: String, tag: String },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateId(id) => write!(f, "id used twice: {id}"),
            Self::CellCountMismatch { expected, actual } => {
                write!(f, "expected {expected} cells (rows x columns), found {actual}")
            }
            Self::MissingCell { row, column } => {
                write!(f, "no cell for row {row} x column {column}")
            }
            Self::DuplicateCell { row, column } => {
                write!(f, "more than one cell for row {row} x column {column}")
            }
            Self::CellOwnerMissing { cell } => {
                write!(f, "cell {cell} references a missing row or column")
            }
            Self::TagColumnMissing { tag } => {
                write!(f, "tag {tag} owned by a missing column")
            }
            Self::TagReferenceBroken { tag, cell } => {
                write!(f, "tag {tag} references cell {cell} which does not mirror it")
            }
            Self::CellTagBroken { cell, tag } => {
                write!(f, "cell {cell} selects tag {tag} which does not mirror it")
            }
            Self::ColumnTagListBroken { column, tag } => {
                write!(f, "column {column} tag list disagrees with tag {tag}")
            }
        }
    }
}

/// Sweep the model and report every violation found.
pub fn check(model: &TableModel) -> Vec<Violation> {
    let mut violations = Vec::new();

    check_id_uniqueness(model, &mut violations);
    check_cross_product(model, &mut violations);
    check_tag_side(model, &mut violations);
    check_cell_side(model, &mut violations);
    check_column_tag_lists(model, &mut violations);

    violations
}

/// Like [`check`] but collapsed into the engine error type.
pub fn assert_consistent(model: &TableModel) -> Result<(), EngineError> {
    let violations = check(model);
    if violations.is_empty() {
        return Ok(());
    }
    let joined = violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ");
    Err(EngineError::Consistency(joined))
}

fn check_id_uniqueness(model: &TableModel, out: &mut Vec<Violation>) {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    let ids = model
        .columns()
        .iter()
        .map(|c| c.id.as_str())
        .chain(model.rows().iter().map(|r| r.id.as_str()))
        .chain(model.cells().iter().map(|c| c.id.as_str()))
        .chain(model.tags().iter().map(|t| t.id.as_str()));
    for id in ids {
        if !seen.insert(id) {
            out.push(Violation::DuplicateId(id.to_string()));
        }
    }
}

fn check_cross_product(model: &TableModel, out: &mut Vec<Violation>) {
    let row_ids: FxHashSet<_> = model.rows().iter().map(|r| &r.id).collect();
    let column_ids: FxHashSet<_> = model.columns().iter().map(|c| &c.id).collect();

    let expected = row_ids.len() * column_ids.len();
    if model.cells().len() != expected {
        out.push(Violation::CellCountMismatch {
            expected,
            actual: model.cells().len(),
        });
    }

    let mut seen_pairs: FxHashMap<(&str, &str), usize> = FxHashMap::default();
    for cell in model.cells() {
        if !row_ids.contains(&cell.row_id) || !column_ids.contains(&cell.column_id) {
            out.push(Violation::CellOwnerMissing {
                cell: cell.id.to_string(),
            });
            continue;
        }
        *seen_pairs
            .entry((cell.row_id.as_str(), cell.column_id.as_str()))
            .or_insert(0) += 1;
    }

    for row in model.rows() {
        for column in model.columns() {
            match seen_pairs.get(&(row.id.as_str(), column.id.as_str())) {
                None => out.push(Violation::MissingCell {
                    row: row.id.to_string(),
                    column: column.id.to_string(),
                }),
                Some(1) => {}
                Some(_) => out.push(Violation::DuplicateCell {
                    row: row.id.to_string(),
                    column: column.id.to_string(),
                }),
            }
        }
    }
}

fn check_tag_side(model: &TableModel, out: &mut Vec<Violation>) {
    for tag in model.tags() {
        let column_exists = model.column(&tag.column_id).is_some();
        if !column_exists {
            out.push(Violation::TagColumnMissing {
                tag: tag.id.to_string(),
            });
        }
        for cell_id in tag.cell_ids() {
            let ok = model
                .cell(cell_id)
                .map(|cell| cell.column_id == tag.column_id && cell.has_tag(&tag.id))
                .unwrap_or(false);
            if !ok {
                out.push(Violation::TagReferenceBroken {
                    tag: tag.id.to_string(),
                    cell: cell_id.to_string(),
                });
            }
        }
    }
}

fn check_cell_side(model: &TableModel, out: &mut Vec<Violation>) {
    for cell in model.cells() {
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for tag_id in cell.tag_ids() {
            if !seen.insert(tag_id.as_str()) {
                out.push(Violation::DuplicateId(tag_id.to_string()));
                continue;
            }
            let ok = model
                .tag(tag_id)
                .map(|tag| tag.column_id == cell.column_id && tag.references(&cell.id))
                .unwrap_or(false);
            if !ok {
                out.push(Violation::CellTagBroken {
                    cell: cell.id.to_string(),
                    tag: tag_id.to_string(),
                });
            }
        }
    }
}

fn check_column_tag_lists(model: &TableModel, out: &mut Vec<Violation>) {
    for column in model.columns() {
        let mut listed: FxHashSet<&str> = FxHashSet::default();
        for tag_id in column.tag_ids() {
            if !listed.insert(tag_id.as_str()) {
                out.push(Violation::DuplicateId(tag_id.to_string()));
                continue;
            }
            let ok = model
                .tag(tag_id)
                .map(|tag| tag.column_id == column.id)
                .unwrap_or(false);
            if !ok {
                out.push(Violation::ColumnTagListBroken {
                    column: column.id.to_string(),
                    tag: tag_id.to_string(),
                });
            }
        }
        for tag in model.tags() {
            if tag.column_id == column.id && !listed.contains(tag.id.as_str()) {
                out.push(Violation::ColumnTagListBroken {
                    column: column.id.to_string(),
                    tag: tag.id.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::ColumnType;
    use crate::tag::Color;
    use chrono::Utc;

    fn valid_model() -> TableModel {
        let mut model = TableModel::new();
        let text = model.add_column(ColumnType::Text);
        let tags = model.add_column(ColumnType::Tag);
        let r1 = model.add_row(Utc::now());
        model.add_row(Utc::now());

        let cell = model.cell_at(&r1, &text).unwrap().id.clone();
        model.set_cell_content(&cell, "hello").unwrap();

        let tag_cell = model.cell_at(&r1, &tags).unwrap().id.clone();
        let tag = model.create_tag(&tags, "done", Color::Green).unwrap();
        model.attach_tag(&tag_cell, &tag).unwrap();
        model
    }

    #[test]
    fn test_valid_model_passes() {
        let model = valid_model();
        assert!(check(&model).is_empty());
        assert!(assert_consistent(&model).is_ok());
    }

    #[test]
    fn test_empty_model_passes() {
        assert!(check(&TableModel::new()).is_empty());
    }

    #[test]
    fn test_detects_missing_cell() {
        let mut model = valid_model();
        // bypass the primitives to break the cross product
        let row = model.rows()[0].id.clone();
        let removed = model.remove_row(&row).unwrap();
        let mut broken = removed;
        broken.cells.pop();
        model.restore_row(broken);

        let violations = check(&model);
        assert!(violations
            .iter()
            .any(|v| matches!(v, Violation::MissingCell { .. })));
        assert!(violations
            .iter()
            .any(|v| matches!(v, Violation::CellCountMismatch { .. })));
        assert!(assert_consistent(&model).is_err());
    }

    #[test]
    fn test_detects_broken_mirror() {
        let mut model = valid_model();
        let tag_id = model.tags()[0].id.clone();
        // detach only the cell side
        let cell_id = model.tags()[0].cell_ids()[0].clone();
        model
            .cell_mut(&cell_id)
            .unwrap()
            .remove_tag(&tag_id);

        let violations = check(&model);
        assert!(violations
            .iter()
            .any(|v| matches!(v, Violation::TagReferenceBroken { .. })));
    }

    #[test]
    fn test_detects_column_list_disagreement() {
        let mut model = valid_model();
        let tag_id = model.tags()[0].id.clone();
        let column_id = model.tags()[0].column_id.clone();
        model.column_mut(&column_id).unwrap().remove_tag(&tag_id);

        let violations = check(&model);
        assert!(violations
            .iter()
            .any(|v| matches!(v, Violation::ColumnTagListBroken { .. })));
    }
}
