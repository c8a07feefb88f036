//! Row ordering under a column sort.
//!
//! The engine stores each column's sort direction but never reorders the
//! row sequence itself — the presentation layer asks for the sorted order
//! and applies it. Keeping the query pure keeps content commands minimal
//! (editing a cell does not imply a row permutation in the same delta).

use std::cmp::Ordering;

use crate::column::SortDir;
use crate::id::RowId;
use crate::model::TableModel;

/// Row ids in display order: sorted by the single column whose direction
/// is set, original order otherwise. Rows with an empty sort cell always
/// sink to the bottom. The sort is stable.
pub fn sorted_row_ids(model: &TableModel) -> Vec<RowId> {
    let sort_column = model
        .columns()
        .iter()
        .find(|c| c.sort_dir != SortDir::None);
    let Some(column) = sort_column else {
        return model.rows().iter().map(|r| r.id.clone()).collect();
    };

    let mut keyed: Vec<(String, RowId)> = model
        .rows()
        .iter()
        .map(|row| {
            let text = model
                .cell_at(&row.id, &column.id)
                .map(|cell| model.rendered_cell_text(cell))
                .unwrap_or_default();
            (text, row.id.clone())
        })
        .collect();

    keyed.sort_by(|(a, _), (b, _)| match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => match column.sort_dir {
            SortDir::Desc => compare_values(b, a),
            _ => compare_values(a, b),
        },
    });

    keyed.into_iter().map(|(_, id)| id).collect()
}

/// Numeric comparison when both sides parse as numbers, case-insensitive
/// text comparison otherwise.
fn compare_values(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        _ => a.to_lowercase().cmp(&b.to_lowercase()),
    }
}
