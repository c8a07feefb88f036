//! Externalized per-column display settings.
//!
//! The text format carries none of this, and ids do not survive a text
//! round trip, so the settings section is keyed by column *position*. An
//! external store persists it; the engine only captures it from a model
//! and applies it back at load time, round-tripping unknown-to-it values
//! opaquely.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::column::{ColumnType, SortDir, DEFAULT_COLUMN_WIDTH};
use crate::model::TableModel;
use crate::tag::Color;

/// Display settings for one column, by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnSettings {
    pub column_type: ColumnType,
    pub width: u32,
    pub wrap_overflow: bool,
    pub auto_width: bool,
    pub sort_dir: SortDir,
    /// Tag color palette, label -> color. Used to recolor tags rebuilt
    /// from the text form.
    pub tag_colors: BTreeMap<String, Color>,
}

impl Default for ColumnSettings {
    fn default() -> Self {
        Self {
            column_type: ColumnType::Text,
            width: DEFAULT_COLUMN_WIDTH,
            wrap_overflow: false,
            auto_width: false,
            sort_dir: SortDir::None,
            tag_colors: BTreeMap::new(),
        }
    }
}

/// The settings section of a whole table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSettings {
    pub columns: Vec<ColumnSettings>,
}

impl TableSettings {
    /// Snapshot the settings of every column, in column order.
    pub fn capture(model: &TableModel) -> Self {
        let columns = model
            .columns()
            .iter()
            .map(|column| {
                let tag_colors = model
                    .tags_of_column(&column.id)
                    .into_iter()
                    .map(|tag| (tag.label().to_string(), tag.color))
                    .collect();
                ColumnSettings {
                    column_type: column.column_type,
                    width: column.width,
                    wrap_overflow: column.wrap_overflow,
                    auto_width: column.auto_width,
                    sort_dir: column.sort_dir,
                    tag_colors,
                }
            })
            .collect();
        Self { columns }
    }

    /// Apply by position onto a freshly loaded model. Extra entries on
    /// either side are ignored (the document may have gained or lost
    /// columns since the settings were stored).
    pub fn apply(&self, model: &mut TableModel) {
        let column_ids: Vec<_> = model.columns().iter().map(|c| c.id.clone()).collect();
        for (id, settings) in column_ids.iter().zip(&self.columns) {
            if let Some(column) = model.column_mut(id) {
                column.column_type = settings.column_type;
                column.width = settings.width;
                column.wrap_overflow = settings.wrap_overflow;
                column.auto_width = settings.auto_width;
                column.sort_dir = settings.sort_dir;
            }
        }
    }

    /// Stored color for a tag label in a column, if any.
    pub fn tag_color(&self, column_index: usize, label: &str) -> Option<Color> {
        self.columns
            .get(column_index)
            .and_then(|c| c.tag_colors.get(label))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_capture_and_apply_round_trip() {
        let mut model = TableModel::new();
        let text = model.add_column(ColumnType::Text);
        let tags = model.add_column(ColumnType::Tag);
        let row = model.add_row(Utc::now());
        let cell = model.cell_at(&row, &tags).unwrap().id.clone();
        let tag = model.create_tag(&tags, "done", Color::Purple).unwrap();
        model.attach_tag(&cell, &tag).unwrap();
        model.column_mut(&text).unwrap().width = 240;
        model.column_mut(&text).unwrap().sort_dir = SortDir::Asc;

        let settings = TableSettings::capture(&model);
        assert_eq!(settings.columns.len(), 2);
        assert_eq!(settings.columns[0].width, 240);
        assert_eq!(settings.columns[1].column_type, ColumnType::Tag);
        assert_eq!(settings.tag_color(1, "done"), Some(Color::Purple));

        // a fresh load starts as all-text; applying restores the types
        let mut loaded = TableModel::new();
        loaded.add_column(ColumnType::Text);
        loaded.add_column(ColumnType::Text);
        settings.apply(&mut loaded);
        assert_eq!(loaded.columns()[0].width, 240);
        assert_eq!(loaded.columns()[0].sort_dir, SortDir::Asc);
        assert_eq!(loaded.columns()[1].column_type, ColumnType::Tag);
    }

    #[test]
    fn test_apply_tolerates_column_count_drift() {
        let settings = TableSettings {
            columns: vec![ColumnSettings {
                width: 300,
                ..ColumnSettings::default()
            }],
        };
        let mut model = TableModel::new();
        model.add_column(ColumnType::Text);
        model.add_column(ColumnType::Text);
        settings.apply(&mut model);
        assert_eq!(model.columns()[0].width, 300);
        assert_eq!(model.columns()[1].width, DEFAULT_COLUMN_WIDTH);
    }
}
