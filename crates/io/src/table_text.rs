//! The persisted text form: a padded, pipe-delimited table.
//!
//! Layout is one line per row — header first, then a separator whose dash
//! run per column equals that column's computed width, then the data rows.
//! Every line starts and ends with `|`, and every cell is padded with one
//! leading space plus right-padding up to the column width plus one
//! trailing space. Width per column is the maximum rendered length of the
//! header and every cell; a tag cell renders as its labels joined by
//! single spaces in attachment order.
//!
//! Deserialization rebuilds the model through the same creation primitives
//! commands use. A malformed table yields an error naming the offending
//! line and no model.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::Utc;

use textgrid_engine::column::ColumnType;
use textgrid_engine::error::EngineError;
use textgrid_engine::model::TableModel;
use textgrid_engine::settings::TableSettings;
use textgrid_engine::tag::Color;

/// Parse/io failure for the text form. Line numbers are 1-based and count
/// from the first non-blank line of the table.
#[derive(Debug, Clone, PartialEq)]
pub enum MalformedTableError {
    /// No lines at all, or no header/separator pair.
    Empty,
    /// A line does not both start and end with the delimiter.
    UnmatchedDelimiters { line: usize },
    /// Line 2 is not a dash separator.
    MissingSeparator { line: usize },
    /// A data row's cell count differs from the header's.
    CellCountMismatch {
        line: usize,
        expected: usize,
        actual: usize,
    },
    /// Model construction failed while loading (never expected for input
    /// this module itself parsed).
    Model(String),
    /// File read/write failure.
    Io(String),
}

impl fmt::Display for MalformedTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty table: need a header and separator line"),
            Self::UnmatchedDelimiters { line } => {
                write!(f, "line {line}: row must start and end with '|'")
            }
            Self::MissingSeparator { line } => {
                write!(f, "line {line}: expected a dash separator row")
            }
            Self::CellCountMismatch {
                line,
                expected,
                actual,
            } => write!(
                f,
                "line {line}: expected {expected} cells, found {actual}"
            ),
            Self::Model(msg) => write!(f, "cannot build table model: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for MalformedTableError {}

impl From<EngineError> for MalformedTableError {
    fn from(err: EngineError) -> Self {
        Self::Model(err.to_string())
    }
}

/// Character width of each column: max of the rendered header length and
/// every cell's rendered length in that column.
pub fn column_widths(model: &TableModel) -> Vec<usize> {
    let mut widths: Vec<usize> = model
        .columns()
        .iter()
        .map(|c| c.header_rendered().chars().count())
        .collect();

    for cell in model.cells() {
        let Some(index) = model.column_index(&cell.column_id) else {
            continue;
        };
        let len = model.rendered_cell_text(cell).chars().count();
        if len > widths[index] {
            widths[index] = len;
        }
    }
    widths
}

struct LineBuffer {
    out: String,
}

impl LineBuffer {
    fn new() -> Self {
        Self { out: String::new() }
    }

    fn start_row(&mut self) {
        if !self.out.is_empty() {
            self.out.push('\n');
        }
        self.out.push('|');
    }

    fn write_cell(&mut self, content: &str, width: usize) {
        self.out.push(' ');
        self.out.push_str(content);
        for _ in content.chars().count()..width {
            self.out.push(' ');
        }
        self.out.push(' ');
        self.out.push('|');
    }

    fn into_string(self) -> String {
        self.out
    }
}

/// Render a model to its canonical text form.
pub fn serialize(model: &TableModel) -> String {
    let widths = column_widths(model);
    let mut buffer = LineBuffer::new();

    buffer.start_row();
    for (column, width) in model.columns().iter().zip(&widths) {
        buffer.write_cell(column.header_rendered(), *width);
    }

    buffer.start_row();
    for width in &widths {
        buffer.write_cell(&"-".repeat(*width), *width);
    }

    for row in model.rows() {
        buffer.start_row();
        for (column, width) in model.columns().iter().zip(&widths) {
            let text = model
                .cell_at(&row.id, &column.id)
                .map(|cell| model.rendered_cell_text(cell))
                .unwrap_or_default();
            buffer.write_cell(&text, *width);
        }
    }

    buffer.into_string()
}

/// Parse the text form with every column defaulting to text.
pub fn deserialize(text: &str) -> Result<TableModel, MalformedTableError> {
    deserialize_with_settings(text, &TableSettings::default())
}

/// Parse the text form, applying externally stored per-column settings.
/// Tag-typed columns rebuild their tags from the whitespace-separated
/// labels in each cell, colored from the settings' palette when present.
pub fn deserialize_with_settings(
    text: &str,
    settings: &TableSettings,
) -> Result<TableModel, MalformedTableError> {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        return Err(MalformedTableError::Empty);
    }

    let headers = parse_line(lines[0], 1)?;
    let separator = parse_line(lines[1], 2)?;
    if separator.len() != headers.len()
        || !separator
            .iter()
            .all(|s| !s.is_empty() && s.chars().all(|c| c == '-'))
    {
        return Err(MalformedTableError::MissingSeparator { line: 2 });
    }

    let mut model = TableModel::new();
    let mut column_ids = Vec::with_capacity(headers.len());
    for header in &headers {
        let column_id = model.add_column(ColumnType::Text);
        model.set_header(&column_id, header)?;
        column_ids.push(column_id);
    }
    settings.apply(&mut model);

    for (offset, line) in lines[2..].iter().enumerate() {
        let values = parse_line(line, offset + 3)?;
        if values.len() != headers.len() {
            return Err(MalformedTableError::CellCountMismatch {
                line: offset + 3,
                expected: headers.len(),
                actual: values.len(),
            });
        }

        let row_id = model.add_row(Utc::now());
        for (index, value) in values.iter().enumerate() {
            let column_id = &column_ids[index];
            let cell_id = model
                .cell_at(&row_id, column_id)
                .map(|c| c.id.clone())
                .ok_or_else(|| MalformedTableError::Model("cell missing after add_row".into()))?;

            let is_tag_column = model
                .column(column_id)
                .map(|c| c.column_type == ColumnType::Tag)
                .unwrap_or(false);
            if is_tag_column {
                for label in value.split_whitespace() {
                    let tag_id = match model.tag_by_label(column_id, label) {
                        Some(tag) => tag.id.clone(),
                        None => {
                            let color =
                                settings.tag_color(index, label).unwrap_or(Color::default());
                            model.create_tag(column_id, label, color)?
                        }
                    };
                    model.attach_tag(&cell_id, &tag_id)?;
                }
            } else {
                model.set_cell_content(&cell_id, value)?;
            }
        }
    }

    Ok(model)
}

fn parse_line(line: &str, number: usize) -> Result<Vec<String>, MalformedTableError> {
    let trimmed = line.trim();
    if trimmed.len() < 2 || !trimmed.starts_with('|') || !trimmed.ends_with('|') {
        return Err(MalformedTableError::UnmatchedDelimiters { line: number });
    }
    let inner = &trimmed[1..trimmed.len() - 1];
    Ok(inner.split('|').map(|s| s.trim().to_string()).collect())
}

/// Read and parse a table file.
pub fn import(path: &Path) -> Result<TableModel, MalformedTableError> {
    import_with_settings(path, &TableSettings::default())
}

pub fn import_with_settings(
    path: &Path,
    settings: &TableSettings,
) -> Result<TableModel, MalformedTableError> {
    let content = fs::read_to_string(path).map_err(|e| MalformedTableError::Io(e.to_string()))?;
    deserialize_with_settings(&content, settings)
}

/// Serialize a model and write it out, with a trailing newline.
pub fn export(model: &TableModel, path: &Path) -> Result<(), MalformedTableError> {
    let mut text = serialize(model);
    text.push('\n');
    fs::write(path, text).map_err(|e| MalformedTableError::Io(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use textgrid_engine::settings::ColumnSettings;

    fn ann_model() -> TableModel {
        let mut model = TableModel::new();
        let name = model.add_column(ColumnType::Text);
        let age = model.add_column(ColumnType::Text);
        model.set_header(&name, "Name").unwrap();
        model.set_header(&age, "Age").unwrap();
        let row = model.add_row(Utc::now());
        let name_cell = model.cell_at(&row, &name).unwrap().id.clone();
        let age_cell = model.cell_at(&row, &age).unwrap().id.clone();
        model.set_cell_content(&name_cell, "Ann").unwrap();
        model.set_cell_content(&age_cell, "30").unwrap();
        model
    }

    #[test]
    fn test_serialize_pads_to_column_width() {
        let model = ann_model();
        assert_eq!(
            serialize(&model),
            "| Name | Age |\n| ---- | --- |\n| Ann  | 30  |"
        );
    }

    #[test]
    fn test_width_follows_longest_cell() {
        let mut model = ann_model();
        let name = model.columns()[0].id.clone();
        let row = model.rows()[0].id.clone();
        let cell = model.cell_at(&row, &name).unwrap().id.clone();
        model.set_cell_content(&cell, "Alexandria").unwrap();

        assert_eq!(column_widths(&model), vec![10, 3]);
        let text = serialize(&model);
        assert!(text.starts_with("| Name       | Age |\n| ---------- | --- |"));
    }

    #[test]
    fn test_tag_cells_render_joined_labels() {
        let mut model = TableModel::new();
        let col = model.add_column(ColumnType::Tag);
        model.set_header(&col, "Status").unwrap();
        let row = model.add_row(Utc::now());
        let cell = model.cell_at(&row, &col).unwrap().id.clone();
        let a = model.create_tag(&col, "urgent", Color::Red).unwrap();
        let b = model.create_tag(&col, "review", Color::Blue).unwrap();
        model.attach_tag(&cell, &a).unwrap();
        model.attach_tag(&cell, &b).unwrap();

        assert_eq!(
            serialize(&model),
            "| Status        |\n| ------------- |\n| urgent review |"
        );
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let model = ann_model();
        let text = serialize(&model);
        let loaded = deserialize(&text).unwrap();

        assert_eq!(loaded.columns().len(), 2);
        assert_eq!(loaded.columns()[0].header_rendered(), "Name");
        assert_eq!(loaded.columns()[1].header_rendered(), "Age");
        assert_eq!(loaded.rows().len(), 1);
        let row = &loaded.rows()[0];
        let name_cell = loaded.cell_at(&row.id, &loaded.columns()[0].id).unwrap();
        assert_eq!(name_cell.rendered(), "Ann");
        // and the canonical text survives a second pass untouched
        assert_eq!(serialize(&loaded), text);
    }

    #[test]
    fn test_round_trip_rebuilds_tags() {
        let mut settings = TableSettings::default();
        settings.columns.push(ColumnSettings::default());
        settings.columns.push(ColumnSettings {
            column_type: ColumnType::Tag,
            ..ColumnSettings::default()
        });
        settings.columns[1]
            .tag_colors
            .insert("todo".to_string(), Color::Orange);

        let text = "| Task | Status    |\n\
                    | ---- | --------- |\n\
                    | a    | todo      |\n\
                    | b    | todo done |";
        let model = deserialize_with_settings(text, &settings).unwrap();

        let status = &model.columns()[1];
        assert_eq!(status.column_type, ColumnType::Tag);
        // "todo" is one tag shared by both rows, "done" a second
        assert_eq!(model.tags().len(), 2);
        let todo = model.tag_by_label(&status.id, "todo").unwrap();
        assert_eq!(todo.cell_ids().len(), 2);
        assert_eq!(todo.color, Color::Orange);
        let done = model.tag_by_label(&status.id, "done").unwrap();
        assert_eq!(done.color, Color::default());

        assert_eq!(
            serialize(&model),
            "| Task | Status    |\n| ---- | --------- |\n| a    | todo      |\n| b    | todo done |"
        );
    }

    #[test]
    fn test_deserialize_rejects_missing_separator() {
        let text = "| A | B |\n| 1 | 2 |";
        assert_eq!(
            deserialize(text),
            Err(MalformedTableError::MissingSeparator { line: 2 })
        );
    }

    #[test]
    fn test_deserialize_rejects_unmatched_delimiters() {
        let text = "| A | B |\n| - | - |\n| 1 | 2";
        assert_eq!(
            deserialize(text),
            Err(MalformedTableError::UnmatchedDelimiters { line: 3 })
        );
    }

    #[test]
    fn test_deserialize_rejects_ragged_rows() {
        let text = "| A | B |\n| - | - |\n| 1 |";
        assert_eq!(
            deserialize(text),
            Err(MalformedTableError::CellCountMismatch {
                line: 3,
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_deserialize_rejects_empty_input() {
        assert_eq!(deserialize(""), Err(MalformedTableError::Empty));
        assert_eq!(deserialize("\n\n"), Err(MalformedTableError::Empty));
    }

    #[test]
    fn test_deserialize_loads_through_validating_primitives() {
        let text = "| A | B |\n| - | - |\n| 1 | 2 |\n| 3 | 4 |";
        let model = deserialize(text).unwrap();
        assert!(textgrid_engine::validate::check(&model).is_empty());
        assert_eq!(model.cells().len(), 4);
    }

    #[test]
    fn test_import_export_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.md");

        let model = ann_model();
        export(&model, &path).unwrap();
        let loaded = import(&path).unwrap();
        assert_eq!(serialize(&loaded), serialize(&model));
    }

    #[test]
    fn test_import_missing_file_is_io_error() {
        let err = import(Path::new("/nonexistent/table.md")).unwrap_err();
        assert!(matches!(err, MalformedTableError::Io(_)));
    }
}
