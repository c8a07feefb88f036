// Native JSON format
//
// Lossless persistence of a whole model — ids, timestamps, per-column
// settings, tag colors — wrapped in a versioned envelope. Used by tooling;
// the in-document representation stays the text table.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use textgrid_engine::model::TableModel;
use textgrid_engine::validate;

use crate::NATIVE_FORMAT_VERSION;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    model: &'a TableModel,
}

#[derive(Deserialize)]
struct Envelope {
    version: u32,
    model: TableModel,
}

pub fn to_json_string(model: &TableModel) -> Result<String, String> {
    let envelope = EnvelopeRef {
        version: NATIVE_FORMAT_VERSION,
        model,
    };
    serde_json::to_string_pretty(&envelope).map_err(|e| e.to_string())
}

pub fn from_json_str(content: &str) -> Result<TableModel, String> {
    let envelope: Envelope = serde_json::from_str(content).map_err(|e| e.to_string())?;
    if envelope.version > NATIVE_FORMAT_VERSION {
        return Err(format!(
            "unsupported format version {} (newest known is {})",
            envelope.version, NATIVE_FORMAT_VERSION
        ));
    }
    // The file is external input; a model that breaks the invariants must
    // not get past the boundary.
    validate::assert_consistent(&envelope.model).map_err(|e| e.to_string())?;
    Ok(envelope.model)
}

pub fn export(model: &TableModel, path: &Path) -> Result<(), String> {
    let file = File::create(path).map_err(|e| e.to_string())?;
    let writer = BufWriter::new(file);
    let envelope = EnvelopeRef {
        version: NATIVE_FORMAT_VERSION,
        model,
    };
    serde_json::to_writer_pretty(writer, &envelope).map_err(|e| e.to_string())
}

pub fn import(path: &Path) -> Result<TableModel, String> {
    let file = File::open(path).map_err(|e| e.to_string())?;
    let reader = BufReader::new(file);
    let envelope: Envelope = serde_json::from_reader(reader).map_err(|e| e.to_string())?;
    if envelope.version > NATIVE_FORMAT_VERSION {
        return Err(format!(
            "unsupported format version {} (newest known is {})",
            envelope.version, NATIVE_FORMAT_VERSION
        ));
    }
    validate::assert_consistent(&envelope.model).map_err(|e| e.to_string())?;
    Ok(envelope.model)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::tempdir;
    use textgrid_engine::column::ColumnType;
    use textgrid_engine::tag::Color;

    fn tagged_model() -> TableModel {
        let mut model = TableModel::new();
        let name = model.add_column(ColumnType::Text);
        let status = model.add_column(ColumnType::Tag);
        model.set_header(&name, "Name").unwrap();
        model.set_header(&status, "Status").unwrap();
        let row = model.add_row(Utc::now());
        let name_cell = model.cell_at(&row, &name).unwrap().id.clone();
        let status_cell = model.cell_at(&row, &status).unwrap().id.clone();
        model.set_cell_content(&name_cell, "Alice").unwrap();
        let tag = model.create_tag(&status, "active", Color::Green).unwrap();
        model.attach_tag(&status_cell, &tag).unwrap();
        model
    }

    #[test]
    fn test_json_round_trip_is_lossless() {
        let model = tagged_model();
        let json = to_json_string(&model).unwrap();
        let loaded = from_json_str(&json).unwrap();
        // unlike the text form, ids and timestamps survive
        assert_eq!(loaded, model);
    }

    #[test]
    fn test_json_export_import_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("table.json");

        let model = tagged_model();
        export(&model, &path).unwrap();
        let loaded = import(&path).unwrap();
        assert_eq!(loaded, model);
    }

    #[test]
    fn test_future_version_rejected() {
        let model = tagged_model();
        let json = to_json_string(&model).unwrap();
        let bumped = json.replacen(
            &format!("\"version\": {NATIVE_FORMAT_VERSION}"),
            "\"version\": 999",
            1,
        );
        assert!(from_json_str(&bumped).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(from_json_str("not json").is_err());
        assert!(from_json_str("{\"version\":1}").is_err());
    }
}
