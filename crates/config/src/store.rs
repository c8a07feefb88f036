// Per-document table settings store
// Persisted to ~/.config/textgrid/tables.json

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use textgrid_engine::settings::TableSettings;

/// Maps a document key (canonical file path) to the display settings of
/// the table it contains. The engine reads these but does not own them;
/// the store is an explicitly passed handle, not ambient state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsStore {
    tables: BTreeMap<String, TableSettings>,

    #[serde(skip)]
    path: Option<PathBuf>,
}

impl SettingsStore {
    fn default_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("textgrid");
        config_dir.join("tables.json")
    }

    /// Load the store from the default location. A missing or unreadable
    /// file yields an empty store; a corrupt file is reported and replaced
    /// with an empty store rather than aborting.
    pub fn load() -> Self {
        Self::load_from(Self::default_path())
    }

    pub fn load_from(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut store = if path.exists() {
            match fs::read_to_string(&path) {
                Ok(contents) => match serde_json::from_str::<SettingsStore>(&contents) {
                    Ok(store) => store,
                    Err(e) => {
                        eprintln!("Error parsing {}: {}", path.display(), e);
                        eprintln!("Using empty settings");
                        Self::default()
                    }
                },
                Err(e) => {
                    eprintln!("Error reading {}: {}", path.display(), e);
                    Self::default()
                }
            }
        } else {
            Self::default()
        };
        store.path = Some(path);
        store
    }

    /// Settings for a document, if any were stored.
    pub fn table_settings(&self, document: &Path) -> Option<&TableSettings> {
        self.tables.get(&Self::key_for(document))
    }

    pub fn set_table_settings(&mut self, document: &Path, settings: TableSettings) {
        self.tables.insert(Self::key_for(document), settings);
    }

    pub fn remove_table_settings(&mut self, document: &Path) -> Option<TableSettings> {
        self.tables.remove(&Self::key_for(document))
    }

    /// Save the store back to where it was loaded from.
    pub fn save(&self) -> Result<(), String> {
        let path = self.path.clone().unwrap_or_else(Self::default_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|e| e.to_string())?;
        fs::write(&path, json).map_err(|e| e.to_string())
    }

    fn key_for(document: &Path) -> String {
        // canonicalize when the file exists so relative and absolute
        // spellings of the same document share one entry
        document
            .canonicalize()
            .unwrap_or_else(|_| document.to_path_buf())
            .to_string_lossy()
            .into_owned()
    }
}
