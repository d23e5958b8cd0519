use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::tree::{PinnedItem, PinnedTree, deserialize_tree};

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to serialize settings: {0}")]
    Serialize(serde_json::Error),
}

/// The `ui` object of a user's settings.
///
/// Only `pinnedModels` is interpreted here. Every other key is carried
/// through untouched so a save never drops settings owned by other features.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiSettings {
    #[serde(default, deserialize_with = "deserialize_tree")]
    pub pinned_models: PinnedTree,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// The persisted document, shaped like the `{ui: settings}` update payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct UserSettings {
    #[serde(default)]
    ui: UiSettings,
    #[serde(flatten)]
    other: Map<String, Value>,
}

/// Where UI settings are read from and written back to.
pub trait SettingsStore {
    fn load(&self) -> Result<UiSettings, SettingsError>;
    fn save(&self, settings: &UiSettings) -> Result<(), SettingsError>;
}

/// Settings kept in a local JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> Result<UserSettings, SettingsError> {
        if !self.path.exists() {
            return Ok(UserSettings::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(UserSettings::default());
        }
        serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: self.path.clone(),
            source,
        })
    }
}

impl SettingsStore for JsonFileStore {
    fn load(&self) -> Result<UiSettings, SettingsError> {
        Ok(self.read_document()?.ui)
    }

    fn save(&self, settings: &UiSettings) -> Result<(), SettingsError> {
        // Keys outside `ui` belong to someone else; keep them.
        let mut document = self.read_document()?;
        document.ui = settings.clone();

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&document).map_err(SettingsError::Serialize)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, &self.path)?;
        tracing::info!(path = %self.path.display(), "saved settings");
        Ok(())
    }
}

/// Load settings, transform the pinned tree, and persist the result.
pub fn update_pinned(
    store: &dyn SettingsStore,
    transform: impl FnOnce(&[PinnedItem]) -> PinnedTree,
) -> Result<PinnedTree, SettingsError> {
    let mut settings = store.load()?;
    let before = settings.pinned_models.len();
    settings.pinned_models = transform(&settings.pinned_models);
    tracing::debug!(
        before,
        after = settings.pinned_models.len(),
        "updated pinned models"
    );
    store.save(&settings)?;
    Ok(settings.pinned_models)
}
