use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub settings: Option<SettingsConfig>,
    pub pdf: Option<PdfConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SettingsConfig {
    /// JSON file holding the user's `ui` settings.
    pub path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdfConfig {
    /// Fraction of page height at the top to drop (0.0 disables).
    pub header_exclusion: Option<f32>,
    /// Fraction of page height at the bottom to drop (0.0 disables).
    pub footer_exclusion: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset, e.g. `"info"`.
    pub level: Option<String>,
    /// Directory for daily-rolling log files.
    pub dir: Option<String>,
}

impl ConfigFile {
    /// Configured settings file, falling back to the platform data directory.
    pub fn settings_path(&self) -> Option<PathBuf> {
        self.settings
            .as_ref()
            .and_then(|s| s.path.as_ref())
            .map(PathBuf::from)
            .or_else(default_settings_path)
    }

    pub fn header_exclusion(&self) -> f32 {
        self.pdf.as_ref().and_then(|p| p.header_exclusion).unwrap_or(0.0)
    }

    pub fn footer_exclusion(&self) -> f32 {
        self.pdf.as_ref().and_then(|p| p.footer_exclusion).unwrap_or(0.0)
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or("warn")
    }

    pub fn log_dir(&self) -> Option<PathBuf> {
        self.logging
            .as_ref()
            .and_then(|l| l.dir.as_ref())
            .map(PathBuf::from)
    }
}

/// Platform config directory path: `<config_dir>/pinboard/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("pinboard").join("config.toml"))
}

/// `<data_dir>/pinboard/settings.json`.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join("pinboard").join("settings.json"))
}

/// Load config by cascading CWD `.pinboard.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".pinboard.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        settings: Some(SettingsConfig {
            path: overlay
                .settings
                .as_ref()
                .and_then(|s| s.path.clone())
                .or_else(|| base.settings.as_ref().and_then(|s| s.path.clone())),
        }),
        pdf: Some(PdfConfig {
            header_exclusion: overlay
                .pdf
                .as_ref()
                .and_then(|p| p.header_exclusion)
                .or_else(|| base.pdf.as_ref().and_then(|p| p.header_exclusion)),
            footer_exclusion: overlay
                .pdf
                .as_ref()
                .and_then(|p| p.footer_exclusion)
                .or_else(|| base.pdf.as_ref().and_then(|p| p.footer_exclusion)),
        }),
        logging: Some(LoggingConfig {
            level: overlay
                .logging
                .as_ref()
                .and_then(|l| l.level.clone())
                .or_else(|| base.logging.as_ref().and_then(|l| l.level.clone())),
            dir: overlay
                .logging
                .as_ref()
                .and_then(|l| l.dir.clone())
                .or_else(|| base.logging.as_ref().and_then(|l| l.dir.clone())),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_parses() {
        let toml_str = "[pdf]\nfooter_exclusion = 0.05\n";
        let parsed: ConfigFile = toml::from_str(toml_str).unwrap();
        assert!(parsed.settings.is_none());
        assert_eq!(parsed.footer_exclusion(), 0.05);
        assert_eq!(parsed.header_exclusion(), 0.0);
        assert_eq!(parsed.log_level(), "warn");
    }

    #[test]
    fn merge_overlay_wins() {
        let base = ConfigFile {
            settings: Some(SettingsConfig {
                path: Some("/base/settings.json".to_string()),
            }),
            logging: Some(LoggingConfig {
                level: Some("info".to_string()),
                dir: None,
            }),
            ..Default::default()
        };
        let overlay = ConfigFile {
            settings: Some(SettingsConfig {
                path: Some("/overlay/settings.json".to_string()),
            }),
            ..Default::default()
        };
        let merged = merge(base, overlay);
        assert_eq!(
            merged.settings_path(),
            Some(PathBuf::from("/overlay/settings.json"))
        );
        assert_eq!(merged.log_level(), "info");
    }

    #[test]
    fn merge_base_preserved_when_overlay_absent() {
        let base = ConfigFile {
            pdf: Some(PdfConfig {
                header_exclusion: Some(0.04),
                footer_exclusion: None,
            }),
            ..Default::default()
        };
        let merged = merge(base, ConfigFile::default());
        assert_eq!(merged.header_exclusion(), 0.04);
        assert!(merged.log_dir().is_none());
    }

    #[test]
    fn unparseable_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[pdf\nbroken").unwrap();
        assert!(load_from_path(&path).is_none());
        assert!(load_from_path(&dir.path().join("missing.toml")).is_none());
    }
}
