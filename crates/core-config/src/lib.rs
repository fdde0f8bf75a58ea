//! Startup configuration loading.
//!
//! `StartupConfig` deserializes an optional `[settings]` table from an
//! `oxidized.toml`-style file whose keys are the same option names the
//! runtime settings registry in `core-ex` understands. It is applied once at
//! `Editor` construction time, before any key is processed, as initial
//! overrides layered on top of the registry's built-in defaults.
//!
//! A malformed or outdated config file must not prevent the editor from
//! starting: parse failure falls back to an empty (all-default) config, and
//! unknown keys are logged and ignored by the caller applying the table
//! rather than rejected here — this crate only owns parsing and discovery.

use anyhow::Result;
use serde::Deserialize;
use std::{collections::BTreeMap, fs, path::PathBuf};
use tracing::warn;

/// A single raw setting value as read from TOML, before the settings
/// registry validates it against its declared type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawSettingValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl std::fmt::Display for RawSettingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawSettingValue::Bool(b) => write!(f, "{b}"),
            RawSettingValue::Int(i) => write!(f, "{i}"),
            RawSettingValue::Str(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct ConfigFile {
    #[serde(default)]
    pub settings: BTreeMap<String, RawSettingValue>,
}

#[derive(Debug, Clone, Default)]
pub struct StartupConfig {
    pub file: ConfigFile,
    /// Non-fatal diagnostics accumulated while loading (e.g. parse failure
    /// falling back to defaults). Surfaced to the embedding program for
    /// `show_message`-style reporting; never blocks startup.
    pub warnings: Vec<String>,
}

impl StartupConfig {
    pub fn settings(&self) -> impl Iterator<Item = (&str, &RawSettingValue)> {
        self.file.settings.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Best-effort config path following platform conventions (XDG / AppData
/// Roaming), preferring a working-directory file if present.
pub fn discover() -> PathBuf {
    let local = PathBuf::from("oxidized.toml");
    if local.exists() {
        return local;
    }
    if let Some(dir) = dirs::config_dir() {
        return dir.join("oxidized").join("oxidized.toml");
    }
    PathBuf::from("oxidized.toml")
}

pub fn load_from(path: Option<PathBuf>) -> Result<StartupConfig> {
    let path = path.unwrap_or_else(discover);
    let Ok(content) = fs::read_to_string(&path) else {
        return Ok(StartupConfig::default());
    };
    match toml::from_str::<ConfigFile>(&content) {
        Ok(file) => Ok(StartupConfig {
            file,
            warnings: Vec::new(),
        }),
        Err(e) => {
            warn!(target: "config", path = %path.display(), error = %e, "config_parse_failed_using_defaults");
            Ok(StartupConfig {
                file: ConfigFile::default(),
                warnings: vec![format!("{}: {e}", path.display())],
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_when_missing_file() {
        let cfg = load_from(Some(PathBuf::from("__nonexistent_hopefully__.toml"))).unwrap();
        assert!(cfg.file.settings.is_empty());
        assert!(cfg.warnings.is_empty());
    }

    #[test]
    fn parses_settings_table() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            tmp.path(),
            "[settings]\nnumber = true\ntabstop = 4\nbackspace = \"indent,eol,start\"\n",
        )
        .unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(
            cfg.file.settings.get("number"),
            Some(&RawSettingValue::Bool(true))
        );
        assert_eq!(
            cfg.file.settings.get("tabstop"),
            Some(&RawSettingValue::Int(4))
        );
        assert_eq!(
            cfg.file.settings.get("backspace"),
            Some(&RawSettingValue::Str("indent,eol,start".into()))
        );
    }

    #[test]
    fn malformed_file_falls_back_to_defaults_with_warning() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(tmp.path(), "not valid toml {{{").unwrap();
        let cfg = load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert!(cfg.file.settings.is_empty());
        assert_eq!(cfg.warnings.len(), 1);
    }
}
