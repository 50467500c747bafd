use anyhow::{Context, Result};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{UNDO_WINDOW_SECS, folders};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub undo: UndoConfig,
    #[serde(default)]
    pub board: BoardConfig,
    #[serde(default)]
    pub ui: UiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UndoConfig {
    /// Seconds a destructive action stays undoable before it is committed
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

impl Default for UndoConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
        }
    }
}

impl UndoConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Folder ids shown as columns, left to right
    #[serde(default = "default_columns")]
    pub columns: Vec<String>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            columns: default_columns(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            date_format: default_date_format(),
        }
    }
}

fn default_window_secs() -> u64 {
    UNDO_WINDOW_SECS
}

fn default_columns() -> Vec<String> {
    vec![
        folders::INBOX.to_string(),
        folders::ARCHIVE.to_string(),
        folders::TRASH.to_string(),
    ]
}

fn default_date_format() -> String {
    "%b %d".to_string()
}

impl Config {
    pub fn config_dir() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("Could not find config directory")?
            .join("colmail");
        Ok(dir)
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.board.columns.is_empty() {
            anyhow::bail!("board.columns must name at least one folder");
        }
        if let Some(dup) = self
            .board
            .columns
            .iter()
            .enumerate()
            .find_map(|(i, c)| self.board.columns[..i].contains(c).then_some(c))
        {
            anyhow::bail!("board.columns lists '{}' twice", dup);
        }
        if StrftimeItems::new(&self.ui.date_format).any(|item| matches!(item, Item::Error)) {
            anyhow::bail!(
                "ui.date_format '{}' is not a valid strftime format",
                self.ui.date_format
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.undo.window(), Duration::from_secs(UNDO_WINDOW_SECS));
        assert_eq!(config.board.columns, vec!["inbox", "archive", "trash"]);
        assert_eq!(config.ui.date_format, "%b %d");
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[undo]\nwindow_secs = 10").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.undo.window_secs, 10);
        assert_eq!(config.board.columns.len(), 3);
    }

    #[test]
    fn test_custom_columns() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[board]\ncolumns = [\"inbox\", \"spam\"]").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.board.columns, vec!["inbox", "spam"]);
    }

    #[test]
    fn test_invalid_columns_rejected() {
        let mut empty = tempfile::NamedTempFile::new().unwrap();
        writeln!(empty, "[board]\ncolumns = []").unwrap();
        assert!(Config::load_from(empty.path()).is_err());

        let mut dup = tempfile::NamedTempFile::new().unwrap();
        writeln!(dup, "[board]\ncolumns = [\"inbox\", \"inbox\"]").unwrap();
        assert!(Config::load_from(dup.path()).is_err());
    }

    #[test]
    fn test_invalid_date_format_rejected() {
        let mut bad = tempfile::NamedTempFile::new().unwrap();
        writeln!(bad, "[ui]\ndate_format = \"%Q\"").unwrap();
        let err = Config::load_from(bad.path()).unwrap_err();
        assert!(err.to_string().contains("date_format"));

        let mut good = tempfile::NamedTempFile::new().unwrap();
        writeln!(good, "[ui]\ndate_format = \"%Y-%m-%d %H:%M\"").unwrap();
        assert_eq!(
            Config::load_from(good.path()).unwrap().ui.date_format,
            "%Y-%m-%d %H:%M"
        );
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[undo\nwindow_secs = ").unwrap();
        assert!(Config::load_from(file.path()).is_err());
    }
}
