use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";
pub const BACKEND_URL_ENV: &str = "COLLEGEGPT_BACKEND_URL";

/// Main application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base address of the chat backend
    pub backend_url: String,

    /// Ask the backend to retrieve document context for each query
    pub use_rag: bool,

    /// Connect timeout in seconds. Reads are never timed out.
    pub connect_timeout_secs: u64,

    /// Directory the TUI writes its log file into
    pub log_dir: PathBuf,

    /// UI preferences
    pub ui: UiConfig,
}

/// UI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub show_timestamps: bool,
    pub sidebar_width: u16,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_timestamps: true,
            sidebar_width: 28,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            use_rag: true,
            connect_timeout_secs: 10,
            log_dir: Self::home_dir().join("logs"),
            ui: UiConfig::default(),
        }
    }
}

impl Config {
    /// `~/.collegegpt`, falling back to the working directory when no home exists
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".collegegpt")
    }

    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Load configuration from `path` (or the default location) and apply
    /// the backend URL environment override.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_path);

        let mut config = Self::load_file(&config_path)?;

        if let Ok(url) = std::env::var(BACKEND_URL_ENV) {
            config.set_backend_url(&url);
        }

        Ok(config)
    }

    /// Read a config file; a missing file yields the defaults
    pub fn load_file(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            toml::from_str::<Config>(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        } else {
            Config::default()
        };

        config.backend_url = normalize_base_url(&config.backend_url);
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    pub fn set_backend_url(&mut self, url: &str) {
        self.backend_url = normalize_base_url(url);
    }
}

/// Strip whitespace and trailing slashes so endpoint paths can be appended
pub fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        DEFAULT_BACKEND_URL.to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_file(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.backend_url, DEFAULT_BACKEND_URL);
        assert!(config.use_rag);
        assert_eq!(config.connect_timeout_secs, 10);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "backend_url = \"http://rag.internal:9000/\"\nuse_rag = false\n\n[ui]\nshow_timestamps = false\n",
        )
        .unwrap();

        let config = Config::load_file(&path).unwrap();
        assert_eq!(config.backend_url, "http://rag.internal:9000");
        assert!(!config.use_rag);
        assert!(!config.ui.show_timestamps);
        assert_eq!(config.ui.sidebar_width, 28);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "backend_url = [").unwrap();

        let err = Config::load_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn save_then_load_preserves_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.set_backend_url("http://10.0.0.5:8000");
        config.use_rag = false;
        config.save(&path).unwrap();

        assert_eq!(Config::load_file(&path).unwrap(), config);
    }

    #[test]
    fn normalizes_base_urls() {
        assert_eq!(normalize_base_url("http://host:8000///"), "http://host:8000");
        assert_eq!(normalize_base_url("  "), DEFAULT_BACKEND_URL);
    }
}
