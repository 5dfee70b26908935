use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default page size for every paginated list
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// Application configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the forum REST API
    pub api_url: String,

    /// Items per page in thread and post lists
    pub page_size: usize,

    /// Timeout for a single API request
    pub request_timeout_secs: u64,

    /// Directory for the log file
    pub data_dir: PathBuf,

    /// Whether the TUI captures mouse clicks
    pub mouse_enabled: bool,

    /// File the configuration was read from, if any
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

/// Configuration as read from a file, every field optional
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FileConfig {
    pub api_url: Option<String>,
    pub page_size: Option<usize>,
    pub request_timeout_secs: Option<u64>,
    pub data_dir: Option<PathBuf>,
    pub mouse_enabled: Option<bool>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:3000/api".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout_secs: 15,
            data_dir: dirs::data_dir()
                .map(|dir| dir.join("forumterm"))
                .unwrap_or_else(|| PathBuf::from("./data")),
            mouse_enabled: true,
            source: None,
        }
    }
}

impl Config {
    /// Initialize configuration from environment and config files
    pub async fn init() -> Result<Self> {
        Self::load(&Self::config_paths(), |key| std::env::var(key).ok()).await
    }

    /// Defaults, then environment, then the first existing file in `paths`.
    /// Runs before logging is set up, so the chosen file is recorded in
    /// `source` for the caller to report.
    pub async fn load<F>(paths: &[PathBuf], lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        config.load_from_env(lookup);

        if let Some((path, file_config)) = Self::load_from_file(paths).await? {
            config.merge_with(file_config);
            config.source = Some(path);
        }

        Ok(config)
    }

    /// Apply `FORUMTERM_*` variables. `lookup` is usually `std::env::var`.
    pub fn load_from_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("FORUMTERM_API_URL") {
            self.api_url = url;
        }

        if let Some(size) = lookup("FORUMTERM_PAGE_SIZE").and_then(|s| s.parse().ok()) {
            self.page_size = size;
        }

        if let Some(secs) = lookup("FORUMTERM_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            self.request_timeout_secs = secs;
        }

        if let Some(dir) = lookup("FORUMTERM_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }

        if let Some(mouse) = lookup("FORUMTERM_MOUSE") {
            self.mouse_enabled = mouse.to_lowercase() == "true";
        }
    }

    /// Candidate configuration files, highest priority first
    pub fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![
            PathBuf::from("./.forumterm.json"),
            PathBuf::from("./forumterm.json"),
        ];

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("forumterm").join("forumterm.json"));
        }

        paths
    }

    /// Read the first existing file among `paths`
    pub async fn load_from_file(paths: &[PathBuf]) -> Result<Option<(PathBuf, FileConfig)>> {
        for path in paths {
            if path.exists() {
                let content = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?;
                let config: FileConfig = serde_json::from_str(&content)
                    .with_context(|| format!("Invalid configuration in {}", path.display()))?;
                return Ok(Some((path.clone(), config)));
            }
        }

        Ok(None)
    }

    /// Merge values present in a file over this configuration
    pub fn merge_with(&mut self, other: FileConfig) {
        if let Some(api_url) = other.api_url {
            self.api_url = api_url;
        }
        if let Some(page_size) = other.page_size {
            self.page_size = page_size;
        }
        if let Some(secs) = other.request_timeout_secs {
            self.request_timeout_secs = secs;
        }
        if let Some(data_dir) = other.data_dir {
            self.data_dir = data_dir;
        }
        if let Some(mouse) = other.mouse_enabled {
            self.mouse_enabled = mouse;
        }
    }

    /// Create the data directory if needed and return the log file path
    pub fn ensure_log_file(&self) -> Result<PathBuf> {
        ensure_dir(&self.data_dir)?;
        Ok(self.data_dir.join("forumterm.log"))
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "api_url must start with http:// or https:// (got '{}'). Set FORUMTERM_API_URL or pass --api-url.",
                self.api_url
            ));
        }

        if !(1..=100).contains(&self.page_size) {
            return Err(anyhow::anyhow!("page_size must be between 1 and 100"));
        }

        if self.request_timeout_secs == 0 {
            return Err(anyhow::anyhow!("request_timeout_secs must be greater than 0"));
        }

        Ok(())
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create data directory {}", dir.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert_eq!(config.page_size, DEFAULT_PAGE_SIZE);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FORUMTERM_API_URL", "https://forum.example/api"),
            ("FORUMTERM_PAGE_SIZE", "25"),
            ("FORUMTERM_TIMEOUT_SECS", "not-a-number"),
            ("FORUMTERM_MOUSE", "FALSE"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.load_from_env(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.api_url, "https://forum.example/api");
        assert_eq!(config.page_size, 25);
        assert_eq!(config.request_timeout_secs, 15);
        assert!(!config.mouse_enabled);
    }

    #[tokio::test]
    async fn test_first_existing_file_wins() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let first = dir.path().join("first.json");
        let second = dir.path().join("second.json");
        std::fs::write(&first, r#"{"page_size": 20}"#).unwrap();
        std::fs::write(&second, r#"{"page_size": 50}"#).unwrap();

        let (path, loaded) = Config::load_from_file(&[missing, first.clone(), second])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(path, first);
        assert_eq!(loaded.page_size, Some(20));
        assert_eq!(loaded.api_url, None);

        let mut config = Config::default();
        config.merge_with(loaded);
        assert_eq!(config.page_size, 20);
        assert_eq!(config.api_url, Config::default().api_url);
    }

    #[tokio::test]
    async fn test_load_records_the_chosen_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        let found = dir.path().join("forumterm.json");
        std::fs::write(&found, r#"{"api_url": "https://file.example/api"}"#).unwrap();

        let config = Config::load(&[missing.clone(), found.clone()], |key| {
            (key == "FORUMTERM_PAGE_SIZE").then(|| "30".to_string())
        })
        .await
        .unwrap();
        assert_eq!(config.source, Some(found));
        assert_eq!(config.api_url, "https://file.example/api");
        assert_eq!(config.page_size, 30);

        let config = Config::load(&[missing], |_| None).await.unwrap();
        assert_eq!(config.source, None);
        assert_eq!(config, Config::default());
    }

    #[tokio::test]
    async fn test_invalid_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{ not json").unwrap();

        assert!(Config::load_from_file(&[path]).await.is_err());
    }

    #[test]
    fn test_validation_errors() {
        let mut config = Config {
            api_url: "localhost:3000".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        config.api_url = "http://localhost:3000".to_string();
        config.page_size = 0;
        assert!(config.validate().is_err());

        config.page_size = 10;
        config.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ensure_log_file_creates_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            data_dir: dir.path().join("nested").join("data"),
            ..Config::default()
        };

        let log_file = config.ensure_log_file().unwrap();
        assert!(config.data_dir.is_dir());
        assert_eq!(log_file.file_name().unwrap(), "forumterm.log");
    }
}
