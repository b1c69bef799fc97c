use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "twitter-daily-report";
const CONFIG_ENV: &str = "POST_FEED_CONFIG";

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub accounts: Vec<String>,

    #[serde(default = "default_days_back")]
    pub days_back: u32,

    #[serde(rename = "dataDir", default)]
    pub data_dir: Option<PathBuf>,

    #[serde(default)]
    pub browser: BrowserSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserSettings {
    pub executable: Option<PathBuf>,

    #[serde(default = "default_headless")]
    pub headless: bool,

    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_viewport_width")]
    pub viewport_width: u32,

    #[serde(default = "default_viewport_height")]
    pub viewport_height: u32,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            executable: None,
            headless: default_headless(),
            navigation_timeout_ms: default_navigation_timeout_ms(),
            settle_ms: default_settle_ms(),
            user_agent: default_user_agent(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
        }
    }
}

impl BrowserSettings {
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    pub fn settle_interval(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}

fn default_days_back() -> u32 {
    1
}

fn default_headless() -> bool {
    true
}

fn default_navigation_timeout_ms() -> u64 {
    30_000
}

fn default_settle_ms() -> u64 {
    3_000
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_viewport_width() -> u32 {
    1280
}

fn default_viewport_height() -> u32 {
    800
}

impl Config {
    /// Load the configuration, resolving its location when no explicit path is given
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => Self::locate()?,
        };

        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_json(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("Config is not valid JSON for this tool")
    }

    /// Output directory, falling back to the local data dir
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(dirs::data_local_dir()
                .context("Could not determine local data directory")?
                .join(APP_DIR)
                .join("twitter-data")),
        }
    }

    fn locate() -> Result<PathBuf> {
        Self::try_load_dotenv();

        if let Ok(path) = env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }

        let mut candidates = vec![PathBuf::from("config").join(format!("{}.json", APP_DIR))];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join(APP_DIR).join("config.json"));
        }

        candidates
            .iter()
            .find(|path| path.exists())
            .cloned()
            .with_context(|| {
                format!(
                    "No config file found.\n\n\
                    Pass --config <path>, set {} or create one of:\n  {}",
                    CONFIG_ENV,
                    candidates
                        .iter()
                        .map(|p| p.display().to_string())
                        .collect::<Vec<_>>()
                        .join("\n  ")
                )
            })
    }

    fn try_load_dotenv() {
        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/twitter-daily-report/.env
        if let Some(config_dir) = dirs::config_dir() {
            let env_path = config_dir.join(APP_DIR).join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_minimal_config() {
        let config = Config::from_json(r#"{"accounts": ["alice", "bob"]}"#).unwrap();

        assert_eq!(config.accounts, vec!["alice", "bob"]);
        assert_eq!(config.days_back, 1);
        assert!(config.data_dir.is_none());
        assert!(config.browser.headless);
        assert_eq!(config.browser.navigation_timeout(), Duration::from_secs(30));
        assert_eq!(config.browser.settle_interval(), Duration::from_secs(3));
        assert_eq!(config.browser.viewport_width, 1280);
        assert_eq!(config.browser.viewport_height, 800);
        assert_eq!(config.browser.user_agent, DEFAULT_USER_AGENT);
    }

    #[test]
    fn reads_data_dir_and_ignores_unknown_sections() {
        let config = Config::from_json(
            r#"{
                "accounts": ["alice"],
                "days_back": 3,
                "dataDir": "/tmp/feeds",
                "email": {"recipient": "someone@example.com"},
                "browser": {"headless": false, "settleMs": 500}
            }"#,
        )
        .unwrap();

        assert_eq!(config.days_back, 3);
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/feeds"));
        assert!(!config.browser.headless);
        assert_eq!(config.browser.settle_ms, 500);
        assert_eq!(config.browser.navigation_timeout_ms, 30_000);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(Config::from_json("{ accounts: ").is_err());
        assert!(Config::from_json(r#"{"days_back": "three"}"#).is_err());
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = Config::from_path(Path::new("/nonexistent/config.json")).unwrap_err();
        assert!(err.to_string().contains("Config file not found"));
    }
}
