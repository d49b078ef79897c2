//! TOML configuration.
//!
//! Every section is optional; an empty file (or [`Config::minimal`]) reads
//! every source from its default location with default limits.
//!
//! ```toml
//! [paths]
//! home = "/Users/alice"
//! scratch_dir = "/tmp/ctx-read"
//!
//! [load]
//! max_count = 1000
//! timeout_secs = 60
//!
//! [readers.imessage]
//! concatenate_conversations = true
//!
//! [readers.wechat]
//! export_dir = "/Users/alice/wechat-export"
//! concatenate_messages = false
//!
//! [readers.slack]
//! mcp_server_command = "slack-mcp-server"
//! workspace_name = "acme"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub load: LoadConfig,
    #[serde(default)]
    pub readers: ReadersConfig,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PathsConfig {
    /// Home directory used to resolve default source paths.
    #[serde(default)]
    pub home: Option<PathBuf>,
    /// Where snapshot copies are created. Defaults to the system temp dir.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

impl PathsConfig {
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir.clone().unwrap_or_else(std::env::temp_dir)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoadConfig {
    /// Default result cap when the caller gives none. `<= 0` is unlimited.
    #[serde(default = "default_max_count")]
    pub max_count: i64,
    /// Deadline for the copy + query phase of a single load.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            max_count: default_max_count(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LoadConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_max_count() -> i64 {
    1000
}
fn default_timeout_secs() -> u64 {
    60
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ReadersConfig {
    #[serde(default)]
    pub browser: BrowserReaderConfig,
    #[serde(default)]
    pub imessage: IMessageReaderConfig,
    #[serde(default)]
    pub mail: MailReaderConfig,
    #[serde(default)]
    pub calendar: CalendarReaderConfig,
    #[serde(default)]
    pub wechat: WeChatReaderConfig,
    pub slack: Option<SlackReaderConfig>,
    pub twitter: Option<TwitterReaderConfig>,
    pub chatgpt: Option<ExportReaderConfig>,
    pub claude: Option<ExportReaderConfig>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct BrowserReaderConfig {
    /// Browser profile directory containing `History`.
    #[serde(default)]
    pub profile: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IMessageReaderConfig {
    /// Directory containing `chat.db`.
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub concatenate_conversations: bool,
}

impl Default for IMessageReaderConfig {
    fn default() -> Self {
        Self {
            dir: None,
            concatenate_conversations: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct MailReaderConfig {
    /// Path of the `Envelope Index` database.
    #[serde(default)]
    pub envelope_index: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CalendarReaderConfig {
    /// Path of the `Calendar Cache` database.
    #[serde(default)]
    pub cache: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WeChatReaderConfig {
    /// Directory of per-contact `*.json` exports. No default exists.
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
    #[serde(default = "default_true")]
    pub concatenate_messages: bool,
}

impl Default for WeChatReaderConfig {
    fn default() -> Self {
        Self {
            export_dir: None,
            concatenate_messages: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct SlackReaderConfig {
    pub mcp_server_command: String,
    #[serde(default)]
    pub workspace_name: Option<String>,
    #[serde(default = "default_true")]
    pub concatenate_conversations: bool,
    #[serde(default)]
    pub channels: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TwitterReaderConfig {
    pub mcp_server_command: String,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ExportReaderConfig {
    #[serde(default)]
    pub export_path: Option<PathBuf>,
}

impl Config {
    /// Configuration used when no config file is present.
    pub fn minimal() -> Self {
        Self::default()
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    if config.load.timeout_secs == 0 {
        anyhow::bail!("load.timeout_secs must be > 0");
    }

    if let Some(slack) = &config.readers.slack {
        if slack.mcp_server_command.trim().is_empty() {
            anyhow::bail!("readers.slack.mcp_server_command must not be empty");
        }
    }
    if let Some(twitter) = &config.readers.twitter {
        if twitter.mcp_server_command.trim().is_empty() {
            anyhow::bail!("readers.twitter.mcp_server_command must not be empty");
        }
    }

    Ok(config)
}
