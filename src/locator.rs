//! Default on-disk locations of each personal-data source.
//!
//! The locator is built once from configuration and handed to every reader,
//! so no reader looks up the home directory on its own.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::PathsConfig;

/// Name of the history database inside a browser profile directory.
pub const HISTORY_FILE: &str = "History";
/// Name of the messages database inside the Messages directory.
pub const CHAT_DB_FILE: &str = "chat.db";
/// Name of the mail index inside a `MailData` directory.
pub const ENVELOPE_INDEX_FILE: &str = "Envelope Index";

/// Mail data versions to try, newest first.
const MAIL_VERSIONS: [&str; 2] = ["V10", "V9"];

/// Resolves default source paths relative to a home directory.
#[derive(Debug, Clone)]
pub struct SourceLocator {
    home: PathBuf,
}

impl SourceLocator {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// Use `paths.home` if configured, otherwise the current user's home.
    pub fn from_config(paths: &PathsConfig) -> Self {
        let home = paths
            .home
            .clone()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(home)
    }

    /// Default Chrome profile directory.
    pub fn browser_profile(&self) -> PathBuf {
        self.home
            .join("Library/Application Support/Google/Chrome/Default")
    }

    /// Directory holding `chat.db`.
    pub fn messages_dir(&self) -> PathBuf {
        self.home.join("Library/Messages")
    }

    /// The newest mail index that exists, or the newest candidate when none do.
    pub fn mail_envelope_index(&self) -> PathBuf {
        let candidates: Vec<PathBuf> = MAIL_VERSIONS
            .iter()
            .map(|v| {
                self.home
                    .join("Library/Mail")
                    .join(v)
                    .join("MailData")
                    .join(ENVELOPE_INDEX_FILE)
            })
            .collect();
        candidates
            .iter()
            .find(|p| p.exists())
            .unwrap_or(&candidates[0])
            .clone()
    }

    pub fn calendar_cache(&self) -> PathBuf {
        self.home.join("Library/Calendars/Calendar Cache")
    }

    /// Browser base directories present on this machine, keyed by browser.
    pub fn find_browser_paths(&self) -> BTreeMap<String, PathBuf> {
        let support = self.home.join("Library/Application Support");
        [
            ("chrome", support.join("Google/Chrome")),
            ("brave", support.join("BraveSoftware/Brave-Browser")),
        ]
        .into_iter()
        .filter(|(_, path)| path.exists())
        .map(|(name, path)| (name.to_string(), path))
        .collect()
    }
}

/// Pick the explicit path, then the configured one, then the default.
pub fn resolve(
    explicit: Option<&Path>,
    configured: Option<&PathBuf>,
    default: impl FnOnce() -> PathBuf,
) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| configured.cloned())
        .unwrap_or_else(default)
}
