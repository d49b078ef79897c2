//! Readers for remote services and third-party chat exports.
//!
//! These keep the [`Reader`] shape so callers can treat every source alike,
//! but they are not implemented yet and always return no documents. Slack and
//! Twitter would talk to an MCP server process; ChatGPT and Claude would parse
//! account export archives.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::config::{SlackReaderConfig, TwitterReaderConfig};
use crate::models::Document;
use crate::traits::Reader;

fn not_implemented(reader: &str) -> Vec<Document> {
    tracing::info!(reader, "reader not yet implemented, returning no documents");
    Vec::new()
}

/// Slack channels through an MCP server.
pub struct SlackReader {
    config: SlackReaderConfig,
}

impl SlackReader {
    pub fn new(config: SlackReaderConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Reader for SlackReader {
    fn name(&self) -> &str {
        "slack"
    }

    fn description(&self) -> &str {
        "Slack channels via MCP (not yet implemented)"
    }

    fn is_placeholder(&self) -> bool {
        true
    }

    async fn load(&self, _source: Option<&Path>, _max_count: i64) -> Vec<Document> {
        tracing::debug!(
            command = %self.config.mcp_server_command,
            workspace = ?self.config.workspace_name,
            channels = self.config.channels.len(),
            concatenate = self.config.concatenate_conversations,
            "slack load requested"
        );
        not_implemented(self.name())
    }
}

/// Twitter bookmarks through an MCP server.
pub struct TwitterReader {
    config: TwitterReaderConfig,
}

impl TwitterReader {
    pub fn new(config: TwitterReaderConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Reader for TwitterReader {
    fn name(&self) -> &str {
        "twitter"
    }

    fn description(&self) -> &str {
        "Twitter bookmarks via MCP (not yet implemented)"
    }

    fn is_placeholder(&self) -> bool {
        true
    }

    async fn load(&self, _source: Option<&Path>, _max_count: i64) -> Vec<Document> {
        tracing::debug!(command = %self.config.mcp_server_command, "twitter load requested");
        not_implemented(self.name())
    }
}

/// ChatGPT account export (`.html` or `.zip`).
pub struct ChatGptReader {
    export_path: Option<PathBuf>,
}

impl ChatGptReader {
    pub fn new(export_path: Option<PathBuf>) -> Self {
        Self { export_path }
    }
}

#[async_trait]
impl Reader for ChatGptReader {
    fn name(&self) -> &str {
        "chatgpt"
    }

    fn description(&self) -> &str {
        "ChatGPT conversation export (not yet implemented)"
    }

    fn is_placeholder(&self) -> bool {
        true
    }

    fn default_source(&self) -> Option<PathBuf> {
        self.export_path.clone()
    }

    async fn load(&self, _source: Option<&Path>, _max_count: i64) -> Vec<Document> {
        not_implemented(self.name())
    }
}

/// Claude account export (`.json` or `.zip`).
pub struct ClaudeReader {
    export_path: Option<PathBuf>,
}

impl ClaudeReader {
    pub fn new(export_path: Option<PathBuf>) -> Self {
        Self { export_path }
    }
}

#[async_trait]
impl Reader for ClaudeReader {
    fn name(&self) -> &str {
        "claude"
    }

    fn description(&self) -> &str {
        "Claude conversation export (not yet implemented)"
    }

    fn is_placeholder(&self) -> bool {
        true
    }

    fn default_source(&self) -> Option<PathBuf> {
        self.export_path.clone()
    }

    async fn load(&self, _source: Option<&Path>, _max_count: i64) -> Vec<Document> {
        not_implemented(self.name())
    }
}
