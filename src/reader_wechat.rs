//! WeChat chat-export reader.
//!
//! An export directory holds one `<contact>.json` file per conversation, each
//! a JSON array of message objects:
//!
//! ```json
//! [
//!   { "content": "wxid_abc: see you at 6", "createTime": 1700000000, "isSentFromSelf": false },
//!   { "content": { "title": "Shared link", "text": "read this" }, "isSentFromSelf": true }
//! ]
//! ```
//!
//! Files are processed in filename order. A file that cannot be read or
//! parsed is logged and skipped.

use async_trait::async_trait;
use globset::{Glob, GlobMatcher};
use serde_json::Value;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::conversation::ConversationMode;
use crate::error::ReaderError;
use crate::metadata;
use crate::models::Document;
use crate::sanitize::{is_text_message, readable_text};
use crate::timestamp::from_unix_seconds;
use crate::traits::{cap, load_or_empty, within, ReadContext, Reader};

const EXPORT_PATTERN: &str = "*.json";

pub struct WeChatReader {
    ctx: ReadContext,
    export_dir: Option<PathBuf>,
    mode: ConversationMode,
}

impl WeChatReader {
    pub fn new(ctx: ReadContext, export_dir: Option<PathBuf>, mode: ConversationMode) -> Self {
        Self {
            ctx,
            export_dir,
            mode,
        }
    }

    async fn read(
        &self,
        source: Option<&Path>,
        max_count: i64,
    ) -> Result<Vec<Document>, ReaderError> {
        let dir = source
            .map(Path::to_path_buf)
            .or_else(|| self.export_dir.clone())
            .ok_or(ReaderError::NotConfigured("wechat"))?;
        if !dir.is_dir() {
            return Err(ReaderError::SourceNotFound(dir));
        }

        let limit = cap(max_count);
        let mut docs = Vec::new();

        for path in export_files(&dir)? {
            if limit.is_some_and(|n| docs.len() >= n) {
                break;
            }

            let contact = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();

            let lines = match read_export(&path).await {
                Ok(lines) => lines,
                Err(e) => {
                    tracing::warn!(
                        file = %path.display(),
                        error = %e,
                        "skipping unreadable export file"
                    );
                    continue;
                }
            };
            if lines.is_empty() {
                continue;
            }

            match self.mode {
                ConversationMode::Concatenated => {
                    let text = format!("Contact: {}\n\n{}", contact, lines.join("\n"));
                    docs.extend(Document::new(text, metadata! { "contact_name" => contact }));
                }
                ConversationMode::Individual => {
                    for line in lines {
                        if limit.is_some_and(|n| docs.len() >= n) {
                            break;
                        }
                        docs.extend(Document::new(line, metadata! { "contact_name" => contact }));
                    }
                }
            }
        }

        Ok(docs)
    }
}

/// Top-level `*.json` files of `dir`, sorted by file name.
fn export_files(dir: &Path) -> Result<Vec<PathBuf>, ReaderError> {
    let matcher: GlobMatcher = Glob::new(EXPORT_PATTERN)?.compile_matcher();
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if entry.file_type().is_file() && matcher.is_match(entry.file_name()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}

/// Errors for a single export file; the file is skipped.
#[derive(Debug, thiserror::Error)]
enum ExportFileError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a JSON message list: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parse one export file into rendered `(time) [Me|Contact]: text` lines.
async fn read_export(path: &Path) -> Result<Vec<String>, ExportFileError> {
    let raw = tokio::fs::read_to_string(path).await?;
    let messages: Vec<Value> = serde_json::from_str(&raw)?;
    Ok(messages.iter().filter_map(render_message).collect())
}

/// Render a qualifying message, or `None` when it carries no text.
pub fn render_message(message: &Value) -> Option<String> {
    let fields = message.as_object()?;
    let content = fields.get("content").unwrap_or(&Value::Null);
    if !is_text_message(content) {
        return None;
    }

    let mut text = readable_text(content);
    if text.is_empty() {
        text = fields
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
    }
    if text.trim().is_empty() {
        return None;
    }

    let created = fields
        .get("createTime")
        .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
        .unwrap_or(0);
    let from_self = fields.get("isSentFromSelf").is_some_and(flag_set);
    let sender = if from_self { "[Me]" } else { "[Contact]" };

    Some(format!("({}) {}: {}", from_unix_seconds(created), sender, text))
}

/// Older exports store flags as 0/1 instead of booleans.
fn flag_set(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        other => other.as_i64().is_some_and(|n| n != 0),
    }
}

#[async_trait]
impl Reader for WeChatReader {
    fn name(&self) -> &str {
        "wechat"
    }

    fn description(&self) -> &str {
        "WeChat chat history exported as JSON"
    }

    fn default_source(&self) -> Option<PathBuf> {
        self.export_dir.clone()
    }

    async fn load(&self, source: Option<&Path>, max_count: i64) -> Vec<Document> {
        let work = within(self.ctx.timeout, self.read(source, max_count));
        load_or_empty(self.name(), work).await
    }
}
