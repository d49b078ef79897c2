//! The [`Reader`] capability and the registry of configured readers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                  ReaderRegistry                  │
//! │  ┌─────────┐ ┌──────────┐ ┌──────┐ ┌──────────┐  │
//! │  │ browser │ │ imessage │ │ mail │ │ calendar │  │
//! │  └─────────┘ └──────────┘ └──────┘ └──────────┘  │
//! │  ┌─────────┐ ┌──────────────────────────────────┐│
//! │  │ wechat  │ │ slack / twitter / chatgpt/claude ││
//! │  └─────────┘ └──────────────────────────────────┘│
//! └────────────────────────┬─────────────────────────┘
//!                          ▼
//!            load(source?, max_count) → Vec<Document>
//! ```
//!
//! Every reader shares one contract: it never fails. Whole-source errors are
//! logged and produce an empty vector, see [`load_or_empty`].

use async_trait::async_trait;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::Config;
use crate::error::ReaderError;
use crate::locator::SourceLocator;
use crate::models::Document;

/// Converts one personal-data store into documents.
///
/// # Example
///
/// ```rust
/// use async_trait::async_trait;
/// use context_readers::models::Document;
/// use context_readers::traits::Reader;
/// use std::path::Path;
///
/// pub struct NotesReader;
///
/// #[async_trait]
/// impl Reader for NotesReader {
///     fn name(&self) -> &str { "notes" }
///     fn description(&self) -> &str { "Local notes" }
///
///     async fn load(&self, _source: Option<&Path>, _max_count: i64) -> Vec<Document> {
///         Vec::new()
///     }
/// }
/// ```
#[async_trait]
pub trait Reader: Send + Sync {
    /// Short identifier (e.g. `"browser"`, `"imessage"`).
    fn name(&self) -> &str;

    /// One-line description for `ctx-read sources`.
    fn description(&self) -> &str;

    /// Location read when `load` is called without a source, if any.
    fn default_source(&self) -> Option<PathBuf> {
        None
    }

    /// Whether this reader is a placeholder that never produces documents.
    fn is_placeholder(&self) -> bool {
        false
    }

    /// Read the source and return its documents.
    ///
    /// `source` overrides the configured/default location; `max_count <= 0`
    /// means unlimited. Never fails: problems are logged and yield an empty
    /// vector.
    async fn load(&self, source: Option<&Path>, max_count: i64) -> Vec<Document>;
}

/// What every reader needs from its environment.
#[derive(Debug, Clone)]
pub struct ReadContext {
    pub locator: SourceLocator,
    pub scratch_dir: PathBuf,
    pub timeout: Duration,
}

impl ReadContext {
    pub fn new(locator: SourceLocator, scratch: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            locator,
            scratch_dir: scratch.into(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            SourceLocator::from_config(&config.paths),
            config.paths.scratch_dir(),
            config.load.timeout(),
        )
    }
}

/// `Some(n)` for a positive cap, `None` for unlimited.
pub fn cap(max_count: i64) -> Option<usize> {
    (max_count > 0).then_some(max_count as usize)
}

/// Bound `work` by `timeout`.
///
/// Only for work that owns nothing on disk: expiry drops `work` on the spot.
/// Snapshot-backed reads get their deadline from
/// [`with_snapshot`](crate::db::with_snapshot) instead.
pub async fn within<T, F>(timeout: Duration, work: F) -> Result<T, ReaderError>
where
    F: Future<Output = Result<T, ReaderError>>,
{
    match tokio::time::timeout(timeout, work).await {
        Ok(result) => result,
        Err(_) => Err(ReaderError::Timeout(timeout)),
    }
}

/// Collapse every failure of a reader's work into an empty result.
pub async fn load_or_empty<F>(reader: &str, work: F) -> Vec<Document>
where
    F: Future<Output = Result<Vec<Document>, ReaderError>>,
{
    match work.await {
        Ok(docs) => {
            tracing::info!(reader, documents = docs.len(), "load finished");
            docs
        }
        Err(e) if e.is_missing_source() => {
            tracing::warn!(reader, "{}", e);
            Vec::new()
        }
        Err(e) => {
            tracing::error!(reader, error = %e, "load failed");
            Vec::new()
        }
    }
}

/// Registry of readers built from configuration.
///
/// The five local readers are always present; remote-service readers are
/// added when their section exists in the config.
pub struct ReaderRegistry {
    readers: Vec<Box<dyn Reader>>,
}

impl ReaderRegistry {
    pub fn new() -> Self {
        Self {
            readers: Vec::new(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        use crate::conversation::ConversationMode;
        use crate::reader_browser::BrowserHistoryReader;
        use crate::reader_calendar::CalendarReader;
        use crate::reader_imessage::IMessageReader;
        use crate::reader_mail::MailReader;
        use crate::reader_remote::{ChatGptReader, ClaudeReader, SlackReader, TwitterReader};
        use crate::reader_wechat::WeChatReader;

        let ctx = ReadContext::from_config(config);
        let readers = &config.readers;
        let mut registry = Self::new();

        registry.register(Box::new(BrowserHistoryReader::new(
            ctx.clone(),
            readers.browser.profile.clone(),
        )));
        registry.register(Box::new(IMessageReader::new(
            ctx.clone(),
            readers.imessage.dir.clone(),
            ConversationMode::from_concatenate(readers.imessage.concatenate_conversations),
        )));
        registry.register(Box::new(MailReader::new(
            ctx.clone(),
            readers.mail.envelope_index.clone(),
        )));
        registry.register(Box::new(CalendarReader::new(
            ctx.clone(),
            readers.calendar.cache.clone(),
        )));
        registry.register(Box::new(WeChatReader::new(
            ctx,
            readers.wechat.export_dir.clone(),
            ConversationMode::from_concatenate(readers.wechat.concatenate_messages),
        )));

        if let Some(cfg) = &readers.slack {
            registry.register(Box::new(SlackReader::new(cfg.clone())));
        }
        if let Some(cfg) = &readers.twitter {
            registry.register(Box::new(TwitterReader::new(cfg.clone())));
        }
        if let Some(cfg) = &readers.chatgpt {
            registry.register(Box::new(ChatGptReader::new(cfg.export_path.clone())));
        }
        if let Some(cfg) = &readers.claude {
            registry.register(Box::new(ClaudeReader::new(cfg.export_path.clone())));
        }

        registry
    }

    pub fn register(&mut self, reader: Box<dyn Reader>) {
        self.readers.push(reader);
    }

    pub fn readers(&self) -> &[Box<dyn Reader>] {
        &self.readers
    }

    /// Find a reader by name.
    pub fn find(&self, name: &str) -> Option<&dyn Reader> {
        self.readers
            .iter()
            .find(|r| r.name() == name)
            .map(|r| r.as_ref())
    }

    /// Load every registered reader from its default source concurrently.
    pub async fn load_all(&self, max_count: i64) -> Vec<(String, Vec<Document>)> {
        let loads = self.readers.iter().map(|reader| async move {
            let docs = reader.load(None, max_count).await;
            (reader.name().to_string(), docs)
        });
        futures::future::join_all(loads).await
    }

    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.readers.len()
    }
}

impl Default for ReaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
