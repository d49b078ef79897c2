//! Messages (`chat.db`) reader.
//!
//! Joins messages with their chat and sender handle, then renders them either
//! as one document per conversation or one per message.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::conversation::{self, contact_label, ConversationMode, Message};
use crate::db::with_snapshot;
use crate::error::ReaderError;
use crate::locator::{resolve, CHAT_DB_FILE};
use crate::models::Document;
use crate::timestamp::from_apple_nanos;
use crate::traits::{cap, load_or_empty, ReadContext, Reader};

const MESSAGES_QUERY: &str = "\
    SELECT \
        m.ROWID AS message_id, \
        m.text AS text, \
        m.date AS date, \
        m.is_from_me AS is_from_me, \
        m.service AS service, \
        c.chat_identifier AS chat_identifier, \
        c.display_name AS chat_display_name, \
        h.id AS handle_id, \
        c.ROWID AS chat_id \
    FROM message m \
    LEFT JOIN chat_message_join cmj ON m.ROWID = cmj.message_id \
    LEFT JOIN chat c ON cmj.chat_id = c.ROWID \
    LEFT JOIN handle h ON m.handle_id = h.ROWID \
    WHERE m.text IS NOT NULL AND m.text != '' \
    ORDER BY c.ROWID, m.date";

pub struct IMessageReader {
    ctx: ReadContext,
    dir: Option<PathBuf>,
    mode: ConversationMode,
}

impl IMessageReader {
    /// `dir` is the configured directory holding `chat.db`, if any.
    pub fn new(ctx: ReadContext, dir: Option<PathBuf>, mode: ConversationMode) -> Self {
        Self { ctx, dir, mode }
    }

    fn chat_db(&self, source: Option<&Path>) -> PathBuf {
        let default = || self.ctx.locator.messages_dir();
        resolve(source, self.dir.as_ref(), default).join(CHAT_DB_FILE)
    }

    async fn read(
        &self,
        source: Option<&Path>,
        max_count: i64,
    ) -> Result<Vec<Document>, ReaderError> {
        let chat_db = self.chat_db(source);
        if !chat_db.exists() {
            return Err(ReaderError::SourceNotFound(chat_db));
        }

        let (scratch, timeout) = (&self.ctx.scratch_dir, self.ctx.timeout);
        let messages = read_messages(&chat_db, scratch, timeout).await?;
        tracing::debug!(messages = messages.len(), mode = ?self.mode, "messages read");

        let mut docs = conversation::render(messages, self.mode);
        if let Some(n) = cap(max_count) {
            docs.truncate(n);
        }
        Ok(docs)
    }
}

/// All non-empty messages ordered by chat then date.
pub async fn read_messages(
    chat_db: &Path,
    scratch_dir: &Path,
    timeout: Duration,
) -> Result<Vec<Message>, ReaderError> {
    with_snapshot(chat_db, scratch_dir, "imessage", timeout, |conn| {
        Box::pin(async move {
            let rows = sqlx::query(MESSAGES_QUERY).fetch_all(&mut *conn).await?;
            let messages = rows
                .iter()
                .filter_map(|row| match message_from_row(row) {
                    Ok(message) => Some(message),
                    Err(e) => {
                        tracing::debug!(error = %e, "skipping unreadable message row");
                        None
                    }
                })
                .collect::<Vec<_>>();
            Ok::<_, ReaderError>(messages)
        })
    })
    .await
}

fn message_from_row(row: &SqliteRow) -> Result<Message, sqlx::Error> {
    let handle_id: Option<String> = row.try_get("handle_id")?;
    let handle_id = handle_id.unwrap_or_default();
    let date: Option<i64> = row.try_get("date")?;
    let is_from_me: Option<i64> = row.try_get("is_from_me")?;
    let service: Option<String> = row.try_get("service")?;
    let chat_identifier: Option<String> = row.try_get("chat_identifier")?;
    let chat_display_name: Option<String> = row.try_get("chat_display_name")?;

    Ok(Message {
        id: row.try_get("message_id")?,
        text: row.try_get("text")?,
        timestamp: from_apple_nanos(date.unwrap_or(0)),
        is_from_me: is_from_me.unwrap_or(0) != 0,
        service: non_empty_or(service, "iMessage"),
        chat_identifier: non_empty_or(chat_identifier, "Unknown"),
        chat_display_name: non_empty_or(chat_display_name, "Unknown Chat"),
        contact_name: contact_label(&handle_id),
        handle_id: if handle_id.is_empty() {
            "Unknown".to_string()
        } else {
            handle_id
        },
        chat_id: row.try_get("chat_id")?,
    })
}

fn non_empty_or(value: Option<String>, fallback: &str) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

#[async_trait]
impl Reader for IMessageReader {
    fn name(&self) -> &str {
        "imessage"
    }

    fn description(&self) -> &str {
        "Messages conversations from chat.db"
    }

    fn default_source(&self) -> Option<PathBuf> {
        Some(self.chat_db(None))
    }

    async fn load(&self, source: Option<&Path>, max_count: i64) -> Vec<Document> {
        load_or_empty(self.name(), self.read(source, max_count)).await
    }
}
