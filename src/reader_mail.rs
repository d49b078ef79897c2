//! Apple Mail `Envelope Index` reader.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::path::{Path, PathBuf};

use crate::db::with_snapshot;
use crate::error::ReaderError;
use crate::locator::resolve;
use crate::metadata;
use crate::models::Document;
use crate::timestamp::{from_mail_date_sent, UNKNOWN};
use crate::traits::{load_or_empty, ReadContext, Reader};

// SQLite treats a negative LIMIT as "no limit".
const MAIL_QUERY: &str = "\
    SELECT \
        CAST(m.subject AS TEXT) AS subject, \
        CAST(m.sender AS TEXT) AS sender, \
        CAST(m.date_sent AS INTEGER) AS date_sent, \
        s.snippet AS snippet \
    FROM messages m \
    LEFT JOIN message_snippets s ON m.ROWID = s.message_id \
    ORDER BY m.date_sent DESC \
    LIMIT ?";

pub struct MailReader {
    ctx: ReadContext,
    envelope_index: Option<PathBuf>,
}

impl MailReader {
    pub fn new(ctx: ReadContext, envelope_index: Option<PathBuf>) -> Self {
        Self {
            ctx,
            envelope_index,
        }
    }

    fn index_path(&self, source: Option<&Path>) -> PathBuf {
        let default = || self.ctx.locator.mail_envelope_index();
        resolve(source, self.envelope_index.as_ref(), default)
    }

    async fn read(
        &self,
        source: Option<&Path>,
        max_count: i64,
    ) -> Result<Vec<Document>, ReaderError> {
        let index = self.index_path(source);
        if !index.exists() {
            return Err(ReaderError::SourceNotFound(index));
        }

        let limit = if max_count > 0 { max_count } else { -1 };
        let (scratch, timeout) = (&self.ctx.scratch_dir, self.ctx.timeout);
        with_snapshot(&index, scratch, "mail", timeout, move |conn| {
            Box::pin(async move {
                let rows = sqlx::query(MAIL_QUERY)
                    .bind(limit)
                    .fetch_all(&mut *conn)
                    .await?;
                let mut docs = Vec::with_capacity(rows.len());
                for row in &rows {
                    match mail_document(row) {
                        Ok(Some(doc)) => docs.push(doc),
                        Ok(None) => {}
                        Err(e) => tracing::debug!(error = %e, "skipping unreadable mail row"),
                    }
                }
                Ok::<_, ReaderError>(docs)
            })
        })
        .await
    }
}

fn mail_document(row: &SqliteRow) -> Result<Option<Document>, sqlx::Error> {
    let subject: Option<String> = row.try_get("subject")?;
    let sender: Option<String> = row.try_get("sender")?;
    let date_sent: Option<i64> = row.try_get("date_sent")?;
    let snippet: Option<String> = row.try_get("snippet")?;

    let subject = subject.unwrap_or_default();
    let sender = sender.unwrap_or_default();
    let snippet = snippet.unwrap_or_default();
    if subject.is_empty() && snippet.is_empty() {
        return Ok(None);
    }

    let text = format!(
        "Subject: {}\nFrom: {}\nDate: {}\n\n{}",
        or_unknown(&subject),
        or_unknown(&sender),
        from_mail_date_sent(date_sent),
        snippet
    );

    Ok(Document::new(
        text,
        metadata! {
            "subject" => subject,
            "sender" => sender,
        },
    ))
}

fn or_unknown(value: &str) -> &str {
    match value {
        "" => UNKNOWN,
        other => other,
    }
}

#[async_trait]
impl Reader for MailReader {
    fn name(&self) -> &str {
        "mail"
    }

    fn description(&self) -> &str {
        "Apple Mail subjects, senders and previews"
    }

    fn default_source(&self) -> Option<PathBuf> {
        Some(self.index_path(None))
    }

    async fn load(&self, source: Option<&Path>, max_count: i64) -> Vec<Document> {
        load_or_empty(self.name(), self.read(source, max_count)).await
    }
}
