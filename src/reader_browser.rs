//! Chrome/Brave browsing history.
//!
//! Reads the `urls` table of a profile's `History` database, newest visit
//! first. The result cap counts only rows that survive the empty title/URL
//! filter, so it is applied while streaming rather than as a SQL `LIMIT`.

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::path::{Path, PathBuf};

use crate::db::with_snapshot;
use crate::error::ReaderError;
use crate::locator::{resolve, HISTORY_FILE};
use crate::metadata;
use crate::models::{truncate_chars, Document};
use crate::timestamp::from_webkit_micros;
use crate::traits::{cap, load_or_empty, ReadContext, Reader};

const HISTORY_QUERY: &str = "\
    SELECT last_visit_time, url, title, visit_count \
    FROM urls \
    ORDER BY last_visit_time DESC";

/// Longest title kept in metadata.
pub const TITLE_MAX_CHARS: usize = 150;

pub struct BrowserHistoryReader {
    ctx: ReadContext,
    profile: Option<PathBuf>,
}

impl BrowserHistoryReader {
    /// `profile` is the configured profile directory, if any.
    pub fn new(ctx: ReadContext, profile: Option<PathBuf>) -> Self {
        Self { ctx, profile }
    }

    fn profile_dir(&self, source: Option<&Path>) -> PathBuf {
        let default = || self.ctx.locator.browser_profile();
        resolve(source, self.profile.as_ref(), default)
    }

    async fn read(
        &self,
        source: Option<&Path>,
        max_count: i64,
    ) -> Result<Vec<Document>, ReaderError> {
        let history = self.profile_dir(source).join(HISTORY_FILE);
        if !history.exists() {
            return Err(ReaderError::SourceNotFound(history));
        }

        let limit = cap(max_count);
        let (scratch, timeout) = (&self.ctx.scratch_dir, self.ctx.timeout);
        with_snapshot(&history, scratch, "browser", timeout, move |conn| {
            Box::pin(async move {
                let mut docs = Vec::new();
                let mut rows = sqlx::query(HISTORY_QUERY).fetch(&mut *conn);
                while let Some(row) = rows.try_next().await? {
                    if limit.is_some_and(|n| docs.len() >= n) {
                        break;
                    }
                    match visit_document(&row) {
                        Ok(Some(doc)) => docs.push(doc),
                        Ok(None) => {}
                        Err(e) => tracing::debug!(error = %e, "skipping unreadable history row"),
                    }
                }
                Ok::<_, ReaderError>(docs)
            })
        })
        .await
    }
}

fn visit_document(row: &SqliteRow) -> Result<Option<Document>, sqlx::Error> {
    let last_visit: Option<i64> = row.try_get("last_visit_time")?;
    let url: Option<String> = row.try_get("url")?;
    let title: Option<String> = row.try_get("title")?;
    let visit_count: Option<i64> = row.try_get("visit_count")?;

    let url = url.filter(|u| !u.is_empty());
    let title = title.filter(|t| !t.is_empty());
    let (Some(url), Some(title)) = (url, title) else {
        return Ok(None);
    };

    let text = format!(
        "\n[Title]: {}\n[URL]: {}\n[Last Visited]: {}\n[Visits]: {}\n",
        title,
        url,
        from_webkit_micros(last_visit.unwrap_or(0)),
        visit_count.unwrap_or(0)
    );

    Ok(Document::new(
        text,
        metadata! {
            "title" => truncate_chars(&title, TITLE_MAX_CHARS),
            "url" => url,
        },
    ))
}

#[async_trait]
impl Reader for BrowserHistoryReader {
    fn name(&self) -> &str {
        "browser"
    }

    fn description(&self) -> &str {
        "Chrome/Brave browsing history"
    }

    fn default_source(&self) -> Option<PathBuf> {
        Some(self.profile_dir(None).join(HISTORY_FILE))
    }

    async fn load(&self, source: Option<&Path>, max_count: i64) -> Vec<Document> {
        load_or_empty(self.name(), self.read(source, max_count)).await
    }
}
