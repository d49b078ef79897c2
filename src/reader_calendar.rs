//! Apple Calendar `Calendar Cache` reader.

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use std::path::{Path, PathBuf};

use crate::db::with_snapshot;
use crate::error::ReaderError;
use crate::locator::resolve;
use crate::metadata;
use crate::models::Document;
use crate::timestamp::from_apple_seconds;
use crate::traits::{load_or_empty, ReadContext, Reader};

const EVENTS_QUERY: &str = "\
    SELECT \
        summary, \
        description, \
        location, \
        CAST(start_date AS REAL) AS start_date, \
        CAST(end_date AS REAL) AS end_date \
    FROM CI_EVENT \
    ORDER BY start_date DESC \
    LIMIT ?";

pub struct CalendarReader {
    ctx: ReadContext,
    cache: Option<PathBuf>,
}

impl CalendarReader {
    pub fn new(ctx: ReadContext, cache: Option<PathBuf>) -> Self {
        Self { ctx, cache }
    }

    fn cache_path(&self, source: Option<&Path>) -> PathBuf {
        let default = || self.ctx.locator.calendar_cache();
        resolve(source, self.cache.as_ref(), default)
    }

    async fn read(
        &self,
        source: Option<&Path>,
        max_count: i64,
    ) -> Result<Vec<Document>, ReaderError> {
        let cache = self.cache_path(source);
        if !cache.exists() {
            return Err(ReaderError::SourceNotFound(cache));
        }

        let limit = if max_count > 0 { max_count } else { -1 };
        let (scratch, timeout) = (&self.ctx.scratch_dir, self.ctx.timeout);
        with_snapshot(&cache, scratch, "calendar", timeout, move |conn| {
            Box::pin(async move {
                let rows = sqlx::query(EVENTS_QUERY)
                    .bind(limit)
                    .fetch_all(&mut *conn)
                    .await?;
                let docs = rows
                    .iter()
                    .filter_map(|row| {
                        event_document(row)
                            .inspect_err(|e| {
                                tracing::debug!(error = %e, "skipping unreadable event row")
                            })
                            .ok()
                            .flatten()
                    })
                    .collect::<Vec<_>>();
                Ok::<_, ReaderError>(docs)
            })
        })
        .await
    }
}

fn event_document(row: &SqliteRow) -> Result<Option<Document>, sqlx::Error> {
    let summary: Option<String> = row.try_get("summary")?;
    let Some(summary) = summary.filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let description: Option<String> = row.try_get("description")?;
    let location: Option<String> = row.try_get("location")?;
    let start = from_apple_seconds(row.try_get("start_date")?);
    let end = from_apple_seconds(row.try_get("end_date")?);

    let text = format!(
        "Event: {}\nStart: {}\nEnd: {}\nLocation: {}\nDescription: {}",
        summary,
        start,
        end,
        location.unwrap_or_default(),
        description.unwrap_or_default()
    );

    Ok(Document::new(
        text,
        metadata! {
            "event" => summary,
            "start" => start,
        },
    ))
}

#[async_trait]
impl Reader for CalendarReader {
    fn name(&self) -> &str {
        "calendar"
    }

    fn description(&self) -> &str {
        "Apple Calendar events"
    }

    fn default_source(&self) -> Option<PathBuf> {
        Some(self.cache_path(None))
    }

    async fn load(&self, source: Option<&Path>, max_count: i64) -> Vec<Document> {
        load_or_empty(self.name(), self.read(source, max_count)).await
    }
}
