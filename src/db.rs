use futures::future::BoxFuture;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::Connection;
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;

use crate::error::ReaderError;
use crate::snapshot::Snapshot;

/// Open a database file strictly read-only.
///
/// `immutable` stops SQLite from creating journal or shm files next to the
/// snapshot, so deleting the snapshot is the only cleanup needed.
pub async fn open_read_only(path: &Path) -> Result<SqliteConnection, sqlx::Error> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .read_only(true)
        .immutable(true);

    SqliteConnection::connect_with(&options).await
}

/// Snapshot `source`, run `work` against a read-only connection to the copy,
/// then close the connection and delete the copy.
///
/// `timeout` bounds the copy and the query together. On expiry the copy is
/// cancelled and joined before this returns, so no scratch file survives the
/// call whichever way it ends.
pub async fn with_snapshot<T, F>(
    source: &Path,
    scratch_dir: &Path,
    label: &str,
    timeout: Duration,
    work: F,
) -> Result<T, ReaderError>
where
    F: for<'c> FnOnce(&'c mut SqliteConnection) -> BoxFuture<'c, Result<T, ReaderError>>,
{
    let deadline = Instant::now() + timeout;
    let pending = Snapshot::spawn(source, scratch_dir, label);
    let Some(snapshot) = pending.finish_by(deadline).await? else {
        return Err(ReaderError::Timeout(timeout));
    };

    let query = async {
        match open_read_only(snapshot.path()).await {
            Ok(mut conn) => {
                let out = work(&mut conn).await;
                if let Err(e) = conn.close().await {
                    tracing::debug!(
                        reader = label,
                        error = %e,
                        "closing snapshot connection failed"
                    );
                }
                out
            }
            Err(e) => Err(e.into()),
        }
    };
    let result = match tokio::time::timeout_at(deadline, query).await {
        Ok(result) => result,
        Err(_) => Err(ReaderError::Timeout(timeout)),
    };

    if let Err(e) = snapshot.release() {
        tracing::warn!(reader = label, error = %e, "failed to delete snapshot");
    }

    result
}
