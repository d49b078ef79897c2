//! Scratch copies of live application databases.
//!
//! Applications keep their stores open and locked while running, so readers
//! never open the live file. A [`Snapshot`] copies it to a uniquely named file
//! in the scratch directory and deletes that file when dropped, whichever way
//! the reader exits.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tempfile::TempPath;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::ReaderError;

const COPY_CHUNK: usize = 1 << 20;

/// Exclusive ownership of one scratch copy.
#[derive(Debug)]
pub struct Snapshot {
    path: TempPath,
}

/// A copy still running on the blocking pool.
///
/// The blocking task owns the scratch file until it returns, so the copy must
/// be joined before the caller can promise the file is gone.
pub struct PendingSnapshot {
    task: JoinHandle<Result<Snapshot, ReaderError>>,
    cancel: Arc<AtomicBool>,
}

impl Snapshot {
    /// Start copying `source` into `scratch_dir` on the blocking pool.
    pub fn spawn(source: &Path, scratch_dir: &Path, label: &str) -> PendingSnapshot {
        let source = source.to_path_buf();
        let scratch_dir = scratch_dir.to_path_buf();
        let label = label.to_string();
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let task = tokio::task::spawn_blocking(move || {
            Self::take_blocking(&source, &scratch_dir, &label, &flag)
        });
        PendingSnapshot { task, cancel }
    }

    /// Copy synchronously. Setting `cancel` stops the copy between chunks and
    /// removes the partial file.
    pub fn take_blocking(
        source: &Path,
        scratch_dir: &Path,
        label: &str,
        cancel: &AtomicBool,
    ) -> Result<Self, ReaderError> {
        if !source.exists() {
            return Err(ReaderError::SourceNotFound(source.to_path_buf()));
        }

        let copy_err = |source_err: io::Error| ReaderError::Copy {
            path: source.to_path_buf(),
            source: source_err,
        };

        let mut scratch = tempfile::Builder::new()
            .prefix(&format!("{}-", label))
            .suffix(".snapshot")
            .tempfile_in(scratch_dir)
            .map_err(copy_err)?;

        // `scratch` is removed on drop if the copy fails part way.
        copy_chunked(source, scratch.as_file_mut(), cancel).map_err(copy_err)?;
        let path = scratch.into_temp_path();

        tracing::debug!(
            source = %source.display(),
            snapshot = %path.display(),
            "snapshot taken"
        );
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the copy now, reporting any failure.
    pub fn release(self) -> io::Result<()> {
        let shown: PathBuf = self.path.to_path_buf();
        self.path.close()?;
        tracing::debug!(snapshot = %shown.display(), "snapshot released");
        Ok(())
    }
}

impl PendingSnapshot {
    /// Wait for the copy until `deadline`.
    ///
    /// Returns `Ok(None)` when the deadline passes first. In that case the
    /// copy has been cancelled and joined, and its scratch file is gone.
    pub async fn finish_by(mut self, deadline: Instant) -> Result<Option<Snapshot>, ReaderError> {
        match tokio::time::timeout_at(deadline, &mut self.task).await {
            Ok(joined) => {
                let snapshot = joined.map_err(|e| ReaderError::Task(e.to_string()))??;
                Ok(Some(snapshot))
            }
            Err(_) => {
                self.cancel.store(true, Ordering::Relaxed);
                // dropping the result deletes a copy that finished anyway
                drop(self.task.await);
                Ok(None)
            }
        }
    }
}

fn copy_chunked(source: &Path, dest: &mut File, cancel: &AtomicBool) -> io::Result<()> {
    let mut reader = File::open(source)?;
    let mut buf = vec![0u8; COPY_CHUNK];
    loop {
        if cancel.load(Ordering::Relaxed) {
            return Err(io::Error::new(io::ErrorKind::Interrupted, "snapshot cancelled"));
        }
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        dest.write_all(&buf[..n])?;
    }
    dest.flush()
}
