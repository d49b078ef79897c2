//! Run one reader and write its documents as JSON.
//!
//! This is the operator view of a load: what the downstream indexer would
//! receive, printed to stdout or saved to a file.

use anyhow::{bail, Result};
use serde::Serialize;
use std::path::Path;

use crate::config::Config;
use crate::models::Document;
use crate::traits::ReaderRegistry;

#[derive(Serialize)]
struct LoadOutput<'a> {
    reader: &'a str,
    count: usize,
    documents: &'a [Document],
}

/// Load documents from the named reader.
///
/// `individual` switches the conversation readers to one document per
/// message. `limit` defaults to `load.max_count` from the config.
pub async fn load_documents(
    config: &Config,
    reader: &str,
    source: Option<&Path>,
    limit: Option<i64>,
    individual: bool,
) -> Result<Vec<Document>> {
    let mut config = config.clone();
    if individual {
        config.readers.imessage.concatenate_conversations = false;
        config.readers.wechat.concatenate_messages = false;
    }

    let registry = ReaderRegistry::from_config(&config);
    let Some(found) = registry.find(reader) else {
        let names: Vec<&str> = registry.readers().iter().map(|r| r.name()).collect();
        let available = names.join(", ");
        bail!("Unknown reader: '{}'. Available: {}", reader, available);
    };

    let max_count = limit.unwrap_or(config.load.max_count);
    Ok(found.load(source, max_count).await)
}

/// Load from a reader and write `{reader, count, documents}` JSON.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub async fn run_load(
    config: &Config,
    reader: &str,
    source: Option<&Path>,
    limit: Option<i64>,
    individual: bool,
    output: Option<&Path>,
) -> Result<()> {
    let documents = load_documents(config, reader, source, limit, individual).await?;
    let data = LoadOutput {
        reader,
        count: documents.len(),
        documents: &documents,
    };
    let json = serde_json::to_string_pretty(&data)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &json)?;
            tracing::info!(
                reader,
                documents = documents.len(),
                output = %path.display(),
                "documents written"
            );
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}
