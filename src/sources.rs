//! Reader availability listing.
//!
//! Reports, for every registered reader, where it would read from and whether
//! that location exists. Used by `ctx-read sources`.
//!
//! | Reader | Available When |
//! |--------|----------------|
//! | `browser`, `imessage`, `mail`, `calendar` | Resolved database file exists |
//! | `wechat` | Export directory is configured and exists |
//! | `slack`, `twitter`, `chatgpt`, `claude` | Never (not yet implemented) |

use anyhow::Result;
use serde::Serialize;

use crate::config::Config;
use crate::locator::SourceLocator;
use crate::traits::ReaderRegistry;

/// Where a reader reads from and whether it can.
#[derive(Debug, Clone, Serialize)]
pub struct SourceStatus {
    pub name: String,
    pub description: String,
    /// Resolved source location, if the reader has one.
    pub path: Option<String>,
    pub available: bool,
}

impl SourceStatus {
    fn label(&self) -> &'static str {
        match (&self.path, self.available) {
            (_, true) => "OK",
            (None, false) => "NOT CONFIGURED",
            (Some(_), false) => "MISSING",
        }
    }
}

/// Status of every reader the config produces.
pub fn get_sources(config: &Config) -> Vec<SourceStatus> {
    let registry = ReaderRegistry::from_config(config);
    registry
        .readers()
        .iter()
        .map(|reader| {
            let path = reader.default_source();
            let stub = reader.is_placeholder();
            SourceStatus {
                name: reader.name().to_string(),
                description: reader.description().to_string(),
                available: !stub && path.as_ref().is_some_and(|p| p.exists()),
                path: path.map(|p| p.display().to_string()),
            }
        })
        .collect()
}

pub fn list_sources(config: &Config) -> Result<()> {
    println!("{:<10} {:<15} PATH", "READER", "STATUS");
    for status in get_sources(config) {
        println!(
            "{:<10} {:<15} {}",
            status.name,
            status.label(),
            status.path.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

pub fn list_browsers(config: &Config) -> Result<()> {
    let found = SourceLocator::from_config(&config.paths).find_browser_paths();
    if found.is_empty() {
        println!("No browser profiles found.");
        return Ok(());
    }
    for (browser, path) in found {
        println!("{:<10} {}", browser, path.display());
    }
    Ok(())
}
