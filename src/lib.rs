//! # Context Readers
//!
//! Local personal-data readers for AI context pipelines.
//!
//! Each reader turns one platform-native store (browser history, the Messages
//! database, the Mail index, the Calendar cache, WeChat JSON exports) into a
//! list of uniform [`Document`](models::Document)s: a text body plus flat
//! metadata, ready for an external indexer.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌─────────────────────┐
//! │SourceLocator │──▶│   Snapshot   │──▶│ read-only SQLite /  │
//! │ default paths│   │ scratch copy │   │ JSON export parsing │
//! └──────────────┘   └──────────────┘   └──────────┬──────────┘
//!                                                  ▼
//!              ┌───────────┐  ┌───────────┐  ┌──────────────┐
//!              │ timestamp │  │ sanitize  │  │ conversation │
//!              └─────┬─────┘  └─────┬─────┘  └──────┬───────┘
//!                    └──────────────┼───────────────┘
//!                                   ▼
//!                            Vec<Document>
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | The `Document` type |
//! | [`traits`] | `Reader` trait and registry |
//! | [`locator`] | Default source locations |
//! | [`snapshot`] | Scratch copies of live databases |
//! | [`db`] | Read-only SQLite access to snapshots |
//! | [`timestamp`] | Per-source timestamp decoding |
//! | [`sanitize`] | Chat payload classification |
//! | [`conversation`] | Message grouping and rendering |
//! | [`reader_browser`] | Browser history |
//! | [`reader_imessage`] | Messages database |
//! | [`reader_mail`] | Mail index |
//! | [`reader_calendar`] | Calendar cache |
//! | [`reader_wechat`] | WeChat exports |
//! | [`reader_remote`] | Remote-service placeholders |
//! | [`sources`] | Reader availability listing |
//! | [`export`] | JSON dump of a load |

pub mod config;
pub mod conversation;
pub mod db;
pub mod error;
pub mod export;
pub mod locator;
pub mod models;
pub mod reader_browser;
pub mod reader_calendar;
pub mod reader_imessage;
pub mod reader_mail;
pub mod reader_remote;
pub mod reader_wechat;
pub mod sanitize;
pub mod snapshot;
pub mod sources;
pub mod timestamp;
pub mod traits;
