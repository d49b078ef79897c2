//! Core data models emitted by readers.
//!
//! A [`Document`] is the only thing that crosses the reader boundary: a text
//! body for the indexer plus a flat metadata map whose key set is fixed per
//! source.

use serde::Serialize;
use serde_json::{Map, Value};

/// Metadata attached to a [`Document`].
pub type Metadata = Map<String, Value>;

/// A uniform `{text, metadata}` record produced by a reader.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub text: String,
    pub metadata: Metadata,
}

impl Document {
    /// Assemble a document, refusing text that is blank after trimming.
    pub fn new(text: impl Into<String>, metadata: Metadata) -> Option<Self> {
        let text = text.into();
        if text.trim().is_empty() {
            return None;
        }
        Some(Self { text, metadata })
    }

    /// Look up a metadata value as a string slice.
    pub fn meta_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

/// Build a [`Metadata`] map from `key => value` pairs.
///
/// Values go through `serde_json::json!`, so anything serializable works.
#[macro_export]
macro_rules! metadata {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut map = $crate::models::Metadata::new();
        $( map.insert(($key).to_string(), ::serde_json::json!($value)); )*
        map
    }};
}

/// Shorten `text` to at most `max_chars` characters without splitting a
/// code point.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
