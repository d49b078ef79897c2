//! Classification and cleanup of chat-export message payloads.
//!
//! A payload is either a plain string (possibly carrying a `sender:` prefix or
//! non-text markup) or a structured object whose text lives in a handful of
//! well-known fields.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Fields of a structured payload that carry renderable text, in output order.
const TEXT_FIELDS: [&str; 4] = ["title", "quoted", "content", "text"];

/// Markup that marks a string payload as media or an app card.
const MARKUP_TAGS: [&str; 5] = ["<img", "<emoji", "<voice", "<video", "<appmsg"];

const RECALLED: &str = "recalled a message";

static PLATFORM_ID_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^wxid_[^:]+:\s*").expect("valid regex"));
static LABEL_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^:]+:\s*").expect("valid regex"));

/// Loose truthiness of a JSON value: null, false, 0, "" and empty
/// containers count as absent.
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Strip a platform id prefix, then any generic `label:` prefix.
///
/// Both passes always run, so text that legitimately contains a colon loses
/// everything up to it.
pub fn strip_sender_prefixes(text: &str) -> String {
    let once = PLATFORM_ID_PREFIX.replace(text, "");
    LABEL_PREFIX.replace(&once, "").into_owned()
}

fn structured_text(fields: &serde_json::Map<String, Value>) -> Vec<String> {
    TEXT_FIELDS
        .iter()
        .filter_map(|f| fields.get(*f).filter(|v| is_truthy(v)))
        .map(render)
        .collect()
}

/// Whether a payload carries human-readable text worth indexing.
pub fn is_text_message(payload: &Value) -> bool {
    if !is_truthy(payload) {
        return false;
    }
    match payload {
        Value::Object(fields) => !structured_text(fields).is_empty(),
        Value::String(s) => {
            if MARKUP_TAGS.iter().any(|tag| s.contains(tag)) || s.contains(RECALLED) {
                return false;
            }
            let clean = strip_sender_prefixes(s);
            let clean = clean.trim();
            !clean.is_empty() && !clean.starts_with('<')
        }
        _ => false,
    }
}

/// The cleaned text of a payload, or an empty string when nothing readable
/// can be extracted.
pub fn readable_text(payload: &Value) -> String {
    if !is_truthy(payload) {
        return String::new();
    }
    match payload {
        Value::Object(fields) => structured_text(fields).join(" | "),
        Value::String(s) => {
            let clean = strip_sender_prefixes(s);
            if clean.trim().starts_with('<') || clean.contains(RECALLED) {
                return String::new();
            }
            clean.trim().to_string()
        }
        _ => String::new(),
    }
}
