//! Grouping of messaging-database rows into conversations and rendering
//! them as documents.

use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};

use crate::metadata;
use crate::models::Document;
use crate::timestamp::UNKNOWN;

/// How message rows become documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationMode {
    /// One document per conversation.
    #[default]
    Concatenated,
    /// One document per message.
    Individual,
}

impl ConversationMode {
    pub fn from_concatenate(concatenate: bool) -> Self {
        if concatenate {
            Self::Concatenated
        } else {
            Self::Individual
        }
    }
}

/// One row of the messaging database after normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub timestamp: String,
    pub is_from_me: bool,
    pub service: String,
    pub chat_identifier: String,
    pub chat_display_name: String,
    pub handle_id: String,
    pub contact_name: String,
    pub chat_id: Option<i64>,
}

impl Message {
    /// Display label of whoever sent this message.
    pub fn sender(&self) -> &str {
        if self.is_from_me {
            "You"
        } else {
            &self.contact_name
        }
    }
}

/// Messages sharing a `chat_id`, in the order they were read.
#[derive(Debug, Clone)]
pub struct Conversation {
    pub chat_id: Option<i64>,
    pub messages: Vec<Message>,
}

/// Group messages by `chat_id`.
///
/// Conversations come back in first-seen order; each keeps its messages in
/// input order, which the query already sorts by timestamp.
pub fn group_by_chat(messages: Vec<Message>) -> Vec<Conversation> {
    let mut index: HashMap<Option<i64>, usize> = HashMap::new();
    let mut conversations: Vec<Conversation> = Vec::new();

    for message in messages {
        let slot = *index.entry(message.chat_id).or_insert_with(|| {
            conversations.push(Conversation {
                chat_id: message.chat_id,
                messages: Vec::new(),
            });
            conversations.len() - 1
        });
        conversations[slot].messages.push(message);
    }

    conversations
}

/// Readable label for a phone number or email handle.
pub fn contact_label(handle: &str) -> String {
    if handle.is_empty() {
        return UNKNOWN.to_string();
    }
    if handle.contains('@') || handle.starts_with('+') {
        return handle.to_string();
    }

    let digits: String = handle.chars().filter(|c| c.is_ascii_digit()).collect();
    match digits.len() {
        10 => us_number(&digits),
        11 if digits.starts_with('1') => format!("+1 {}", us_number(&digits[1..])),
        _ => handle.to_string(),
    }
}

fn us_number(digits: &str) -> String {
    format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..])
}

fn render_line(message: &Message) -> String {
    let mut prefix = format!("[{}]", message.sender());
    if message.timestamp != UNKNOWN {
        prefix.push_str(&format!(" ({})", message.timestamp));
    }
    format!("{}: {}", prefix, message.text)
}

/// Render a whole conversation as one document.
pub fn conversation_document(conversation: &Conversation) -> Option<Document> {
    let first = conversation.messages.first()?;
    let last = conversation.messages.last()?;

    let body = conversation
        .messages
        .iter()
        .map(render_line)
        .collect::<Vec<_>>()
        .join("\n\n");

    let text = format!(
        "Chat: {}\nIdentifier: {}\nMessages ({} messages):\n\n{}\n",
        first.chat_display_name,
        first.chat_identifier,
        conversation.messages.len(),
        body
    );

    let participants: BTreeSet<&str> = conversation
        .messages
        .iter()
        .filter(|m| !m.is_from_me)
        .map(|m| m.contact_name.as_str())
        .collect();

    let mut meta = metadata! {
        "source" => "iMessage",
        "chat_name" => first.chat_display_name,
        "chat_identifier" => first.chat_identifier,
        "message_count" => conversation.messages.len(),
        "first_message_date" => first.timestamp,
        "last_message_date" => last.timestamp,
        "participants" => participants,
    };
    if let Some(chat_id) = conversation.chat_id {
        meta.insert("chat_id".to_string(), chat_id.into());
    }

    Document::new(text, meta)
}

/// Render a single message as its own document.
pub fn message_document(message: &Message) -> Option<Document> {
    let text = format!(
        "Message from {} in chat \"{}\"\nTime: {}\nContent: {}\n",
        message.sender(),
        message.chat_display_name,
        message.timestamp,
        message.text
    );

    let mut meta = metadata! {
        "source" => "iMessage",
        "message_id" => message.id,
        "chat_name" => message.chat_display_name,
        "chat_identifier" => message.chat_identifier,
        "timestamp" => message.timestamp,
        "is_from_me" => message.is_from_me,
        "contact_name" => message.contact_name,
        "service" => message.service,
    };
    if let Some(chat_id) = message.chat_id {
        meta.insert("chat_id".to_string(), chat_id.into());
    }

    Document::new(text, meta)
}

/// Turn grouped or flat messages into documents according to `mode`.
pub fn render(messages: Vec<Message>, mode: ConversationMode) -> Vec<Document> {
    match mode {
        ConversationMode::Concatenated => group_by_chat(messages)
            .iter()
            .filter_map(conversation_document)
            .collect(),
        ConversationMode::Individual => messages.iter().filter_map(message_document).collect(),
    }
}
