//! End-to-end reader tests against fixture databases and export folders.
//!
//! Fixtures are built with sqlx in a temp directory that plays the role of the
//! user's home. Every test also checks that the scratch directory is empty
//! once `load` returns.

use context_readers::conversation::ConversationMode;
use context_readers::locator::SourceLocator;
use context_readers::reader_browser::{BrowserHistoryReader, TITLE_MAX_CHARS};
use context_readers::reader_calendar::CalendarReader;
use context_readers::reader_imessage::IMessageReader;
use context_readers::reader_mail::MailReader;
use context_readers::reader_wechat::WeChatReader;
use context_readers::timestamp::{
    from_apple_nanos, from_apple_seconds, from_webkit_micros, WEBKIT_EPOCH_OFFSET_SECS,
};
use context_readers::traits::{ReadContext, Reader};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode};
use sqlx::Connection;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

struct Env {
    home: TempDir,
    scratch: TempDir,
}

impl Env {
    fn new() -> Self {
        Self {
            home: TempDir::new().unwrap(),
            scratch: TempDir::new().unwrap(),
        }
    }

    fn ctx(&self) -> ReadContext {
        self.ctx_with_timeout(Duration::from_secs(30))
    }

    fn ctx_with_timeout(&self, timeout: Duration) -> ReadContext {
        let locator = SourceLocator::new(self.home.path());
        ReadContext::new(locator, self.scratch.path(), timeout)
    }

    fn home_path(&self, relative: &str) -> PathBuf {
        let path = self.home.path().join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        path
    }

    fn assert_scratch_clean(&self) {
        let leftovers: Vec<_> = std::fs::read_dir(self.scratch.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        assert!(leftovers.is_empty(), "scratch left behind: {:?}", leftovers);
    }
}

async fn create_db(path: &Path, statements: &[&str]) {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Delete);
    let mut conn = SqliteConnection::connect_with(&options).await.unwrap();
    for statement in statements {
        sqlx::query(statement).execute(&mut conn).await.unwrap();
    }
    conn.close().await.unwrap();
}

fn webkit(unix: i64) -> i64 {
    (unix + WEBKIT_EPOCH_OFFSET_SECS) * 1_000_000
}

fn url_row(id: i64, url: &str, title: &str, visits: i64, typed: i64, visited: i64) -> String {
    format!("INSERT INTO urls VALUES ({id}, '{url}', '{title}', {visits}, {typed}, {visited}, 0)")
}

// ─── Browser history ────────────────────────────────────────────────

const CHROME_DEFAULT: &str = "Library/Application Support/Google/Chrome/Default/History";

async fn browser_fixture(env: &Env) -> PathBuf {
    let history = env.home_path(CHROME_DEFAULT);
    let long_title = "T".repeat(400);
    let rows = [
        url_row(1, "https://a.example", "", 1, 0, webkit(500)),
        url_row(2, "https://b.example", "Bravo", 3, 1, webkit(400)),
        url_row(3, "", "No URL", 1, 0, webkit(300)),
        url_row(4, "https://d.example", &long_title, 7, 0, webkit(200)),
        url_row(5, "https://e.example", "Echo", 2, 0, webkit(100)),
        "INSERT INTO urls VALUES (6, 'https://f.example', NULL, 1, 0, 0, 0)".to_string(),
    ];
    let mut statements = vec![
        "CREATE TABLE urls (id INTEGER PRIMARY KEY, url LONGVARCHAR, title LONGVARCHAR, \
         visit_count INTEGER, typed_count INTEGER, last_visit_time INTEGER, hidden INTEGER)",
    ];
    statements.extend(rows.iter().map(String::as_str));
    create_db(&history, &statements).await;
    history
}

#[tokio::test]
async fn browser_reads_default_profile_newest_first() {
    let env = Env::new();
    browser_fixture(&env).await;
    let reader = BrowserHistoryReader::new(env.ctx(), None);

    let docs = reader.load(None, 0).await;
    let urls: Vec<&str> = docs.iter().map(|d| d.meta_str("url").unwrap()).collect();
    assert_eq!(urls.len(), 3);
    assert_eq!(urls[0], "https://b.example");
    assert_eq!(urls[1..], ["https://d.example", "https://e.example"]);

    let bravo = &docs[0].text;
    let visited = from_webkit_micros(webkit(400));
    assert!(bravo.contains("[Title]: Bravo"));
    assert!(bravo.contains(&format!("[Last Visited]: {}", visited)));
    assert!(bravo.contains("[Visits]: 3"));
    for doc in &docs {
        let title = doc.meta_str("title").unwrap();
        assert!(title.chars().count() <= TITLE_MAX_CHARS);
    }
    let long_title = docs[1].meta_str("title").unwrap();
    assert_eq!(long_title.len(), TITLE_MAX_CHARS);
    env.assert_scratch_clean();
}

#[tokio::test]
async fn browser_cap_counts_only_emitted_rows() {
    let env = Env::new();
    browser_fixture(&env).await;
    let reader = BrowserHistoryReader::new(env.ctx(), None);

    let docs = reader.load(None, 2).await;
    let urls: Vec<&str> = docs.iter().map(|d| d.meta_str("url").unwrap()).collect();
    // a SQL LIMIT 2 would only have seen the empty-title row and Bravo
    assert_eq!(urls, vec!["https://b.example", "https://d.example"]);
    env.assert_scratch_clean();
}

#[tokio::test]
async fn browser_explicit_profile_overrides_default() {
    let env = Env::new();
    let history = browser_fixture(&env).await;
    let other_home = TempDir::new().unwrap();
    let ctx = ReadContext::new(
        SourceLocator::new(other_home.path()),
        env.scratch.path(),
        Duration::from_secs(30),
    );
    let reader = BrowserHistoryReader::new(ctx, None);

    assert!(reader.load(None, 10).await.is_empty());
    assert_eq!(reader.load(history.parent(), 10).await.len(), 3);
    env.assert_scratch_clean();
}

#[tokio::test]
async fn browser_missing_source_is_empty() {
    let env = Env::new();
    let reader = BrowserHistoryReader::new(env.ctx(), None);
    assert!(reader.load(None, 10).await.is_empty());
    env.assert_scratch_clean();
}

#[tokio::test]
async fn browser_schema_error_is_empty_and_cleans_up() {
    let env = Env::new();
    let history = env.home_path(CHROME_DEFAULT);
    create_db(&history, &["CREATE TABLE visits (id INTEGER PRIMARY KEY)"]).await;

    let reader = BrowserHistoryReader::new(env.ctx(), None);
    assert!(reader.load(None, 10).await.is_empty());
    env.assert_scratch_clean();
}

#[tokio::test]
async fn browser_corrupt_file_is_empty_and_cleans_up() {
    let env = Env::new();
    let history = env.home_path(CHROME_DEFAULT);
    std::fs::write(&history, b"this is not a database, just some bytes").unwrap();

    let reader = BrowserHistoryReader::new(env.ctx(), None);
    assert!(reader.load(None, 10).await.is_empty());
    env.assert_scratch_clean();
}

#[tokio::test]
async fn expired_deadline_leaves_no_snapshot_behind() {
    let env = Env::new();
    let history = env.home_path(CHROME_DEFAULT);
    // large enough that the copy is still running when the deadline passes
    std::fs::write(&history, vec![0u8; 64 << 20]).unwrap();

    let ctx = env.ctx_with_timeout(Duration::from_millis(1));
    let reader = BrowserHistoryReader::new(ctx, None);
    assert!(reader.load(None, 0).await.is_empty());
    env.assert_scratch_clean();
}

#[tokio::test]
async fn concurrent_loads_of_one_source_do_not_collide() {
    let env = Env::new();
    browser_fixture(&env).await;
    let reader = BrowserHistoryReader::new(env.ctx(), None);

    let (a, b, c) = tokio::join!(
        reader.load(None, 0),
        reader.load(None, 0),
        reader.load(None, 1)
    );
    assert_eq!(a.len(), 3);
    assert_eq!(a, b);
    assert_eq!(c.len(), 1);
    env.assert_scratch_clean();
}

// ─── Messages ───────────────────────────────────────────────────────

const SECOND: i64 = 1_000_000_000;

async fn messages_fixture(env: &Env) -> PathBuf {
    let chat_db = env.home_path("Library/Messages/chat.db");
    create_db(
        &chat_db,
        &[
            "CREATE TABLE handle (ROWID INTEGER PRIMARY KEY, id TEXT)",
            "CREATE TABLE chat (ROWID INTEGER PRIMARY KEY, chat_identifier TEXT, \
             display_name TEXT)",
            "CREATE TABLE message (ROWID INTEGER PRIMARY KEY, text TEXT, date INTEGER, \
             is_from_me INTEGER, service TEXT, handle_id INTEGER)",
            "CREATE TABLE chat_message_join (chat_id INTEGER, message_id INTEGER)",
            "INSERT INTO handle VALUES (1, '1234567890'), (2, 'bob@example.com')",
            "INSERT INTO chat VALUES (1, 'chat-family', 'Family'), (2, 'bob@example.com', '')",
            // inserted out of date order on purpose
            "INSERT INTO message VALUES (10, 'see you then', 300000000000, 1, 'iMessage', 0)",
            "INSERT INTO message VALUES (11, 'dinner at 7?', 100000000000, 0, 'iMessage', 1)",
            "INSERT INTO message VALUES (12, 'hey bob', 50000000000, 1, 'SMS', 0)",
            "INSERT INTO message VALUES (13, '', 60000000000, 0, 'iMessage', 2)",
            "INSERT INTO message VALUES (14, 'yo', 0, 0, NULL, 2)",
            "INSERT INTO message VALUES (15, 'sounds good', 200000000000, 0, 'iMessage', 1)",
            "INSERT INTO chat_message_join VALUES \
             (1, 10), (1, 11), (2, 12), (2, 13), (2, 14), (1, 15)",
        ],
    )
    .await;
    chat_db
}

#[tokio::test]
async fn imessage_concatenates_per_chat_in_time_order() {
    let env = Env::new();
    messages_fixture(&env).await;
    let reader = IMessageReader::new(env.ctx(), None, ConversationMode::Concatenated);

    let docs = reader.load(None, 0).await;
    assert_eq!(docs.len(), 2);

    let family = &docs[0];
    let header = "Chat: Family\nIdentifier: chat-family\nMessages (3 messages):";
    assert!(family.text.starts_with(header));
    let first = family.text.find("dinner at 7?").unwrap();
    let second = family.text.find("sounds good").unwrap();
    let third = family.text.find("see you then").unwrap();
    assert!(first < second && second < third);
    assert!(!family.text.contains("hey bob"));
    let sent = from_apple_nanos(100 * SECOND);
    let dinner = format!("[(123) 456-7890] ({}): dinner at 7?", sent);
    assert!(family.text.contains(&dinner));
    assert!(family.text.contains("[You]"));
    let participants = serde_json::json!(["(123) 456-7890"]);
    assert_eq!(family.metadata["participants"], participants);
    assert_eq!(family.metadata["chat_id"], 1);
    assert_eq!(family.metadata["message_count"], 3);
    assert_eq!(family.meta_str("source"), Some("iMessage"));

    let bob = &docs[1];
    let header = "Chat: Unknown Chat\nIdentifier: bob@example.com";
    assert!(bob.text.starts_with(header));
    // zero date renders without a timestamp
    assert!(bob.text.contains("[bob@example.com]: yo"));
    assert_eq!(bob.meta_str("first_message_date"), Some("Unknown"));
    assert_eq!(bob.metadata["message_count"], 2);
    env.assert_scratch_clean();
}

#[tokio::test]
async fn imessage_individual_mode_and_cap() {
    let env = Env::new();
    let chat_db = messages_fixture(&env).await;
    let reader = IMessageReader::new(env.ctx(), None, ConversationMode::Individual);

    let docs = reader.load(chat_db.parent(), 0).await;
    assert_eq!(docs.len(), 5);
    assert_eq!(docs[0].metadata["message_id"], 11);
    let sent = from_apple_nanos(100 * SECOND);
    assert_eq!(docs[0].meta_str("timestamp"), Some(sent.as_str()));
    assert_eq!(docs[0].meta_str("contact_name"), Some("(123) 456-7890"));
    let header = "Message from (123) 456-7890 in chat \"Family\"";
    assert!(docs[0].text.starts_with(header));
    let yo = docs.iter().find(|d| d.metadata["message_id"] == 14);
    assert_eq!(yo.unwrap().meta_str("service"), Some("iMessage"));

    assert_eq!(reader.load(None, 2).await.len(), 2);
    env.assert_scratch_clean();
}

// ─── Mail ───────────────────────────────────────────────────────────

const MAIL_MESSAGES_TABLE: &str = "CREATE TABLE messages (ROWID INTEGER PRIMARY KEY, \
    subject TEXT, sender TEXT, date_sent INTEGER)";
const MAIL_SNIPPETS_TABLE: &str =
    "CREATE TABLE message_snippets (message_id INTEGER, snippet TEXT)";

async fn mail_fixture(env: &Env) -> PathBuf {
    let index = env.home_path("Library/Mail/V10/MailData/Envelope Index");
    create_db(
        &index,
        &[
            MAIL_MESSAGES_TABLE,
            MAIL_SNIPPETS_TABLE,
            "INSERT INTO messages VALUES (1, 'Quarterly report', 'boss@corp.example', 300)",
            "INSERT INTO messages VALUES (2, '', 'noreply@corp.example', 200)",
            "INSERT INTO messages VALUES (3, NULL, 'friend@mail.example', 100)",
            "INSERT INTO message_snippets VALUES (1, 'Numbers attached'), (3, 'preview only')",
        ],
    )
    .await;
    index
}

#[tokio::test]
async fn mail_skips_rows_without_subject_or_snippet() {
    let env = Env::new();
    mail_fixture(&env).await;
    let reader = MailReader::new(env.ctx(), None);

    let docs = reader.load(None, 0).await;
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].meta_str("subject"), Some("Quarterly report"));
    let header = "Subject: Quarterly report\nFrom: boss@corp.example\nDate: ";
    assert!(docs[0].text.starts_with(header));
    assert!(docs[0].text.ends_with("\n\nNumbers attached"));
    assert_eq!(docs[1].meta_str("subject"), Some(""));
    assert_eq!(docs[1].meta_str("sender"), Some("friend@mail.example"));
    assert!(docs[1].text.contains("preview only"));
    env.assert_scratch_clean();
}

#[tokio::test]
async fn mail_limit_applies_to_query_rows() {
    let env = Env::new();
    mail_fixture(&env).await;
    let reader = MailReader::new(env.ctx(), None);

    // rows 1 and 2 are fetched; row 2 is then filtered out
    assert_eq!(reader.load(None, 2).await.len(), 1);
    env.assert_scratch_clean();
}

#[tokio::test]
async fn mail_falls_back_to_v9() {
    let env = Env::new();
    let index = env.home_path("Library/Mail/V9/MailData/Envelope Index");
    create_db(
        &index,
        &[
            MAIL_MESSAGES_TABLE,
            MAIL_SNIPPETS_TABLE,
            "INSERT INTO messages VALUES (1, 'Old mailbox', 'x@y.example', 5)",
        ],
    )
    .await;

    let docs = MailReader::new(env.ctx(), None).load(None, 10).await;
    assert_eq!(docs.len(), 1);
    assert!(docs[0].text.contains("From: x@y.example"));
}

// ─── Calendar ───────────────────────────────────────────────────────

#[tokio::test]
async fn calendar_reads_events_newest_first() {
    let env = Env::new();
    let cache = env.home_path("Library/Calendars/Calendar Cache");
    create_db(
        &cache,
        &[
            "CREATE TABLE CI_EVENT (summary TEXT, description TEXT, location TEXT, \
             start_date REAL, end_date REAL)",
            "INSERT INTO CI_EVENT VALUES ('Standup', NULL, 'Room 1', 0, 900)",
            "INSERT INTO CI_EVENT VALUES ('', 'orphan', 'nowhere', 500, 600)",
            "INSERT INTO CI_EVENT VALUES ('Retro', 'Sprint 4', NULL, 86400, 90000)",
        ],
    )
    .await;
    let reader = CalendarReader::new(env.ctx(), None);

    let docs = reader.load(None, 0).await;
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0].meta_str("event"), Some("Retro"));
    assert!(docs[0].text.contains("Description: Sprint 4"));
    assert!(docs[0].text.contains("Location: \n"));

    let standup = &docs[1];
    let reference = from_apple_seconds(Some(0.0));
    assert!(reference.starts_with("2001-01-01") || reference.starts_with("2000-12-31"));
    assert_eq!(standup.meta_str("start"), Some(reference.as_str()));
    assert!(standup.text.starts_with("Event: Standup\nStart: "));
    assert!(standup.text.ends_with("Description: "));

    assert_eq!(reader.load(Some(&cache), 1).await.len(), 1);
    env.assert_scratch_clean();
}

#[tokio::test]
async fn calendar_missing_source_is_empty() {
    let env = Env::new();
    let reader = CalendarReader::new(env.ctx(), None);
    assert!(reader.load(None, 0).await.is_empty());
    env.assert_scratch_clean();
}

// ─── WeChat export ──────────────────────────────────────────────────

fn wechat_fixture() -> TempDir {
    let dir = TempDir::new().unwrap();
    std::fs::write(
        dir.path().join("alice.json"),
        serde_json::json!([
            {
                "content": "wxid_alice: lunch tomorrow?",
                "createTime": 1_700_000_000,
                "isSentFromSelf": false
            },
            {"content": "<img src=\"photo.jpg\"/>", "createTime": 1_700_000_010},
            {"content": "sure", "createTime": 1_700_000_020, "isSentFromSelf": true},
            {
                "content": {"title": "Menu", "text": "noodles"},
                "createTime": 1_700_000_030,
                "isSentFromSelf": false
            }
        ])
        .to_string(),
    )
    .unwrap();
    std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
    std::fs::write(
        dir.path().join("carol.json"),
        serde_json::json!([
            {"content": "\"Carol\" recalled a message"},
            {"content": "ok bye", "isSentFromSelf": true}
        ])
        .to_string(),
    )
    .unwrap();
    std::fs::write(
        dir.path().join("dave.json"),
        serde_json::json!([{"content": "<voice length=\"3\"/>"}]).to_string(),
    )
    .unwrap();
    std::fs::write(dir.path().join("readme.txt"), "not an export").unwrap();
    dir
}

#[tokio::test]
async fn wechat_concatenates_per_contact_and_skips_broken_files() {
    let env = Env::new();
    let export = wechat_fixture();
    let reader = WeChatReader::new(env.ctx(), None, ConversationMode::Concatenated);

    let docs = reader.load(Some(export.path()), 0).await;
    let contacts: Vec<Option<&str>> = docs.iter().map(|d| d.meta_str("contact_name")).collect();
    assert_eq!(contacts, [Some("alice"), Some("carol")]);

    let alice = &docs[0];
    assert!(alice.text.starts_with("Contact: alice\n\n"));
    let lines: Vec<&str> = alice.text.lines().skip(2).collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].ends_with("[Contact]: lunch tomorrow?"));
    assert!(lines[1].ends_with("[Me]: sure"));
    assert!(lines[2].ends_with("[Contact]: Menu | noodles"));
    assert!(!alice.text.contains("photo.jpg"));
}

#[tokio::test]
async fn wechat_individual_mode_caps_documents() {
    let env = Env::new();
    let export = wechat_fixture();
    let reader = WeChatReader::new(
        env.ctx(),
        Some(export.path().to_path_buf()),
        ConversationMode::Individual,
    );

    assert_eq!(reader.load(None, 0).await.len(), 4);

    let capped = reader.load(None, 2).await;
    assert_eq!(capped.len(), 2);
    for doc in &capped {
        assert_eq!(doc.meta_str("contact_name"), Some("alice"));
    }
}

#[tokio::test]
async fn wechat_concatenated_cap_counts_files() {
    let env = Env::new();
    let export = wechat_fixture();
    let reader = WeChatReader::new(env.ctx(), None, ConversationMode::Concatenated);
    assert_eq!(reader.load(Some(export.path()), 1).await.len(), 1);
}

#[tokio::test]
async fn wechat_without_directory_is_empty() {
    let env = Env::new();
    let reader = WeChatReader::new(env.ctx(), None, ConversationMode::Concatenated);
    assert!(reader.load(None, 0).await.is_empty());
    let missing = Path::new("/no/such/export");
    assert!(reader.load(Some(missing), 0).await.is_empty());
}
