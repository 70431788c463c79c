use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Routing key embedded in the socket path, generated once per process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(String);

impl ClientId {
    pub fn generate() -> Self {
        Self(format!("client-{}", uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PromptId(pub u64);

impl fmt::Display for PromptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// The service echoes prompt ids back; some builds stringify them.
impl<'de> Deserialize<'de> for PromptId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(PromptId(n)),
            Raw::Text(s) => s
                .trim()
                .parse()
                .map(PromptId)
                .map_err(|_| serde::de::Error::custom(format!("invalid prompt id: {s:?}"))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct UserPromptEntry {
    pub id: PromptId,
    pub content: String,
    pub selected: bool,
}

impl UserPromptEntry {
    pub fn empty(id: PromptId) -> Self {
        Self { id, content: String::new(), selected: true }
    }

    /// Selected and carrying some non-whitespace text.
    pub fn is_runnable(&self) -> bool {
        self.selected && !self.content.trim().is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    InProgress,
    Completed,
}

/// Point in time as the service sent it. Any JSON value is accepted so an
/// odd timestamp only affects the time label, never the message.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum Timestamp {
    Millis(i64),
    Float(f64),
    Text(String),
    Other(serde_json::Value),
}

impl Default for Timestamp {
    fn default() -> Self {
        Timestamp::Other(serde_json::Value::Null)
    }
}

fn local_time_from_millis(ms: i64) -> Option<String> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map(|dt| dt.with_timezone(&Local).format("%H:%M:%S").to_string())
}

impl Timestamp {
    /// Local wall-clock time for display. Unparseable text is shown as-is.
    pub fn display_time(&self) -> String {
        match self {
            Timestamp::Millis(ms) => local_time_from_millis(*ms).unwrap_or_else(|| ms.to_string()),
            Timestamp::Float(ms) => {
                local_time_from_millis(ms.round() as i64).unwrap_or_else(|| ms.to_string())
            }
            Timestamp::Text(raw) => {
                if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
                    return dt.with_timezone(&Local).format("%H:%M:%S").to_string();
                }
                // isoformat() without an offset, already local to the service
                if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
                    return naive.format("%H:%M:%S").to_string();
                }
                raw.clone()
            }
            Timestamp::Other(serde_json::Value::Null) => String::new(),
            Timestamp::Other(value) => value.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Message {
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub timestamp: Timestamp,
}

impl Message {
    pub const AGENT_ROLE: &'static str = "Agent";

    pub fn is_agent(&self) -> bool {
        self.role == Self::AGENT_ROLE
    }
}

/// Conversation descriptor as announced by `conversations_created`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ConversationSummary {
    pub id: String,
    #[serde(rename = "userPromptId")]
    pub user_prompt_id: PromptId,
    pub status: ConversationStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub id: String,
    pub user_prompt_id: PromptId,
    pub status: ConversationStatus,
    pub messages: Vec<Message>,
}

impl From<ConversationSummary> for Conversation {
    fn from(summary: ConversationSummary) -> Self {
        Self {
            id: summary.id,
            user_prompt_id: summary.user_prompt_id,
            status: summary.status,
            messages: Vec::new(),
        }
    }
}

impl Conversation {
    pub fn is_completed(&self) -> bool {
        self.status == ConversationStatus::Completed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    Disconnected,
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_ids_are_distinct() {
        let a = ClientId::generate();
        let b = ClientId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("client-"));
        assert_eq!(a.as_str().len(), "client-".len() + 32);
    }

    #[test]
    fn prompt_id_accepts_numbers_and_numeric_strings() {
        let from_num: PromptId = serde_json::from_str("1712345678901").unwrap();
        let from_str: PromptId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(from_num, PromptId(1712345678901));
        assert_eq!(from_str, PromptId(42));
        assert!(serde_json::from_str::<PromptId>("\"abc\"").is_err());
    }

    #[test]
    fn prompt_entry_wire_shape() {
        let entry = UserPromptEntry { id: PromptId(7), content: "Hi".into(), selected: true };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json, serde_json::json!({"id": 7, "content": "Hi", "selected": true}));
    }

    #[test]
    fn runnable_requires_selection_and_text() {
        let mut entry = UserPromptEntry::empty(PromptId(1));
        assert!(!entry.is_runnable());
        entry.content = "   ".into();
        assert!(!entry.is_runnable());
        entry.content = "Xin chào".into();
        assert!(entry.is_runnable());
        entry.selected = false;
        assert!(!entry.is_runnable());
    }

    #[test]
    fn timestamp_keeps_both_wire_forms() {
        let text: Timestamp = serde_json::from_str("\"2024-05-01T10:20:30.123456\"").unwrap();
        assert_eq!(text, Timestamp::Text("2024-05-01T10:20:30.123456".into()));
        let millis: Timestamp = serde_json::from_str("1714558830000").unwrap();
        assert_eq!(millis, Timestamp::Millis(1714558830000));
    }

    #[test]
    fn fractional_and_missing_timestamps_still_decode() {
        let millis: Timestamp = serde_json::from_str("1714558830123.5").unwrap();
        assert!(matches!(millis, Timestamp::Float(ms) if (ms - 1714558830123.5).abs() < 0.01));
        assert_eq!(millis.display_time(), Timestamp::Millis(1714558830124).display_time());

        let msg: Message =
            serde_json::from_str(r#"{"role":"Agent","content":"hi","timestamp":null}"#).unwrap();
        assert_eq!(msg.timestamp, Timestamp::Other(serde_json::Value::Null));
        assert_eq!(msg.timestamp.display_time(), "");

        let msg: Message = serde_json::from_str(r#"{"role":"Agent","content":"hi"}"#).unwrap();
        assert_eq!(msg.timestamp, Timestamp::default());

        let odd: Timestamp = serde_json::from_str(r#"{"at":5}"#).unwrap();
        assert_eq!(odd.display_time(), r#"{"at":5}"#);
    }

    #[test]
    fn naive_timestamp_is_shown_without_conversion() {
        let ts = Timestamp::Text("2024-05-01T10:20:30.5".into());
        assert_eq!(ts.display_time(), "10:20:30");
    }

    #[test]
    fn garbage_timestamp_is_shown_verbatim() {
        let ts = Timestamp::Text("yesterday-ish".into());
        assert_eq!(ts.display_time(), "yesterday-ish");
    }

    #[test]
    fn summary_uses_camel_case_prompt_reference() {
        let summary: ConversationSummary = serde_json::from_str(
            r#"{"id":"abc","userPromptId":3,"status":"in_progress"}"#,
        )
        .unwrap();
        let conv = Conversation::from(summary);
        assert_eq!(conv.user_prompt_id, PromptId(3));
        assert_eq!(conv.status, ConversationStatus::InProgress);
        assert!(conv.messages.is_empty());
    }
}
