use serde::{Deserialize, Serialize};

use crate::api::models::{ConversationSummary, Message, UserPromptEntry};

/// Frames sent to the simulation service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientRequest {
    StartConversation {
        agent_prompt: String,
        user_prompts: Vec<UserPromptEntry>,
    },
}

impl ClientRequest {
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Frames streamed back by the simulation service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    ConversationsCreated {
        conversations: Vec<ConversationSummary>,
    },
    Message {
        conversation_id: String,
        message: Message,
    },
    Completion {
        conversation_id: String,
    },
    #[serde(other)]
    Unknown,
}

impl ServerEvent {
    /// Decodes one text frame. `Ok(None)` for event types this client does not handle.
    pub fn decode(text: &str) -> Result<Option<Self>, serde_json::Error> {
        match serde_json::from_str::<ServerEvent>(text)? {
            ServerEvent::Unknown => Ok(None),
            event => Ok(Some(event)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{ConversationStatus, PromptId, Timestamp};

    #[test]
    fn start_request_wire_shape() {
        let req = ClientRequest::StartConversation {
            agent_prompt: "Hello".into(),
            user_prompts: vec![UserPromptEntry { id: PromptId(1), content: "Hi".into(), selected: true }],
        };
        let value: serde_json::Value = serde_json::from_str(&req.encode().unwrap()).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "start_conversation",
                "agent_prompt": "Hello",
                "user_prompts": [{"id": 1, "content": "Hi", "selected": true}]
            })
        );
    }

    #[test]
    fn decodes_conversations_created() {
        let frame = r#"{"type":"conversations_created","conversations":[
            {"id":"c-1","userPromptId":1,"status":"in_progress"},
            {"id":"c-2","userPromptId":"2","status":"completed"}]}"#;
        match ServerEvent::decode(frame).unwrap() {
            Some(ServerEvent::ConversationsCreated { conversations }) => {
                assert_eq!(conversations.len(), 2);
                assert_eq!(conversations[1].user_prompt_id, PromptId(2));
                assert_eq!(conversations[1].status, ConversationStatus::Completed);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn decodes_message_and_completion() {
        let frame = r#"{"type":"message","conversation_id":"c-1",
            "message":{"role":"Agent","content":"Chào bạn","timestamp":"2024-05-01T10:20:30Z"}}"#;
        let Some(ServerEvent::Message { conversation_id, message }) = ServerEvent::decode(frame).unwrap() else {
            panic!("expected message event");
        };
        assert_eq!(conversation_id, "c-1");
        assert!(message.is_agent());
        assert_eq!(message.timestamp, Timestamp::Text("2024-05-01T10:20:30Z".into()));

        let done = ServerEvent::decode(r#"{"type":"completion","conversation_id":"c-1"}"#).unwrap();
        assert_eq!(done, Some(ServerEvent::Completion { conversation_id: "c-1".into() }));
    }

    #[test]
    fn message_with_unusual_timestamp_is_kept() {
        for raw in ["1714558830123.5", "1714558830.123", "null"] {
            let frame = format!(
                r#"{{"type":"message","conversation_id":"c-1","message":{{"role":"User 1","content":"hey","timestamp":{raw}}}}}"#
            );
            match ServerEvent::decode(&frame) {
                Ok(Some(ServerEvent::Message { message, .. })) => assert_eq!(message.content, "hey"),
                other => panic!("timestamp {raw} lost the message: {other:?}"),
            }
        }
    }

    #[test]
    fn unknown_types_are_ignored() {
        assert_eq!(ServerEvent::decode(r#"{"type":"typing","conversation_id":"c-1"}"#).unwrap(), None);
    }

    #[test]
    fn malformed_frames_are_errors() {
        assert!(ServerEvent::decode("not json").is_err());
        assert!(ServerEvent::decode(r#"{"conversation_id":"c-1"}"#).is_err());
        assert!(ServerEvent::decode(r#"{"type":"completion"}"#).is_err());
    }
}
