// Serialization tests for the backend wire format

use agrogpt_client::backend::wire::{ChatRequest, ChatResponse, TranscribeResponse, TranslateRequest};
use agrogpt_client::{Language, Message, Role};

#[test]
fn test_chat_request_shape() {
    let request = ChatRequest {
        session_id: "s1".to_string(),
        messages: vec![
            Message::user("When should I plant wheat?"),
            Message::assistant("Plant in spring."),
        ],
        target_language: Language::Hindi,
    };

    let json = serde_json::to_value(&request).unwrap();

    assert_eq!(json["session_id"], "s1");
    assert_eq!(json["target_language"], "Hindi");
    assert_eq!(json["messages"][0]["role"], "user");
    assert_eq!(json["messages"][0]["content"], "When should I plant wheat?");
    assert_eq!(json["messages"][1]["role"], "assistant");
}

#[test]
fn test_chat_response() {
    let response: ChatResponse = serde_json::from_str(r#"{ "reply": "Plant in spring." }"#).unwrap();
    assert_eq!(response.reply, "Plant in spring.");
}

#[test]
fn test_history_message_roles() {
    let history: Vec<Message> = serde_json::from_str(
        r#"[
            { "role": "user", "content": "Is it going to rain?" },
            { "role": "assistant", "content": "Light showers expected." }
        ]"#,
    )
    .unwrap();

    assert_eq!(history[0].role, Role::User);
    assert_eq!(history[1].role, Role::Assistant);
}

#[test]
fn test_unknown_role_is_rejected() {
    let result: Result<Message, _> =
        serde_json::from_str(r#"{ "role": "system", "content": "Init" }"#);
    assert!(result.is_err());
}

#[test]
fn test_transcribe_response_without_transcript() {
    let response: TranscribeResponse = serde_json::from_str("{}").unwrap();
    assert_eq!(response.transcript, "");
}

#[test]
fn test_translate_request_shape() {
    let request = TranslateRequest {
        text: "Rice needs water".to_string(),
        source_language: Language::English,
        target_language: Language::Kannada,
    };

    let json = serde_json::to_string(&request).unwrap();

    assert!(json.contains("\"source_language\":\"English\""));
    assert!(json.contains("\"target_language\":\"Kannada\""));
    assert!(json.contains("\"text\":\"Rice needs water\""));
}
