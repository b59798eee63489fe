use super::*;

#[test]
fn entity_not_found_code_asks_for_reauth() {
    let raw = r#"{"code":"E_ENTITY_NOT_FOUND","message":"model gone","retryable":false}"#;
    let err = classify_failure(502, raw);
    assert!(matches!(err, ChatError::EntityNotFound(ref m) if m == "model gone"));
}

#[test]
fn rate_limit_code_is_quota() {
    let raw = r#"{"code":"E_RATE_LIMITED","message":"slow down","retryable":true}"#;
    assert!(matches!(classify_failure(429, raw), ChatError::Quota(_)));
}

#[test]
fn upstream_quota_status_is_quota() {
    let raw = r#"{"code":"E_API_RESPONSE","message":"resource exhausted","retryable":true}"#;
    assert!(matches!(classify_failure(429, raw), ChatError::Quota(_)));
}

#[test]
fn other_failures_are_generic() {
    let raw = r#"{"code":"E_LLM_NOT_CONFIGURED","message":"no key","retryable":false}"#;
    assert!(matches!(classify_failure(503, raw), ChatError::Request(ref m) if m == "no key"));
}

#[test]
fn unparseable_body_falls_back_to_status() {
    let err = classify_failure(500, "<html>oops</html>");
    assert!(matches!(err, ChatError::Request(ref m) if m == "HTTP 500"));
}

#[test]
fn request_body_matches_server_shape() {
    let history = vec![ChatMessage::assistant("Welcome"), ChatMessage::user("Hi")];
    let id = Uuid::nil();
    let body = ChatRequest { client_id: id, history: &history, message: "What do you do?" };
    let json = serde_json::to_value(&body).unwrap();

    assert_eq!(json["client_id"], serde_json::json!(id));
    assert_eq!(json["message"], "What do you do?");
    assert_eq!(json["history"][0]["is_user"], false);
    assert_eq!(json["history"][1]["text"], "Hi");
}

#[test]
fn responder_targets_chat_route() {
    let responder = HttpResponder::new("http://localhost:3000/");
    assert_eq!(responder.url, "http://localhost:3000/api/chat");
}
