//! POST /api/v1/send_mail tests

use crate::common::{test_config, RecordingDelivery, TestApp};
use axum::http::StatusCode;
use mail_relay::config::FormMode;
use mail_relay::email::DeliveryError;
use pretty_assertions::assert_eq;
use rstest::rstest;
use serde_json::json;

mod common;

const SEND_MAIL: &str = "/api/v1/send_mail";

#[tokio::test]
async fn test_json_submission_is_relayed() {
    let app = TestApp::strict();

    let (status, body) = app
        .post_json(
            SEND_MAIL,
            json!({
                "name": "Ada Lovelace",
                "email": "ada@example.com",
                "subject": "Engines",
                "message": "About the analytical engine",
                "company": ""
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));

    let sent = app.delivery.sent();
    assert_eq!(sent.len(), 1);
    let message = &sent[0];
    assert_eq!(message.to_address, "inbox@example.com");
    assert_eq!(message.from_address, "relay@example.com");
    assert_eq!(message.from_mailbox().to_string(), "Ada Lovelace <relay@example.com>");
    assert_eq!(message.subject, "[Contact] Engines");
    assert_eq!(
        message.reply_to.as_ref().unwrap().to_string(),
        "Ada Lovelace <ada@example.com>"
    );
    assert!(message.body.starts_with("New contact form submission\n\n"));
    assert!(message.body.contains("Message:\nAbout the analytical engine\n"));
}

#[tokio::test]
async fn test_form_submission_is_relayed() {
    let app = TestApp::strict();

    let (status, body) = app
        .post_form(
            SEND_MAIL,
            "name=Ada&email=ada%40example.com&message=Hello+from+a+form",
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));
    let sent = app.delivery.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].subject, "[Contact] Website contact");
    assert!(sent[0].body.contains("Hello from a form"));
}

#[tokio::test]
async fn test_each_request_sends_exactly_once() {
    let app = TestApp::strict();
    let payload = json!({"name": "Ada", "email": "ada@example.com", "message": "hi"});

    for _ in 0..3 {
        let (status, _) = app.post_json(SEND_MAIL, payload.clone()).await;
        assert_eq!(status, StatusCode::OK);
    }

    assert_eq!(app.delivery.sent().len(), 3);
}

#[rstest]
#[case::json(r#"{"message": "buy now", "company": "Spam LLC"}"#)]
#[case::form("message=buy+now&company=Spam+LLC")]
#[case::invalid_rest(r#"{"email": "nope", "company": "x"}"#)]
#[tokio::test]
async fn test_honeypot_pretends_success(#[case] body: &str) {
    let app = TestApp::strict();

    let (status, response) = app.post_form(SEND_MAIL, body).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(response, json!({"ok": true}));
    assert!(app.delivery.sent().is_empty());
}

#[tokio::test]
async fn test_configured_honeypot_field() {
    let mut config = test_config(FormMode::Strict);
    config.form.honeypot_field = "honeypot".to_string();
    let app = TestApp::new(config, RecordingDelivery::succeeding());

    let (status, _) = app
        .post_json(
            SEND_MAIL,
            json!({"name": "Bot", "email": "bot@example.com", "message": "x", "honeypot": "filled"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(app.delivery.sent().is_empty());

    // The default field name no longer counts
    let (status, _) = app
        .post_json(
            SEND_MAIL,
            json!({"name": "Ada", "email": "ada@example.com", "message": "x", "company": "ACME"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(app.delivery.sent().len(), 1);
}

#[rstest]
#[case::empty_body(json!({"name": "Ada", "email": "ada@example.com", "message": ""}))]
#[case::whitespace_body(json!({"name": "Ada", "email": "ada@example.com", "message": "  \n\t "}))]
#[case::missing_name(json!({"email": "ada@example.com", "message": "hi"}))]
#[case::blank_name(json!({"name": "   ", "email": "ada@example.com", "message": "hi"}))]
#[case::no_at_sign(json!({"name": "Ada", "email": "noatsign", "message": "hi"}))]
#[case::no_dot(json!({"name": "Ada", "email": "a@b", "message": "hi"}))]
#[case::embedded_space(json!({"name": "Ada", "email": "a @b.co", "message": "hi"}))]
#[case::empty_object(json!({}))]
#[tokio::test]
async fn test_invalid_input_is_rejected(#[case] payload: serde_json::Value) {
    let app = TestApp::strict();

    let (status, body) = app.post_json(SEND_MAIL, payload).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"ok": false, "error": "Invalid input"}));
    assert!(app.delivery.sent().is_empty());
}

#[tokio::test]
async fn test_empty_request_body_is_rejected() {
    let app = TestApp::strict();

    let (status, body) = app.post_form(SEND_MAIL, "").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert!(app.delivery.sent().is_empty());
}

#[tokio::test]
async fn test_delivery_failure_is_bad_gateway() {
    let app = TestApp::new(
        test_config(FormMode::Strict),
        RecordingDelivery::failing(DeliveryError::Connection("connection refused".to_string())),
    );

    let (status, body) = app
        .post_json(
            SEND_MAIL,
            json!({"name": "Ada", "email": "ada@example.com", "message": "hi"}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({"ok": false, "error": "connection refused"}));
    assert_eq!(app.delivery.sent().len(), 1);
}

#[tokio::test]
async fn test_authentication_failure_is_bad_gateway() {
    let app = TestApp::new(
        test_config(FormMode::Strict),
        RecordingDelivery::failing(DeliveryError::Authentication(
            "permanent error (535): 5.7.8 Username and Password not accepted".to_string(),
        )),
    );

    let (status, body) = app
        .post_json(
            SEND_MAIL,
            json!({"name": "Ada", "email": "ada@example.com", "message": "hi"}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(
        body["error"],
        "permanent error (535): 5.7.8 Username and Password not accepted"
    );
}

#[tokio::test]
async fn test_header_injection_is_neutralized() {
    let app = TestApp::strict();

    let (status, _) = app
        .post_json(
            SEND_MAIL,
            json!({
                "name": "Eve\r\nBcc: victim@example.com",
                "email": "eve@example.com",
                "subject": "Hello\nX-Injected: 1",
                "message": "multi\nline\nbody"
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    let sent = app.delivery.sent();
    let message = &sent[0];
    for header in [
        message.subject.clone(),
        message.from_mailbox().to_string(),
        message.reply_to.as_ref().unwrap().to_string(),
    ] {
        assert!(!header.contains(['\r', '\n']), "header carries a line break: {:?}", header);
    }
    assert!(message.body.contains("multi\nline\nbody"));
}

#[tokio::test]
async fn test_email_with_newline_is_rejected_in_strict_mode() {
    let app = TestApp::strict();

    let (status, _) = app
        .post_json(
            SEND_MAIL,
            json!({"name": "Eve", "email": "eve@example.com\nBcc: x@y.z", "message": "hi"}),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.delivery.sent().is_empty());
}

#[tokio::test]
async fn test_minimal_mode_relays_body_verbatim() {
    let app = TestApp::new(test_config(FormMode::Minimal), RecordingDelivery::succeeding());

    let (status, body) = app
        .post_json(SEND_MAIL, json!({"body": "  Just the body\nplease  "}))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"ok": true}));
    let sent = app.delivery.sent();
    assert_eq!(sent[0].body, "Just the body\nplease");
    assert_eq!(sent[0].from_display_name, None);
    assert_eq!(sent[0].reply_to, None);
}

#[tokio::test]
async fn test_minimal_mode_still_requires_body() {
    let app = TestApp::new(test_config(FormMode::Minimal), RecordingDelivery::succeeding());

    let (status, body) = app
        .post_json(SEND_MAIL, json!({"name": "Ada", "email": "ada@example.com"}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"ok": false, "error": "Invalid input"}));
    assert!(app.delivery.sent().is_empty());
}

#[tokio::test]
async fn test_wrong_method_gets_json_error() {
    let app = TestApp::strict();

    let (status, body) = app.get(SEND_MAIL).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["ok"], false);
}
