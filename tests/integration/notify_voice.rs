//! Voice-call channel against a mock provider API.

use std::sync::Arc;

use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use taskwarden::config::VoiceCallConfig;
use taskwarden::reminder::{NotificationChannel, VoiceCallChannel, deliver_to_all};

fn config_for(server: &MockServer) -> VoiceCallConfig {
    VoiceCallConfig {
        enabled: true,
        api_base: server.uri(),
        account_sid: "AC123".to_owned(),
        auth_token: "secret".to_owned(),
        from_number: "+15550000".to_owned(),
        to_numbers: Vec::new(),
    }
}

#[tokio::test]
async fn call_posts_the_expected_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/AC123/Calls.json"))
        .and(body_string_contains("To=%2B15551234"))
        .and(body_string_contains("From=%2B15550000"))
        .and(body_string_contains("Say"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "sid": "CA999"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let channel = VoiceCallChannel::new(&config_for(&server));
    channel
        .deliver("+15551234", "Reminder for task: Pay bill")
        .await
        .expect("delivery succeeds");
}

#[tokio::test]
async fn provider_error_is_surfaced_per_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("provider exploded"))
        .mount(&server)
        .await;

    let channel = VoiceCallChannel::new(&config_for(&server));
    let err = channel
        .deliver("+15551234", "hello")
        .await
        .expect_err("delivery fails");
    assert!(err.to_string().contains("500"));
}

#[tokio::test]
async fn batch_attempts_every_recipient_even_when_all_fail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let channel: Arc<dyn NotificationChannel> =
        Arc::new(VoiceCallChannel::new(&config_for(&server)));
    let recipients = vec!["+15550001".to_owned(), "+15550002".to_owned()];

    let outcomes = deliver_to_all(std::slice::from_ref(&channel), &recipients, "hi").await;
    assert_eq!(outcomes.len(), 2);
    assert!(outcomes.iter().all(|o| !o.succeeded()));
    assert!(outcomes.iter().all(|o| o.channel == "voice"));
}
