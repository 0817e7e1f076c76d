//! Model switching end to end: admin gating, atomic replacement, the
//! busy path, and the degraded fallback.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use helpers::TestHarness;

const ADMIN: i64 = 42;
const STRANGER: i64 = 7;

/// An admin switch replaces the serving model; the next chat is templated
/// for and labeled with the new model.
#[tokio::test]
async fn e2e_admin_switch_changes_serving_model() {
    let h = TestHarness::with_admins(&[ADMIN]);
    h.load("gpt2").await;

    let reply = h.say_as(ADMIN, "/switch microsoft/phi-2").await;
    assert_eq!(reply, "Switched to microsoft/phi-2 (text-generation).");

    h.backend.queue_generation(Ok("Phi says hello.".into()));
    let chat = h.say("/chat hello").await;

    assert!(chat.contains("[microsoft/phi-2 |"));
    assert_eq!(
        h.backend.last_prompt().as_deref(),
        Some("Instruct: hello\nOutput:")
    );
}

/// A non-admin switch is refused before anything reaches the backend.
#[tokio::test]
async fn e2e_non_admin_switch_never_reaches_backend() {
    let h = TestHarness::with_admins(&[ADMIN]);

    let reply = h.say_as(STRANGER, "/switch gpt2").await;
    assert_eq!(reply, "Sorry, only administrators can switch models.");

    assert!(h.backend.loads().is_empty());
    assert_eq!(h.adapter.current_model().await, None);
}

/// A switch to a model that fails to load keeps the previous model
/// serving chats.
#[tokio::test]
async fn e2e_failed_switch_keeps_previous_model_serving() {
    let h = TestHarness::empty();
    h.load("gpt2").await;
    h.backend.refuse_model("unobtainium");

    let reply = h.say("/switch acme/unobtainium-70b").await;
    assert!(reply.starts_with("Could not load acme/unobtainium-70b:"));
    assert!(reply.ends_with("The previous model is still active."));

    h.backend.queue_generation(Ok("Still here.".into()));
    let chat = h.say("/chat are you alive?").await;
    assert!(chat.starts_with("Still here."));
    assert!(chat.contains("[gpt2 |"));
}

/// A switch issued while another load is mid-flight reports busy instead
/// of queueing, and the first load completes untouched.
#[tokio::test]
async fn e2e_switch_during_switch_reports_busy() {
    let h = TestHarness::empty();
    h.backend.set_load_delay(Duration::from_millis(200));

    let slow = {
        let adapter = Arc::clone(&h.adapter);
        tokio::spawn(async move { adapter.load("gpt2").await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let reply = h.say("/switch microsoft/phi-2").await;
    assert_eq!(
        reply,
        "A model switch is already in progress. Please try again shortly."
    );

    slow.await.unwrap().unwrap();
    assert_eq!(h.adapter.current_model().await.as_deref(), Some("gpt2"));
}

/// When the configured model fails at startup, the baseline takes over,
/// `/info` admits the degradation, and chats are labeled with the
/// baseline.
#[tokio::test]
async fn e2e_startup_fallback_serves_degraded_baseline() {
    let h = TestHarness::empty();
    h.backend.refuse_model("unobtainium");

    let info = h
        .adapter
        .load_with_fallback("acme/unobtainium-70b")
        .await
        .unwrap();
    assert!(info.degraded);

    let info_reply = h.say("/info").await;
    assert!(info_reply.contains("Model: gpt2 (text-generation)"));
    assert!(info_reply.contains("fallback baseline"));

    h.backend.queue_generation(Ok("Baseline speaking.".into()));
    let chat = h.say("/chat hi").await;
    assert!(chat.contains("[gpt2 |"));
}
