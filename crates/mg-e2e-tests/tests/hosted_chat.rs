//! Chat served through the real hosted HTTP backend, with the inference
//! API stood in by a local mock server. The one test family that crosses
//! every crate boundary, wire included.

use std::sync::Arc;

use mg_adapter::{AdapterConfig, HostedBackend, HostedConfig, InferenceBackend, ModelAdapter};
use mg_bot::config::BotConfig;
use mg_bot::dispatcher::Dispatcher;
use mg_store::ResourceStore;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Build the binary's object graph over a hosted backend pointed at the
/// mock server, and load gpt2 through it. Mocks must be mounted first.
async fn dispatcher_for(server: &MockServer) -> Dispatcher {
    let config = HostedConfig {
        api_base: server.uri(),
        api_token: None,
        request_timeout_secs: 2,
        load_timeout_secs: 2,
    };
    let backend = Arc::new(HostedBackend::new(config)) as Arc<dyn InferenceBackend>;
    let adapter = Arc::new(ModelAdapter::new(backend, AdapterConfig::default()));
    adapter
        .load("gpt2")
        .await
        .expect("warm-up against the mock server should succeed");
    Dispatcher::new(adapter, ResourceStore::in_memory(), &BotConfig::default())
}

/// A chat travels dispatcher -> adapter -> HTTP -> back, and the reply
/// carries the generated text with a footer.
#[tokio::test]
async fn e2e_hosted_generation_roundtrip() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/models/gpt2"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"generated_text": "Hosted reply text."}])),
        )
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server).await;
    let reply = dispatcher.handle(1, "/chat say hi").await;

    assert!(reply.starts_with("Hosted reply text."));
    assert!(reply.contains("[gpt2 | confidence 80% |"));
}

/// The API going down mid-conversation surfaces as the apology, not as a
/// crash or a footered reply.
#[tokio::test]
async fn e2e_hosted_outage_becomes_apology() {
    let server = MockServer::start().await;
    // First call is the load warm-up; everything after it gets a 503.
    Mock::given(method("POST"))
        .and(path("/models/gpt2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"generated_text": "warm"}])),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/models/gpt2"))
        .respond_with(ResponseTemplate::new(503).set_body_string("model gpt2 is loading"))
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server).await;
    let reply = dispatcher.handle(1, "/chat still there?").await;

    assert!(reply.contains("trouble processing"));
    assert!(!reply.contains("[gpt2"));
}
