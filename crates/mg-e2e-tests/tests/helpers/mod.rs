//! Shared harness for the end-to-end tests.
//!
//! Builds the same object graph as the bot binary: a `ModelAdapter` over a
//! scripted `MockBackend`, a `ResourceStore`, and a `Dispatcher` on top.
//! Tests talk to the dispatcher the way the update loop does, one message
//! string in, one reply string out.

use std::sync::Arc;

use mg_adapter::{AdapterConfig, InferenceBackend, MockBackend, ModelAdapter};
use mg_bot::config::BotConfig;
use mg_bot::dispatcher::Dispatcher;
use mg_store::ResourceStore;

/// Telegram user id the plain `say` helper sends as.
pub const USER: i64 = 9001;

/// Fully wired bot minus the Telegram transport.
pub struct TestHarness {
    /// Scripted inference backend behind the adapter.
    pub backend: Arc<MockBackend>,
    /// The adapter the dispatcher serves predictions from.
    pub adapter: Arc<ModelAdapter>,
    /// Message entry point, wired exactly as in the binary.
    pub dispatcher: Dispatcher,
}

impl TestHarness {
    /// Harness over an empty in-memory store, no model loaded, switching
    /// open to everyone.
    pub fn empty() -> Self {
        Self::build(ResourceStore::in_memory(), BotConfig::default())
    }

    /// Harness over the seeded sample store, no model loaded.
    pub fn with_sample_data() -> Self {
        Self::build(ResourceStore::with_sample_data(), BotConfig::default())
    }

    /// Harness with `/switch` restricted to the given user ids.
    pub fn with_admins(admins: &[i64]) -> Self {
        let mut config = BotConfig::default();
        config.bot.admin_user_ids = admins.to_vec();
        Self::build(ResourceStore::in_memory(), config)
    }

    fn build(store: ResourceStore, config: BotConfig) -> Self {
        let backend = Arc::new(MockBackend::new());
        let adapter = Arc::new(ModelAdapter::new(
            Arc::clone(&backend) as Arc<dyn InferenceBackend>,
            AdapterConfig::default(),
        ));
        let dispatcher = Dispatcher::new(Arc::clone(&adapter), store, &config);
        Self {
            backend,
            adapter,
            dispatcher,
        }
    }

    /// Load a model directly, as the binary does at startup.
    pub async fn load(&self, identifier: &str) {
        self.adapter
            .load(identifier)
            .await
            .expect("model load should succeed");
    }

    /// Send a message as an unprivileged user and return the reply.
    pub async fn say(&self, text: &str) -> String {
        self.dispatcher.handle(USER, text).await
    }

    /// Send a message as a specific user and return the reply.
    pub async fn say_as(&self, user: i64, text: &str) -> String {
        self.dispatcher.handle(user, text).await
    }
}
