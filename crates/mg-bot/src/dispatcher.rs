//! Command dispatch: one incoming message in, one reply text out.
//!
//! Transport-independent on purpose. The update loop hands every text
//! message to `Dispatcher::handle`, which routes commands to the model
//! adapter or the resource store and renders plain-text replies. All
//! adapter and store failures have already been converted to polite
//! values by those layers, so nothing here returns an error.

use std::sync::Arc;
use std::time::{Duration, Instant};

use mg_adapter::{AdapterError, ModelAdapter, catalog};
use mg_protocol::{ContractRecord, GenerationOptions, Prediction, UrlResource};
use mg_store::ResourceStore;

use crate::commands::{self, Command};
use crate::config::BotConfig;

/// Most store matches rendered in one reply.
const MAX_SEARCH_RESULTS: usize = 5;

const START_TEXT: &str = "Hi! I'm Magpie. Send me any message and I'll run it through the \
loaded language model, look up saved URLs and contract addresses, or use /help to see \
every command.";

const HELP_TEXT: &str = "Commands:
/chat <text> - generate a reply with the loaded model (/ask and /predict work too)
/info - current model and settings
/models - known model identifiers, grouped by task
/switch <identifier> - load a different model (admins only)
/url <name> - look up a saved URL
/contract <name> - look up a saved contract address
/add_url <name> <url> [description] - save a URL
/add_contract <name> <address> [network] [description] - save a contract

Plain messages mentioning \"url\"/\"link\" or \"contract\"/\"address\" search the \
store first; everything else goes to the model.";

/// Routes parsed commands and renders replies.
pub struct Dispatcher {
    adapter: Arc<ModelAdapter>,
    store: ResourceStore,
    admin_user_ids: Vec<i64>,
    max_response_length: usize,
    bot_username: Option<String>,
}

impl Dispatcher {
    pub fn new(adapter: Arc<ModelAdapter>, store: ResourceStore, config: &BotConfig) -> Self {
        Self {
            adapter,
            store,
            admin_user_ids: config.bot.admin_user_ids.clone(),
            max_response_length: config.bot.max_response_length,
            bot_username: None,
        }
    }

    /// Set the bot's own username (from `getMe`) so `/cmd@botname` forms
    /// are recognized as ours.
    pub fn with_username(mut self, username: Option<String>) -> Self {
        self.bot_username = username;
        self
    }

    /// Route one message to a reply. An empty reply means the message was
    /// addressed to a different bot and no response should be sent.
    pub async fn handle(&self, from_user: i64, text: &str) -> String {
        match commands::parse(text, self.bot_username.as_deref()) {
            Command::Ignored => String::new(),
            Command::Start => START_TEXT.to_string(),
            Command::Help => HELP_TEXT.to_string(),
            Command::Chat { text } => {
                if text.is_empty() {
                    "Usage: /chat <message>".to_string()
                } else {
                    self.predict_reply(&text).await
                }
            }
            Command::Info => self.info_reply().await,
            Command::Models => models_reply(),
            Command::Switch { identifier } => self.switch_reply(from_user, &identifier).await,
            Command::Url { name } => self.url_reply(&name).await,
            Command::Contract { name } => self.contract_reply(&name).await,
            Command::AddUrl {
                name,
                url,
                description,
            } => self.add_url_reply(&name, &url, description).await,
            Command::AddContract {
                name,
                address,
                network,
                description,
            } => {
                self.add_contract_reply(&name, &address, network, description)
                    .await
            }
            Command::Unknown { command } => format!("Unknown command {command}. Try /help."),
            Command::Plain { text } => self.plain_reply(&text).await,
        }
    }

    // ── Model commands ────────────────────────────────────────

    async fn predict_reply(&self, text: &str) -> String {
        let started = Instant::now();
        let prediction = self
            .adapter
            .predict(text, GenerationOptions::default())
            .await;
        self.render_prediction(prediction, started.elapsed())
    }

    /// Successful predictions get a footer with model, confidence, and
    /// elapsed time; failure predictions go out as their message alone.
    fn render_prediction(&self, prediction: Prediction, elapsed: Duration) -> String {
        if prediction.is_error() {
            return prediction.response;
        }
        let mut reply = truncate(&prediction.response, self.max_response_length);
        let model = prediction.model.as_deref().unwrap_or("unknown");
        let confidence = (prediction.confidence * 100.0).round() as i32;
        reply.push_str(&format!(
            "\n\n[{model} | confidence {confidence}% | {:.1}s]",
            elapsed.as_secs_f64()
        ));
        reply
    }

    async fn info_reply(&self) -> String {
        let info = self.adapter.info().await;
        let mut lines = Vec::new();
        match (&info.identifier, info.task) {
            (Some(identifier), Some(task)) => lines.push(format!("Model: {identifier} ({task})")),
            _ => lines.push("Model: none loaded".to_string()),
        }
        lines.push(format!(
            "Device: {} | max length {} | quantized: {}",
            info.device,
            info.max_length,
            if info.quantized { "yes" } else { "no" }
        ));
        if info.degraded {
            lines.push(
                "Running the fallback baseline; the configured model failed to load.".to_string(),
            );
        }
        lines.push(format!(
            "Store: {}",
            if self.store.is_persistent() {
                "postgres"
            } else {
                "in-memory"
            }
        ));
        lines.join("\n")
    }

    async fn switch_reply(&self, from_user: i64, identifier: &str) -> String {
        if !self.is_admin(from_user) {
            return "Sorry, only administrators can switch models.".to_string();
        }
        if identifier.is_empty() {
            return "Usage: /switch <identifier>".to_string();
        }
        match self.adapter.load(identifier).await {
            Ok(info) => {
                let task = info
                    .task
                    .map(|task| task.to_string())
                    .unwrap_or_else(|| "unknown".into());
                format!("Switched to {identifier} ({task}).")
            }
            Err(AdapterError::Busy) => {
                "A model switch is already in progress. Please try again shortly.".to_string()
            }
            Err(e) => format!("Could not load {identifier}: {e}. The previous model is still active."),
        }
    }

    fn is_admin(&self, user_id: i64) -> bool {
        self.admin_user_ids.is_empty() || self.admin_user_ids.contains(&user_id)
    }

    // ── Store commands ────────────────────────────────────────

    async fn url_reply(&self, name: &str) -> String {
        if name.is_empty() {
            return "Usage: /url <name>".to_string();
        }
        if let Some(found) = self.store.get_url(name).await {
            return render_url(&found);
        }
        let similar = self.store.search_urls(name).await;
        if similar.is_empty() {
            format!("No URL saved under '{name}'.")
        } else {
            format!("No URL named '{name}'. Similar entries:\n{}", render_url_list(&similar))
        }
    }

    async fn contract_reply(&self, name: &str) -> String {
        if name.is_empty() {
            return "Usage: /contract <name>".to_string();
        }
        if let Some(found) = self.store.get_contract(name).await {
            return render_contract(&found);
        }
        let similar = self.store.search_contracts(name).await;
        if similar.is_empty() {
            format!("No contract saved under '{name}'.")
        } else {
            format!(
                "No contract named '{name}'. Similar entries:\n{}",
                render_contract_list(&similar)
            )
        }
    }

    async fn add_url_reply(&self, name: &str, url: &str, description: Option<String>) -> String {
        if name.is_empty() || url.is_empty() {
            return "Usage: /add_url <name> <url> [description]".to_string();
        }
        if self.store.add_url(name, url, description).await {
            format!("Saved URL '{name}'.")
        } else {
            format!("A URL named '{name}' already exists.")
        }
    }

    async fn add_contract_reply(
        &self,
        name: &str,
        address: &str,
        network: Option<String>,
        description: Option<String>,
    ) -> String {
        if name.is_empty() || address.is_empty() {
            return "Usage: /add_contract <name> <address> [network] [description]".to_string();
        }
        if self.store.add_contract(name, address, network, description).await {
            format!("Saved contract '{name}'.")
        } else {
            format!("A contract named '{name}' already exists.")
        }
    }

    /// Plain text: keyword-routed store search, then the model.
    ///
    /// The whole message is the search query; that only matches short
    /// lookup-style messages, which is the point. Anything that finds
    /// nothing falls through to predict.
    async fn plain_reply(&self, text: &str) -> String {
        let lower = text.to_lowercase();
        if lower.contains("url") || lower.contains("link") {
            let hits = self.store.search_urls(text).await;
            if !hits.is_empty() {
                return render_url_list(&hits);
            }
        } else if lower.contains("contract") || lower.contains("address") {
            let hits = self.store.search_contracts(text).await;
            if !hits.is_empty() {
                return render_contract_list(&hits);
            }
        }
        self.predict_reply(text).await
    }
}

// ── Rendering helpers ─────────────────────────────────────────

fn models_reply() -> String {
    let mut out = String::from("Known models (load one with /switch <identifier>):\n");
    for (task, entries) in catalog::grouped() {
        out.push_str(&format!("\n{task}:\n"));
        for entry in entries {
            out.push_str(&format!("  {} - {}\n", entry.identifier, entry.note));
        }
    }
    out.trim_end().to_string()
}

fn render_url(resource: &UrlResource) -> String {
    let mut line = format!("{}: {}", resource.name, resource.url);
    if let Some(description) = &resource.description {
        line.push_str(&format!(" ({description})"));
    }
    line
}

fn render_url_list(hits: &[UrlResource]) -> String {
    let mut out = String::new();
    for resource in hits.iter().take(MAX_SEARCH_RESULTS) {
        out.push_str(&format!("{}\n", render_url(resource)));
    }
    if hits.len() > MAX_SEARCH_RESULTS {
        out.push_str(&format!("({} more not shown)\n", hits.len() - MAX_SEARCH_RESULTS));
    }
    out.trim_end().to_string()
}

fn render_contract(record: &ContractRecord) -> String {
    let mut line = format!("{}: {}", record.name, record.address);
    if let Some(network) = &record.network {
        line.push_str(&format!(" [{network}]"));
    }
    if let Some(description) = &record.description {
        line.push_str(&format!(" ({description})"));
    }
    line
}

fn render_contract_list(hits: &[ContractRecord]) -> String {
    let mut out = String::new();
    for record in hits.iter().take(MAX_SEARCH_RESULTS) {
        out.push_str(&format!("{}\n", render_contract(record)));
    }
    if hits.len() > MAX_SEARCH_RESULTS {
        out.push_str(&format!("({} more not shown)\n", hits.len() - MAX_SEARCH_RESULTS));
    }
    out.trim_end().to_string()
}

/// Cut at a character count, marking the cut with a trailing ellipsis.
fn truncate(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        text.to_string()
    } else {
        let mut cut: String = text.chars().take(limit).collect();
        cut.push_str("...");
        cut
    }
}
