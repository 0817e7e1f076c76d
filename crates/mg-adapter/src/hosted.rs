//! Hosted inference backend speaking the Hugging Face Inference API.
//!
//! Requests go to `POST {base}/models/{identifier}` with a body shaped by
//! the pipeline: generation, question answering, or classification. Load
//! is a one-token warm-up request with `wait_for_model` set, under a
//! longer timeout than regular inference; predict-path requests never set
//! `wait_for_model`, so a model that went cold surfaces as unavailable
//! instead of being warmed implicitly.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::backend::{
    ExtractiveAnswer, GenerationParams, InferenceBackend, LabelScore, LoadRequest,
};
use crate::error::{BackendError, BackendResult};
use mg_protocol::TaskKind;

/// Configuration for the hosted inference endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct HostedConfig {
    /// API base URL.
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Bearer token. Anonymous calls work but are rate-limited hard.
    #[serde(default)]
    pub api_token: Option<String>,
    /// Per-request timeout in seconds for inference calls.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Timeout for load/warm-up calls. Cold models take a while.
    #[serde(default = "default_load_timeout_secs")]
    pub load_timeout_secs: u64,
}

fn default_api_base() -> String {
    "https://api-inference.huggingface.co".into()
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_load_timeout_secs() -> u64 {
    120
}

impl Default for HostedConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_token: None,
            request_timeout_secs: default_request_timeout_secs(),
            load_timeout_secs: default_load_timeout_secs(),
        }
    }
}

// ── Wire types ────────────────────────────────────────────────

#[derive(Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: GenerateParameters,
    options: RequestOptions,
}

#[derive(Serialize)]
struct GenerateParameters {
    max_new_tokens: u32,
    temperature: f32,
    top_p: f32,
    top_k: u32,
    repetition_penalty: f32,
    /// Continuation only; the adapter's cleanup assumes no prompt echo.
    return_full_text: bool,
}

#[derive(Serialize)]
struct QaRequest<'a> {
    inputs: QaInputs<'a>,
    options: RequestOptions,
}

#[derive(Serialize)]
struct QaInputs<'a> {
    question: &'a str,
    context: &'a str,
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a str,
    options: RequestOptions,
}

#[derive(Serialize)]
struct RequestOptions {
    wait_for_model: bool,
    use_cache: bool,
}

/// Generation response item (only the field we need).
#[derive(Deserialize)]
struct GeneratedText {
    generated_text: String,
}

#[derive(Deserialize)]
struct QaResponse {
    answer: String,
    score: f64,
}

#[derive(Deserialize)]
struct RawLabel {
    label: String,
    score: f64,
}

// ── Client ────────────────────────────────────────────────────

/// Client for the hosted inference API.
pub struct HostedBackend {
    client: reqwest::Client,
    load_client: reqwest::Client,
    config: HostedConfig,
}

impl HostedBackend {
    pub fn new(config: HostedConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("failed to build reqwest client");
        let load_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.load_timeout_secs))
            .build()
            .expect("failed to build reqwest client");
        Self {
            client,
            load_client,
            config,
        }
    }

    fn model_url(&self, identifier: &str) -> String {
        format!("{}/models/{}", self.config.api_base, identifier)
    }

    /// POST a body to the model endpoint and map HTTP failures onto the
    /// backend error taxonomy.
    async fn execute<T: Serialize>(
        &self,
        client: &reqwest::Client,
        identifier: &str,
        body: &T,
    ) -> BackendResult<serde_json::Value> {
        let url = self.model_url(identifier);
        let mut request = client.post(&url).json(body);
        if let Some(token) = &self.config.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                BackendError::Unavailable(format!("request timed out: {e}"))
            } else {
                BackendError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                return Err(BackendError::Auth(format!("status {status}")));
            }
            reqwest::StatusCode::NOT_FOUND => {
                return Err(BackendError::UnknownModel(identifier.to_string()));
            }
            reqwest::StatusCode::SERVICE_UNAVAILABLE => {
                let detail = response.text().await.unwrap_or_default();
                return Err(BackendError::Unavailable(detail));
            }
            s if !s.is_success() => {
                return Err(BackendError::Request(format!("status {status}")));
            }
            _ => {}
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::Malformed(e.to_string()))
    }

    fn options(wait_for_model: bool) -> RequestOptions {
        RequestOptions {
            wait_for_model,
            use_cache: false,
        }
    }
}

#[async_trait]
impl InferenceBackend for HostedBackend {
    async fn load(&self, request: &LoadRequest) -> BackendResult<()> {
        tracing::debug!(
            model = %request.identifier,
            quantization = request.quantization,
            device = %request.device,
            "warm-up load (hosted endpoint controls quantization and placement)"
        );

        // Warm-up body matches the pipeline the model serves; a
        // generation body against a classifier would be rejected. The
        // warm-up output itself is discarded.
        match request.task {
            TaskKind::QuestionAnswering => {
                let body = QaRequest {
                    inputs: QaInputs {
                        question: "Ready?",
                        context: "Ready.",
                    },
                    options: Self::options(true),
                };
                self.execute(&self.load_client, &request.identifier, &body)
                    .await?;
            }
            TaskKind::Classification => {
                let body = ClassifyRequest {
                    inputs: "ok",
                    options: Self::options(true),
                };
                self.execute(&self.load_client, &request.identifier, &body)
                    .await?;
            }
            TaskKind::TextGeneration | TaskKind::TextToText | TaskKind::Conversational => {
                let body = GenerateRequest {
                    inputs: "Hello",
                    parameters: GenerateParameters {
                        max_new_tokens: 1,
                        temperature: 1.0,
                        top_p: 1.0,
                        top_k: 1,
                        repetition_penalty: 1.0,
                        return_full_text: false,
                    },
                    options: Self::options(true),
                };
                self.execute(&self.load_client, &request.identifier, &body)
                    .await?;
            }
        }
        Ok(())
    }

    async fn generate(
        &self,
        identifier: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> BackendResult<String> {
        let body = GenerateRequest {
            inputs: prompt,
            parameters: GenerateParameters {
                max_new_tokens: params.max_new_tokens,
                temperature: params.temperature,
                top_p: params.top_p,
                top_k: params.top_k,
                repetition_penalty: params.repetition_penalty,
                return_full_text: false,
            },
            options: Self::options(false),
        };
        let value = self.execute(&self.client, identifier, &body).await?;
        parse_generated_text(value)
    }

    async fn answer(
        &self,
        identifier: &str,
        question: &str,
        context: &str,
    ) -> BackendResult<ExtractiveAnswer> {
        let body = QaRequest {
            inputs: QaInputs { question, context },
            options: Self::options(false),
        };
        let value = self.execute(&self.client, identifier, &body).await?;
        let parsed: QaResponse = serde_json::from_value(value)
            .map_err(|e| BackendError::Malformed(e.to_string()))?;
        Ok(ExtractiveAnswer {
            answer: parsed.answer,
            score: parsed.score,
        })
    }

    async fn classify(&self, identifier: &str, text: &str) -> BackendResult<Vec<LabelScore>> {
        let body = ClassifyRequest {
            inputs: text,
            options: Self::options(false),
        };
        let value = self.execute(&self.client, identifier, &body).await?;
        parse_labels(value)
    }
}

/// Accept both `[{"generated_text": ..}]` and a bare object.
fn parse_generated_text(value: serde_json::Value) -> BackendResult<String> {
    if let Ok(items) = serde_json::from_value::<Vec<GeneratedText>>(value.clone()) {
        return items
            .into_iter()
            .next()
            .map(|g| g.generated_text)
            .ok_or_else(|| BackendError::Malformed("empty generation array".into()));
    }
    if let Ok(single) = serde_json::from_value::<GeneratedText>(value) {
        return Ok(single.generated_text);
    }
    Err(BackendError::Malformed(
        "no generated_text in response".into(),
    ))
}

/// Accept both the nested `[[{label, score}, ..]]` shape and the flat one.
fn parse_labels(value: serde_json::Value) -> BackendResult<Vec<LabelScore>> {
    if let Ok(nested) = serde_json::from_value::<Vec<Vec<RawLabel>>>(value.clone()) {
        let labels = nested.into_iter().next().unwrap_or_default();
        return Ok(labels.into_iter().map(label_score).collect());
    }
    if let Ok(flat) = serde_json::from_value::<Vec<RawLabel>>(value) {
        return Ok(flat.into_iter().map(label_score).collect());
    }
    Err(BackendError::Malformed(
        "unrecognized classification shape".into(),
    ))
}

fn label_score(raw: RawLabel) -> LabelScore {
    LabelScore {
        label: raw.label,
        score: raw.score,
    }
}
