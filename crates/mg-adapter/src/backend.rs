//! Backend seam for hosted model inference.
//!
//! One method per pipeline shape the adapter drives. The hosted HTTP
//! implementation lives in `hosted`; tests use the scripted mock in
//! `mock`.

use async_trait::async_trait;
use mg_protocol::{Device, TaskKind};
use serde::Serialize;

use crate::error::BackendResult;

/// Load request handed to the backend on explicit load/switch.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    /// Model identifier, e.g. "mistralai/Mistral-7B-Instruct-v0.1".
    pub identifier: String,
    /// Task kind derived from the identifier.
    pub task: TaskKind,
    /// Advisory for hosted backends, which pick quantization themselves.
    pub quantization: bool,
    /// Advisory for hosted backends, which pick placement themselves.
    pub device: Device,
}

/// Concrete sampling parameters after merging per-request options over
/// the adapter's configured defaults.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GenerationParams {
    pub max_new_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub top_k: u32,
    pub repetition_penalty: f32,
}

/// An extractive QA answer with the model's own score.
#[derive(Debug, Clone)]
pub struct ExtractiveAnswer {
    pub answer: String,
    pub score: f64,
}

/// One classification label with its score.
#[derive(Debug, Clone)]
pub struct LabelScore {
    pub label: String,
    pub score: f64,
}

/// Uniform surface over hosted inference APIs.
///
/// `generate` must return the continuation only, never an echo of the
/// prompt; the adapter's cleanup assumes this.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Resolve and warm up a model. Called on explicit load/switch only,
    /// never implicitly from the predict path.
    async fn load(&self, request: &LoadRequest) -> BackendResult<()>;

    /// Generate a continuation for the prompt.
    async fn generate(
        &self,
        identifier: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> BackendResult<String>;

    /// Answer a question against a context span.
    async fn answer(
        &self,
        identifier: &str,
        question: &str,
        context: &str,
    ) -> BackendResult<ExtractiveAnswer>;

    /// Classify text. Label order is not guaranteed; callers pick the max.
    async fn classify(&self, identifier: &str, text: &str) -> BackendResult<Vec<LabelScore>>;
}
