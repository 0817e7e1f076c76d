//! Adapter configuration: generation defaults and load knobs.

use mg_protocol::{Device, GenerationOptions};
use serde::Deserialize;

use crate::backend::GenerationParams;

/// Configuration for the model adapter.
///
/// One config covers every model family; per-family differences live in
/// the task/prompt rule tables, not in loader variants.
#[derive(Debug, Clone, Deserialize)]
pub struct AdapterConfig {
    /// Model loaded at startup.
    #[serde(default = "default_model")]
    pub default_model: String,
    /// Maximum sequence length; generation never exceeds this.
    #[serde(default = "default_max_length")]
    pub max_length: u32,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Nucleus sampling cutoff.
    #[serde(default = "default_top_p")]
    pub top_p: f32,
    /// Top-k sampling cutoff. Config-only; requests cannot override it.
    #[serde(default = "default_top_k")]
    pub top_k: u32,
    /// Repetition penalty.
    #[serde(default = "default_repetition_penalty")]
    pub repetition_penalty: f32,
    /// Request quantized weights at load (advisory for hosted backends).
    #[serde(default = "default_quantization")]
    pub quantization: bool,
    /// Device placement request (advisory for hosted backends).
    #[serde(default)]
    pub device: Device,
}

fn default_model() -> String {
    "microsoft/DialoGPT-medium".into()
}
fn default_max_length() -> u32 {
    512
}
fn default_temperature() -> f32 {
    0.7
}
fn default_top_p() -> f32 {
    0.9
}
fn default_top_k() -> u32 {
    50
}
fn default_repetition_penalty() -> f32 {
    1.1
}
fn default_quantization() -> bool {
    true
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            default_model: default_model(),
            max_length: default_max_length(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            top_k: default_top_k(),
            repetition_penalty: default_repetition_penalty(),
            quantization: default_quantization(),
            device: Device::default(),
        }
    }
}

impl AdapterConfig {
    /// Merge per-request overrides over the configured defaults.
    ///
    /// `max_new_tokens` defaults to `min(max_length, 256)` and is always
    /// clamped to `max_length`, whatever the request asked for.
    pub fn generation_params(&self, options: &GenerationOptions) -> GenerationParams {
        let max_new_tokens = options
            .max_tokens
            .unwrap_or_else(|| self.max_length.min(256))
            .min(self.max_length);
        GenerationParams {
            max_new_tokens,
            temperature: options.temperature.unwrap_or(self.temperature),
            top_p: options.top_p.unwrap_or(self.top_p),
            top_k: self.top_k,
            repetition_penalty: options
                .repetition_penalty
                .unwrap_or(self.repetition_penalty),
        }
    }
}
