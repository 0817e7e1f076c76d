use serde::{Deserialize, Serialize};

/// Inference task family a model identifier resolves to.
///
/// Assigned once when a model is loaded and carried on every prediction;
/// never re-derived per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Causal text generation (GPT / LLaMA / Mistral / Gemma / Phi families).
    TextGeneration,
    /// Sequence-to-sequence generation (T5 / BART / Pegasus families).
    TextToText,
    /// Extractive question answering (BERT-family with a QA head).
    QuestionAnswering,
    /// Sequence classification (BERT-family without a QA head).
    Classification,
    /// Dialogue-tuned generation. Dispatches like `TextGeneration`.
    Conversational,
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TaskKind::TextGeneration => "text-generation",
            TaskKind::TextToText => "text2text-generation",
            TaskKind::QuestionAnswering => "question-answering",
            TaskKind::Classification => "classification",
            TaskKind::Conversational => "conversational",
        };
        write!(f, "{name}")
    }
}

/// Device placement requested at load time.
///
/// Advisory for hosted backends, which decide placement themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Device {
    #[default]
    Auto,
    Cpu,
}

impl std::fmt::Display for Device {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Device::Auto => write!(f, "auto"),
            Device::Cpu => write!(f, "cpu"),
        }
    }
}

/// Per-request overrides for generation sampling.
///
/// Unset fields fall back to the adapter's configured defaults.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct GenerationOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repetition_penalty: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Failure class carried inside a `Prediction` instead of an `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictErrorKind {
    /// No model loaded, or a load/switch was in flight.
    NotReady,
    /// The backend failed mid-inference; recovered into an apology reply.
    Generation,
}

/// Result of one prediction. Prediction never fails as a Rust error;
/// failures surface here with a polite `response` and confidence 0.0.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    /// Cleaned response text, or a polite failure message.
    pub response: String,
    /// Confidence in [0.0, 1.0]. Backend-native score for
    /// question-answering and classification; a length/shape heuristic for
    /// the generation families. The two are not comparable across tasks.
    pub confidence: f64,
    /// Identifier of the model that actually served this prediction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Task kind of the serving model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskKind>,
    /// Set when this prediction represents a recovered failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<PredictErrorKind>,
}

impl Prediction {
    /// A failure prediction: polite message, zero confidence.
    pub fn failure(kind: PredictErrorKind, message: impl Into<String>) -> Self {
        Self {
            response: message.into(),
            confidence: 0.0,
            model: None,
            task: None,
            error: Some(kind),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Snapshot of the adapter's current model state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Whether a model is currently held.
    pub loaded: bool,
    /// Identifier of the loaded model, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    /// Task kind of the loaded model, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<TaskKind>,
    /// Configured device placement.
    pub device: Device,
    /// Configured maximum sequence length.
    pub max_length: u32,
    /// Whether quantized loading was requested.
    pub quantized: bool,
    /// True when the current model is the fallback baseline rather than
    /// the one that was asked for.
    pub degraded: bool,
}
