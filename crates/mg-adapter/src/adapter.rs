//! The model adapter state machine.
//!
//! Holds at most one loaded model and serves predictions against it.
//! Loads are explicit and single-flight: a second load while one is
//! running fails with `Busy` instead of queueing, and a failed load
//! leaves the previous model untouched. Switches replace the model
//! handle atomically; in-flight predictions keep the snapshot they
//! started with, so results are always labeled with the model that
//! actually served them.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use mg_protocol::{GenerationOptions, ModelInfo, PredictErrorKind, Prediction, TaskKind};
use tokio::sync::{Mutex, RwLock};

use crate::backend::{InferenceBackend, LoadRequest};
use crate::config::AdapterConfig;
use crate::error::{AdapterError, AdapterResult, BackendError, BackendResult};
use crate::{prompt, response, task};

/// Baseline model for `load_with_fallback`. Small, public, always warm.
pub const FALLBACK_MODEL: &str = "gpt2";

/// Reply when no model is loaded.
const NOT_READY_REPLY: &str = "Model not available. Please contact an administrator.";

/// Reply when a load or switch is mid-flight.
const SWITCHING_REPLY: &str = "A model switch is in progress. Please try again in a moment.";

/// Reply when the backend fails mid-inference.
const APOLOGY_REPLY: &str =
    "I'm having trouble processing your request. Please try a simpler message.";

/// Immutable record of a loaded model. Replaced wholesale on switch;
/// in-flight predictions keep serving their snapshot.
#[derive(Debug)]
struct LoadedModel {
    identifier: String,
    task: TaskKind,
    degraded: bool,
    loaded_at: DateTime<Utc>,
}

/// Uniform prediction surface over one hosted model at a time.
pub struct ModelAdapter {
    backend: Arc<dyn InferenceBackend>,
    config: AdapterConfig,
    current: RwLock<Option<Arc<LoadedModel>>>,
    /// Single-writer gate: `try_lock` failure means a load is in flight.
    load_gate: Mutex<()>,
    /// Mirrors the gate for the lock-free predict path.
    loading: AtomicBool,
}

impl ModelAdapter {
    pub fn new(backend: Arc<dyn InferenceBackend>, config: AdapterConfig) -> Self {
        Self {
            backend,
            config,
            current: RwLock::new(None),
            load_gate: Mutex::new(()),
            loading: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    // ── Load / switch ─────────────────────────────────────────

    /// Load (or switch to) a model. Never falls back; a failure keeps
    /// whatever was loaded before.
    pub async fn load(&self, identifier: &str) -> AdapterResult<ModelInfo> {
        let Ok(_gate) = self.load_gate.try_lock() else {
            return Err(AdapterError::Busy);
        };
        self.loading.store(true, Ordering::SeqCst);
        let result = self.load_locked(identifier, false).await;
        self.loading.store(false, Ordering::SeqCst);
        result
    }

    /// Load a model, falling back to the fixed baseline on failure.
    ///
    /// A successful fallback marks the adapter degraded and reports the
    /// baseline's info; if the baseline also fails, the original error is
    /// returned and prior state is untouched.
    pub async fn load_with_fallback(&self, identifier: &str) -> AdapterResult<ModelInfo> {
        let Ok(_gate) = self.load_gate.try_lock() else {
            return Err(AdapterError::Busy);
        };
        self.loading.store(true, Ordering::SeqCst);
        let result = match self.load_locked(identifier, false).await {
            Ok(info) => Ok(info),
            Err(primary_err) => {
                tracing::warn!(
                    model = %identifier,
                    error = %primary_err,
                    fallback = FALLBACK_MODEL,
                    "load failed, trying baseline"
                );
                match self.load_locked(FALLBACK_MODEL, true).await {
                    Ok(info) => Ok(info),
                    Err(fallback_err) => {
                        tracing::error!(error = %fallback_err, "baseline load failed");
                        Err(primary_err)
                    }
                }
            }
        };
        self.loading.store(false, Ordering::SeqCst);
        result
    }

    /// Caller must hold the load gate.
    async fn load_locked(&self, identifier: &str, degraded: bool) -> AdapterResult<ModelInfo> {
        let task = task::detect_task(identifier);
        let request = LoadRequest {
            identifier: identifier.to_string(),
            task,
            quantization: self.config.quantization,
            device: self.config.device,
        };

        tracing::info!(model = %identifier, task = %task, "loading model");
        if let Err(e) = self.backend.load(&request).await {
            tracing::warn!(model = %identifier, error = %e, "load failed, previous state kept");
            return Err(AdapterError::Load(e.to_string()));
        }

        let loaded = Arc::new(LoadedModel {
            identifier: identifier.to_string(),
            task,
            degraded,
            loaded_at: Utc::now(),
        });

        let mut current = self.current.write().await;
        if let Some(previous) = current.replace(Arc::clone(&loaded)) {
            tracing::info!(
                from = %previous.identifier,
                to = %identifier,
                loaded_at = %previous.loaded_at,
                "model replaced"
            );
        }
        drop(current);

        Ok(self.info_for(Some(loaded.as_ref())))
    }

    // ── Predict ───────────────────────────────────────────────

    /// Run inference on the current model.
    ///
    /// Infallible surface: failures come back inside the `Prediction`
    /// (`NotReady` when no model is available or a switch is in flight,
    /// `Generation` when the backend fails). Never loads a model.
    pub async fn predict(&self, text: &str, options: GenerationOptions) -> Prediction {
        if self.loading.load(Ordering::SeqCst) {
            return Prediction::failure(PredictErrorKind::NotReady, SWITCHING_REPLY);
        }

        let snapshot = {
            let guard = self.current.read().await;
            match guard.as_ref() {
                Some(model) => Arc::clone(model),
                None => return Prediction::failure(PredictErrorKind::NotReady, NOT_READY_REPLY),
            }
        };

        let result = match snapshot.task {
            TaskKind::TextGeneration | TaskKind::Conversational => {
                self.predict_generation(&snapshot, text, &options).await
            }
            TaskKind::TextToText => self.predict_seq2seq(&snapshot, text, &options).await,
            TaskKind::QuestionAnswering => self.predict_qa(&snapshot, text).await,
            TaskKind::Classification => self.predict_classification(&snapshot, text).await,
        };

        match result {
            Ok((response_text, confidence)) => Prediction {
                response: response_text,
                confidence,
                model: Some(snapshot.identifier.clone()),
                task: Some(snapshot.task),
                error: None,
            },
            Err(e) => {
                tracing::warn!(
                    model = %snapshot.identifier,
                    task = %snapshot.task,
                    error = %e,
                    "inference failed, replying with apology"
                );
                Prediction {
                    response: APOLOGY_REPLY.into(),
                    confidence: 0.0,
                    model: Some(snapshot.identifier.clone()),
                    task: Some(snapshot.task),
                    error: Some(PredictErrorKind::Generation),
                }
            }
        }
    }

    async fn predict_generation(
        &self,
        model: &LoadedModel,
        text: &str,
        options: &GenerationOptions,
    ) -> BackendResult<(String, f64)> {
        let prompt_text = prompt::format_prompt(&model.identifier, text);
        let params = self.config.generation_params(options);
        let raw = self
            .backend
            .generate(&model.identifier, &prompt_text, &params)
            .await?;
        let cleaned = response::clean_response(&raw);
        let confidence = response::score_confidence(&cleaned);
        Ok((cleaned, confidence))
    }

    async fn predict_seq2seq(
        &self,
        model: &LoadedModel,
        text: &str,
        options: &GenerationOptions,
    ) -> BackendResult<(String, f64)> {
        // Seq2seq takes the raw text, untemplated, and may run to the
        // full window rather than the chat token budget.
        let mut params = self.config.generation_params(options);
        params.max_new_tokens = options
            .max_tokens
            .unwrap_or(self.config.max_length)
            .min(self.config.max_length);
        let raw = self
            .backend
            .generate(&model.identifier, text, &params)
            .await?;
        let cleaned = response::clean_response(&raw);
        let confidence = response::score_confidence(&cleaned);
        Ok((cleaned, confidence))
    }

    async fn predict_qa(&self, model: &LoadedModel, text: &str) -> BackendResult<(String, f64)> {
        // Chat gives no separate context, so the text doubles as its own
        // context. Degenerate but total; the native score is kept as-is.
        let extracted = self.backend.answer(&model.identifier, text, text).await?;
        Ok((extracted.answer, extracted.score))
    }

    async fn predict_classification(
        &self,
        model: &LoadedModel,
        text: &str,
    ) -> BackendResult<(String, f64)> {
        let labels = self.backend.classify(&model.identifier, text).await?;
        let best = labels
            .into_iter()
            .max_by(|a, b| a.score.total_cmp(&b.score));
        match best {
            Some(top) => Ok((top.label, top.score)),
            None => Err(BackendError::Malformed(
                "classification returned no labels".into(),
            )),
        }
    }

    // ── Introspection ─────────────────────────────────────────

    /// Snapshot of the adapter's state for the `/info` surface.
    pub async fn info(&self) -> ModelInfo {
        let guard = self.current.read().await;
        self.info_for(guard.as_deref())
    }

    /// Identifier of the currently loaded model, if any.
    pub async fn current_model(&self) -> Option<String> {
        self.current
            .read()
            .await
            .as_ref()
            .map(|m| m.identifier.clone())
    }

    fn info_for(&self, model: Option<&LoadedModel>) -> ModelInfo {
        ModelInfo {
            loaded: model.is_some(),
            identifier: model.map(|m| m.identifier.clone()),
            task: model.map(|m| m.task),
            device: self.config.device,
            max_length: self.config.max_length,
            quantized: self.config.quantization,
            degraded: model.is_some_and(|m| m.degraded),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;
    use std::time::Duration;

    fn adapter_with_mock() -> (Arc<ModelAdapter>, Arc<MockBackend>) {
        let mock = Arc::new(MockBackend::new());
        let adapter = Arc::new(ModelAdapter::new(
            Arc::clone(&mock) as Arc<dyn InferenceBackend>,
            AdapterConfig::default(),
        ));
        (adapter, mock)
    }

    // ── Load / switch ─────────────────────────────────────────

    #[tokio::test]
    async fn load_sets_task_and_identifier() {
        let (adapter, _mock) = adapter_with_mock();
        let info = adapter.load("mistralai/Mistral-7B-Instruct-v0.1").await.unwrap();

        assert!(info.loaded);
        assert_eq!(info.identifier.as_deref(), Some("mistralai/Mistral-7B-Instruct-v0.1"));
        assert_eq!(info.task, Some(TaskKind::TextGeneration));
        assert!(!info.degraded);
    }

    #[tokio::test]
    async fn failed_load_keeps_previous_model() {
        let (adapter, mock) = adapter_with_mock();
        adapter.load("gpt2").await.unwrap();

        mock.refuse_model("flan");
        let err = adapter.load("google/flan-t5-base").await.unwrap_err();
        assert!(matches!(err, AdapterError::Load(_)));

        assert_eq!(adapter.current_model().await.as_deref(), Some("gpt2"));
    }

    #[tokio::test]
    async fn failed_load_with_no_prior_model_stays_empty() {
        let (adapter, mock) = adapter_with_mock();
        mock.refuse_model("gpt2");

        assert!(adapter.load("gpt2").await.is_err());
        assert_eq!(adapter.current_model().await, None);
        assert!(!adapter.info().await.loaded);
    }

    #[tokio::test]
    async fn concurrent_load_is_busy() {
        let (adapter, mock) = adapter_with_mock();
        mock.set_load_delay(Duration::from_millis(200));

        let slow = {
            let adapter = Arc::clone(&adapter);
            tokio::spawn(async move { adapter.load("gpt2").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let err = adapter.load("microsoft/phi-2").await.unwrap_err();
        assert!(matches!(err, AdapterError::Busy));

        slow.await.unwrap().unwrap();
        assert_eq!(adapter.current_model().await.as_deref(), Some("gpt2"));
    }

    #[tokio::test]
    async fn fallback_marks_degraded() {
        let (adapter, mock) = adapter_with_mock();
        mock.refuse_model("unobtainium");

        let info = adapter
            .load_with_fallback("acme/unobtainium-70b")
            .await
            .unwrap();
        assert_eq!(info.identifier.as_deref(), Some(FALLBACK_MODEL));
        assert!(info.degraded);

        // Both load attempts reached the backend.
        let loads = mock.loads();
        assert_eq!(loads.len(), 2);
        assert_eq!(loads[1].identifier, FALLBACK_MODEL);
    }

    #[tokio::test]
    async fn fallback_failure_returns_original_error() {
        let (adapter, mock) = adapter_with_mock();
        mock.refuse_model("unobtainium");
        mock.refuse_model("gpt2");

        let err = adapter
            .load_with_fallback("acme/unobtainium-70b")
            .await
            .unwrap_err();
        match err {
            AdapterError::Load(msg) => assert!(msg.contains("unobtainium")),
            other => panic!("expected Load, got {other:?}"),
        }
        assert_eq!(adapter.current_model().await, None);
    }

    #[tokio::test]
    async fn plain_load_never_falls_back() {
        let (adapter, mock) = adapter_with_mock();
        mock.refuse_model("unobtainium");

        assert!(adapter.load("acme/unobtainium-70b").await.is_err());
        assert_eq!(mock.loads().len(), 1);
    }

    // ── Predict paths ─────────────────────────────────────────

    #[tokio::test]
    async fn predict_without_model_is_not_ready() {
        let (adapter, _mock) = adapter_with_mock();
        let prediction = adapter.predict("hello", GenerationOptions::default()).await;

        assert_eq!(prediction.error, Some(PredictErrorKind::NotReady));
        assert_eq!(prediction.confidence, 0.0);
        assert_eq!(prediction.model, None);
    }

    #[tokio::test]
    async fn generation_applies_template_and_cleanup() {
        let (adapter, mock) = adapter_with_mock();
        adapter.load("mistralai/Mistral-7B-Instruct-v0.1").await.unwrap();

        mock.queue_generation(Ok("[INST] echoed [/INST]  Rust is a systems language.".into()));
        let prediction = adapter.predict("what is rust?", GenerationOptions::default()).await;

        assert_eq!(
            mock.last_prompt().as_deref(),
            Some("<s>[INST] what is rust? [/INST]")
        );
        assert_eq!(prediction.response, "echoed Rust is a systems language.");
        assert!(prediction.error.is_none());
        assert!(prediction.confidence > 0.0);
    }

    #[tokio::test]
    async fn seq2seq_takes_raw_text_and_full_window() {
        let (adapter, mock) = adapter_with_mock();
        adapter.load("google/flan-t5-base").await.unwrap();

        adapter.predict("summarize: the text", GenerationOptions::default()).await;

        let call = &mock.generation_calls()[0];
        assert_eq!(call.prompt, "summarize: the text");
        assert_eq!(call.params.max_new_tokens, 512);
    }

    #[tokio::test]
    async fn qa_doubles_text_as_context() {
        let (adapter, mock) = adapter_with_mock();
        adapter.load("bert-qa-model").await.unwrap();

        mock.queue_answer(Ok(crate::backend::ExtractiveAnswer {
            answer: "42".into(),
            score: 0.93,
        }));
        let prediction = adapter
            .predict("what is the answer?", GenerationOptions::default())
            .await;

        let calls = mock.answer_calls();
        assert_eq!(calls[0].question, "what is the answer?");
        assert_eq!(calls[0].context, "what is the answer?");
        assert_eq!(prediction.response, "42");
        // Native backend score, not the shape heuristic.
        assert_eq!(prediction.confidence, 0.93);
    }

    #[tokio::test]
    async fn classification_picks_top_label() {
        let (adapter, mock) = adapter_with_mock();
        adapter.load("distilbert-base-uncased-finetuned-sst-2-english").await.unwrap();

        mock.queue_classification(Ok(vec![
            crate::backend::LabelScore {
                label: "NEGATIVE".into(),
                score: 0.03,
            },
            crate::backend::LabelScore {
                label: "POSITIVE".into(),
                score: 0.97,
            },
        ]));
        let prediction = adapter.predict("I love this", GenerationOptions::default()).await;

        assert_eq!(prediction.response, "POSITIVE");
        assert_eq!(prediction.confidence, 0.97);
        assert_eq!(prediction.task, Some(TaskKind::Classification));
    }

    #[tokio::test]
    async fn backend_failure_recovers_with_apology() {
        let (adapter, mock) = adapter_with_mock();
        adapter.load("gpt2").await.unwrap();

        mock.queue_generation(Err(BackendError::Request("connection reset".into())));
        let prediction = adapter.predict("hello", GenerationOptions::default()).await;

        assert_eq!(prediction.error, Some(PredictErrorKind::Generation));
        assert_eq!(prediction.confidence, 0.0);
        assert!(prediction.response.contains("trouble processing"));
        // The failing model is still identified.
        assert_eq!(prediction.model.as_deref(), Some("gpt2"));
    }

    #[tokio::test]
    async fn empty_classification_is_recovered() {
        let (adapter, mock) = adapter_with_mock();
        adapter.load("distilbert-base-uncased").await.unwrap();

        mock.queue_classification(Ok(vec![]));
        let prediction = adapter.predict("text", GenerationOptions::default()).await;
        assert_eq!(prediction.error, Some(PredictErrorKind::Generation));
    }

    // ── Concurrency ───────────────────────────────────────────

    #[tokio::test]
    async fn predict_during_load_fails_fast() {
        let (adapter, mock) = adapter_with_mock();
        adapter.load("gpt2").await.unwrap();
        mock.set_load_delay(Duration::from_millis(200));

        let switching = {
            let adapter = Arc::clone(&adapter);
            tokio::spawn(async move { adapter.load("microsoft/phi-2").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let prediction = adapter.predict("hello", GenerationOptions::default()).await;
        assert_eq!(prediction.error, Some(PredictErrorKind::NotReady));

        switching.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn switch_during_predict_keeps_snapshot_label() {
        let (adapter, mock) = adapter_with_mock();
        adapter.load("gpt2").await.unwrap();
        mock.set_generation_delay(Duration::from_millis(150));

        let predicting = {
            let adapter = Arc::clone(&adapter);
            tokio::spawn(async move { adapter.predict("hello", GenerationOptions::default()).await })
        };
        tokio::time::sleep(Duration::from_millis(30)).await;

        // Switch completes while the predict sleeps inside the backend.
        adapter.load("microsoft/phi-2").await.unwrap();
        assert_eq!(adapter.current_model().await.as_deref(), Some("microsoft/phi-2"));

        let prediction = predicting.await.unwrap();
        assert_eq!(prediction.model.as_deref(), Some("gpt2"));
        assert!(prediction.error.is_none());
    }

    // ── Info ──────────────────────────────────────────────────

    #[tokio::test]
    async fn info_reflects_config_when_unloaded() {
        let (adapter, _mock) = adapter_with_mock();
        let info = adapter.info().await;

        assert!(!info.loaded);
        assert_eq!(info.identifier, None);
        assert_eq!(info.max_length, 512);
        assert!(info.quantized);
    }
}
