//! Mock inference backend for tests.
//!
//! Serves scripted results per method and records every call for test
//! assertions. Optional per-method delays let tests overlap loads and
//! predictions to exercise switch races. No network involved.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::backend::{
    ExtractiveAnswer, GenerationParams, InferenceBackend, LabelScore, LoadRequest,
};
use crate::error::{BackendError, BackendResult};

/// A recorded `generate` call.
#[derive(Debug, Clone)]
pub struct GenerationCall {
    pub identifier: String,
    pub prompt: String,
    pub params: GenerationParams,
}

/// A recorded `answer` call.
#[derive(Debug, Clone)]
pub struct AnswerCall {
    pub identifier: String,
    pub question: String,
    pub context: String,
}

/// Mock implementation of `InferenceBackend`.
///
/// Queued results are served FIFO; an empty queue serves a canned success
/// so simple tests need no scripting. Thread-safe via `Mutex` (fine for
/// test contexts).
pub struct MockBackend {
    generations: Mutex<VecDeque<BackendResult<String>>>,
    answers: Mutex<VecDeque<BackendResult<ExtractiveAnswer>>>,
    classifications: Mutex<VecDeque<BackendResult<Vec<LabelScore>>>>,
    /// Identifier substrings whose loads always fail.
    refused: Mutex<Vec<String>>,
    load_delay: Mutex<Option<Duration>>,
    generation_delay: Mutex<Option<Duration>>,
    loads: Mutex<Vec<LoadRequest>>,
    generation_calls: Mutex<Vec<GenerationCall>>,
    answer_calls: Mutex<Vec<AnswerCall>>,
    classify_calls: Mutex<Vec<String>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            generations: Mutex::new(VecDeque::new()),
            answers: Mutex::new(VecDeque::new()),
            classifications: Mutex::new(VecDeque::new()),
            refused: Mutex::new(Vec::new()),
            load_delay: Mutex::new(None),
            generation_delay: Mutex::new(None),
            loads: Mutex::new(Vec::new()),
            generation_calls: Mutex::new(Vec::new()),
            answer_calls: Mutex::new(Vec::new()),
            classify_calls: Mutex::new(Vec::new()),
        }
    }

    // ── Scripting ─────────────────────────────────────────────

    /// Queue the next `generate` result.
    pub fn queue_generation(&self, result: BackendResult<String>) {
        self.generations.lock().unwrap().push_back(result);
    }

    /// Queue the next `answer` result.
    pub fn queue_answer(&self, result: BackendResult<ExtractiveAnswer>) {
        self.answers.lock().unwrap().push_back(result);
    }

    /// Queue the next `classify` result.
    pub fn queue_classification(&self, result: BackendResult<Vec<LabelScore>>) {
        self.classifications.lock().unwrap().push_back(result);
    }

    /// Make loads fail for any identifier containing this substring.
    pub fn refuse_model(&self, identifier_part: impl Into<String>) {
        self.refused.lock().unwrap().push(identifier_part.into());
    }

    /// Delay every `load` call, so tests can overlap operations.
    pub fn set_load_delay(&self, delay: Duration) {
        *self.load_delay.lock().unwrap() = Some(delay);
    }

    /// Delay every `generate` call.
    pub fn set_generation_delay(&self, delay: Duration) {
        *self.generation_delay.lock().unwrap() = Some(delay);
    }

    // ── Recorded calls ────────────────────────────────────────

    /// All load requests seen, in order.
    pub fn loads(&self) -> Vec<LoadRequest> {
        self.loads.lock().unwrap().clone()
    }

    /// All generation calls seen, in order.
    pub fn generation_calls(&self) -> Vec<GenerationCall> {
        self.generation_calls.lock().unwrap().clone()
    }

    /// The prompt of the most recent generation call.
    pub fn last_prompt(&self) -> Option<String> {
        self.generation_calls
            .lock()
            .unwrap()
            .last()
            .map(|c| c.prompt.clone())
    }

    /// All answer calls seen, in order.
    pub fn answer_calls(&self) -> Vec<AnswerCall> {
        self.answer_calls.lock().unwrap().clone()
    }

    /// Texts passed to `classify`, in order.
    pub fn classify_calls(&self) -> Vec<String> {
        self.classify_calls.lock().unwrap().clone()
    }

    /// Clear all recorded state and scripts.
    pub fn reset(&self) {
        self.generations.lock().unwrap().clear();
        self.answers.lock().unwrap().clear();
        self.classifications.lock().unwrap().clear();
        self.refused.lock().unwrap().clear();
        *self.load_delay.lock().unwrap() = None;
        *self.generation_delay.lock().unwrap() = None;
        self.loads.lock().unwrap().clear();
        self.generation_calls.lock().unwrap().clear();
        self.answer_calls.lock().unwrap().clear();
        self.classify_calls.lock().unwrap().clear();
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceBackend for MockBackend {
    async fn load(&self, request: &LoadRequest) -> BackendResult<()> {
        self.loads.lock().unwrap().push(request.clone());

        let delay = *self.load_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let refused = self
            .refused
            .lock()
            .unwrap()
            .iter()
            .any(|part| request.identifier.contains(part.as_str()));
        if refused {
            return Err(BackendError::UnknownModel(request.identifier.clone()));
        }
        Ok(())
    }

    async fn generate(
        &self,
        identifier: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> BackendResult<String> {
        let delay = *self.generation_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.generation_calls.lock().unwrap().push(GenerationCall {
            identifier: identifier.to_string(),
            prompt: prompt.to_string(),
            params: *params,
        });

        match self.generations.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok("mock generation".into()),
        }
    }

    async fn answer(
        &self,
        identifier: &str,
        question: &str,
        context: &str,
    ) -> BackendResult<ExtractiveAnswer> {
        self.answer_calls.lock().unwrap().push(AnswerCall {
            identifier: identifier.to_string(),
            question: question.to_string(),
            context: context.to_string(),
        });

        match self.answers.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(ExtractiveAnswer {
                answer: "mock answer".into(),
                score: 0.5,
            }),
        }
    }

    async fn classify(&self, identifier: &str, text: &str) -> BackendResult<Vec<LabelScore>> {
        let _ = identifier;
        self.classify_calls.lock().unwrap().push(text.to_string());

        match self.classifications.lock().unwrap().pop_front() {
            Some(result) => result,
            None => Ok(vec![LabelScore {
                label: "NEUTRAL".into(),
                score: 0.5,
            }]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mg_protocol::{Device, TaskKind};

    fn request(identifier: &str) -> LoadRequest {
        LoadRequest {
            identifier: identifier.into(),
            task: TaskKind::TextGeneration,
            quantization: true,
            device: Device::Auto,
        }
    }

    fn params() -> GenerationParams {
        GenerationParams {
            max_new_tokens: 64,
            temperature: 0.7,
            top_p: 0.9,
            top_k: 50,
            repetition_penalty: 1.1,
        }
    }

    #[tokio::test]
    async fn records_loads() {
        let mock = MockBackend::new();
        mock.load(&request("gpt2")).await.unwrap();

        let loads = mock.loads();
        assert_eq!(loads.len(), 1);
        assert_eq!(loads[0].identifier, "gpt2");
    }

    #[tokio::test]
    async fn refused_models_fail_to_load() {
        let mock = MockBackend::new();
        mock.refuse_model("broken");

        assert!(mock.load(&request("acme/broken-model")).await.is_err());
        assert!(mock.load(&request("gpt2")).await.is_ok());
        // Failed attempts are still recorded.
        assert_eq!(mock.loads().len(), 2);
    }

    #[tokio::test]
    async fn serves_queued_generations_in_order() {
        let mock = MockBackend::new();
        mock.queue_generation(Ok("first".into()));
        mock.queue_generation(Ok("second".into()));

        assert_eq!(mock.generate("gpt2", "p", &params()).await.unwrap(), "first");
        assert_eq!(
            mock.generate("gpt2", "p", &params()).await.unwrap(),
            "second"
        );
        // Empty queue serves the canned default.
        assert_eq!(
            mock.generate("gpt2", "p", &params()).await.unwrap(),
            "mock generation"
        );
    }

    #[tokio::test]
    async fn records_prompts_and_params() {
        let mock = MockBackend::new();
        mock.generate("gpt2", "hello there", &params()).await.unwrap();

        assert_eq!(mock.last_prompt().as_deref(), Some("hello there"));
        assert_eq!(mock.generation_calls()[0].params.max_new_tokens, 64);
    }

    #[tokio::test]
    async fn reset_clears_state() {
        let mock = MockBackend::new();
        mock.queue_generation(Err(BackendError::Request("boom".into())));
        mock.load(&request("gpt2")).await.unwrap();

        mock.reset();
        assert!(mock.loads().is_empty());
        assert_eq!(
            mock.generate("gpt2", "p", &params()).await.unwrap(),
            "mock generation"
        );
    }
}
