//! Task-kind inference from model identifiers.
//!
//! Maps an identifier like "mistralai/Mistral-7B-Instruct-v0.1" to the
//! task family the adapter will drive it as. Ordered substring rules over
//! the lowercased identifier; first match wins, so rule order is part of
//! the contract.

use mg_protocol::TaskKind;

/// Substrings marking causal generation families.
const GENERATION_MARKERS: &[&str] = &["gpt", "llama", "mistral", "gemma", "phi"];

/// Substrings marking sequence-to-sequence families.
const SEQ2SEQ_MARKERS: &[&str] = &["t5", "bart", "pegasus"];

/// Substrings marking BERT-family encoders.
const ENCODER_MARKERS: &[&str] = &["bert", "roberta", "distilbert"];

/// Resolve the task kind for a model identifier.
///
/// Total and deterministic: every identifier resolves to exactly one
/// `TaskKind`, with `TextGeneration` as the fallback. Evaluated once at
/// load time and stored with the loaded model, never per request.
pub fn detect_task(identifier: &str) -> TaskKind {
    let lower = identifier.to_lowercase();

    // Causal generation families. Checked first, so "dialogpt" resolves
    // here via its "gpt" substring and never reaches the dialogue rule.
    if matches_any(&lower, GENERATION_MARKERS) {
        return TaskKind::TextGeneration;
    }

    if matches_any(&lower, SEQ2SEQ_MARKERS) {
        return TaskKind::TextToText;
    }

    // QA must precede plain classification: "bert-qa" carries a QA head.
    if matches_any(&lower, ENCODER_MARKERS) && lower.contains("qa") {
        return TaskKind::QuestionAnswering;
    }

    if matches_any(&lower, ENCODER_MARKERS) {
        return TaskKind::Classification;
    }

    if lower.contains("dialogpt") {
        return TaskKind::Conversational;
    }

    TaskKind::TextGeneration
}

/// Check if the text contains any of the given patterns.
fn matches_any(text: &str, patterns: &[&str]) -> bool {
    patterns.iter().any(|p| text.contains(p))
}
