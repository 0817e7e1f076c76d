//! Prompt templates for instruction-tuned model families.
//!
//! Wraps raw user text in the instruction markup each family was trained
//! on. Ordered substring rules over the lowercased identifier; families
//! with no entry pass text through unchanged (plain causal models like
//! GPT-2 take raw continuation input).
//!
//! Applied only on the generation/conversational path. Seq2seq, QA, and
//! classification inputs are never templated.

/// Wrap user text in the prompt format for the given model family.
pub fn format_prompt(identifier: &str, text: &str) -> String {
    let lower = identifier.to_lowercase();

    if lower.contains("mistral") || lower.contains("mixtral") {
        return format!("<s>[INST] {text} [/INST]");
    }

    if lower.contains("llama") && lower.contains("chat") {
        return format!("<s>[INST] {text} [/INST]");
    }

    if lower.contains("phi") {
        return format!("Instruct: {text}\nOutput:");
    }

    if lower.contains("gemma") {
        return format!("<start_of_turn>user\n{text}<end_of_turn>\n<start_of_turn>model\n");
    }

    // GPT / DialoGPT and unrecognized families take the text as-is.
    text.to_string()
}
