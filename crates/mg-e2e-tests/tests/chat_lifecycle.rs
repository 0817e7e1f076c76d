//! Chat flow end to end: startup load, prompt templating, response
//! cleanup, and the per-task reply shapes.

mod helpers;

use helpers::TestHarness;
use mg_adapter::{ExtractiveAnswer, LabelScore};

/// The binary's startup sequence (load the default model, then serve a
/// chat) produces a footered reply naming that model.
#[tokio::test]
async fn e2e_startup_load_then_chat() {
    let h = TestHarness::empty();
    let default_model = h.adapter.config().default_model.clone();
    h.adapter.load_with_fallback(&default_model).await.unwrap();

    h.backend.queue_generation(Ok("Rust is fast.".into()));
    let reply = h.say("/chat tell me about rust").await;

    assert!(reply.starts_with("Rust is fast."));
    assert!(reply.contains(&format!("[{default_model} | confidence 80%")));
    assert!(reply.ends_with("s]"));
}

/// An instruction-tuned model gets its family template on the wire while
/// the user only ever sees their own words and the cleaned reply.
#[tokio::test]
async fn e2e_instruct_template_reaches_backend() {
    let h = TestHarness::empty();
    h.load("mistralai/Mistral-7B-Instruct-v0.1").await;

    h.backend
        .queue_generation(Ok("A systems programming language.".into()));
    let reply = h.say("/chat what is rust?").await;

    assert_eq!(
        h.backend.last_prompt().as_deref(),
        Some("<s>[INST] what is rust? [/INST]")
    );
    assert!(reply.starts_with("A systems programming language."));
    assert!(reply.contains("mistralai/Mistral-7B-Instruct-v0.1"));
}

/// Markup and repeated lines in raw model output never reach the chat:
/// the reply opens with the cleaned text.
#[tokio::test]
async fn e2e_raw_output_is_cleaned_before_reply() {
    let h = TestHarness::empty();
    h.load("gpt2").await;

    h.backend.queue_generation(Ok(
        "<p>Answer one.</p>\nAnswer one.\n\nAnswer two.".into(),
    ));
    let reply = h.say("/chat hello").await;

    assert!(reply.starts_with("Answer one.\nAnswer two."));
    assert!(!reply.contains("<p>"));
}

/// Consecutive chats drain scripted generations in order; each reply
/// carries its own text.
#[tokio::test]
async fn e2e_conversation_consumes_replies_in_order() {
    let h = TestHarness::empty();
    h.load("gpt2").await;

    h.backend.queue_generation(Ok("First reply.".into()));
    h.backend.queue_generation(Ok("Second reply.".into()));

    let first = h.say("/chat one").await;
    let second = h.say("/chat two").await;

    assert!(first.starts_with("First reply."));
    assert!(second.starts_with("Second reply."));

    let prompts: Vec<String> = h
        .backend
        .generation_calls()
        .into_iter()
        .map(|c| c.prompt)
        .collect();
    assert_eq!(prompts, vec!["one".to_string(), "two".to_string()]);
}

/// A question-answering model extracts a span and the footer shows the
/// backend's native score, not the shape heuristic.
#[tokio::test]
async fn e2e_qa_model_reports_native_score() {
    let h = TestHarness::empty();
    h.load("bert-qa-model").await;

    h.backend.queue_answer(Ok(ExtractiveAnswer {
        answer: "42".into(),
        score: 0.93,
    }));
    let reply = h.say("/ask what is the answer?").await;

    assert!(reply.starts_with("42"));
    assert!(reply.contains("confidence 93%"));
    // Chat offers no separate context, so the question doubles as one.
    let calls = h.backend.answer_calls();
    assert_eq!(calls[0].question, "what is the answer?");
    assert_eq!(calls[0].context, "what is the answer?");
}

/// A classifier model replies with the top label at its own score.
#[tokio::test]
async fn e2e_classifier_replies_with_top_label() {
    let h = TestHarness::empty();
    h.load("distilbert-base-uncased-finetuned-sst-2-english").await;

    h.backend.queue_classification(Ok(vec![
        LabelScore {
            label: "NEGATIVE".into(),
            score: 0.03,
        },
        LabelScore {
            label: "POSITIVE".into(),
            score: 0.97,
        },
    ]));
    let reply = h.say("/predict I love this bot").await;

    assert!(reply.starts_with("POSITIVE"));
    assert!(reply.contains("confidence 97%"));
}
