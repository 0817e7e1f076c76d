//! Curated model catalog for the `/models` listing.
//!
//! A small set of public identifiers spanning every task family the
//! adapter drives. The task shown for each entry comes from
//! `task::detect_task`, so listings reflect exactly how the adapter
//! would treat the model after a switch. Detection is identifier-based:
//! QA-tuned models without a literal "qa" in the name list as
//! classification.

use mg_protocol::TaskKind;

use crate::task;

/// One catalog entry: a public model identifier and a short note.
#[derive(Debug, Clone, Copy)]
pub struct CatalogEntry {
    pub identifier: &'static str,
    pub note: &'static str,
}

/// Models surfaced by the `/models` command.
pub const KNOWN_MODELS: &[CatalogEntry] = &[
    CatalogEntry {
        identifier: "microsoft/DialoGPT-medium",
        note: "dialogue-tuned GPT-2, the startup default",
    },
    CatalogEntry {
        identifier: "gpt2",
        note: "small causal baseline, also the fallback model",
    },
    CatalogEntry {
        identifier: "distilgpt2",
        note: "distilled GPT-2, fastest of the bunch",
    },
    CatalogEntry {
        identifier: "mistralai/Mistral-7B-Instruct-v0.1",
        note: "instruction-tuned 7B generalist",
    },
    CatalogEntry {
        identifier: "microsoft/phi-2",
        note: "compact instruct model",
    },
    CatalogEntry {
        identifier: "google/gemma-2b-it",
        note: "instruction-tuned Gemma",
    },
    CatalogEntry {
        identifier: "google/flan-t5-base",
        note: "instruction-tuned seq2seq",
    },
    CatalogEntry {
        identifier: "facebook/bart-large-cnn",
        note: "summarization",
    },
    CatalogEntry {
        identifier: "distilbert-base-uncased-finetuned-sst-2-english",
        note: "binary sentiment",
    },
    CatalogEntry {
        identifier: "cardiffnlp/twitter-roberta-base-sentiment-latest",
        note: "three-way sentiment",
    },
    CatalogEntry {
        identifier: "deepset/roberta-base-squad2",
        note: "extractive QA tuned on SQuAD 2.0",
    },
];

/// Display order for grouped listings.
const KIND_ORDER: &[TaskKind] = &[
    TaskKind::TextGeneration,
    TaskKind::Conversational,
    TaskKind::TextToText,
    TaskKind::QuestionAnswering,
    TaskKind::Classification,
];

/// Catalog entries grouped by detected task kind, in display order.
/// Empty groups are omitted.
pub fn grouped() -> Vec<(TaskKind, Vec<&'static CatalogEntry>)> {
    KIND_ORDER
        .iter()
        .filter_map(|kind| {
            let entries: Vec<_> = KNOWN_MODELS
                .iter()
                .filter(|e| task::detect_task(e.identifier) == *kind)
                .collect();
            if entries.is_empty() {
                None
            } else {
                Some((*kind, entries))
            }
        })
        .collect()
}
