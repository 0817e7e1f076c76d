//! Model adapter for hosted text models.
//!
//! One uniform text-in/text-out surface over heterogeneous model families:
//! task-kind inference from the identifier, per-family prompt templating,
//! response cleanup, and a confidence heuristic, with explicit load/switch
//! semantics and a swappable hosted backend behind a trait.

pub mod adapter;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod hosted;
pub mod mock;
pub mod prompt;
pub mod response;
pub mod task;

pub use adapter::ModelAdapter;
pub use backend::{ExtractiveAnswer, GenerationParams, InferenceBackend, LabelScore, LoadRequest};
pub use config::AdapterConfig;
pub use error::{AdapterError, AdapterResult, BackendError, BackendResult};
pub use hosted::{HostedBackend, HostedConfig};
pub use mock::MockBackend;
