//! End-to-end integration tests for the magpie workspace.
//!
//! This crate contains no runtime code. Everything of interest lives under
//! `tests/`, where each file drives a real `Dispatcher` over a real
//! `ModelAdapter` and `ResourceStore`, exactly as the bot binary wires them,
//! minus the Telegram transport.
