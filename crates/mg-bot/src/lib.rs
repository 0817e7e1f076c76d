//! Magpie bot library crate.
//!
//! Re-exports the bot's modules so the binary (`main.rs`) and the
//! `mg-e2e-tests` crate can reach the dispatcher, command parser, and
//! transport types.

pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod telegram;
pub mod update_loop;
