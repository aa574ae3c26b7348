//! Core logic for the forex pairs Telegram bot.
//!
//! This crate is framework-agnostic. Telegram and the HTTP health endpoint
//! live in adapter crates; the transport reaches the core through
//! `messaging::port::MessagingPort` and `handler::UpdateHandler`.

pub mod catalog;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod handler;
pub mod logging;
pub mod messaging;
pub mod navigation;
pub mod router;
pub mod security;
pub mod views;

pub use errors::{Error, Result};
