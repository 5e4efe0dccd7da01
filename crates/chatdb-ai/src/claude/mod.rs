//! Anthropic Claude API client.
//!
//! Implements the `AiClient` trait for Claude models via the
//! Anthropic Messages API (https://api.anthropic.com/v1/messages).

mod api;
mod client;
mod config;


pub use client::ClaudeClient;
pub use config::ClaudeConfig;
