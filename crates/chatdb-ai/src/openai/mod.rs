//! OpenAI Chat Completions client.
//!
//! Implements the `AiClient` trait for OpenAI models and for any server
//! speaking the same protocol (LM Studio, llama.cpp, vLLM) via a custom
//! base URL.

mod api;
mod client;
mod config;


pub use client::OpenAiClient;
pub use config::OpenAiConfig;
