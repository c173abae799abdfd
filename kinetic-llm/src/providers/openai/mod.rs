//! OpenAI provider implementation
//!
//! This module provides OpenAI-based ranking of exercise alternatives over
//! the chat completions endpoint.

pub mod client;
pub mod config;
pub mod ranker;
pub mod types;

pub use client::OpenAIClient;
pub use config::OpenAIRankerConfig;
pub use ranker::OpenAIRanker;
