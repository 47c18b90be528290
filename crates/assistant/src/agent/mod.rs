//! LLM Agent Layer
//!
//! Provider abstraction over the chat models the specialist tools consult,
//! plus the prompt templates handed to them.

pub mod prompts;
pub mod provider;

pub use provider::{create_provider, LLMConfig, LLMProvider, MockProvider};
