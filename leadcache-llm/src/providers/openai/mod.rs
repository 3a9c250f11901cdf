//! OpenAI provider implementation
//!
//! Draft generation over the Responses API.

pub mod client;
pub mod generation;
pub mod types;

pub use client::OpenAIClient;
pub use generation::OpenAIGenerationProvider;
