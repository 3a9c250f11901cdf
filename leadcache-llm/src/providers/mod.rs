//! Generation provider implementations
//!
//! Concrete implementations of [`crate::GenerationProvider`].

pub mod openai;

pub use openai::{OpenAIClient, OpenAIGenerationProvider};
