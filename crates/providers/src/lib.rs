//! LLM provider implementations for Ain Bondhu.
//!
//! All providers implement the `ainbondhu_core::Provider` trait. One
//! provider instance serves three callers that differ only in model name:
//! the main chat loop, the semantic-search classifier, and the history
//! summarizer.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
