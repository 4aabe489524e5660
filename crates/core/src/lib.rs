//! # Ain Bondhu Core
//!
//! Domain types, traits, and error definitions for the Ain Bondhu legal
//! assistant. This crate has **zero framework dependencies** — it defines
//! the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod knowledge;
pub mod message;
pub mod provider;
pub mod store;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use knowledge::{ActSummary, IntentMapping, LegalSection, SectionRef};
pub use message::{Message, ProfileId, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition, Usage};
pub use store::{AnalyticsRecord, ConversationStore, StoredTurn};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
