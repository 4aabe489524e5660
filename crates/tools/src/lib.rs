//! The retrieval tools the LLM can call during a chat turn.
//!
//! Three operations, all read-only against the knowledge index:
//!
//! - `get_legal_knowledge` — exact sections for a predefined intent
//! - `get_procedural_guidance` — playbook, process, and step-by-step
//!   procedures for an intent
//! - `search_legal_sections` — the semantic fallback funnel for queries
//!   no intent covers
//!
//! Intent and topic enumerations in the tool schemas are derived from the
//! loaded corpus at startup, not hardcoded.

use std::sync::Arc;

use ainbondhu_core::ToolRegistry;
use ainbondhu_knowledge::KnowledgeIndex;
use ainbondhu_search::SemanticSearch;

mod get_legal_knowledge;
mod get_procedural_guidance;
mod search_legal_sections;

pub use get_legal_knowledge::GetLegalKnowledge;
pub use get_procedural_guidance::GetProceduralGuidance;
pub use search_legal_sections::SearchLegalSections;

/// Build the registry with all three retrieval tools.
pub fn registry(index: Arc<KnowledgeIndex>, search: Arc<SemanticSearch>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(GetLegalKnowledge::new(index.clone())));
    registry.register(Box::new(GetProceduralGuidance::new(index)));
    registry.register(Box::new(SearchLegalSections::new(search)));
    registry
}

/// Pull a required string argument out of a tool-call payload.
fn require_str<'a>(
    arguments: &'a serde_json::Value,
    field: &str,
) -> Result<&'a str, ainbondhu_core::error::ToolError> {
    arguments[field].as_str().filter(|s| !s.is_empty()).ok_or_else(|| {
        ainbondhu_core::error::ToolError::InvalidArguments(format!(
            "Missing required argument: {field}"
        ))
    })
}
