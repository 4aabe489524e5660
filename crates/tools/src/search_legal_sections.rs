//! Free-text fallback search over the full corpus.

use std::sync::Arc;

use ainbondhu_core::error::ToolError;
use ainbondhu_core::tool::{Tool, ToolResult};
use ainbondhu_search::SemanticSearch;
use async_trait::async_trait;
use tracing::debug;

use crate::require_str;

/// Runs the two-stage semantic funnel when no predefined intent fits.
pub struct SearchLegalSections {
    search: Arc<SemanticSearch>,
}

impl SearchLegalSections {
    pub fn new(search: Arc<SemanticSearch>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl Tool for SearchLegalSections {
    fn name(&self) -> &str {
        "search_legal_sections"
    }

    fn description(&self) -> &str {
        "Search the full legal corpus for sections relevant to a free-text question. \
         Use this when no predefined intent fits the user's question."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The user's question, in Bengali or English"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let query = require_str(&arguments, "query")?;

        let outcome = self.search.search(query).await;
        let sections_count = outcome.legal_sections.len();
        debug!(query, acts = outcome.acts_searched.len(), sections_count, "Fallback search done");

        let payload = serde_json::json!({
            "query": query,
            "acts_searched": outcome.acts_searched,
            "sections_count": sections_count,
            "legal_sections": outcome.legal_sections,
        });

        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output: payload.to_string(),
            sections_count,
        })
    }
}
