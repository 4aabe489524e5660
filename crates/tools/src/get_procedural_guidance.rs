//! Procedural guidance retrieval.

use std::sync::Arc;

use ainbondhu_core::error::ToolError;
use ainbondhu_core::tool::{Tool, ToolResult};
use ainbondhu_knowledge::{KnowledgeIndex, MAX_TOPICS};
use async_trait::async_trait;
use tracing::debug;

use crate::require_str;

/// Returns the strategic playbook, legal process, support organizations,
/// and requested general procedures for an intent.
pub struct GetProceduralGuidance {
    index: Arc<KnowledgeIndex>,
}

impl GetProceduralGuidance {
    pub fn new(index: Arc<KnowledgeIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl Tool for GetProceduralGuidance {
    fn name(&self) -> &str {
        "get_procedural_guidance"
    }

    fn description(&self) -> &str {
        "Get step-by-step procedural guidance for an intent: lawyer's playbook, legal \
         process, support organizations, and optionally general procedures like filing \
         an FIR, getting legal aid, or safety planning."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "intent": {
                    "type": "string",
                    "description": "The legal intent category",
                    "enum": self.index.intent_labels(),
                },
                "topics": {
                    "type": "array",
                    "description": "General procedure topics to include",
                    "items": {
                        "type": "string",
                        "enum": self.index.topic_labels(),
                    },
                    "maxItems": MAX_TOPICS,
                }
            },
            "required": ["intent"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let intent = require_str(&arguments, "intent")?;

        let topics: Vec<String> = arguments["topics"]
            .as_array()
            .map(|items| items.iter().filter_map(|v| v.as_str().map(String::from)).collect())
            .unwrap_or_default();

        let guidance = self.index.procedural_guidance(intent, &topics);
        debug!(intent, topics = topics.len(), "Retrieved procedural guidance");

        let payload = serde_json::json!({
            "intent": intent,
            "topics_requested": topics,
            "lawyer_playbook": guidance.lawyer_playbook,
            "legal_process": guidance.legal_process,
            "support_organizations": guidance.support_organizations,
            "general_procedures": guidance.general_procedures,
        });

        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output: payload.to_string(),
            sections_count: 0,
        })
    }
}
