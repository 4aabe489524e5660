//! Intent-based section retrieval.

use std::sync::Arc;

use ainbondhu_core::error::ToolError;
use ainbondhu_core::tool::{Tool, ToolResult};
use ainbondhu_knowledge::KnowledgeIndex;
use async_trait::async_trait;
use tracing::debug;

use crate::require_str;

/// Returns the law sections bound to a predefined intent.
pub struct GetLegalKnowledge {
    index: Arc<KnowledgeIndex>,
}

impl GetLegalKnowledge {
    pub fn new(index: Arc<KnowledgeIndex>) -> Self {
        Self { index }
    }
}

#[async_trait]
impl Tool for GetLegalKnowledge {
    fn name(&self) -> &str {
        "get_legal_knowledge"
    }

    fn description(&self) -> &str {
        "Get the exact legal sections for a specific intent. Call this for any legal \
         question about family law, violence, or rights that matches one of the listed intents."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "intent": {
                    "type": "string",
                    "description": "The legal intent category",
                    "enum": self.index.intent_labels(),
                }
            },
            "required": ["intent"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
        let intent = require_str(&arguments, "intent")?;

        let knowledge = self.index.legal_knowledge(intent);
        let sections_count = knowledge.legal_sections.len();
        debug!(intent, sections_count, "Retrieved legal knowledge");

        let payload = serde_json::json!({
            "intent": intent,
            "sections_count": sections_count,
            "legal_sections": knowledge.legal_sections,
        });

        Ok(ToolResult {
            call_id: String::new(),
            success: true,
            output: payload.to_string(),
            sections_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ainbondhu_core::knowledge::{IntentMapping, LegalSection, SectionRef};
    use ainbondhu_knowledge::Corpus;
    use std::collections::HashMap;

    fn fixture_tool() -> GetLegalKnowledge {
        let mut intents = HashMap::new();
        intents.insert(
            "maintenance".to_string(),
            IntentMapping {
                mandatory_sections: vec![SectionRef {
                    act_id: "A1".into(),
                    section_number: "125".into(),
                }],
                ..Default::default()
            },
        );

        GetLegalKnowledge::new(Arc::new(KnowledgeIndex::from_corpus(Corpus {
            sections: vec![LegalSection {
                act_id: "A1".into(),
                section_number: "125".into(),
                act_title: "Act A1".into(),
                section_title: "ভরণপোষণ".into(),
                section_text: "ভরণপোষণের বিধান".into(),
                semantic_summary: "maintenance".into(),
            }],
            intents,
            ..Default::default()
        })))
    }

    #[tokio::test]
    async fn maintenance_query_returns_mapped_section() {
        let tool = fixture_tool();
        let result = tool
            .execute(serde_json::json!({"intent": "maintenance"}))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.sections_count, 1);

        let payload: serde_json::Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(payload["sections_count"], 1);
        assert_eq!(payload["legal_sections"][0]["act_id"], "A1");
        assert_eq!(payload["legal_sections"][0]["section_number"], "125");
    }

    #[tokio::test]
    async fn unknown_intent_returns_empty_payload() {
        let tool = fixture_tool();
        let result = tool
            .execute(serde_json::json!({"intent": "no_such_intent"}))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.sections_count, 0);

        let payload: serde_json::Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(payload["legal_sections"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn missing_intent_is_invalid_arguments() {
        let tool = fixture_tool();
        let err = tool.execute(serde_json::json!({})).await.unwrap_err();
        assert!(err.to_string().contains("intent"));
    }

    #[test]
    fn schema_enum_comes_from_corpus() {
        let tool = fixture_tool();
        let schema = tool.parameters_schema();
        assert_eq!(schema["properties"]["intent"]["enum"], serde_json::json!(["maintenance"]));
    }
}
