//! The in-memory knowledge index.
//!
//! Constructed once at startup from a [`Corpus`], then shared read-only
//! across every request. Section lookup is two map reads; intent lookup is
//! one. Nothing here touches the filesystem or the network.

use std::collections::HashMap;
use std::path::Path;

use ainbondhu_core::error::KnowledgeError;
use ainbondhu_core::knowledge::{ActSummary, IntentGuidance, IntentMapping, LegalSection};
use serde::Serialize;
use tracing::debug;

use crate::loader::{load_corpus, Corpus};

/// Cap on general-procedure topics per guidance request.
pub const MAX_TOPICS: usize = 3;

/// Result of an intent-based section lookup.
#[derive(Debug, Clone, Serialize)]
pub struct LegalKnowledge {
    pub legal_sections: Vec<LegalSection>,
}

/// Result of a procedural guidance lookup. Unknown intents and topics
/// yield empty sub-objects, never an error.
#[derive(Debug, Clone, Serialize)]
pub struct ProceduralGuidance {
    pub lawyer_playbook: serde_json::Value,
    pub legal_process: serde_json::Value,
    pub support_organizations: Vec<serde_json::Value>,
    pub general_procedures: serde_json::Map<String, serde_json::Value>,
}

/// Immutable lookup structures over the legal corpus.
pub struct KnowledgeIndex {
    /// act_id -> section_number -> section
    sections: HashMap<String, HashMap<String, LegalSection>>,
    intents: HashMap<String, IntentMapping>,
    intent_guidance: HashMap<String, IntentGuidance>,
    general_procedures: serde_json::Map<String, serde_json::Value>,
    act_summaries: HashMap<String, ActSummary>,
    /// Sorted intent labels, used to build tool schema enums.
    intent_labels: Vec<String>,
    /// Sorted general-procedure topic labels, same purpose.
    topic_labels: Vec<String>,
    section_count: usize,
}

impl KnowledgeIndex {
    /// Load the corpus from `dir` and build the index. The one fallible,
    /// fatal step of startup.
    pub fn load(dir: &Path) -> Result<Self, KnowledgeError> {
        Ok(Self::from_corpus(load_corpus(dir)?))
    }

    pub fn from_corpus(corpus: Corpus) -> Self {
        let section_count = corpus.sections.len();
        let mut sections: HashMap<String, HashMap<String, LegalSection>> = HashMap::new();
        for section in corpus.sections {
            sections
                .entry(section.act_id.clone())
                .or_default()
                .insert(section.section_number.clone(), section);
        }

        let act_summaries: HashMap<String, ActSummary> =
            corpus.act_summaries.into_iter().map(|s| (s.act_id.clone(), s)).collect();

        let mut intent_labels: Vec<String> = corpus.intents.keys().cloned().collect();
        intent_labels.sort();
        let mut topic_labels: Vec<String> =
            corpus.general_procedures.keys().cloned().collect();
        topic_labels.sort();

        Self {
            sections,
            intents: corpus.intents,
            intent_guidance: corpus.intent_guidance,
            general_procedures: corpus.general_procedures,
            act_summaries,
            intent_labels,
            topic_labels,
            section_count,
        }
    }

    /// The sections bound to an intent, in the mapping's declaration order.
    /// References that do not resolve against the corpus are dropped.
    /// Unknown intent returns an empty list.
    pub fn legal_knowledge(&self, intent: &str) -> LegalKnowledge {
        let Some(mapping) = self.intents.get(intent) else {
            debug!(intent, "No mapping for intent");
            return LegalKnowledge { legal_sections: Vec::new() };
        };

        let mut legal_sections = Vec::with_capacity(mapping.mandatory_sections.len());
        for section_ref in &mapping.mandatory_sections {
            match self.section(&section_ref.act_id, &section_ref.section_number) {
                Some(section) => legal_sections.push(section.clone()),
                None => {
                    debug!(
                        act_id = %section_ref.act_id,
                        section_number = %section_ref.section_number,
                        "Dropping unresolvable section reference"
                    );
                }
            }
        }
        LegalKnowledge { legal_sections }
    }

    /// Intent-specific guidance plus the requested general procedures.
    /// At most [`MAX_TOPICS`] topics are honored; unknown topics are
    /// skipped.
    pub fn procedural_guidance(&self, intent: &str, topics: &[String]) -> ProceduralGuidance {
        let guidance = self.intent_guidance.get(intent);

        let mut general_procedures = serde_json::Map::new();
        for topic in topics.iter().take(MAX_TOPICS) {
            if let Some(procedure) = self.general_procedures.get(topic) {
                general_procedures.insert(topic.clone(), procedure.clone());
            }
        }

        ProceduralGuidance {
            lawyer_playbook: guidance
                .map(|g| g.lawyer_playbook.clone())
                .unwrap_or_else(empty_object),
            legal_process: guidance
                .map(|g| g.legal_process.clone())
                .unwrap_or_else(empty_object),
            support_organizations: guidance
                .map(|g| g.support_organizations.clone())
                .unwrap_or_default(),
            general_procedures,
        }
    }

    pub fn section(&self, act_id: &str, section_number: &str) -> Option<&LegalSection> {
        self.sections.get(act_id)?.get(section_number)
    }

    /// All sections of one act, sorted by section number for stable
    /// candidate lists.
    pub fn sections_of_act(&self, act_id: &str) -> Vec<&LegalSection> {
        let mut sections: Vec<&LegalSection> =
            self.sections.get(act_id).map(|m| m.values().collect()).unwrap_or_default();
        sections.sort_by(|a, b| a.section_number.cmp(&b.section_number));
        sections
    }

    pub fn act_summary(&self, act_id: &str) -> Option<&ActSummary> {
        self.act_summaries.get(act_id)
    }

    /// All act summaries, sorted by act_id.
    pub fn act_summaries(&self) -> Vec<&ActSummary> {
        let mut summaries: Vec<&ActSummary> = self.act_summaries.values().collect();
        summaries.sort_by(|a, b| a.act_id.cmp(&b.act_id));
        summaries
    }

    pub fn intent_mapping(&self, intent: &str) -> Option<&IntentMapping> {
        self.intents.get(intent)
    }

    pub fn intent_labels(&self) -> &[String] {
        &self.intent_labels
    }

    pub fn topic_labels(&self) -> &[String] {
        &self.topic_labels
    }

    pub fn section_count(&self) -> usize {
        self.section_count
    }

    pub fn act_count(&self) -> usize {
        self.sections.len()
    }

    pub fn intent_count(&self) -> usize {
        self.intents.len()
    }
}

fn empty_object() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ainbondhu_core::knowledge::SectionRef;

    fn section(act_id: &str, number: &str, summary: &str) -> LegalSection {
        LegalSection {
            act_id: act_id.into(),
            section_number: number.into(),
            act_title: format!("Act {act_id}"),
            section_title: format!("Section {number}"),
            section_text: format!("Full text of {act_id}/{number}"),
            semantic_summary: summary.into(),
        }
    }

    fn fixture_index() -> KnowledgeIndex {
        let mut intents = HashMap::new();
        intents.insert(
            "maintenance".to_string(),
            IntentMapping {
                mandatory_sections: vec![
                    SectionRef { act_id: "A1".into(), section_number: "125".into() },
                    SectionRef { act_id: "A2".into(), section_number: "৩".into() },
                    SectionRef { act_id: "999".into(), section_number: "1".into() },
                ],
                ..Default::default()
            },
        );

        let mut general_procedures = serde_json::Map::new();
        general_procedures.insert(
            "file_fir".into(),
            serde_json::json!({"steps": ["থানায় যান", "এজাহার দিন"]}),
        );
        general_procedures
            .insert("safety_planning".into(), serde_json::json!({"steps": []}));
        general_procedures
            .insert("get_legal_aid".into(), serde_json::json!({"who_provides": []}));

        let mut intent_guidance = HashMap::new();
        intent_guidance.insert(
            "maintenance".to_string(),
            IntentGuidance {
                lawyer_playbook: serde_json::json!({"strategy": "নথি সংগ্রহ"}),
                legal_process: serde_json::json!({"court": "পারিবারিক আদালত"}),
                support_organizations: vec![serde_json::json!({"name": "BLAST"})],
            },
        );

        KnowledgeIndex::from_corpus(Corpus {
            sections: vec![
                section("A1", "125", "ভরণপোষণ"),
                section("A1", "126", "জরিমানা"),
                section("A2", "৩", "তালাক"),
            ],
            intents,
            intent_guidance,
            general_procedures,
            act_summaries: vec![ActSummary {
                act_id: "A1".into(),
                act_title: "Act A1".into(),
                summary: "পারিবারিক আইন".into(),
            }],
        })
    }

    #[test]
    fn legal_knowledge_follows_declaration_order() {
        let index = fixture_index();
        let result = index.legal_knowledge("maintenance");
        let keys: Vec<(&str, &str)> = result
            .legal_sections
            .iter()
            .map(|s| (s.act_id.as_str(), s.section_number.as_str()))
            .collect();
        assert_eq!(keys, vec![("A1", "125"), ("A2", "৩")]);
    }

    #[test]
    fn unknown_intent_returns_empty_not_error() {
        let index = fixture_index();
        let result = index.legal_knowledge("no_such_intent");
        assert!(result.legal_sections.is_empty());
    }

    #[test]
    fn unresolvable_reference_is_dropped() {
        // The mapping references (999, 1) which has no corpus record.
        let index = fixture_index();
        let result = index.legal_knowledge("maintenance");
        assert!(result.legal_sections.iter().all(|s| s.act_id != "999"));
    }

    #[test]
    fn empty_corpus_with_dangling_reference_returns_empty() {
        let mut intents = HashMap::new();
        intents.insert(
            "maintenance".to_string(),
            IntentMapping {
                mandatory_sections: vec![SectionRef {
                    act_id: "999".into(),
                    section_number: "1".into(),
                }],
                ..Default::default()
            },
        );
        let index = KnowledgeIndex::from_corpus(Corpus { intents, ..Default::default() });
        assert!(index.legal_knowledge("maintenance").legal_sections.is_empty());
    }

    #[test]
    fn procedural_guidance_returns_exactly_requested_topics() {
        let index = fixture_index();
        let guidance = index.procedural_guidance(
            "maintenance",
            &["file_fir".into(), "safety_planning".into(), "unknown_topic".into()],
        );
        let mut topics: Vec<&String> = guidance.general_procedures.keys().collect();
        topics.sort();
        assert_eq!(topics, vec!["file_fir", "safety_planning"]);
        assert_eq!(guidance.lawyer_playbook["strategy"], "নথি সংগ্রহ");
    }

    #[test]
    fn procedural_guidance_caps_topics() {
        let index = fixture_index();
        let guidance = index.procedural_guidance(
            "maintenance",
            &[
                "file_fir".into(),
                "safety_planning".into(),
                "get_legal_aid".into(),
                "file_fir".into(),
            ],
        );
        assert_eq!(guidance.general_procedures.len(), 3);
    }

    #[test]
    fn procedural_guidance_unknown_intent_yields_empty_objects() {
        let index = fixture_index();
        let guidance = index.procedural_guidance("no_such_intent", &[]);
        assert_eq!(guidance.lawyer_playbook, serde_json::json!({}));
        assert_eq!(guidance.legal_process, serde_json::json!({}));
        assert!(guidance.support_organizations.is_empty());
        assert!(guidance.general_procedures.is_empty());
    }

    #[test]
    fn section_lookup_handles_bengali_numerals() {
        let index = fixture_index();
        assert!(index.section("A2", "৩").is_some());
        assert!(index.section("A2", "3").is_none());
    }

    #[test]
    fn labels_are_sorted() {
        let index = fixture_index();
        assert_eq!(index.intent_labels(), ["maintenance"]);
        assert_eq!(index.topic_labels(), ["file_fir", "get_legal_aid", "safety_planning"]);
    }

    #[test]
    fn sections_of_act_sorted_by_number() {
        let index = fixture_index();
        let sections = index.sections_of_act("A1");
        assert_eq!(sections.len(), 2);
        assert_eq!(sections[0].section_number, "125");
        assert!(index.sections_of_act("no_such_act").is_empty());
    }
}
