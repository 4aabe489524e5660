//! Semantic fallback search.
//!
//! Used when no predefined intent fits a query. A lightweight classifier
//! model narrows the corpus in two stages: first across acts, then across
//! the sections of each selected act. Candidates are sent reduced (titles
//! and summaries, never full statute text) to bound prompt size.
//!
//! The funnel fails soft. A classifier timeout, a malformed reply, or a
//! hallucinated candidate ID degrades to fewer (possibly zero) results;
//! nothing here propagates an error to the caller.

use std::sync::Arc;
use std::time::Duration;

use ainbondhu_core::knowledge::LegalSection;
use ainbondhu_core::message::Message;
use ainbondhu_core::provider::ProviderRequest;
use ainbondhu_core::Provider;
use tracing::{debug, warn};

const CLASSIFIER_SYSTEM_PROMPT: &str =
    "You are a JSON-only assistant. Return only valid JSON objects, no explanation.";

/// What a fallback search produced. Always best-effort, possibly empty.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    pub acts_searched: Vec<String>,
    pub legal_sections: Vec<LegalSection>,
}

/// The two-stage act/section funnel.
pub struct SemanticSearch {
    provider: Arc<dyn Provider>,
    index: Arc<ainbondhu_knowledge::KnowledgeIndex>,
    model: String,
    act_top_k: usize,
    section_top_k: usize,
    timeout: Duration,
}

impl SemanticSearch {
    pub fn new(
        provider: Arc<dyn Provider>,
        index: Arc<ainbondhu_knowledge::KnowledgeIndex>,
        model: impl Into<String>,
        act_top_k: usize,
        section_top_k: usize,
        timeout: Duration,
    ) -> Self {
        Self { provider, index, model: model.into(), act_top_k, section_top_k, timeout }
    }

    /// Run the full funnel for a free-text query.
    ///
    /// If the act stage selects nothing, the section stage is never
    /// invoked and `acts_searched` is empty.
    pub async fn search(&self, query: &str) -> SearchOutcome {
        let acts_searched = self.relevant_acts(query).await;
        if acts_searched.is_empty() {
            debug!(query, "Act stage selected nothing");
            return SearchOutcome::default();
        }

        let mut legal_sections = Vec::new();
        for act_id in &acts_searched {
            legal_sections.extend(self.sections_from_act(act_id, query).await);
        }

        SearchOutcome { acts_searched, legal_sections }
    }

    /// Act-selection stage: rank all act summaries against the query.
    async fn relevant_acts(&self, query: &str) -> Vec<String> {
        let candidates: Vec<serde_json::Value> = self
            .index
            .act_summaries()
            .iter()
            .map(|s| {
                serde_json::json!({
                    "act_id": s.act_id,
                    "title": s.act_title,
                    "summary": s.summary,
                })
            })
            .collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        let prompt = format!(
            "You are a legal research assistant. Given a user's question and a list of \
             Bangladesh legal acts, identify the {top_k} most relevant acts.\n\n\
             User Question: {query}\n\n\
             Acts:\n{acts}\n\n\
             Return a JSON object with an \"act_ids\" array, like: {{\"act_ids\": [\"1063\", \"835\"]}}\n\
             Pick the {top_k} most relevant acts. Be precise.",
            top_k = self.act_top_k,
            acts = serde_json::to_string_pretty(&candidates).unwrap_or_default(),
        );

        let Some(reply) = self.classify(&prompt, 100).await else {
            return Vec::new();
        };

        extract_ids(&reply, "act_ids", "acts")
            .into_iter()
            // The classifier may invent IDs; keep only ones from the
            // candidate set.
            .filter(|id| {
                let known = self.index.act_summary(id).is_some();
                if !known {
                    warn!(act_id = %id, "Classifier returned act outside candidate set");
                }
                known
            })
            .take(self.act_top_k)
            .collect()
    }

    /// Section-selection stage: rank the sections of one act, then
    /// re-hydrate the winners to full records.
    async fn sections_from_act(&self, act_id: &str, query: &str) -> Vec<LegalSection> {
        let sections = self.index.sections_of_act(act_id);
        if sections.is_empty() {
            return Vec::new();
        }

        let candidates: Vec<serde_json::Value> = sections
            .iter()
            .map(|s| {
                serde_json::json!({
                    "section_number": s.section_number,
                    "title": s.section_title,
                    "summary": s.semantic_summary,
                })
            })
            .collect();

        let prompt = format!(
            "You are a legal research assistant. Given a user's question and a list of \
             sections from a Bangladesh law, identify the {top_k} most relevant sections.\n\n\
             User Question: {query}\n\n\
             Sections:\n{sections}\n\n\
             Return a JSON object with a \"section_numbers\" array (as strings), like: \
             {{\"section_numbers\": [\"৩\", \"১৪\", \"২০\"]}}\n\
             Pick the {top_k} most relevant sections. Be precise.",
            top_k = self.section_top_k,
            sections = serde_json::to_string_pretty(&candidates).unwrap_or_default(),
        );

        let Some(reply) = self.classify(&prompt, 150).await else {
            return Vec::new();
        };

        extract_ids(&reply, "section_numbers", "sections")
            .into_iter()
            .filter_map(|number| self.index.section(act_id, &number).cloned())
            .take(self.section_top_k)
            .collect()
    }

    /// One classification call, bounded by the configured timeout.
    /// Any failure maps to `None`.
    async fn classify(&self, prompt: &str, max_tokens: u32) -> Option<String> {
        let mut request = ProviderRequest::plain(
            &self.model,
            vec![Message::system(CLASSIFIER_SYSTEM_PROMPT), Message::user(prompt)],
        );
        request.max_tokens = Some(max_tokens);

        match tokio::time::timeout(self.timeout, self.provider.complete(request)).await {
            Ok(Ok(response)) => Some(response.message.content),
            Ok(Err(e)) => {
                warn!(error = %e, "Classifier call failed");
                None
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "Classifier call timed out");
                None
            }
        }
    }
}

/// Pull a string array out of a classifier reply, trying the primary key
/// then a fallback key. Anything unparsable yields an empty list.
fn extract_ids(reply: &str, primary: &str, fallback: &str) -> Vec<String> {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(reply.trim()) else {
        warn!("Classifier reply was not valid JSON");
        return Vec::new();
    };

    let array = value
        .get(primary)
        .and_then(|v| v.as_array())
        .or_else(|| value.get(fallback).and_then(|v| v.as_array()));

    array
        .map(|items| items.iter().filter_map(|v| v.as_str().map(String::from)).collect())
        .unwrap_or_default()
}
