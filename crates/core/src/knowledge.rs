//! Legal knowledge entities.
//!
//! The corpus is loaded once at startup and treated as immutable for the
//! process lifetime. These types mirror the knowledge artifact files on
//! disk; validation happens at construction in the knowledge crate, not at
//! read time.

use serde::{Deserialize, Serialize};

/// One statutory provision. Identity is `(act_id, section_number)`.
///
/// `section_number` stays a string: Bengali corpora number sections with
/// non-ASCII numerals ("৩", "১৪") and compound labels ("11A").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalSection {
    pub act_id: String,
    pub section_number: String,
    #[serde(default)]
    pub act_title: String,
    #[serde(default)]
    pub section_title: String,
    /// Verbatim statute text.
    #[serde(default)]
    pub section_text: String,
    /// Short paraphrase used for fast ranking; never the full statute.
    #[serde(default)]
    pub semantic_summary: String,
}

/// A reference to a section by composite key, as it appears inside an
/// intent mapping's `mandatory_sections` list.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionRef {
    pub act_id: String,
    pub section_number: String,
}

/// One law/act summary. One-to-many with `LegalSection` via `act_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActSummary {
    pub act_id: String,
    #[serde(default)]
    pub act_title: String,
    #[serde(default)]
    pub summary: String,
}

/// A named legal scenario bound at load time to a fixed list of section
/// references. References that do not resolve against the corpus are
/// dropped at query time rather than failing the lookup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntentMapping {
    #[serde(default)]
    pub mandatory_sections: Vec<SectionRef>,
    #[serde(default)]
    pub lawyer_playbook: serde_json::Value,
    #[serde(default)]
    pub legal_process: serde_json::Value,
    #[serde(default)]
    pub support_organizations: Vec<serde_json::Value>,
}

/// Intent-specific procedural guidance block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntentGuidance {
    #[serde(default)]
    pub lawyer_playbook: serde_json::Value,
    #[serde(default)]
    pub legal_process: serde_json::Value,
    #[serde(default)]
    pub support_organizations: Vec<serde_json::Value>,
}
