//! Artifact loading.
//!
//! Four JSON files in the data directory make up the corpus:
//!
//! - `legal_sections.json`: flat list of section records
//! - `intent_mappings.json`: `{"intents": {<label>: <mapping>}}`
//! - `procedural_knowledge.json`: `{"intent_specific": ..., "general_procedures": ...}`
//! - `act_summaries.json`: flat list of act summaries
//!
//! A missing or unparsable file is fatal. A malformed individual record
//! inside an otherwise valid file is skipped with a warning; a corpus with
//! a few bad rows is still a corpus.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use ainbondhu_core::error::KnowledgeError;
use ainbondhu_core::knowledge::{ActSummary, IntentGuidance, IntentMapping, LegalSection};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{info, warn};

pub const SECTIONS_FILE: &str = "legal_sections.json";
pub const INTENT_MAPPINGS_FILE: &str = "intent_mappings.json";
pub const PROCEDURAL_FILE: &str = "procedural_knowledge.json";
pub const ACT_SUMMARIES_FILE: &str = "act_summaries.json";

/// The raw corpus as read from disk, before index construction.
#[derive(Debug, Default)]
pub struct Corpus {
    pub sections: Vec<LegalSection>,
    pub intents: HashMap<String, IntentMapping>,
    pub intent_guidance: HashMap<String, IntentGuidance>,
    pub general_procedures: serde_json::Map<String, serde_json::Value>,
    pub act_summaries: Vec<ActSummary>,
}

#[derive(Deserialize)]
struct IntentMappingsFile {
    #[serde(default)]
    intents: HashMap<String, IntentMapping>,
}

#[derive(Deserialize)]
struct ProceduralFile {
    #[serde(default)]
    intent_specific: HashMap<String, IntentGuidance>,
    #[serde(default)]
    general_procedures: serde_json::Map<String, serde_json::Value>,
}

fn read_artifact<T: DeserializeOwned>(dir: &Path, file: &str) -> Result<T, KnowledgeError> {
    let path = dir.join(file);
    if !path.exists() {
        return Err(KnowledgeError::ArtifactMissing(file.to_string()));
    }
    let raw = fs::read_to_string(&path).map_err(|e| KnowledgeError::ReadFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    serde_json::from_str(&raw).map_err(|e| KnowledgeError::ParseFailed {
        path: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Read all four artifacts from `dir`.
///
/// Record-level tolerance applies to the two list-shaped artifacts:
/// a section or act summary missing its identity fields is skipped, not
/// fatal. The two object-shaped artifacts must parse as a whole.
pub fn load_corpus(dir: &Path) -> Result<Corpus, KnowledgeError> {
    let raw_sections: Vec<serde_json::Value> = read_artifact(dir, SECTIONS_FILE)?;
    let mut sections = Vec::with_capacity(raw_sections.len());
    for record in raw_sections {
        match serde_json::from_value::<LegalSection>(record) {
            Ok(s) if !s.act_id.is_empty() && !s.section_number.is_empty() => sections.push(s),
            Ok(s) => {
                warn!(act_id = %s.act_id, section_number = %s.section_number,
                    "Skipping section record with incomplete identity");
            }
            Err(e) => {
                warn!(error = %e, "Skipping malformed section record");
            }
        }
    }

    let mappings: IntentMappingsFile = read_artifact(dir, INTENT_MAPPINGS_FILE)?;
    let procedural: ProceduralFile = read_artifact(dir, PROCEDURAL_FILE)?;

    let raw_summaries: Vec<serde_json::Value> = read_artifact(dir, ACT_SUMMARIES_FILE)?;
    let mut act_summaries = Vec::with_capacity(raw_summaries.len());
    for record in raw_summaries {
        match serde_json::from_value::<ActSummary>(record) {
            Ok(s) if !s.act_id.is_empty() => act_summaries.push(s),
            Ok(_) => warn!("Skipping act summary record with empty act_id"),
            Err(e) => warn!(error = %e, "Skipping malformed act summary record"),
        }
    }

    info!(
        sections = sections.len(),
        intents = mappings.intents.len(),
        act_summaries = act_summaries.len(),
        "Legal knowledge corpus loaded"
    );

    Ok(Corpus {
        sections,
        intents: mappings.intents,
        intent_guidance: procedural.intent_specific,
        general_procedures: procedural.general_procedures,
        act_summaries,
    })
}
