//! Legal knowledge corpus: artifact loading and the in-memory index.
//!
//! Four JSON artifacts on disk become one immutable [`KnowledgeIndex`]
//! at startup. Lookups after that point are in-memory map reads; no I/O,
//! no locking, no reload path. A corrupt or missing artifact is fatal
//! before the process starts serving.

mod index;
mod loader;

pub use index::{KnowledgeIndex, LegalKnowledge, ProceduralGuidance, MAX_TOPICS};
pub use loader::{load_corpus, Corpus};
