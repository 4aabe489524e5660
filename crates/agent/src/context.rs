//! Conversation context windowing.
//!
//! Rebuilt fresh every turn from the stored history, never persisted.
//! Two shapes, decided purely by history length at call time:
//!
//! - **direct**: at most `history_limit` turns, passed verbatim
//! - **summarized**: everything older than the last `history_limit` turns
//!   is collapsed into one synthetic system turn, followed by the recent
//!   turns verbatim
//!
//! A failed summarization call degrades to a short placeholder; the turn
//! itself never fails because of it.

use std::sync::Arc;
use std::time::Duration;

use ainbondhu_core::message::{Message, Role};
use ainbondhu_core::provider::ProviderRequest;
use ainbondhu_core::store::StoredTurn;
use ainbondhu_core::Provider;
use tracing::{debug, warn};

/// Target digest length, passed to the summarizer model.
const DIGEST_WORDS: &str = "150-250";

/// The bounded message window for one LLM call.
#[derive(Debug)]
pub struct ContextWindow {
    pub messages: Vec<Message>,
    /// Whether an overflow digest was injected.
    pub summarized: bool,
}

/// Builds bounded context windows from stored history.
pub struct ContextManager {
    provider: Arc<dyn Provider>,
    summarizer_model: String,
    history_limit: usize,
    timeout: Duration,
}

impl ContextManager {
    pub fn new(
        provider: Arc<dyn Provider>,
        summarizer_model: impl Into<String>,
        history_limit: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            provider,
            summarizer_model: summarizer_model.into(),
            history_limit,
            timeout,
        }
    }

    /// Build the window for a turn. `history` is oldest-first, as the
    /// store returns it.
    pub async fn build(&self, history: &[StoredTurn]) -> ContextWindow {
        if history.len() <= self.history_limit {
            return ContextWindow {
                messages: history.iter().filter_map(turn_to_message).collect(),
                summarized: false,
            };
        }

        let split = history.len() - self.history_limit;
        let (old, recent) = history.split_at(split);

        let digest = self.summarize(old).await;
        let mut messages = Vec::with_capacity(self.history_limit + 1);
        messages.push(Message::system(digest));
        messages.extend(recent.iter().filter_map(turn_to_message));

        ContextWindow { messages, summarized: true }
    }

    /// Summarize the overflow partition. Only user and assistant content
    /// contributes; system and tool turns are noise for a digest.
    async fn summarize(&self, old: &[StoredTurn]) -> String {
        let transcript: String = old
            .iter()
            .filter(|t| matches!(t.role, Role::User | Role::Assistant))
            .map(|t| format!("{}: {}\n", t.role.as_str(), t.content))
            .collect();

        if transcript.is_empty() {
            return placeholder(old.len());
        }

        let prompt = format!(
            "Summarize the following conversation between a user and a legal assistant \
             in {DIGEST_WORDS} words. Write the summary in the conversation's language. \
             Preserve the user's legal issue, key facts, and any advice already given.\n\n\
             {transcript}"
        );
        let request = ProviderRequest::plain(
            &self.summarizer_model,
            vec![Message::user(prompt)],
        );

        match tokio::time::timeout(self.timeout, self.provider.complete(request)).await {
            Ok(Ok(response)) if !response.message.content.trim().is_empty() => {
                debug!(turns = old.len(), "Summarized conversation overflow");
                format!("Summary of earlier conversation: {}", response.message.content.trim())
            }
            Ok(Ok(_)) => {
                warn!("Summarizer returned empty digest");
                placeholder(old.len())
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Summarizer call failed");
                placeholder(old.len())
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "Summarizer call timed out");
                placeholder(old.len())
            }
        }
    }
}

fn placeholder(turns: usize) -> String {
    format!("Prior conversation: {turns} messages")
}

/// Stored turns become provider messages. Tool turns are dropped: they
/// cannot be replayed without their original call IDs.
fn turn_to_message(turn: &StoredTurn) -> Option<Message> {
    match turn.role {
        Role::User => Some(Message::user(&turn.content)),
        Role::Assistant => Some(Message::assistant(&turn.content)),
        Role::System => Some(Message::system(&turn.content)),
        Role::Tool => None,
    }
}
