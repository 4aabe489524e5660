//! The chat orchestration loop.
//!
//! One turn is an explicit finite state machine. Each iteration is one
//! provider call, then zero or more tool executions, then a message-list
//! append. The loop is bounded by `max_iterations`; tool failures come
//! back as structured tool results and the model gets a chance to
//! self-correct.
//!
//! `respond` never returns an error. Total failure produces a Bengali
//! apology with `success: false`, and the caller decides what to log.

use std::sync::Arc;

use ainbondhu_core::message::Message;
use ainbondhu_core::provider::ProviderRequest;
use ainbondhu_core::tool::ToolCall;
use ainbondhu_core::{Provider, ToolRegistry};
use tracing::{debug, info, warn};

const SYSTEM_PROMPT: &str = "তুমি একজন বাংলাদেশী আইনজীবী। তুমি পারিবারিক আইন, নারী অধিকার, এবং সহিংসতা সম্পর্কিত মামলায় বিশেষজ্ঞ।

তোমার কাজ:
1. ব্যবহারকারীর সমস্যা বুঝো
2. প্রাসঙ্গিক আইনি ধারা খুঁজে দাও (tools ব্যবহার করে)
3. স্পষ্ট, সহজ বাংলায় পরামর্শ দাও
4. ধাপে ধাপে কী করতে হবে বলো

মনে রাখো:
- সহজ ভাষা ব্যবহার করো (আইনি শব্দ এড়িয়ে চলো)
- সহানুভূতিশীল হও
- নিরাপত্তা প্রথম
- Practical পদক্ষেপ দাও";

const APOLOGY: &str = "দুঃখিত, একটি সমস্যা হয়েছে। অনুগ্রহ করে আবার চেষ্টা করুন।";

/// The loop's state between iterations.
#[derive(Debug, PartialEq, Eq)]
enum LoopState {
    AwaitingModel,
    ExecutingTools,
    Done,
    Failed,
}

/// Everything one chat turn produced.
#[derive(Debug)]
pub struct ChatOutcome {
    pub response: String,
    /// One `{tool, args, sections_count}` entry per executed tool call.
    pub tools_used: Vec<serde_json::Value>,
    pub sections_retrieved: usize,
    pub tokens_used: u32,
    pub model: String,
    /// First intent the model retrieved legal knowledge for.
    pub intent_detected: Option<String>,
    pub success: bool,
    pub error_message: Option<String>,
}

pub struct ChatLoop {
    provider: Arc<dyn Provider>,
    tools: Arc<ToolRegistry>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_iterations: u32,
}

impl ChatLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        tools: Arc<ToolRegistry>,
        model: impl Into<String>,
        temperature: f32,
    ) -> Self {
        Self {
            provider,
            tools,
            model: model.into(),
            temperature,
            max_tokens: None,
            max_iterations: 6,
        }
    }

    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Run one chat turn. `window` is the bounded context for this turn,
    /// ending with the current user message.
    pub async fn respond(&self, window: Vec<Message>) -> ChatOutcome {
        let mut messages = Vec::with_capacity(window.len() + 1);
        messages.push(Message::system(SYSTEM_PROMPT));
        messages.extend(window);

        let mut tools_used = Vec::new();
        let mut sections_retrieved = 0usize;
        let mut tokens_used = 0u32;
        let mut intent_detected: Option<String> = None;
        let mut model = self.model.clone();
        let mut pending_calls = Vec::new();
        let mut state = LoopState::AwaitingModel;
        let mut final_response = String::new();
        let mut error_message = None;

        for iteration in 0..self.max_iterations {
            match state {
                LoopState::AwaitingModel => {
                    let request = ProviderRequest {
                        model: self.model.clone(),
                        messages: messages.clone(),
                        temperature: self.temperature,
                        max_tokens: self.max_tokens,
                        tools: self.tools.definitions(),
                    };

                    match self.provider.complete(request).await {
                        Ok(response) => {
                            if let Some(usage) = response.usage {
                                tokens_used += usage.total_tokens;
                            }
                            model = response.model.clone();

                            if response.tool_calls().is_empty() {
                                final_response = response.message.content.clone();
                                state = LoopState::Done;
                            } else {
                                pending_calls = response.tool_calls().to_vec();
                                messages.push(response.message);
                                state = LoopState::ExecutingTools;
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, iteration, "Provider call failed");
                            error_message = Some(e.to_string());
                            state = LoopState::Failed;
                        }
                    }
                }
                LoopState::ExecutingTools => {
                    for tc in pending_calls.drain(..) {
                        let arguments: serde_json::Value =
                            serde_json::from_str(&tc.arguments).unwrap_or(serde_json::Value::Null);
                        let call = ToolCall {
                            id: tc.id.clone(),
                            name: tc.name.clone(),
                            arguments: arguments.clone(),
                        };

                        debug!(tool = %call.name, "Executing tool call");
                        let result = self.tools.dispatch(&call).await;

                        if call.name == "get_legal_knowledge" && intent_detected.is_none() {
                            intent_detected =
                                arguments["intent"].as_str().map(String::from);
                        }

                        sections_retrieved += result.sections_count;
                        tools_used.push(serde_json::json!({
                            "tool": call.name,
                            "args": arguments,
                            "sections_count": result.sections_count,
                        }));

                        messages.push(Message::tool_result(result.call_id, result.output));
                    }
                    state = LoopState::AwaitingModel;
                }
                LoopState::Done | LoopState::Failed => break,
            }
        }

        if state == LoopState::AwaitingModel || state == LoopState::ExecutingTools {
            warn!(max_iterations = self.max_iterations, "Chat loop hit iteration bound");
            error_message = Some(format!(
                "Tool iteration bound reached after {} iterations",
                self.max_iterations
            ));
            state = LoopState::Failed;
        }

        let success = state == LoopState::Done;
        info!(
            success,
            tools = tools_used.len(),
            tokens = tokens_used,
            "Chat turn complete"
        );

        ChatOutcome {
            response: if success { final_response } else { APOLOGY.to_string() },
            tools_used,
            sections_retrieved,
            tokens_used,
            model,
            intent_detected,
            success,
            error_message,
        }
    }
}
