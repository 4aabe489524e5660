//! Chat orchestration for Ain Bondhu.
//!
//! Two pieces: the context manager that bounds how much stored history
//! reaches the model per turn, and the chat loop that drives the
//! model/tool conversation to a final answer.

pub mod context;
pub mod loop_runner;

pub use context::{ContextManager, ContextWindow};
pub use loop_runner::{ChatLoop, ChatOutcome};
