//! Conversation orchestration for ragchat.
//!
//! A request flows through:
//!
//! 1. **Load** the session's History (under the session guard)
//! 2. **Retrieve** instruction and domain context (retrieval mode only)
//! 3. **Compose** the prompt
//! 4. **Run the pipeline**: START → ANSWER, calling the language model
//! 5. **Persist** the extended History and return the answer
//!
//! Retrieval mode runs the pipeline twice: once to generate a read-only
//! query, once to answer from its rows.

pub mod chat;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod sql;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use chat::{ChatRequest, ChatService};
pub use pipeline::{ConversationPipeline, PipelineSettings, PipelineState, Stage};
pub use prompt::{answer_prompt, compose, render_transcript};
pub use retriever::{ContextRetriever, validate_request};
pub use sql::{ensure_read_only, extract_sql};
