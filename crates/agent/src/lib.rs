//! Two-tier playbook runtime.
//!
//! When an LLM backend is configured the runtime asks it for a decision first and
//! normalizes whatever comes back into a well-formed `SimulationResult`. Any call or
//! parse failure, and every request made without a backend, is answered by the
//! deterministic engine from `replydesk-core`.
//!
//! # Key Types
//!
//! - `PlaybookRuntime` - mode selection and fallback (see `runtime` module)
//! - `LlmClient` - pluggable completion seam
//! - `OpenAiClient` - OpenAI-compatible chat completions over HTTP

pub mod llm;
pub mod normalize;
pub mod openai;
pub mod prompt;
pub mod runtime;

pub use llm::{CompletionRequest, LlmClient};
pub use openai::{LlmError, OpenAiClient};
pub use runtime::PlaybookRuntime;
