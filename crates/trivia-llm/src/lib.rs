//! trivia-llm — upstream generation backend, JSON extraction, and the relay
//! that ties them together with model fallback.

pub mod backend;
pub mod extraction;
pub mod relay;

pub use backend::{GenerationBackend, GeminiBackend, LlmError, UpstreamReply};
pub use relay::{Relay, RelayResult};
