//! trivia-web — HTTP surface for the trivia relay.
//! Exposes:
//!   - POST /api/trivia  prompt → extracted JSON, fallback signal, or error
//!   - GET  /health      liveness and configured port

pub mod router;
pub mod handlers;
pub mod state;
