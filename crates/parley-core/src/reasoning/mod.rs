//! Structured-output reasoning: the backend port and the engine that
//! drives it through the request state machine.

pub mod backend;
pub mod engine;

pub use backend::{BoxReasoningBackend, ReasoningBackend};
pub use engine::{EngineSettings, FinalDraft, PassOutcome, ReasoningEngine, ReasoningSession};
