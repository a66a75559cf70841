//! Observability for Parley: tracing subscriber initialization and OTel
//! GenAI semantic-convention constants.

pub mod genai_attrs;
pub mod tracing_setup;
