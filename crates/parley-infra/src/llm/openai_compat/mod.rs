//! OpenAI-compatible structured-output reasoning backend.

mod client;
mod types;

pub use client::OpenAiCompatBackend;
