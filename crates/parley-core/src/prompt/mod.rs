//! Prompt assembly for the structured reasoning call.

pub mod builder;

pub use builder::{AssembledPrompt, PromptBuilder};
