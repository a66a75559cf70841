//! Response-generation pipeline for Parley.
//!
//! This crate defines the "ports" (backend traits) that the infrastructure
//! layer implements -- [`store::ConversationStore`],
//! [`reasoning::backend::ReasoningBackend`], [`tools::catalogue::Tool`] --
//! and the pipeline stages that consume them. It depends only on
//! `parley-types`, never on `parley-infra` or any HTTP/IO crate.

pub mod compose;
pub mod context;
pub mod persona;
pub mod pipeline;
pub mod prompt;
pub mod reasoning;
pub mod store;
pub mod sync;
pub mod tools;
