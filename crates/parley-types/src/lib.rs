//! Shared domain types for Parley.
//!
//! This crate contains the core domain types used across the Parley
//! pipeline: messages, personas, reasoning traces, tool calls, UI metadata,
//! and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror,
//! and schemars.

pub mod config;
pub mod error;
pub mod llm;
pub mod message;
pub mod persona;
pub mod response;
pub mod tool;
pub mod trace;
pub mod ui;
