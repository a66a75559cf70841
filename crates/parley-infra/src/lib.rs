//! Infrastructure implementations for Parley.
//!
//! Concrete adapters for the ports defined in `parley-core`: the HTTP
//! conversation backend, the OpenAI-compatible structured-output reasoning
//! backend, built-in tools, filesystem persona loading, and TOML config
//! loading.

pub mod backend;
pub mod config;
pub mod llm;
pub mod persona;
pub mod tools;
