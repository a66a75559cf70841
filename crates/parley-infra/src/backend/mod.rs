//! External conversation backend over HTTP.

pub mod client;
mod types;

pub use client::HttpConversationStore;
