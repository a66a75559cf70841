//! Filesystem persona loading.

pub mod loader;

pub use loader::load_personas;
