//! Tool catalogue and execution.

pub mod catalogue;
pub mod executor;
pub mod validate;

pub use catalogue::{BoxTool, Tool, ToolCatalogue};
pub use executor::ToolExecutor;
