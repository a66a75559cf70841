//! Built-in tools.
//!
//! Each tool implements the `parley-core` [`Tool`] port against a keyless
//! public API, so the catalogue is runnable as shipped. Tool-specific
//! retry policy stays inside the tool; the executor only applies the
//! per-invocation timeout.
//!
//! [`Tool`]: parley_core::tools::Tool

pub mod currency;
pub mod weather;

pub use currency::CurrencyTool;
pub use weather::WeatherTool;
