//! The tax rule engine and its versioned rule data.
//!
//! Rates, thresholds, and the fiscal-year UVT values are data
//! ([`RuleConfig`]), not code: historical years can be tested and new DIAN
//! resolutions applied by constructing a different config.

mod conceptos;
mod engine;
mod municipios;
mod uvt;

pub use conceptos::*;
pub use engine::*;
pub use municipios::*;
pub use uvt::*;
