//! Retention processing: classification, orchestration, and batch runs.

mod clasificacion;
mod processor;

pub use clasificacion::*;
pub use processor::*;
