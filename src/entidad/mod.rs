//! Tax-entity classification: NIT validation and heuristic resolution.

mod nit;
mod validator;

pub use nit::*;
pub use validator::*;
