//! Shared invoice, entity, and retention types plus the crate error type.
//!
//! The data model follows the DIAN reporting shapes: one
//! [`RetentionDetail`] row per applicable retention type per invoice, and a
//! derived [`RetentionBreakdown`] aggregate returned to the caller.

mod error;
mod types;

pub use error::*;
pub use types::*;
