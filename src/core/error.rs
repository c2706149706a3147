use thiserror::Error;

/// Errors that can occur during retention processing.
///
/// Recoverable conditions — missing tax ids, unclassifiable services,
/// unknown municipalities — are values, not errors: the pipeline degrades
/// to documented defaults instead of failing. What remains here is what
/// genuinely stops an invoice.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RetencionError {
    /// Entity or retention store failure. A store failure is a hard failure
    /// for the acting invoice only.
    #[error("store error: {0}")]
    Store(String),

    /// The invoice record is unusable (negative amounts, inconsistent totals).
    #[error("invalid invoice {id}: {reason}")]
    Invoice { id: String, reason: String },

    /// No UVT value registered for the invoice's fiscal year.
    #[error("no UVT value registered for fiscal year {0}")]
    UnknownFiscalYear(i32),
}
