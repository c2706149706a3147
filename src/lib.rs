//! # retenciones
//!
//! Colombian withholding tax engine for electronic invoices: determines, for
//! each invoice, which statutory retentions apply — Retención en la Fuente
//! (Art. 392 E.T.), Retención de ICA (municipal), Retención de IVA
//! (Art. 437-2 E.T.) — at what rate, against what taxable base, and with the
//! DIAN concept/municipal codes needed for audit reporting.
//!
//! All monetary values use [`rust_decimal::Decimal`] — never floating point.
//! Retention amounts are truncated to whole pesos (floor), never rounded, so
//! the engine cannot over-withhold.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::NaiveDate;
//! use retenciones::core::*;
//! use retenciones::entidad::InMemoryEntityStore;
//! use retenciones::proceso::RetentionProcessor;
//! use rust_decimal_macros::dec;
//!
//! let invoice = Invoice {
//!     id: "FE-2024-0042".into(),
//!     company_id: "co-1".into(),
//!     subtotal: dec!(1_000_000),
//!     total_tax: dec!(190_000),
//!     total_amount: dec!(1_190_000),
//!     supplier_name: "Consultoría Andina S.A.S.".into(),
//!     supplier_tax_id: Some("900123456-8".into()),
//!     issue_date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
//!     puc_code: Some("5110".into()),
//!     total_retention: None,
//! };
//!
//! let mut processor = RetentionProcessor::new(InMemoryEntityStore::new());
//! let breakdown = processor
//!     .process_invoice_retentions(&invoice, Some("900123456-8"), Some("800197268-4"), None)
//!     .unwrap();
//!
//! assert_eq!(breakdown.summary.net_amount, invoice.total_amount - breakdown.total_retentions);
//! ```
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`core`] | Invoice/entity/retention types and the error type |
//! | [`entidad`] | NIT validation and heuristic tax-entity classification |
//! | [`reglas`] | UVT table, concept/municipal rate tables, the pure rule engine |
//! | [`proceso`] | Orchestration: context assembly, detail mapping, aggregation, batch runs |

pub mod core;
pub mod entidad;
pub mod proceso;
pub mod reglas;

// Re-export core types at crate root for convenience
pub use crate::core::*;
