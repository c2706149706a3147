//! Retefuente concept table: rate, DIAN concept code, and minimum base per
//! service classification.
//!
//! Simplified extract of the Art. 392 E.T. / Decreto 1625 de 2016 tables.
//! The built-in table is data, not code: adding or adjusting a concept is a
//! [`ConceptoTable`] change, and callers can inject their own table through
//! [`crate::reglas::RuleConfig`].

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::core::ServiceType;

/// One row of the retefuente concept table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptoRetefuente {
    /// Rate as a decimal fraction (0.11 = 11%).
    pub rate: Decimal,
    /// DIAN concept code.
    pub dian_code: String,
    /// Concept description for the retention certificate.
    pub description: String,
    /// Minimum taxable base, in UVT. Below this the retention is suppressed.
    pub min_base_uvt: Decimal,
}

impl ConceptoRetefuente {
    fn new(rate: Decimal, dian_code: &str, description: &str, min_base_uvt: Decimal) -> Self {
        Self {
            rate,
            dian_code: dian_code.into(),
            description: description.into(),
            min_base_uvt,
        }
    }
}

/// Concept lookup, total over [`ServiceType`]: classifications without an
/// explicit row fall to the fallback arm (concept 365, other services).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConceptoTable {
    rows: HashMap<ServiceType, ConceptoRetefuente>,
    fallback: ConceptoRetefuente,
}

impl ConceptoTable {
    /// Build a table from explicit rows plus the fallback concept.
    pub fn new(rows: HashMap<ServiceType, ConceptoRetefuente>, fallback: ConceptoRetefuente) -> Self {
        Self { rows, fallback }
    }

    /// The concept row for a service classification.
    pub fn get(&self, service_type: ServiceType) -> &ConceptoRetefuente {
        self.rows.get(&service_type).unwrap_or(&self.fallback)
    }
}

impl Default for ConceptoTable {
    /// Statutory rates per Decreto 1625 de 2016 (simplified).
    fn default() -> Self {
        let rows = HashMap::from([
            (
                ServiceType::Services,
                ConceptoRetefuente::new(dec!(0.11), "365", "Servicios generales", dec!(4)),
            ),
            (
                ServiceType::Consulting,
                ConceptoRetefuente::new(dec!(0.11), "329", "Honorarios y consultoría", dec!(0)),
            ),
            (
                ServiceType::Purchases,
                ConceptoRetefuente::new(dec!(0.025), "351", "Compras generales", dec!(27)),
            ),
            (
                ServiceType::Rent,
                ConceptoRetefuente::new(dec!(0.035), "370", "Arrendamiento de bienes inmuebles", dec!(27)),
            ),
            (
                ServiceType::Transport,
                ConceptoRetefuente::new(dec!(0.01), "355", "Transporte de carga", dec!(4)),
            ),
            (
                ServiceType::Construction,
                ConceptoRetefuente::new(dec!(0.02), "360", "Contratos de construcción", dec!(27)),
            ),
        ]);
        let fallback = ConceptoRetefuente::new(dec!(0.11), "365", "Otros servicios", dec!(4));
        Self { rows, fallback }
    }
}
