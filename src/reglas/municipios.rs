//! Municipal ICA retention rates and DANE codes.
//!
//! ICA (industria y comercio) is a municipal tax; each municipality fixes
//! its own per-mille rate. The built-in table carries the general services
//! rate for the four largest markets; callers can inject their own through
//! [`crate::reglas::RuleConfig`]. Unknown municipality names resolve to
//! Bogotá upstream, in [`crate::core::Municipio::from_name`].

use std::collections::HashMap;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::core::Municipio;

/// One row of the municipal ICA table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TarifaIca {
    /// Rate as a decimal fraction (0.00966 = 9.66 per mil).
    pub rate: Decimal,
    /// DANE municipal code.
    pub dane_code: String,
}

impl TarifaIca {
    fn new(rate: Decimal, dane_code: &str) -> Self {
        Self {
            rate,
            dane_code: dane_code.into(),
        }
    }
}

/// ICA rate lookup, total over [`Municipio`]: municipalities without an
/// explicit row use the Bogotá fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IcaTable {
    rows: HashMap<Municipio, TarifaIca>,
    fallback: TarifaIca,
}

impl IcaTable {
    /// Build a table from explicit rows plus the fallback rate.
    pub fn new(rows: HashMap<Municipio, TarifaIca>, fallback: TarifaIca) -> Self {
        Self { rows, fallback }
    }

    /// The ICA row for a municipality.
    pub fn get(&self, municipio: Municipio) -> &TarifaIca {
        self.rows.get(&municipio).unwrap_or(&self.fallback)
    }
}

impl Default for IcaTable {
    fn default() -> Self {
        let rows = HashMap::from([
            // Acuerdo 65 de 2002 — general services, 9.66 per mil
            (Municipio::Bogota, TarifaIca::new(dec!(0.00966), "11001")),
            (Municipio::Medellin, TarifaIca::new(dec!(0.007), "05001")),
            (Municipio::Cali, TarifaIca::new(dec!(0.0077), "76001")),
            (Municipio::Bucaramanga, TarifaIca::new(dec!(0.0072), "68001")),
        ]);
        let fallback = TarifaIca::new(dec!(0.00966), "11001");
        Self { rows, fallback }
    }
}
