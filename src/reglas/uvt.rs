//! UVT (Unidad de Valor Tributario) values by fiscal year.
//!
//! The UVT is the indexation unit of the Colombian tax code; DIAN fixes a
//! new peso value every year. Thresholds in the retention tables are
//! denominated in UVT and converted using the value for the invoice's
//! fiscal year.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::core::RetencionError;

/// UVT peso values per fiscal year. Immutable once constructed; the
/// built-in table carries the DIAN resolutions from 2019 on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UvtTable {
    values: Vec<(i32, Decimal)>,
}

impl UvtTable {
    /// Build a table from explicit `(year, peso value)` pairs.
    pub fn new(mut values: Vec<(i32, Decimal)>) -> Self {
        values.sort_by_key(|(y, _)| *y);
        Self { values }
    }

    /// The UVT peso value for `fiscal_year`.
    pub fn value_for(&self, fiscal_year: i32) -> Result<Decimal, RetencionError> {
        self.values
            .binary_search_by_key(&fiscal_year, |(y, _)| *y)
            .map(|i| self.values[i].1)
            .map_err(|_| RetencionError::UnknownFiscalYear(fiscal_year))
    }

    /// Years the table covers, ascending.
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.values.iter().map(|(y, _)| *y)
    }
}

impl Default for UvtTable {
    /// DIAN resolution values, 2019–2025.
    fn default() -> Self {
        Self::new(vec![
            (2019, dec!(34_270)),
            (2020, dec!(35_607)),
            (2021, dec!(36_308)),
            (2022, dec!(38_004)),
            (2023, dec!(42_412)),
            (2024, dec!(47_065)),
            (2025, dec!(49_799)),
        ])
    }
}
