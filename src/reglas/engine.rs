//! The pure rule engine: one [`InvoiceTaxContext`] in, three independent
//! [`TaxCalculationResult`]s out. No I/O, deterministic, never cached.

use chrono::Datelike;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::core::{InvoiceTaxContext, RetencionError, TaxAssessment, TaxCalculationResult};

use super::conceptos::ConceptoTable;
use super::municipios::IcaTable;
use super::uvt::UvtTable;

/// Immutable rule data injected into the engine. `Default` carries the
/// built-in statutory values; construct your own to test historical rates
/// or apply a new fiscal year without a code change.
#[derive(Debug, Clone)]
pub struct RuleConfig {
    /// UVT peso values per fiscal year.
    pub uvt: UvtTable,
    /// Retefuente concept table.
    pub conceptos: ConceptoTable,
    /// Municipal ICA rates.
    pub tarifas_ica: IcaTable,
    /// Blanket gate: invoices below this gross amount get no retention of
    /// any type.
    pub minimum_invoice_amount: Decimal,
    /// ReteIVA rate applied to the IVA amount (Art. 437-1 E.T.).
    pub reteiva_rate: Decimal,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            uvt: UvtTable::default(),
            conceptos: ConceptoTable::default(),
            tarifas_ica: IcaTable::default(),
            minimum_invoice_amount: dec!(100_000),
            reteiva_rate: dec!(0.15),
        }
    }
}

/// Computes the three retention assessments for one invoice context.
#[derive(Debug, Clone, Default)]
pub struct TaxRuleEngine {
    config: RuleConfig,
}

impl TaxRuleEngine {
    pub fn new(config: RuleConfig) -> Self {
        Self { config }
    }

    /// The rule data this engine runs on.
    pub fn config(&self) -> &RuleConfig {
        &self.config
    }

    /// Evaluate all three retention types against one context.
    ///
    /// Amounts are truncated (floor) to whole pesos, never rounded, so the
    /// engine cannot over-withhold. Every result carries `rule_applied`
    /// naming the branch that fired — including suppressed results, which
    /// record why the retention does not apply.
    ///
    /// # Logic
    ///
    /// 1. Gross total below the blanket minimum → all three suppressed.
    /// 2. Retefuente: customer must be a retention agent and the subtotal
    ///    must reach the concept's UVT minimum base for the fiscal year.
    ///    Base = subtotal, rate/concept from the service classification.
    /// 3. ReteICA: customer retention agent AND supplier ICA subject.
    ///    Base = subtotal, rate from the municipal table.
    /// 4. ReteIVA: customer retention agent AND the invoice carries IVA.
    ///    Base = the IVA amount itself, at the fixed reteIVA rate.
    pub fn calculate_taxes(
        &self,
        ctx: &InvoiceTaxContext,
    ) -> Result<TaxAssessment, RetencionError> {
        if ctx.total_amount < self.config.minimum_invoice_amount {
            let rule = format!(
                "minimum-amount gate: total {} below {}",
                ctx.total_amount, self.config.minimum_invoice_amount
            );
            return Ok(TaxAssessment {
                retencion_fuente: TaxCalculationResult::not_applicable(rule.clone()),
                ica: TaxCalculationResult::not_applicable(rule.clone()),
                retencion_iva: TaxCalculationResult::not_applicable(rule),
            });
        }

        Ok(TaxAssessment {
            retencion_fuente: self.retefuente(ctx)?,
            ica: self.reteica(ctx),
            retencion_iva: self.reteiva(ctx),
        })
    }

    fn retefuente(&self, ctx: &InvoiceTaxContext) -> Result<TaxCalculationResult, RetencionError> {
        if !ctx.customer.is_retention_agent {
            return Ok(TaxCalculationResult::not_applicable(
                "retefuente: customer is not a retention agent",
            ));
        }

        let concepto = self.config.conceptos.get(ctx.service_type);
        let uvt = self.config.uvt.value_for(ctx.issue_date.year())?;
        let min_base = concepto.min_base_uvt * uvt;

        if ctx.subtotal < min_base {
            return Ok(TaxCalculationResult {
                applicable: false,
                rate: Decimal::ZERO,
                amount: Decimal::ZERO,
                rule_applied: format!(
                    "retefuente: base {} below {} UVT minimum ({})",
                    ctx.subtotal, concepto.min_base_uvt, min_base
                ),
                base_uvt: Some(concepto.min_base_uvt),
                dian_concept: Some(concepto.dian_code.clone()),
            });
        }

        let amount = (ctx.subtotal * concepto.rate).floor();
        Ok(TaxCalculationResult {
            applicable: true,
            rate: concepto.rate,
            amount,
            rule_applied: format!(
                "retefuente: concept {} ({}) at {}%",
                concepto.dian_code,
                concepto.description,
                (concepto.rate * dec!(100)).normalize()
            ),
            base_uvt: Some(concepto.min_base_uvt),
            dian_concept: Some(concepto.dian_code.clone()),
        })
    }

    fn reteica(&self, ctx: &InvoiceTaxContext) -> TaxCalculationResult {
        if !ctx.customer.is_retention_agent {
            return TaxCalculationResult::not_applicable(
                "reteica: customer is not a retention agent",
            );
        }
        if !ctx.supplier.is_ica_subject {
            return TaxCalculationResult::not_applicable(
                "reteica: supplier is not an ICA subject",
            );
        }

        let tarifa = self.config.tarifas_ica.get(ctx.municipio);
        let amount = (ctx.subtotal * tarifa.rate).floor();
        TaxCalculationResult {
            applicable: true,
            rate: tarifa.rate,
            amount,
            rule_applied: format!(
                "reteica: {} at {} per mil",
                ctx.municipio.name(),
                (tarifa.rate * dec!(1000)).normalize()
            ),
            base_uvt: None,
            dian_concept: None,
        }
    }

    fn reteiva(&self, ctx: &InvoiceTaxContext) -> TaxCalculationResult {
        if !ctx.customer.is_retention_agent {
            return TaxCalculationResult::not_applicable(
                "reteiva: customer is not a retention agent",
            );
        }
        if ctx.total_tax <= Decimal::ZERO {
            return TaxCalculationResult::not_applicable("reteiva: invoice carries no IVA");
        }

        let amount = (ctx.total_tax * self.config.reteiva_rate).floor();
        TaxCalculationResult {
            applicable: true,
            rate: self.config.reteiva_rate,
            amount,
            rule_applied: format!(
                "reteiva: {}% of invoiced IVA",
                (self.config.reteiva_rate * dec!(100)).normalize()
            ),
            base_uvt: None,
            dian_concept: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::*;
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entity(retention_agent: bool, ica_subject: bool) -> TaxEntity {
        TaxEntity {
            tax_id: Some("900123456".into()),
            name: "Test S.A.S.".into(),
            entity_type: EntityType::LegalPerson,
            regime_type: RegimeType::Common,
            is_retention_agent: retention_agent,
            is_ica_subject: ica_subject,
            is_declarant: true,
            municipalities: BTreeSet::new(),
            verification_status: VerificationStatus::Verified,
            verification_confidence: 1.0,
        }
    }

    fn context() -> InvoiceTaxContext {
        InvoiceTaxContext {
            subtotal: dec!(1_057_038.17),
            total_tax: dec!(77_107.89),
            total_amount: dec!(1_134_146.06),
            service_type: ServiceType::Services,
            supplier: entity(false, true),
            customer: entity(true, false),
            issue_date: date(2024, 6, 15),
            municipio: Municipio::Bogota,
        }
    }

    #[test]
    fn bogota_services_scenario() {
        let engine = TaxRuleEngine::default();
        let a = engine.calculate_taxes(&context()).unwrap();

        assert!(a.retencion_fuente.applicable);
        assert_eq!(a.retencion_fuente.amount, dec!(116_274));
        assert_eq!(a.retencion_fuente.rate, dec!(0.11));
        assert_eq!(a.retencion_fuente.dian_concept.as_deref(), Some("365"));

        assert!(a.ica.applicable);
        assert_eq!(a.ica.amount, dec!(10_210));
        assert_eq!(a.ica.rate, dec!(0.00966));

        assert!(a.retencion_iva.applicable);
        assert_eq!(a.retencion_iva.amount, dec!(11_566));
        assert_eq!(a.retencion_iva.rate, dec!(0.15));
    }

    #[test]
    fn below_gate_suppresses_everything() {
        let mut ctx = context();
        ctx.subtotal = dec!(75_630.25);
        ctx.total_tax = dec!(14_369.75);
        ctx.total_amount = dec!(90_000);
        let a = TaxRuleEngine::default().calculate_taxes(&ctx).unwrap();
        assert!(!a.retencion_fuente.applicable);
        assert!(!a.ica.applicable);
        assert!(!a.retencion_iva.applicable);
        assert!(a.retencion_fuente.rule_applied.contains("minimum-amount gate"));
    }

    #[test]
    fn non_retention_agent_customer_suppresses_everything() {
        let mut ctx = context();
        ctx.customer.is_retention_agent = false;
        let a = TaxRuleEngine::default().calculate_taxes(&ctx).unwrap();
        assert!(!a.retencion_fuente.applicable);
        assert!(!a.ica.applicable);
        assert!(!a.retencion_iva.applicable);
    }

    #[test]
    fn supplier_not_ica_subject_suppresses_ica_only() {
        let mut ctx = context();
        ctx.supplier.is_ica_subject = false;
        let a = TaxRuleEngine::default().calculate_taxes(&ctx).unwrap();
        assert!(a.retencion_fuente.applicable);
        assert!(!a.ica.applicable);
        assert!(a.ica.rule_applied.contains("ICA subject"));
        assert!(a.retencion_iva.applicable);
    }

    #[test]
    fn zero_iva_suppresses_reteiva_only() {
        let mut ctx = context();
        ctx.total_tax = Decimal::ZERO;
        ctx.total_amount = ctx.subtotal;
        let a = TaxRuleEngine::default().calculate_taxes(&ctx).unwrap();
        assert!(a.retencion_fuente.applicable);
        assert!(!a.retencion_iva.applicable);
        assert!(a.retencion_iva.rule_applied.contains("no IVA"));
    }

    #[test]
    fn uvt_minimum_base_suppresses_retefuente() {
        // 4 UVT in 2024 = 188,260 — a 150k services invoice passes the
        // blanket gate but not the concept minimum
        let mut ctx = context();
        ctx.subtotal = dec!(150_000);
        ctx.total_tax = dec!(28_500);
        ctx.total_amount = dec!(178_500);
        let a = TaxRuleEngine::default().calculate_taxes(&ctx).unwrap();
        assert!(!a.retencion_fuente.applicable);
        assert!(a.retencion_fuente.rule_applied.contains("UVT minimum"));
        assert_eq!(a.retencion_fuente.base_uvt, Some(dec!(4)));
        // ICA and reteIVA have no UVT threshold
        assert!(a.ica.applicable);
        assert!(a.retencion_iva.applicable);
    }

    #[test]
    fn municipal_rate_selected() {
        let mut ctx = context();
        ctx.municipio = Municipio::Medellin;
        let a = TaxRuleEngine::default().calculate_taxes(&ctx).unwrap();
        assert_eq!(a.ica.rate, dec!(0.007));
        assert_eq!(a.ica.amount, (dec!(1_057_038.17) * dec!(0.007)).floor());
    }

    #[test]
    fn amounts_are_floored_not_rounded() {
        let mut ctx = context();
        ctx.subtotal = dec!(999_999);
        ctx.total_tax = dec!(189_999.81);
        ctx.total_amount = dec!(1_189_998.81);
        let a = TaxRuleEngine::default().calculate_taxes(&ctx).unwrap();
        // 999,999 × 0.11 = 109,999.89 → 109,999
        assert_eq!(a.retencion_fuente.amount, dec!(109_999));
        // 189,999.81 × 0.15 = 28,499.9715 → 28,499
        assert_eq!(a.retencion_iva.amount, dec!(28_499));
    }

    #[test]
    fn unknown_fiscal_year_is_hard_error() {
        let mut ctx = context();
        ctx.issue_date = date(1998, 1, 1);
        assert!(matches!(
            TaxRuleEngine::default().calculate_taxes(&ctx),
            Err(RetencionError::UnknownFiscalYear(1998))
        ));
    }

    #[test]
    fn historical_uvt_changes_threshold() {
        // 4 UVT in 2019 = 137,080 — the same 150k invoice clears the 2019
        // threshold but not the 2024 one
        let mut ctx = context();
        ctx.subtotal = dec!(150_000);
        ctx.total_tax = dec!(28_500);
        ctx.total_amount = dec!(178_500);
        ctx.issue_date = date(2019, 6, 15);
        let a = TaxRuleEngine::default().calculate_taxes(&ctx).unwrap();
        assert!(a.retencion_fuente.applicable);
    }

    #[test]
    fn results_record_rule_applied() {
        let a = TaxRuleEngine::default().calculate_taxes(&context()).unwrap();
        assert!(a.retencion_fuente.rule_applied.contains("concept 365"));
        assert!(a.ica.rule_applied.contains("Bogotá"));
        assert!(a.retencion_iva.rule_applied.contains("15%"));
    }
}
