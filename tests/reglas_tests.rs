use std::collections::BTreeSet;
use std::collections::HashMap;

use chrono::NaiveDate;
use retenciones::core::*;
use retenciones::reglas::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn entity(retention_agent: bool, ica_subject: bool) -> TaxEntity {
    TaxEntity {
        tax_id: Some("900123456".into()),
        name: "Prueba S.A.S.".into(),
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

fn ctx(subtotal: Decimal, total_tax: Decimal) -> InvoiceTaxContext {
    InvoiceTaxContext {
        subtotal,
        total_tax,
        total_amount: subtotal + total_tax,
        service_type: ServiceType::Services,
        supplier: entity(false, true),
        customer: entity(true, false),
        issue_date: date(2024, 6, 15),
        municipio: Municipio::Bogota,
    }
}

// ---------------------------------------------------------------------------
// Rule semantics through the public engine API
// ---------------------------------------------------------------------------

#[test]
fn three_results_are_independent() {
    let a = TaxRuleEngine::default()
        .calculate_taxes(&ctx(dec!(1_000_000), dec!(190_000)))
        .unwrap();
    assert!(a.retencion_fuente.applicable);
    assert!(a.ica.applicable);
    assert!(a.retencion_iva.applicable);
    assert_eq!(a.retencion_fuente.amount, dec!(110_000));
    assert_eq!(a.ica.amount, dec!(9_660));
    assert_eq!(a.retencion_iva.amount, dec!(28_500));
}

#[test]
fn reteiva_base_is_the_iva_not_the_subtotal() {
    let a = TaxRuleEngine::default()
        .calculate_taxes(&ctx(dec!(1_000_000), dec!(190_000)))
        .unwrap();
    assert_eq!(a.retencion_iva.amount, (dec!(190_000) * dec!(0.15)).floor());
}

#[test]
fn suppressed_results_still_name_the_rule() {
    let mut c = ctx(dec!(1_000_000), dec!(0));
    c.supplier.is_ica_subject = false;
    let a = TaxRuleEngine::default().calculate_taxes(&c).unwrap();

    assert!(!a.ica.applicable);
    assert!(!a.ica.rule_applied.is_empty());
    assert!(!a.retencion_iva.applicable);
    assert!(!a.retencion_iva.rule_applied.is_empty());
}

// ---------------------------------------------------------------------------
// Injected rule data
// ---------------------------------------------------------------------------

#[test]
fn custom_uvt_table_changes_thresholds() {
    // A fictional 2030 where 4 UVT exceed the invoice subtotal
    let config = RuleConfig {
        uvt: UvtTable::new(vec![(2030, dec!(100_000))]),
        ..RuleConfig::default()
    };
    let engine = TaxRuleEngine::new(config);

    let mut c = ctx(dec!(300_000), dec!(57_000));
    c.issue_date = date(2030, 1, 1);
    let a = engine.calculate_taxes(&c).unwrap();
    assert!(!a.retencion_fuente.applicable);
    assert!(a.retencion_fuente.rule_applied.contains("UVT minimum"));
}

#[test]
fn custom_concept_table_changes_rates() {
    let conceptos = ConceptoTable::new(
        HashMap::new(),
        ConceptoRetefuente {
            rate: dec!(0.04),
            dian_code: "365".into(),
            description: "Servicios al 4%".into(),
            min_base_uvt: dec!(0),
        },
    );
    let config = RuleConfig {
        conceptos,
        ..RuleConfig::default()
    };
    let a = TaxRuleEngine::new(config)
        .calculate_taxes(&ctx(dec!(1_000_000), dec!(0)))
        .unwrap();
    assert_eq!(a.retencion_fuente.rate, dec!(0.04));
    assert_eq!(a.retencion_fuente.amount, dec!(40_000));
}

#[test]
fn custom_gate_applies_before_everything() {
    let config = RuleConfig {
        minimum_invoice_amount: dec!(5_000_000),
        ..RuleConfig::default()
    };
    let a = TaxRuleEngine::new(config)
        .calculate_taxes(&ctx(dec!(1_000_000), dec!(190_000)))
        .unwrap();
    assert!(!a.retencion_fuente.applicable);
    assert!(!a.ica.applicable);
    assert!(!a.retencion_iva.applicable);
}

// ---------------------------------------------------------------------------
// Numeric policy
// ---------------------------------------------------------------------------

#[test]
fn amounts_never_exceed_exact_product() {
    for subtotal in [dec!(200_001), dec!(523_456.78), dec!(999_999.99)] {
        let a = TaxRuleEngine::default()
            .calculate_taxes(&ctx(subtotal, dec!(0)))
            .unwrap();
        assert!(a.retencion_fuente.amount <= subtotal * dec!(0.11));
        assert!(a.retencion_fuente.amount > subtotal * dec!(0.11) - Decimal::ONE);
        // Whole pesos
        assert_eq!(a.retencion_fuente.amount, a.retencion_fuente.amount.floor());
    }
}

#[test]
fn rates_reported_as_decimal_fractions() {
    let a = TaxRuleEngine::default()
        .calculate_taxes(&ctx(dec!(1_000_000), dec!(190_000)))
        .unwrap();
    assert_eq!(a.retencion_fuente.rate, dec!(0.11));
    assert_eq!(a.ica.rate, dec!(0.00966));
    assert_eq!(a.retencion_iva.rate, dec!(0.15));
}

// ---------------------------------------------------------------------------
// Serialization of results
// ---------------------------------------------------------------------------

#[test]
fn assessment_serializes() {
    let a = TaxRuleEngine::default()
        .calculate_taxes(&ctx(dec!(1_000_000), dec!(190_000)))
        .unwrap();
    let json = serde_json::to_string(&a).unwrap();
    let back: TaxAssessment = serde_json::from_str(&json).unwrap();
    assert_eq!(back.retencion_fuente.amount, a.retencion_fuente.amount);
    assert_eq!(back.ica.rule_applied, a.ica.rule_applied);
}
