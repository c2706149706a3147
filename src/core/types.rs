use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// An electronic invoice as produced by the UBL/XML extraction pipeline.
///
/// Consumed read-only, except for `total_retention`, which the retention
/// processor writes back once a breakdown has been computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Invoice identifier (CUFE or internal id).
    pub id: String,
    /// Owning company (tenant) identifier.
    pub company_id: String,
    /// Net amount before IVA.
    pub subtotal: Decimal,
    /// Total IVA charged on the invoice.
    pub total_tax: Decimal,
    /// Gross amount (subtotal + total_tax).
    pub total_amount: Decimal,
    /// Supplier display name as extracted from the XML.
    pub supplier_name: String,
    /// Supplier NIT — extraction does not guarantee one.
    pub supplier_tax_id: Option<String>,
    /// Invoice issue date; determines the fiscal year for UVT lookups.
    pub issue_date: NaiveDate,
    /// PUC account code, when the invoice has been coded ("5110", "6135", ...).
    pub puc_code: Option<String>,
    /// Aggregate retention total, written back by the processor.
    pub total_retention: Option<Decimal>,
}

/// Kind of taxpayer behind a NIT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    /// Persona natural.
    NaturalPerson,
    /// Persona jurídica.
    LegalPerson,
}

/// Tax regime the entity belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegimeType {
    /// Régimen simplificado (non-IVA-responsible, Art. 437 E.T. parágrafo 3).
    Simplified,
    /// Régimen común (IVA responsible).
    Common,
    /// Régimen especial (non-profits, Art. 19 E.T.).
    Special,
}

/// How the entity's classification was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerificationStatus {
    /// No usable tax id; placeholder classification awaiting manual review.
    Pending,
    /// Classified heuristically from NIT shape and name keywords.
    Automatic,
    /// Confirmed by a human or against the RUT.
    Verified,
}

/// A taxpayer as known to the retention system.
///
/// Created on first reference to a tax id and never deleted (audit trail).
/// `is_retention_agent` and `is_ica_subject` are independent DIAN
/// designations, not derivable from `entity_type` alone; when unknown they
/// are approximated heuristically and flagged via `verification_status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxEntity {
    /// Cleaned NIT without verification digit; `None` for placeholders
    /// synthesized when the invoice carried no tax id.
    pub tax_id: Option<String>,
    /// Display name.
    pub name: String,
    /// Natural or legal person.
    pub entity_type: EntityType,
    /// Tax regime.
    pub regime_type: RegimeType,
    /// Designated retention agent (Art. 368 E.T.).
    pub is_retention_agent: bool,
    /// Subject to municipal ICA.
    pub is_ica_subject: bool,
    /// Income tax declarant.
    pub is_declarant: bool,
    /// Municipalities where the entity operates.
    pub municipalities: BTreeSet<String>,
    /// How the classification was established.
    pub verification_status: VerificationStatus,
    /// Confidence in the classification, in [0, 1]. Below 1.0 signals that
    /// downstream consumers should allow manual override.
    pub verification_confidence: f64,
}

/// The three statutory withholding types this engine computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RetentionType {
    /// Retención en la fuente a título de renta (Art. 392 E.T.).
    Retefuente,
    /// Retención de industria y comercio (municipal).
    Reteica,
    /// Retención de IVA (Art. 437-2 E.T.).
    Reteiva,
}

impl RetentionType {
    /// Storage/reporting code for this retention type.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Retefuente => "RETENCION_FUENTE",
            Self::Reteica => "RETENCION_ICA",
            Self::Reteiva => "RETENCION_IVA",
        }
    }

    /// Parse from a storage/reporting code.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "RETENCION_FUENTE" => Some(Self::Retefuente),
            "RETENCION_ICA" => Some(Self::Reteica),
            "RETENCION_IVA" => Some(Self::Reteiva),
            _ => None,
        }
    }
}

/// Service classification driving the retefuente concept lookup.
///
/// Derived from the invoice's PUC account code when present, from supplier
/// name keywords otherwise. Adding a concept is a table change in
/// [`crate::reglas`], not a new code path here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    /// Servicios generales (PUC 51xx).
    Services,
    /// Compras (PUC 61xx).
    Purchases,
    /// Arrendamientos (PUC 52xx).
    Rent,
    /// Honorarios y consultoría.
    Consulting,
    /// Transporte de carga.
    Transport,
    /// Contratos de construcción.
    Construction,
    /// Unclassifiable — falls to the default concept (365, other services).
    Other,
}

/// Municipality for the ICA rate lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Municipio {
    Bogota,
    Medellin,
    Cali,
    Bucaramanga,
}

impl Municipio {
    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bogota => "Bogotá",
            Self::Medellin => "Medellín",
            Self::Cali => "Cali",
            Self::Bucaramanga => "Bucaramanga",
        }
    }

    /// Resolve a free-text municipality name. Unknown or absent names fall
    /// back to Bogotá, the documented default.
    pub fn from_name(name: &str) -> Self {
        let lowered = name.trim().to_lowercase();
        match lowered.as_str() {
            "medellín" | "medellin" => Self::Medellin,
            "cali" | "santiago de cali" => Self::Cali,
            "bucaramanga" => Self::Bucaramanga,
            _ => Self::Bogota,
        }
    }
}

/// Ephemeral per-calculation context. Built by the processor for one
/// invoice, handed to the rule engine, then dropped — never persisted.
#[derive(Debug, Clone)]
pub struct InvoiceTaxContext {
    /// Net amount before IVA — taxable base for retefuente and reteICA.
    pub subtotal: Decimal,
    /// IVA amount — taxable base for reteIVA.
    pub total_tax: Decimal,
    /// Gross amount, checked against the blanket minimum gate.
    pub total_amount: Decimal,
    /// Service classification for the concept lookup.
    pub service_type: ServiceType,
    /// Supplier snapshot.
    pub supplier: TaxEntity,
    /// Customer snapshot.
    pub customer: TaxEntity,
    /// Issue date; its year selects the UVT value.
    pub issue_date: NaiveDate,
    /// Municipality for the ICA rate.
    pub municipio: Municipio,
}

/// Outcome of evaluating one retention type against a context.
///
/// Produced fresh on every call — never cached across invoices, since the
/// result is a pure function of the context and the fiscal-year tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxCalculationResult {
    /// Whether this retention applies to the invoice.
    pub applicable: bool,
    /// Rate as a decimal fraction (0.11 = 11%).
    pub rate: Decimal,
    /// Retention amount, floored to whole pesos. Zero when not applicable.
    pub amount: Decimal,
    /// Which rule branch fired. Mandatory audit output, also set on
    /// non-applicable results to record why the retention was suppressed.
    pub rule_applied: String,
    /// Minimum base threshold in UVT, when the rule family has one.
    pub base_uvt: Option<Decimal>,
    /// DIAN concept code, when the rule family has one.
    pub dian_concept: Option<String>,
}

impl TaxCalculationResult {
    /// A non-applicable result recording why the retention was suppressed.
    pub fn not_applicable(rule: impl Into<String>) -> Self {
        Self {
            applicable: false,
            rate: Decimal::ZERO,
            amount: Decimal::ZERO,
            rule_applied: rule.into(),
            base_uvt: None,
            dian_concept: None,
        }
    }
}

/// The three independent results for one invoice, one per retention type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxAssessment {
    pub retencion_fuente: TaxCalculationResult,
    pub ica: TaxCalculationResult,
    pub retencion_iva: TaxCalculationResult,
}

/// How a retention line item was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalculationMethod {
    /// Computed by the rule engine.
    Automatic,
    /// Entered by a human.
    Manual,
    /// Engine result overridden by a human.
    Override,
}

/// The persisted retention line item — one row per applicable retention
/// type per invoice, keyed by `(invoice_id, tax_type)`. Recalculation
/// replaces the full set; there is no versioning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionDetail {
    /// Which retention this row represents.
    pub tax_type: RetentionType,
    /// DIAN concept code (retefuente) or municipal activity code (ICA).
    pub concept_code: String,
    /// Human-readable concept description.
    pub concept_description: String,
    /// Base the rate was applied to.
    pub taxable_base: Decimal,
    /// Rate as a decimal fraction.
    pub tax_rate: Decimal,
    /// Withheld amount, floored to whole pesos.
    pub tax_amount: Decimal,
    /// Minimum base threshold in UVT, when the rule family has one.
    pub threshold_uvt: Option<Decimal>,
    /// Municipality, for ICA rows.
    pub municipality: Option<String>,
    /// Supplier classification at calculation time.
    pub supplier_type: EntityType,
    /// How this row was produced.
    pub calculation_method: CalculationMethod,
    /// Rule branch that fired, copied from the engine result.
    pub applied_rule: String,
    /// Confidence in the row, in [0, 1].
    pub confidence: f64,
    /// DIAN reporting code, when applicable.
    pub dian_code: Option<String>,
    /// DANE municipal code, for ICA rows.
    pub municipal_code: Option<String>,
}

/// Per-type and grand totals for one invoice's breakdown.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionSummary {
    pub total_retefuente: Decimal,
    pub total_reteica: Decimal,
    pub total_reteiva: Decimal,
    /// Net payable: `total_amount − total_retentions`.
    pub net_amount: Decimal,
}

/// The aggregate result for one invoice. Purely derived and never persisted
/// as its own row — its details are flattened into [`RetentionDetail`] rows
/// and a scalar `total_retention` on the invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionBreakdown {
    pub retefuente: Vec<RetentionDetail>,
    pub reteica: Vec<RetentionDetail>,
    pub reteiva: Vec<RetentionDetail>,
    /// Sum over all three detail lists.
    pub total_retentions: Decimal,
    pub summary: RetentionSummary,
}

impl RetentionBreakdown {
    /// All detail rows across the three retention types, in reporting order.
    pub fn all_details(&self) -> impl Iterator<Item = &RetentionDetail> {
        self.retefuente
            .iter()
            .chain(self.reteica.iter())
            .chain(self.reteiva.iter())
    }

    /// True when no retention applied at all.
    pub fn is_empty(&self) -> bool {
        self.retefuente.is_empty() && self.reteica.is_empty() && self.reteiva.is_empty()
    }

    /// Write the aggregate back onto the invoice's `total_retention` field.
    pub fn apply_total(&self, invoice: &mut Invoice) {
        invoice.total_retention = Some(self.total_retentions);
    }
}
