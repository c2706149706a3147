//! Orchestration: entity resolution, context assembly, detail mapping,
//! aggregation, persistence, and batch runs.

use rust_decimal::Decimal;

use crate::core::{
    CalculationMethod, Invoice, InvoiceTaxContext, Municipio, RetencionError, RetentionBreakdown,
    RetentionDetail, RetentionSummary, RetentionType, TaxCalculationResult,
};
use crate::entidad::{EntityStore, validate_entity};
use crate::reglas::{RuleConfig, TaxRuleEngine};

use super::clasificacion::classify_service;

/// Confidence attached to retefuente and reteIVA rows — national rules,
/// well determined by the inputs.
const CONFIDENCE_NATIONAL: f64 = 0.95;
/// Confidence attached to reteICA rows — the municipal rate depends on an
/// activity classification the engine only approximates.
const CONFIDENCE_ICA: f64 = 0.90;

/// Persisted retention rows, keyed by `(invoice_id, tax_type)`.
///
/// `replace_details` must behave as one atomic upsert of the invoice's full
/// row set: a failed write may not leave the invoice with a partial or
/// empty set. The store is also the place to serialize concurrent
/// recalculations of the same invoice (advisory lock or unique-constraint
/// upsert); the processor itself holds no cross-invoice state.
pub trait RetentionStore {
    fn replace_details(
        &mut self,
        invoice_id: &str,
        company_id: &str,
        details: &[RetentionDetail],
    ) -> Result<(), RetencionError>;

    fn set_invoice_retention(
        &mut self,
        invoice_id: &str,
        total: Decimal,
    ) -> Result<(), RetencionError>;
}

/// HashMap-backed [`RetentionStore`].
#[derive(Debug, Default)]
pub struct InMemoryRetentionStore {
    details: std::collections::HashMap<String, Vec<RetentionDetail>>,
    totals: std::collections::HashMap<String, Decimal>,
}

impl InMemoryRetentionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored rows for an invoice.
    pub fn details_for(&self, invoice_id: &str) -> &[RetentionDetail] {
        self.details.get(invoice_id).map_or(&[], Vec::as_slice)
    }

    /// Stored retention total for an invoice.
    pub fn total_for(&self, invoice_id: &str) -> Option<Decimal> {
        self.totals.get(invoice_id).copied()
    }
}

impl RetentionStore for InMemoryRetentionStore {
    fn replace_details(
        &mut self,
        invoice_id: &str,
        _company_id: &str,
        details: &[RetentionDetail],
    ) -> Result<(), RetencionError> {
        self.details.insert(invoice_id.to_string(), details.to_vec());
        Ok(())
    }

    fn set_invoice_retention(
        &mut self,
        invoice_id: &str,
        total: Decimal,
    ) -> Result<(), RetencionError> {
        self.totals.insert(invoice_id.to_string(), total);
        Ok(())
    }
}

/// Outcome of a batch run. Succeeded and failed invoices are kept apart so
/// "no retentions apply" (an empty breakdown) is never conflated with
/// "calculation failed".
#[derive(Debug, Default)]
pub struct BatchOutcome {
    /// `(invoice_id, breakdown)` for every invoice that processed.
    pub succeeded: Vec<(String, RetentionBreakdown)>,
    /// `(invoice_id, error)` for every invoice that did not.
    pub failed: Vec<(String, RetencionError)>,
}

/// The retention orchestrator: resolves entities, builds the per-invoice
/// context, runs the rule engine once per retention type, and aggregates
/// the applicable results into a [`RetentionBreakdown`].
#[derive(Debug)]
pub struct RetentionProcessor<S: EntityStore> {
    engine: TaxRuleEngine,
    entities: S,
}

impl<S: EntityStore> RetentionProcessor<S> {
    /// Processor with the built-in statutory rule data.
    pub fn new(entities: S) -> Self {
        Self::with_config(entities, RuleConfig::default())
    }

    /// Processor with injected rule data (historical rates, custom tables).
    pub fn with_config(entities: S, config: RuleConfig) -> Self {
        Self {
            engine: TaxRuleEngine::new(config),
            entities,
        }
    }

    /// The entity store, for seeding or inspecting entities.
    pub fn entities_mut(&mut self) -> &mut S {
        &mut self.entities
    }

    /// Compute the retention breakdown for one invoice.
    ///
    /// `supplier_tax_id` falls back to the invoice's own extracted tax id;
    /// `municipality` defaults to Bogotá. Missing or malformed tax ids do
    /// not fail the call — they resolve to low-confidence placeholder
    /// entities, which typically suppress retention (a placeholder is not a
    /// retention agent) with the reason recorded in `applied_rule`.
    ///
    /// The call is a pure request/response computation plus the entity
    /// round trips; recalculating an unchanged invoice yields an identical
    /// breakdown.
    pub fn process_invoice_retentions(
        &mut self,
        invoice: &Invoice,
        supplier_tax_id: Option<&str>,
        customer_tax_id: Option<&str>,
        municipality: Option<&str>,
    ) -> Result<RetentionBreakdown, RetencionError> {
        check_invoice(invoice)?;

        let supplier_id = supplier_tax_id.or(invoice.supplier_tax_id.as_deref());
        let supplier = validate_entity(&mut self.entities, supplier_id, &invoice.supplier_name)?;
        let customer = validate_entity(&mut self.entities, customer_tax_id, "")?;

        let municipio = municipality.map_or(Municipio::Bogota, Municipio::from_name);
        let service_type = classify_service(invoice.puc_code.as_deref(), &invoice.supplier_name);

        let ctx = InvoiceTaxContext {
            subtotal: invoice.subtotal,
            total_tax: invoice.total_tax,
            total_amount: invoice.total_amount,
            service_type,
            supplier: supplier.entity,
            customer: customer.entity,
            issue_date: invoice.issue_date,
            municipio,
        };

        let assessment = self.engine.calculate_taxes(&ctx)?;
        let config = self.engine.config();

        let retefuente = detail_from(
            &assessment.retencion_fuente,
            RetentionType::Retefuente,
            &ctx,
            config,
            CONFIDENCE_NATIONAL,
        );
        let reteica = detail_from(
            &assessment.ica,
            RetentionType::Reteica,
            &ctx,
            config,
            CONFIDENCE_ICA,
        );
        let reteiva = detail_from(
            &assessment.retencion_iva,
            RetentionType::Reteiva,
            &ctx,
            config,
            CONFIDENCE_NATIONAL,
        );

        Ok(aggregate(invoice.total_amount, retefuente, reteica, reteiva))
    }

    /// Compute and persist: retention rows replaced as one set, then the
    /// invoice's retention total written. A store failure is a hard failure
    /// for this invoice.
    pub fn process_and_store<R: RetentionStore>(
        &mut self,
        retentions: &mut R,
        invoice: &Invoice,
        supplier_tax_id: Option<&str>,
        customer_tax_id: Option<&str>,
        municipality: Option<&str>,
    ) -> Result<RetentionBreakdown, RetencionError> {
        let breakdown = self.process_invoice_retentions(
            invoice,
            supplier_tax_id,
            customer_tax_id,
            municipality,
        )?;

        let details: Vec<RetentionDetail> = breakdown.all_details().cloned().collect();
        retentions.replace_details(&invoice.id, &invoice.company_id, &details)?;
        retentions.set_invoice_retention(&invoice.id, breakdown.total_retentions)?;
        Ok(breakdown)
    }

    /// Recalculate a batch of invoices against one customer.
    ///
    /// Invoices are processed independently: one invoice's failure is
    /// recorded in the outcome and the batch continues.
    pub fn process_batch(
        &mut self,
        invoices: &[Invoice],
        customer_tax_id: Option<&str>,
        municipality: Option<&str>,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();
        for invoice in invoices {
            match self.process_invoice_retentions(invoice, None, customer_tax_id, municipality) {
                Ok(breakdown) => outcome.succeeded.push((invoice.id.clone(), breakdown)),
                Err(e) => outcome.failed.push((invoice.id.clone(), e)),
            }
        }
        outcome
    }
}

fn check_invoice(invoice: &Invoice) -> Result<(), RetencionError> {
    if invoice.subtotal < Decimal::ZERO
        || invoice.total_tax < Decimal::ZERO
        || invoice.total_amount < Decimal::ZERO
    {
        return Err(RetencionError::Invoice {
            id: invoice.id.clone(),
            reason: "negative amounts".into(),
        });
    }
    Ok(())
}

/// Map an applicable engine result into its persisted row. Non-applicable
/// results produce no row; their reason lives in the assessment only.
fn detail_from(
    result: &TaxCalculationResult,
    tax_type: RetentionType,
    ctx: &InvoiceTaxContext,
    config: &RuleConfig,
    confidence: f64,
) -> Option<RetentionDetail> {
    if !result.applicable {
        return None;
    }

    let (concept_code, concept_description, taxable_base, municipality, municipal_code) =
        match tax_type {
            RetentionType::Retefuente => {
                let concepto = config.conceptos.get(ctx.service_type);
                (
                    result
                        .dian_concept
                        .clone()
                        .unwrap_or_else(|| concepto.dian_code.clone()),
                    concepto.description.clone(),
                    ctx.subtotal,
                    None,
                    None,
                )
            }
            RetentionType::Reteica => {
                let code = config.tarifas_ica.get(ctx.municipio).dane_code.clone();
                (
                    code.clone(),
                    format!("ICA {}", ctx.municipio.name()),
                    ctx.subtotal,
                    Some(ctx.municipio.name().to_string()),
                    Some(code),
                )
            }
            RetentionType::Reteiva => (
                "IVA15".to_string(),
                "Retención de IVA".to_string(),
                ctx.total_tax,
                None,
                None,
            ),
        };

    Some(RetentionDetail {
        tax_type,
        concept_code,
        concept_description,
        taxable_base,
        tax_rate: result.rate,
        tax_amount: result.amount,
        threshold_uvt: result.base_uvt,
        municipality,
        supplier_type: ctx.supplier.entity_type,
        calculation_method: CalculationMethod::Automatic,
        applied_rule: result.rule_applied.clone(),
        confidence,
        dian_code: result.dian_concept.clone(),
        municipal_code,
    })
}

fn aggregate(
    total_amount: Decimal,
    retefuente: Option<RetentionDetail>,
    reteica: Option<RetentionDetail>,
    reteiva: Option<RetentionDetail>,
) -> RetentionBreakdown {
    let total = |d: &Option<RetentionDetail>| d.as_ref().map_or(Decimal::ZERO, |d| d.tax_amount);
    let total_retefuente = total(&retefuente);
    let total_reteica = total(&reteica);
    let total_reteiva = total(&reteiva);
    let total_retentions = total_retefuente + total_reteica + total_reteiva;

    RetentionBreakdown {
        retefuente: retefuente.into_iter().collect(),
        reteica: reteica.into_iter().collect(),
        reteiva: reteiva.into_iter().collect(),
        total_retentions,
        summary: RetentionSummary {
            total_retefuente,
            total_reteica,
            total_reteiva,
            net_amount: total_amount - total_retentions,
        },
    }
}
