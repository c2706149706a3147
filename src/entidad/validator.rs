//! Heuristic tax-entity resolution.
//!
//! Given a tax id and a display name, resolve an existing [`TaxEntity`] or
//! synthesize one from the NIT's shape and name keywords. This never fails
//! the pipeline: a missing or malformed tax id produces a low-confidence
//! placeholder flagged for manual review, not an error.

use std::collections::BTreeSet;

use crate::core::{EntityType, RegimeType, RetencionError, TaxEntity, VerificationStatus};

use super::nit::{looks_like_legal_person, validate_nit};

/// Persisted entity lookup/upsert, keyed by the cleaned NIT.
///
/// Implemented by the relational store in production; an in-memory map is
/// provided for tests and embedded use. Entities are never deleted.
pub trait EntityStore {
    fn find_by_tax_id(&self, tax_id: &str) -> Result<Option<TaxEntity>, RetencionError>;
    fn upsert(&mut self, entity: &TaxEntity) -> Result<(), RetencionError>;
}

/// HashMap-backed [`EntityStore`].
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    entities: std::collections::HashMap<String, TaxEntity>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl EntityStore for InMemoryEntityStore {
    fn find_by_tax_id(&self, tax_id: &str) -> Result<Option<TaxEntity>, RetencionError> {
        Ok(self.entities.get(tax_id).cloned())
    }

    fn upsert(&mut self, entity: &TaxEntity) -> Result<(), RetencionError> {
        let Some(tax_id) = &entity.tax_id else {
            return Err(RetencionError::Store(
                "cannot persist an entity without a tax id".into(),
            ));
        };
        self.entities.insert(tax_id.clone(), entity.clone());
        Ok(())
    }
}

/// Result of resolving an entity for one calculation call.
#[derive(Debug, Clone)]
pub struct EntityResolution {
    pub entity: TaxEntity,
    pub status: VerificationStatus,
}

/// Name suffixes that mark a Colombian legal person.
const LEGAL_PERSON_KEYWORDS: &[&str] = &[
    "S.A.S", "SAS", "S.A", "LTDA", "E.U", "S. EN C", "S EN C", "SOCIEDAD", "COMPAÑIA", "COMPANIA",
];

fn name_suggests_legal_person(name: &str) -> bool {
    let upper = name.to_uppercase();
    LEGAL_PERSON_KEYWORDS.iter().any(|k| upper.contains(k))
}

/// Resolve or synthesize a [`TaxEntity`] for a tax id / display name pair.
///
/// # Logic
///
/// 1. A valid NIT already in the store wins — the stored classification and
///    its `verification_status` are returned as-is.
/// 2. A valid NIT not in the store is classified heuristically (NIT shape,
///    name keywords), persisted with `Automatic` status, and returned.
/// 3. A missing or malformed tax id yields an unpersisted placeholder with
///    `Pending` status and low confidence. No pseudo-NIT is fabricated;
///    `tax_id` stays `None` so the row routes to manual review.
///
/// Legal persons default to retention-agent and ICA-subject (the common
/// case for business counterparties); unknown naturals default to neither.
/// Both are DIAN designations the heuristic only approximates, hence the
/// sub-1.0 confidence.
pub fn validate_entity<S: EntityStore>(
    store: &mut S,
    tax_id: Option<&str>,
    display_name: &str,
) -> Result<EntityResolution, RetencionError> {
    let nit = tax_id
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .and_then(|t| validate_nit(t).ok());

    let Some(nit) = nit else {
        let entity = placeholder_entity(display_name);
        return Ok(EntityResolution {
            status: entity.verification_status,
            entity,
        });
    };

    if let Some(existing) = store.find_by_tax_id(&nit.number)? {
        return Ok(EntityResolution {
            status: existing.verification_status,
            entity: existing,
        });
    }

    let entity = classify_new(&nit.number, display_name);
    store.upsert(&entity)?;
    Ok(EntityResolution {
        status: VerificationStatus::Automatic,
        entity,
    })
}

fn classify_new(number: &str, display_name: &str) -> TaxEntity {
    let legal = looks_like_legal_person(number) || name_suggests_legal_person(display_name);

    if legal {
        TaxEntity {
            tax_id: Some(number.to_string()),
            name: display_name.to_string(),
            entity_type: EntityType::LegalPerson,
            regime_type: RegimeType::Common,
            is_retention_agent: true,
            is_ica_subject: true,
            is_declarant: true,
            municipalities: BTreeSet::new(),
            verification_status: VerificationStatus::Automatic,
            verification_confidence: 0.85,
        }
    } else {
        TaxEntity {
            tax_id: Some(number.to_string()),
            name: display_name.to_string(),
            entity_type: EntityType::NaturalPerson,
            regime_type: RegimeType::Simplified,
            is_retention_agent: false,
            is_ica_subject: false,
            is_declarant: false,
            municipalities: BTreeSet::new(),
            verification_status: VerificationStatus::Automatic,
            verification_confidence: 0.70,
        }
    }
}

fn placeholder_entity(display_name: &str) -> TaxEntity {
    let legal = name_suggests_legal_person(display_name);
    TaxEntity {
        tax_id: None,
        name: display_name.to_string(),
        entity_type: if legal {
            EntityType::LegalPerson
        } else {
            EntityType::NaturalPerson
        },
        regime_type: RegimeType::Simplified,
        is_retention_agent: false,
        is_ica_subject: false,
        is_declarant: false,
        municipalities: BTreeSet::new(),
        verification_status: VerificationStatus::Pending,
        verification_confidence: 0.30,
    }
}
