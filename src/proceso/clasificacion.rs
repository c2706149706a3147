//! Service classification from the invoice's PUC account code, with a
//! supplier-name keyword fallback.

use crate::core::ServiceType;

/// Derive the service classification for the retefuente concept lookup.
///
/// # Logic
///
/// 1. PUC account prefix when the invoice is coded: 51 → services,
///    61 → purchases, 52 → rent.
/// 2. Otherwise keyword matching on the supplier name (consultoría,
///    transporte, construcción).
/// 3. Otherwise general services — the safe default, since its concept
///    carries the lowest UVT threshold.
pub fn classify_service(puc_code: Option<&str>, supplier_name: &str) -> ServiceType {
    if let Some(puc) = puc_code {
        let puc = puc.trim();
        if puc.starts_with("51") {
            return ServiceType::Services;
        }
        if puc.starts_with("61") {
            return ServiceType::Purchases;
        }
        if puc.starts_with("52") {
            return ServiceType::Rent;
        }
    }

    let name = supplier_name.to_lowercase();
    if name.contains("consultor") || name.contains("asesor") {
        return ServiceType::Consulting;
    }
    if name.contains("transporte") || name.contains("logística") || name.contains("logistica") {
        return ServiceType::Transport;
    }
    if name.contains("construcc") || name.contains("constructora") {
        return ServiceType::Construction;
    }

    ServiceType::Services
}
