//! NIT format validation and DIAN verification digit (dígito de verificación).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error returned when a NIT fails format validation.
#[derive(Debug, Clone)]
pub struct NitFormatError {
    /// The invalid input value.
    pub value: String,
    /// Why the value failed validation.
    pub reason: String,
}

impl fmt::Display for NitFormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid NIT '{}': {}", self.value, self.reason)
    }
}

impl std::error::Error for NitFormatError {}

/// A validated Colombian tax identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nit {
    /// Digits without separators or verification digit.
    pub number: String,
    /// Verification digit, when the input carried one.
    pub dv: Option<u8>,
}

impl Nit {
    /// Canonical display form: `number-dv` when the DV is known.
    pub fn formatted(&self) -> String {
        match self.dv {
            Some(dv) => format!("{}-{}", self.number, dv),
            None => self.number.clone(),
        }
    }
}

/// DIAN weight sequence for the verification digit, applied right-to-left.
const DV_WEIGHTS: [u32; 15] = [3, 7, 13, 17, 19, 23, 29, 37, 41, 43, 47, 53, 59, 67, 71];

/// Compute the DIAN verification digit for a digit string.
///
/// Weighted sum mod 11; remainders 0 and 1 map to themselves, anything
/// else to `11 − r`.
pub fn compute_dv(number: &str) -> u8 {
    let sum: u32 = number
        .bytes()
        .rev()
        .zip(DV_WEIGHTS.iter())
        .map(|(b, w)| u32::from(b - b'0') * w)
        .sum();
    let r = sum % 11;
    if r <= 1 { r as u8 } else { (11 - r) as u8 }
}

/// Validate a NIT or cédula by format (no network call).
///
/// Accepts common display forms: with or without dots, with an optional
/// `-dv` suffix (e.g. "900.123.456-8", "900123456-8", "79123456"). When a
/// verification digit is present it is checked against the DIAN mod-11
/// algorithm.
pub fn validate_nit(input: &str) -> Result<Nit, NitFormatError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(NitFormatError {
            value: input.into(),
            reason: "empty".into(),
        });
    }

    // Split off an explicit verification digit
    let (body, dv_part) = match trimmed.rsplit_once('-') {
        Some((b, d)) => (b, Some(d)),
        None => (trimmed, None),
    };

    let number: String = body.chars().filter(|c| c.is_ascii_digit()).collect();
    if number.is_empty() {
        return Err(NitFormatError {
            value: input.into(),
            reason: "no digits found".into(),
        });
    }
    if number.len() > 15 {
        return Err(NitFormatError {
            value: input.into(),
            reason: format!("too long — {} digits, maximum 15", number.len()),
        });
    }
    // Reject bodies carrying stray non-separator characters
    if body.chars().any(|c| !c.is_ascii_digit() && c != '.' && c != ' ') {
        return Err(NitFormatError {
            value: input.into(),
            reason: "contains non-numeric characters".into(),
        });
    }

    let dv = match dv_part {
        Some(d) => {
            let d = d.trim();
            let parsed: u8 = d.parse().map_err(|_| NitFormatError {
                value: input.into(),
                reason: format!("verification digit '{d}' is not a digit"),
            })?;
            if parsed > 9 {
                return Err(NitFormatError {
                    value: input.into(),
                    reason: format!("verification digit {parsed} out of range"),
                });
            }
            let expected = compute_dv(&number);
            if parsed != expected {
                return Err(NitFormatError {
                    value: input.into(),
                    reason: format!("verification digit {parsed} does not match expected {expected}"),
                });
            }
            Some(parsed)
        }
        None => None,
    };

    Ok(Nit { number, dv })
}

/// Whether a cleaned digit string has the shape of a legal-person NIT.
///
/// Company NITs are 9 digits in the 800–999 million range; cédulas of
/// natural persons are shorter or start lower. Heuristic only — the DIAN
/// designation is authoritative.
pub fn looks_like_legal_person(number: &str) -> bool {
    number.len() == 9 && matches!(number.as_bytes()[0], b'8' | b'9')
}
