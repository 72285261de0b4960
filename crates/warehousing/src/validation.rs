//! Input normalisation shared by the ledger operations.
//!
//! Text fields are trimmed and length-capped; numeric fields must be finite and
//! respect a lower bound.

use bonded_core::{DomainError, DomainResult};

/// Trimmed, non-empty text of at most `max_len` characters.
pub fn require_text(value: &str, field: &str, max_len: usize) -> DomainResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} is required")));
    }
    if trimmed.chars().count() > max_len {
        return Err(DomainError::validation(format!(
            "{field} exceeds {max_len} chars"
        )));
    }
    Ok(trimmed.to_string())
}

/// Trimmed text that may be empty, capped at `max_len` characters.
pub fn optional_text(value: Option<&str>, field: &str, max_len: usize) -> DomainResult<String> {
    let trimmed = value.unwrap_or_default().trim();
    if trimmed.chars().count() > max_len {
        return Err(DomainError::validation(format!(
            "{field} exceeds {max_len} chars"
        )));
    }
    Ok(trimmed.to_string())
}

/// Finite number `>= min`.
pub fn require_amount(value: f64, field: &str, min: f64) -> DomainResult<f64> {
    if !value.is_finite() {
        return Err(DomainError::validation(format!(
            "{field} must be a valid number"
        )));
    }
    if value < min {
        return Err(DomainError::validation(format!("{field} must be >= {min}")));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_is_trimmed_and_capped() {
        assert_eq!(require_text("  WH-1 ", "Code", 30).unwrap(), "WH-1");
        assert!(matches!(
            require_text("   ", "Code", 30),
            Err(DomainError::Validation(msg)) if msg == "Code is required"
        ));
        assert!(require_text(&"x".repeat(31), "Code", 30).is_err());
    }

    #[test]
    fn optional_text_allows_missing() {
        assert_eq!(optional_text(None, "Notes", 300).unwrap(), "");
        assert!(optional_text(Some(&"n".repeat(301)), "Notes", 300).is_err());
    }

    #[test]
    fn amounts_reject_nan_and_negatives() {
        assert!(require_amount(f64::NAN, "Qty", 0.0).is_err());
        assert!(require_amount(f64::INFINITY, "Qty", 0.0).is_err());
        assert!(require_amount(-1.0, "Qty", 0.0).is_err());
        assert_eq!(require_amount(0.0, "Value", 0.0).unwrap(), 0.0);
    }
}
