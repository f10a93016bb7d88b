//! Remote identifier normalization.
//!
//! The record store addresses databases, pages and blocks by UUID. Users and
//! the LLM hand identifiers over in several shapes (hyphen-less hex copied out
//! of a URL, canonical dashed, braced); every write uses the canonical dashed
//! form.

use crate::error::{NotiError, Result};
use uuid::Uuid;

/// Normalizes `raw` into the canonical lowercase dashed UUID form.
///
/// Returns [`NotiError::InvalidIdentifier`] for anything that is not a UUID.
pub fn normalize_identifier(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    Uuid::try_parse(trimmed)
        .map(|id| id.hyphenated().to_string())
        .map_err(|_| NotiError::invalid_identifier(trimmed))
}

/// Returns `true` if `raw` normalizes successfully.
pub fn is_valid_identifier(raw: &str) -> bool {
    normalize_identifier(raw).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hyphenless_is_dashed() {
        assert_eq!(
            normalize_identifier("1ff1ac9c8c708098bf4ac641178c9b8d").unwrap(),
            "1ff1ac9c-8c70-8098-bf4a-c641178c9b8d"
        );
    }

    #[test]
    fn test_canonical_form_is_unchanged() {
        let id = "12345678-1234-5678-1234-567812345678";
        assert_eq!(normalize_identifier(id).unwrap(), id);
    }

    #[test]
    fn test_uppercase_and_whitespace() {
        assert_eq!(
            normalize_identifier("  1FF1AC9C8C708098BF4AC641178C9B8D\n").unwrap(),
            "1ff1ac9c-8c70-8098-bf4a-c641178c9b8d"
        );
    }

    #[test]
    fn test_malformed_is_rejected() {
        let err = normalize_identifier("not-a-uuid").unwrap_err();
        assert!(err.is_invalid_identifier());
        assert!(!is_valid_identifier("bad-id"));
        assert!(!is_valid_identifier(""));
    }
}
