pub mod ask;
pub mod chat;
pub mod check;
pub mod digest;
pub mod schemas;

use anyhow::{Context, Result};
use chrono::NaiveDate;

pub const DEFAULT_SESSION: &str = "cli";

/// Parses a `YYYY-MM-DD` command-line date.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2024-05-01").unwrap(),
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
        );
        assert!(parse_date("05/01/2024").is_err());
    }
}
