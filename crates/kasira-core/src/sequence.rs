//! # Document Number Sequence
//!
//! Formatting and counter recovery for day-scoped document numbers.
//!
//! ## Format
//! ```text
//! {PREFIX}-{YYMMDD}-{NNNN}
//!
//! INV-260807-0001     first invoice of Aug 7 2026
//! SE-260807-0137      137th stock entry of the same day
//! ```
//!
//! The counter restarts at 1 on each new calendar day (local time). The next
//! counter is recovered from the highest-numbered record dated today; the
//! database side of that query lives in `kasira-db`, this module is the pure
//! half.
//!
//! ## Concurrency
//! Two concurrent creations can read the same "latest" number and format a
//! duplicate. The UNIQUE constraint on the number column is the backstop;
//! the collision surfaces as a persistence error and is never retried here.

use chrono::NaiveDate;

use crate::error::{CoreError, CoreResult};

/// Width of the zero-padded counter suffix.
const COUNTER_WIDTH: usize = 4;

/// Formats a document number for the given prefix, day, and counter.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use kasira_core::sequence::format_document_number;
///
/// let day = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
/// assert_eq!(format_document_number("INV", day, 12), "INV-260807-0012");
/// ```
pub fn format_document_number(prefix: &str, date: NaiveDate, counter: u32) -> String {
    format!(
        "{}-{}-{:0width$}",
        prefix,
        date.format("%y%m%d"),
        counter,
        width = COUNTER_WIDTH
    )
}

/// Recovers the counter from an existing document number.
///
/// The counter is the numeric suffix after the last `-`. A non-numeric
/// suffix fails with [`CoreError::MalformedDocumentNumber`]; defaulting to 1
/// would collide with the unique index on the number column anyway.
pub fn parse_counter(number: &str) -> CoreResult<u32> {
    let suffix = number
        .rsplit('-')
        .next()
        .ok_or_else(|| CoreError::MalformedDocumentNumber(number.to_string()))?;

    suffix
        .parse::<u32>()
        .map_err(|_| CoreError::MalformedDocumentNumber(number.to_string()))
}

/// Returns the next counter given today's highest document number, if any.
///
/// `None` means no record exists today and the counter starts at 1.
pub fn next_counter(latest: Option<&str>) -> CoreResult<u32> {
    match latest {
        Some(number) => Ok(parse_counter(number)? + 1),
        None => Ok(1),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 7).unwrap()
    }

    #[test]
    fn test_format_document_number() {
        assert_eq!(format_document_number("INV", day(), 1), "INV-260807-0001");
        assert_eq!(format_document_number("SE", day(), 137), "SE-260807-0137");
        // Counter wider than the pad is kept whole, not truncated.
        assert_eq!(format_document_number("INV", day(), 12345), "INV-260807-12345");
    }

    #[test]
    fn test_parse_counter() {
        assert_eq!(parse_counter("INV-260807-0012").unwrap(), 12);
        assert_eq!(parse_counter("SE-260807-0001").unwrap(), 1);
    }

    #[test]
    fn test_parse_counter_malformed() {
        let err = parse_counter("INV-260807-00AB").unwrap_err();
        assert!(matches!(err, CoreError::MalformedDocumentNumber(_)));

        assert!(parse_counter("no separators").is_err());
        assert!(parse_counter("INV-260807-").is_err());
    }

    #[test]
    fn test_next_counter() {
        assert_eq!(next_counter(None).unwrap(), 1);
        assert_eq!(next_counter(Some("INV-260807-0041")).unwrap(), 42);
        assert!(next_counter(Some("INV-260807-bogus")).is_err());
    }

    #[test]
    fn test_round_trip() {
        let number = format_document_number("INV", day(), 99);
        assert_eq!(next_counter(Some(&number)).unwrap(), 100);
    }
}
