//! Unit tests for the Temporal module
//!
//! Tests cover Timestamp parsing across the forms the data platform emits,
//! month-key derivation, and MonthKey ordering.

use chrono::{NaiveDate, TimeZone, Utc};
use core_kernel::{MonthKey, Timestamp, TemporalError};
use proptest::prelude::*;

mod timestamp_parsing {
    use super::*;

    #[test]
    fn test_rfc3339_with_z() {
        let ts = Timestamp::parse("2024-02-01T08:15:00Z").unwrap();
        assert_eq!(ts.to_utc(), Utc.with_ymd_and_hms(2024, 2, 1, 8, 15, 0).unwrap());
    }

    #[test]
    fn test_rfc3339_with_fraction_and_offset() {
        let ts = Timestamp::parse("2024-02-01T08:15:00.123456+02:00").unwrap();
        assert_eq!(ts.as_datetime().offset().local_minus_utc(), 2 * 3600);
    }

    #[test]
    fn test_postgres_text_form() {
        let ts = Timestamp::parse("2024-03-10 12:00:00+00").unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2024, 3, 10).unwrap());
    }

    #[test]
    fn test_naive_datetime_is_offset_zero() {
        let ts = Timestamp::parse("2024-03-10T23:59:59").unwrap();
        assert_eq!(ts.as_datetime().offset().local_minus_utc(), 0);
        assert_eq!(ts.month_key().to_string(), "2024-03");
    }

    #[test]
    fn test_bare_date() {
        let ts = Timestamp::parse("2024-01-20").unwrap();
        assert_eq!(ts.date(), NaiveDate::from_ymd_opt(2024, 1, 20).unwrap());
    }

    #[test]
    fn test_surrounding_whitespace_ignored() {
        assert!(Timestamp::parse("  2024-01-20 ").is_ok());
    }

    #[test]
    fn test_invalid_inputs() {
        for input in ["", "2024-13-01", "01/02/2024", "not a date"] {
            assert!(
                matches!(Timestamp::parse(input), Err(TemporalError::InvalidTimestamp(_))),
                "{input} should be rejected"
            );
        }
    }
}

mod timestamp_serde {
    use super::*;

    #[test]
    fn test_deserialize_from_platform_string() {
        let ts: Timestamp = serde_json::from_str("\"2024-01-05T10:00:00+00:00\"").unwrap();
        assert_eq!(ts.month_key().to_string(), "2024-01");
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        let result: Result<Timestamp, _> = serde_json::from_str("\"soon\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_serialize_keeps_offset() {
        let ts = Timestamp::parse("2024-01-05T10:00:00-05:00").unwrap();
        assert_eq!(serde_json::to_string(&ts).unwrap(), "\"2024-01-05T10:00:00-05:00\"");
    }
}

mod month_key {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let key = MonthKey::parse("2023-11").unwrap();
        assert_eq!(key.year(), 2023);
        assert_eq!(key.month(), 11);
        assert_eq!(key.to_string(), "2023-11");
    }

    #[test]
    fn test_parse_rejects_unpadded_month() {
        assert!(MonthKey::parse("2023-1").is_err());
    }

    #[test]
    fn test_parse_rejects_month_out_of_range() {
        assert!(MonthKey::parse("2023-00").is_err());
        assert!(MonthKey::parse("2023-13").is_err());
    }

    #[test]
    fn test_ordering_crosses_year_boundary() {
        let dec = MonthKey::parse("2023-12").unwrap();
        let jan = MonthKey::parse("2024-01").unwrap();
        assert!(dec < jan);
    }

    #[test]
    fn test_serializes_as_string() {
        let key = MonthKey::new(2024, 2).unwrap();
        assert_eq!(serde_json::to_string(&key).unwrap(), "\"2024-02\"");
    }
}

proptest! {
    /// Chronological order and string order agree for four-digit years
    #[test]
    fn prop_month_key_order_matches_string_order(
        y1 in 1000i32..9999, m1 in 1u32..=12,
        y2 in 1000i32..9999, m2 in 1u32..=12,
    ) {
        let a = MonthKey::new(y1, m1).unwrap();
        let b = MonthKey::new(y2, m2).unwrap();
        prop_assert_eq!(a.cmp(&b), a.to_string().cmp(&b.to_string()));
    }

    #[test]
    fn prop_month_key_matches_date(y in 1970i32..2100, m in 1u32..=12, d in 1u32..=28) {
        let date = NaiveDate::from_ymd_opt(y, m, d).unwrap();
        let ts = Timestamp::start_of(date).unwrap();
        prop_assert_eq!(ts.month_key().to_string(), format!("{:04}-{:02}", y, m));
    }
}
