//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for aggregation output that give
//! more meaningful error messages than standard assertions.

use std::collections::BTreeSet;

use core_kernel::MonthKey;
use domain_policy::{DashboardError, MonthBucket, Policy, StatusBucket, SummaryCounts, TypeBucket};

/// Asserts that the three named summary buckets never exceed the total
pub fn assert_summary_within_total(summary: &SummaryCounts) {
    let named = summary.active + summary.pending + summary.expired;
    assert!(
        named <= summary.total,
        "Named buckets exceed total: active={}, pending={}, expired={}, total={}",
        summary.active,
        summary.pending,
        summary.expired,
        summary.total
    );
}

/// Asserts that type buckets account for every row exactly once
pub fn assert_type_buckets_cover(buckets: &[TypeBucket], rows: usize) {
    let sum: usize = buckets.iter().map(|b| b.count).sum();
    assert_eq!(sum, rows, "Type bucket counts sum to {}, expected {}", sum, rows);
}

/// Asserts that status buckets account for every row exactly once
pub fn assert_status_buckets_cover(buckets: &[StatusBucket], rows: usize) {
    let sum: usize = buckets.iter().map(|b| b.count).sum();
    assert_eq!(sum, rows, "Status bucket counts sum to {}, expected {}", sum, rows);
}

/// Asserts that month buckets are strictly ascending and match the months present in `rows`
pub fn assert_months_match(buckets: &[MonthBucket], rows: &[Policy]) {
    for pair in buckets.windows(2) {
        assert!(
            pair[0].month < pair[1].month,
            "Month buckets out of order: {} before {}",
            pair[0].month,
            pair[1].month
        );
    }

    let expected: BTreeSet<MonthKey> = rows.iter().map(|p| p.created_at.month_key()).collect();
    let actual: BTreeSet<MonthKey> = buckets.iter().map(|b| b.month).collect();
    assert_eq!(actual, expected, "Month buckets differ from months present in rows");
}

/// Asserts that a result is a gateway query failure
pub fn assert_query_failed<T: std::fmt::Debug>(result: Result<T, DashboardError>) {
    match result {
        Err(e) if e.is_query_failure() => {}
        other => panic!("Expected QueryFailed, got {:?}", other),
    }
}
