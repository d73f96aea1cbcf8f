//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating policies whose statuses, types,
//! and creation timestamps exercise the aggregation edge cases.

use chrono::{FixedOffset, NaiveDate, TimeZone};
use core_kernel::Timestamp;
use domain_policy::Policy;
use proptest::prelude::*;

use crate::builders::TestPolicyBuilder;

/// Strategy for status values, including near-misses and missing statuses
pub fn status_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(Some("Active".to_string())),
        Just(Some("Pending".to_string())),
        Just(Some("Expired".to_string())),
        Just(Some("active".to_string())),
        Just(Some("Cancelled".to_string())),
        Just(Some(String::new())),
        Just(None),
    ]
}

/// Strategy for policy types, including missing types
pub fn policy_type_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(Some("Life".to_string())),
        Just(Some("Auto".to_string())),
        Just(Some("Home".to_string())),
        Just(Some("Health".to_string())),
        Just(None),
    ]
}

/// Strategy for region values, including missing regions
pub fn region_strategy() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(Some("East".to_string())),
        Just(Some("West".to_string())),
        Just(Some("North".to_string())),
        Just(None),
    ]
}

/// Strategy for timestamps between 2020 and 2026 in offsets from -12:00 to +14:00
pub fn timestamp_strategy() -> impl Strategy<Value = Timestamp> {
    (2020i32..2027, 1u32..=12, 1u32..=28, 0u32..24, 0u32..60, -12i32..=14).prop_map(
        |(year, month, day, hour, minute, offset_hours)| {
            let offset = FixedOffset::east_opt(offset_hours * 3600).unwrap();
            let naive = NaiveDate::from_ymd_opt(year, month, day)
                .unwrap()
                .and_hms_opt(hour, minute, 0)
                .unwrap();
            Timestamp::new(offset.from_local_datetime(&naive).unwrap())
        },
    )
}

/// Strategy for a single policy
pub fn policy_strategy() -> impl Strategy<Value = Policy> {
    (
        status_strategy(),
        policy_type_strategy(),
        region_strategy(),
        timestamp_strategy(),
    )
        .prop_map(|(status, policy_type, region, created_at)| {
            TestPolicyBuilder::new()
                .with_status(status.as_deref())
                .with_policy_type(policy_type.as_deref())
                .with_region(region.as_deref())
                .with_created_at(created_at)
                .build()
        })
}

/// Strategy for policy collections of up to `max_len` rows
pub fn policies_strategy(max_len: usize) -> impl Strategy<Value = Vec<Policy>> {
    prop::collection::vec(policy_strategy(), 0..=max_len)
}

/// Strategy for non-empty policy collections
pub fn non_empty_policies_strategy(max_len: usize) -> impl Strategy<Value = Vec<Policy>> {
    prop::collection::vec(policy_strategy(), 1..=max_len.max(1))
}
