//! Aggregation engine
//!
//! Pure, synchronous summaries over already-fetched policies. Every function
//! is total: an empty slice yields zero counts and empty bucket lists.
//!
//! Type and status buckets keep the order in which their keys were first seen.
//! Month buckets are sorted chronologically.

use std::collections::BTreeMap;
use std::hash::Hash;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use core_kernel::MonthKey;

use crate::policy::{Policy, StatusCategory};

/// Status label used for policies without a status
pub const UNKNOWN_STATUS: &str = "Unknown";

/// Headline counts for the summary cards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryCounts {
    pub total: usize,
    pub active: usize,
    pub pending: usize,
    pub expired: usize,
}

impl SummaryCounts {
    /// Rows that fell into none of the three named buckets
    pub fn other(&self) -> usize {
        self.total - self.active - self.pending - self.expired
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeBucket {
    pub policy_type: Option<String>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusBucket {
    pub status: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthBucket {
    pub month: MonthKey,
    pub count: usize,
}

pub fn summary_counts(rows: &[Policy]) -> SummaryCounts {
    rows.iter().fold(
        SummaryCounts {
            total: rows.len(),
            ..Default::default()
        },
        |mut counts, policy| {
            match policy.status_category() {
                StatusCategory::Active => counts.active += 1,
                StatusCategory::Pending => counts.pending += 1,
                StatusCategory::Expired => counts.expired += 1,
                StatusCategory::Other => {}
            }
            counts
        },
    )
}

/// Counts per policy type. A missing type is its own bucket.
pub fn group_by_type(rows: &[Policy]) -> Vec<TypeBucket> {
    count_in_first_seen_order(rows, |policy| policy.policy_type.clone())
        .into_iter()
        .map(|(policy_type, count)| TypeBucket { policy_type, count })
        .collect()
}

/// Counts per status, with a missing status counted as `"Unknown"`
pub fn group_by_status(rows: &[Policy]) -> Vec<StatusBucket> {
    count_in_first_seen_order(rows, |policy| {
        policy
            .status
            .clone()
            .unwrap_or_else(|| UNKNOWN_STATUS.to_string())
    })
    .into_iter()
    .map(|(status, count)| StatusBucket { status, count })
    .collect()
}

/// Counts per creation month, oldest first, with no gap months
pub fn group_by_month(rows: &[Policy]) -> Vec<MonthBucket> {
    let mut months: BTreeMap<MonthKey, usize> = BTreeMap::new();
    for policy in rows {
        *months.entry(policy.created_at.month_key()).or_default() += 1;
    }
    months
        .into_iter()
        .map(|(month, count)| MonthBucket { month, count })
        .collect()
}

fn count_in_first_seen_order<K, F>(rows: &[Policy], key: F) -> IndexMap<K, usize>
where
    K: Hash + Eq,
    F: Fn(&Policy) -> K,
{
    let mut buckets = IndexMap::new();
    for policy in rows {
        *buckets.entry(key(policy)).or_insert(0) += 1;
    }
    buckets
}

/// Everything the presentation layer renders for one load
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardView {
    pub summary: SummaryCounts,
    pub by_type: Vec<TypeBucket>,
    pub by_status: Vec<StatusBucket>,
    pub by_month: Vec<MonthBucket>,
    pub policies: Vec<Policy>,
}

impl DashboardView {
    pub fn from_rows(rows: Vec<Policy>) -> Self {
        Self {
            summary: summary_counts(&rows),
            by_type: group_by_type(&rows),
            by_status: group_by_status(&rows),
            by_month: group_by_month(&rows),
            policies: rows,
        }
    }
}
