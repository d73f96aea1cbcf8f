//! Dashboard DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use domain_policy::{
    DashboardSnapshot, FilterCriteria, MonthBucket, Policy, StatusBucket, SummaryCounts, TypeBucket,
};

/// Body of `PUT /dashboard/filters`
///
/// An empty `value` clears the filter.
#[derive(Debug, Deserialize, Validate)]
pub struct FilterUpdateRequest {
    #[validate(length(min = 1))]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

/// One published dashboard view
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub generation: u64,
    pub filters: FilterCriteria,
    pub summary: SummaryCounts,
    pub by_type: Vec<TypeBucket>,
    pub by_status: Vec<StatusBucket>,
    pub by_month: Vec<MonthBucket>,
    pub policies: Vec<Policy>,
}

impl From<&DashboardSnapshot> for DashboardResponse {
    fn from(snapshot: &DashboardSnapshot) -> Self {
        let view = &snapshot.view;
        Self {
            generation: snapshot.generation,
            filters: snapshot.criteria.clone(),
            summary: view.summary,
            by_type: view.by_type.clone(),
            by_status: view.by_status.clone(),
            by_month: view.by_month.clone(),
            policies: view.policies.clone(),
        }
    }
}
