//! Records read from the data platform
//!
//! The dashboard never creates or mutates these. They are decoded from gateway
//! rows, which is the point where a malformed row is rejected.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{PolicyId, ProfileId, Timestamp};

/// One insurance contract as stored in the `policies` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Policy {
    pub id: PolicyId,
    /// Display key; not unique at the type level
    pub policy_number: String,
    /// Free-text category. Kept nullable: a missing type is its own chart bucket
    pub policy_type: Option<String>,
    pub coverage_amount: Option<Decimal>,
    pub premium_amount: Option<Decimal>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub status: Option<String>,
    pub region: Option<String>,
    pub policyholder_id: ProfileId,
    pub agent_id: Option<ProfileId>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Policy {
    /// Summary bucket for this policy's status
    pub fn status_category(&self) -> StatusCategory {
        StatusCategory::classify(self.status.as_deref())
    }
}

/// The four summary buckets every policy falls into exactly once
///
/// Classification is exact and case-sensitive: `"active"` is `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCategory {
    Active,
    Pending,
    Expired,
    Other,
}

impl StatusCategory {
    pub const ACTIVE: &'static str = "Active";
    pub const PENDING: &'static str = "Pending";
    pub const EXPIRED: &'static str = "Expired";

    pub fn classify(status: Option<&str>) -> Self {
        match status {
            Some(Self::ACTIVE) => StatusCategory::Active,
            Some(Self::PENDING) => StatusCategory::Pending,
            Some(Self::EXPIRED) => StatusCategory::Expired,
            _ => StatusCategory::Other,
        }
    }
}

/// A person record from the `profiles` table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
}

/// Agent dropdown entry: a profile id with its display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentOption {
    pub id: ProfileId,
    pub full_name: String,
}

impl From<Profile> for AgentOption {
    fn from(profile: Profile) -> Self {
        Self {
            id: profile.id,
            full_name: profile.full_name,
        }
    }
}

/// Row of the `policy_types` lookup table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyTypeEntry {
    pub name: String,
}

/// Single-column projection used when sampling region values
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct RegionSample {
    #[serde(default)]
    pub region: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_is_case_sensitive() {
        assert_eq!(StatusCategory::classify(Some("Active")), StatusCategory::Active);
        assert_eq!(StatusCategory::classify(Some("active")), StatusCategory::Other);
        assert_eq!(StatusCategory::classify(Some("Expired ")), StatusCategory::Other);
        assert_eq!(StatusCategory::classify(None), StatusCategory::Other);
    }

    #[test]
    fn test_policy_decodes_platform_row() {
        let row = serde_json::json!({
            "id": "p-1",
            "policy_number": "POL-0001",
            "policy_type": "Life",
            "coverage_amount": 250000,
            "premium_amount": "1200.50",
            "start_date": "2024-01-01",
            "end_date": null,
            "status": "Active",
            "region": "East",
            "policyholder_id": "h-1",
            "agent_id": null,
            "created_at": "2024-01-05T10:00:00+00:00",
            "updated_at": "2024-01-05T10:00:00+00:00"
        });

        let policy: Policy = serde_json::from_value(row).unwrap();
        assert_eq!(policy.status_category(), StatusCategory::Active);
        assert_eq!(policy.coverage_amount, Some(Decimal::from(250000)));
        assert!(policy.agent_id.is_none());
    }

    #[test]
    fn test_policy_with_bad_timestamp_is_rejected() {
        let row = serde_json::json!({
            "id": "p-1",
            "policy_number": "POL-0001",
            "policy_type": "Life",
            "coverage_amount": null,
            "premium_amount": null,
            "start_date": null,
            "end_date": null,
            "status": null,
            "region": null,
            "policyholder_id": "h-1",
            "agent_id": null,
            "created_at": "last tuesday",
            "updated_at": "2024-01-05T10:00:00+00:00"
        });

        assert!(serde_json::from_value::<Policy>(row).is_err());
    }
}
