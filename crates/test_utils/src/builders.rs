//! Test Data Builders
//!
//! Provides builder patterns for constructing test data with sensible defaults.
//! These builders allow tests to specify only the relevant fields while using
//! defaults for everything else.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::NaiveDate;
use core_kernel::{PolicyId, ProfileId, Timestamp};
use domain_policy::{Policy, Profile};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::fixtures::TemporalFixtures;

static NEXT_POLICY: AtomicU64 = AtomicU64::new(1);

/// Builder for constructing test policies
///
/// Each builder gets a fresh id and policy number. The defaults describe an
/// active life policy in the East region created on 5 Jan 2024.
pub struct TestPolicyBuilder {
    policy: Policy,
}

impl Default for TestPolicyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestPolicyBuilder {
    /// Creates a new builder with default values
    pub fn new() -> Self {
        let n = NEXT_POLICY.fetch_add(1, Ordering::Relaxed);
        let created_at = TemporalFixtures::jan_5();
        Self {
            policy: Policy {
                id: PolicyId::new(format!("pol-{:06}", n)),
                policy_number: format!("POL-{:06}", n),
                policy_type: Some("Life".to_string()),
                coverage_amount: Some(dec!(250000)),
                premium_amount: Some(dec!(1200.50)),
                start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
                end_date: NaiveDate::from_ymd_opt(2024, 12, 31),
                status: Some("Active".to_string()),
                region: Some("East".to_string()),
                policyholder_id: ProfileId::new("holder-1"),
                agent_id: Some(ProfileId::new("agent-1")),
                created_at,
                updated_at: created_at,
            },
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.policy.id = PolicyId::new(id);
        self
    }

    pub fn with_policy_number(mut self, number: impl Into<String>) -> Self {
        self.policy.policy_number = number.into();
        self
    }

    /// Sets the status; `None` models a missing value
    pub fn with_status(mut self, status: Option<&str>) -> Self {
        self.policy.status = status.map(str::to_string);
        self
    }

    pub fn with_policy_type(mut self, policy_type: Option<&str>) -> Self {
        self.policy.policy_type = policy_type.map(str::to_string);
        self
    }

    pub fn with_region(mut self, region: Option<&str>) -> Self {
        self.policy.region = region.map(str::to_string);
        self
    }

    pub fn with_agent(mut self, agent: Option<&str>) -> Self {
        self.policy.agent_id = agent.map(ProfileId::new);
        self
    }

    pub fn with_coverage(mut self, amount: Option<Decimal>) -> Self {
        self.policy.coverage_amount = amount;
        self
    }

    pub fn with_premium(mut self, amount: Option<Decimal>) -> Self {
        self.policy.premium_amount = amount;
        self
    }

    /// Sets the creation timestamp from any format `Timestamp::parse` accepts
    ///
    /// # Panics
    ///
    /// Panics if `created_at` does not parse
    pub fn created_at(mut self, created_at: &str) -> Self {
        let ts = Timestamp::parse(created_at).expect("test timestamp should parse");
        self.policy.created_at = ts;
        self.policy.updated_at = ts;
        self
    }

    pub fn with_created_at(mut self, created_at: Timestamp) -> Self {
        self.policy.created_at = created_at;
        self.policy.updated_at = created_at;
        self
    }

    /// Builds the policy
    pub fn build(self) -> Policy {
        self.policy
    }
}

/// Builder for profile rows
pub struct TestProfileBuilder {
    profile: Profile,
}

impl TestProfileBuilder {
    pub fn new(id: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            profile: Profile {
                id: ProfileId::new(id),
                full_name: full_name.into(),
                phone: None,
                address: None,
                region: None,
            },
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.profile.region = Some(region.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.profile.phone = Some(phone.into());
        self
    }

    pub fn build(self) -> Profile {
        self.profile
    }
}
