//! Pre-built Test Fixtures
//!
//! Provides ready-to-use test data for the dashboard crates.
//! These fixtures are designed to be consistent and predictable for unit tests.

use core_kernel::Timestamp;
use domain_policy::adapters::MockGateway;
use domain_policy::{AuthUser, Policy, PolicyTypeEntry, Profile, Table};

use crate::builders::{TestPolicyBuilder, TestProfileBuilder};

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// 5 Jan 2024, 10:00 UTC
    pub fn jan_5() -> Timestamp {
        Timestamp::parse("2024-01-05T10:00:00+00:00").unwrap()
    }

    /// 20 Jan 2024, 15:30 UTC
    pub fn jan_20() -> Timestamp {
        Timestamp::parse("2024-01-20T15:30:00+00:00").unwrap()
    }

    /// 1 Feb 2024, 09:00 UTC
    pub fn feb_1() -> Timestamp {
        Timestamp::parse("2024-02-01T09:00:00+00:00").unwrap()
    }

    /// Just before midnight on 31 Jan 2024 in UTC-05:00, which is already February in UTC
    pub fn jan_31_late_eastern() -> Timestamp {
        Timestamp::parse("2024-01-31T23:30:00-05:00").unwrap()
    }
}

/// Fixture for policy collections
pub struct PolicyFixtures;

impl PolicyFixtures {
    /// Two active, one pending, and one policy without status
    pub fn status_scenario() -> Vec<Policy> {
        vec![
            TestPolicyBuilder::new().with_status(Some("Active")).build(),
            TestPolicyBuilder::new().with_status(Some("Active")).build(),
            TestPolicyBuilder::new().with_status(Some("Pending")).build(),
            TestPolicyBuilder::new().with_status(None).build(),
        ]
    }

    /// Policies created on 5 Jan, 20 Jan and 1 Feb 2024
    pub fn month_scenario() -> Vec<Policy> {
        vec![
            TestPolicyBuilder::new().with_created_at(TemporalFixtures::jan_5()).build(),
            TestPolicyBuilder::new().with_created_at(TemporalFixtures::jan_20()).build(),
            TestPolicyBuilder::new().with_created_at(TemporalFixtures::feb_1()).build(),
        ]
    }

    /// A small mixed book across regions, agents, types and months
    pub fn book() -> Vec<Policy> {
        vec![
            TestPolicyBuilder::new()
                .with_id("pol-east-1")
                .with_region(Some("East"))
                .with_agent(Some("agent-1"))
                .with_policy_type(Some("Life"))
                .with_status(Some("Active"))
                .created_at("2024-01-05T10:00:00+00:00")
                .build(),
            TestPolicyBuilder::new()
                .with_id("pol-west-1")
                .with_region(Some("West"))
                .with_agent(Some("agent-2"))
                .with_policy_type(Some("Auto"))
                .with_status(Some("Pending"))
                .created_at("2024-01-20T15:30:00+00:00")
                .build(),
            TestPolicyBuilder::new()
                .with_id("pol-east-2")
                .with_region(Some("East"))
                .with_agent(Some("agent-2"))
                .with_policy_type(Some("Home"))
                .with_status(Some("Expired"))
                .created_at("2024-02-01T09:00:00+00:00")
                .build(),
            TestPolicyBuilder::new()
                .with_id("pol-north-1")
                .with_region(None)
                .with_agent(None)
                .with_policy_type(None)
                .with_status(Some("active"))
                .created_at("2024-03-15T12:00:00+00:00")
                .build(),
            TestPolicyBuilder::new()
                .with_id("pol-east-3")
                .with_region(Some("East"))
                .with_agent(Some("agent-1"))
                .with_policy_type(Some("Life"))
                .with_status(Some("Active"))
                .created_at("2024-03-31T23:00:00+00:00")
                .build(),
        ]
    }

    /// `book()` restricted the way an eq filter on region would restrict it
    pub fn book_in_region(region: &str) -> Vec<Policy> {
        Self::book()
            .into_iter()
            .filter(|p| p.region.as_deref() == Some(region))
            .collect()
    }
}

/// Fixture for profile and lookup rows
pub struct ProfileFixtures;

impl ProfileFixtures {
    pub fn agents() -> Vec<Profile> {
        vec![
            TestProfileBuilder::new("agent-1", "Avery Stone").with_region("East").build(),
            TestProfileBuilder::new("agent-2", "Jordan Lake").with_region("West").build(),
        ]
    }

    pub fn policy_types() -> Vec<PolicyTypeEntry> {
        ["Life", "Auto", "Home"]
            .into_iter()
            .map(|name| PolicyTypeEntry { name: name.to_string() })
            .collect()
    }
}

/// Fixture for session users
pub struct UserFixtures;

impl UserFixtures {
    pub fn agent() -> AuthUser {
        AuthUser::new("user-agent")
            .with_email("agent@example.com")
            .with_role("agent")
    }

    pub fn admin() -> AuthUser {
        AuthUser::new("user-admin")
            .with_email("admin@example.com")
            .with_role("admin")
    }
}

/// A mock gateway holding `PolicyFixtures::book()` plus agents and policy types
pub async fn seeded_gateway() -> MockGateway {
    seeded_gateway_with(&PolicyFixtures::book()).await
}

/// A mock gateway holding the given policies plus agents and policy types
pub async fn seeded_gateway_with(policies: &[Policy]) -> MockGateway {
    MockGateway::new()
        .with_rows(Table::Policies, policies)
        .await
        .with_rows(Table::Profiles, &ProfileFixtures::agents())
        .await
        .with_rows(Table::PolicyTypes, &ProfileFixtures::policy_types())
        .await
}
