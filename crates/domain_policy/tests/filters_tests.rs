//! Filter State Controller Tests
//!
//! # Test Organization
//!
//! - `criteria` - Setting, clearing, rejecting, and publishing filters
//! - `options` - Loading the dropdown option lists

use std::sync::Arc;

use chrono::NaiveDate;
use core_kernel::ProfileId;
use domain_policy::adapters::MockGateway;
use domain_policy::*;
use test_utils::*;

// ============================================================================
// CRITERIA
// ============================================================================

mod criteria {
    use super::*;

    fn controller() -> FilterStateController {
        FilterStateController::new(Arc::new(MockGateway::new()))
    }

    #[test]
    fn test_fields_are_independent() {
        let filters = controller();

        filters.set_filter(FilterKey::Region, "East").unwrap();
        filters.set_filter(FilterKey::Agent, "agent-1").unwrap();
        filters.set_filter(FilterKey::PolicyType, "Life").unwrap();
        filters.set_filter(FilterKey::StartDate, "2024-01-01").unwrap();
        let criteria = filters.set_filter(FilterKey::EndDate, "2024-03-31").unwrap();

        assert_eq!(
            criteria,
            FilterCriteria {
                region: Some("East".to_string()),
                agent: Some(ProfileId::new("agent-1")),
                policy_type: Some("Life".to_string()),
                start_date: NaiveDate::from_ymd_opt(2024, 1, 1),
                end_date: NaiveDate::from_ymd_opt(2024, 3, 31),
            }
        );
        assert_eq!(filters.criteria(), criteria);
    }

    #[test]
    fn test_empty_value_clears_only_that_field() {
        let filters = controller();
        filters.set_filter(FilterKey::Region, "East").unwrap();
        filters.set_filter(FilterKey::PolicyType, "Auto").unwrap();

        let criteria = filters.set_filter(FilterKey::Region, "").unwrap();

        assert_eq!(criteria.region, None);
        assert_eq!(criteria.policy_type.as_deref(), Some("Auto"));
    }

    #[test]
    fn test_text_values_are_kept_as_given() {
        let filters = controller();

        let criteria = filters.set_filter(FilterKey::Region, " East ").unwrap();
        assert_eq!(criteria.region.as_deref(), Some(" East "));

        let criteria = filters.set_filter(FilterKey::Region, "   ").unwrap();
        assert_eq!(criteria.region.as_deref(), Some("   "));
        let query = PolicyQueryService::matching_query(&criteria);
        assert_eq!(query.predicates.len(), 1);
        assert_eq!(query.predicates[0].value, ScalarValue::from("   "));
    }

    #[test]
    fn test_whitespace_date_is_rejected() {
        let filters = controller();

        assert_eq!(
            filters.set_filter(FilterKey::EndDate, " 2024-03-31 ").unwrap().end_date,
            NaiveDate::from_ymd_opt(2024, 3, 31)
        );
        assert!(matches!(
            filters.set_filter(FilterKey::EndDate, "  "),
            Err(DashboardError::InvalidFilter { .. })
        ));
    }

    #[test]
    fn test_invalid_date_leaves_criteria_unchanged() {
        let filters = controller();
        filters.set_filter(FilterKey::StartDate, "2024-01-01").unwrap();

        let result = filters.set_filter(FilterKey::StartDate, "2024-13-45");

        assert!(matches!(result, Err(DashboardError::InvalidFilter { .. })));
        assert_eq!(filters.criteria().start_date, NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn test_reset_clears_everything() {
        let filters = controller();
        filters.set_filter(FilterKey::Region, "East").unwrap();
        filters.set_filter(FilterKey::EndDate, "2024-12-31").unwrap();

        assert!(filters.reset().is_empty());
        assert!(filters.criteria().is_empty());
    }

    #[tokio::test]
    async fn test_subscribers_see_each_change() {
        let filters = controller();
        let mut rx = filters.subscribe();

        filters.set_filter(FilterKey::Region, "West").unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().region.as_deref(), Some("West"));

        filters.set_filter(FilterKey::Region, "").unwrap();
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().region, None);
    }

    #[tokio::test]
    async fn test_rejected_change_is_not_published() {
        let filters = controller();
        let rx = filters.subscribe();

        let _ = filters.set_filter(FilterKey::EndDate, "yesterday");

        assert!(!rx.has_changed().unwrap());
    }
}

// ============================================================================
// OPTIONS
// ============================================================================

mod options {
    use super::*;

    #[tokio::test]
    async fn test_load_options_collects_three_lists() {
        let gateway = Arc::new(seeded_gateway().await);
        let filters = FilterStateController::new(gateway.clone());

        let options = filters.load_options().await;

        // Null region skipped, duplicates removed, first-seen order kept
        assert_eq!(options.regions, vec!["East".to_string(), "West".to_string()]);
        assert_eq!(options.agents.len(), 2);
        assert_eq!(options.agents[0].full_name, "Avery Stone");
        assert_eq!(options.policy_types, vec!["Life", "Auto", "Home"]);
        assert_eq!(filters.options(), options);

        let executed = gateway.executed_queries().await;
        assert_eq!(executed.len(), 3);
        assert!(executed.iter().all(|q| q.limit == Some(OPTIONS_SAMPLE_LIMIT)));
    }

    #[tokio::test]
    async fn test_failed_list_stays_empty() {
        let gateway = seeded_gateway().await;
        gateway.fail_table(Table::Profiles, "profiles unavailable").await;
        let filters = FilterStateController::new(Arc::new(gateway));

        let options = filters.load_options().await;

        assert!(options.agents.is_empty());
        assert_eq!(options.regions.len(), 2);
        assert_eq!(options.policy_types.len(), 3);
    }

    #[tokio::test]
    async fn test_region_sample_is_limited() {
        let policies: Vec<Policy> = (0..150)
            .map(|i| {
                let region = format!("R{:03}", i);
                TestPolicyBuilder::new().with_region(Some(region.as_str())).build()
            })
            .collect();
        let gateway = Arc::new(seeded_gateway_with(&policies).await);
        let filters = FilterStateController::new(gateway);

        let options = filters.load_options().await;

        assert_eq!(options.regions.len(), 100);
    }
}
