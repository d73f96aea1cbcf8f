//! Policy Query Service Tests
//!
//! Exercises `PolicyQueryService` against the in-memory gateway.
//!
//! # Test Organization
//!
//! - `pagination` - Row windows, totals, sorting
//! - `filtering` - Equality filters and the dashboard criteria query
//! - `lookup` - Single policy fetch
//! - `failures` - Gateway errors and malformed rows

use std::sync::Arc;

use chrono::NaiveDate;
use core_kernel::{PolicyId, ProfileId};
use domain_policy::adapters::MockGateway;
use domain_policy::*;
use test_utils::*;

fn service(gateway: MockGateway) -> (PolicyQueryService, Arc<MockGateway>) {
    let gateway = Arc::new(gateway);
    (PolicyQueryService::new(gateway.clone()), gateway)
}

async fn numbered_book(count: usize) -> MockGateway {
    let policies: Vec<Policy> = (0..count)
        .map(|i| {
            TestPolicyBuilder::new()
                .with_policy_number(format!("N-{:03}", i))
                .with_region(Some(if i % 2 == 0 { "East" } else { "West" }))
                .created_at(&format!("2024-01-{:02}T08:00:00+00:00", (i % 28) + 1))
                .build()
        })
        .collect();
    MockGateway::new().with_rows(Table::Policies, &policies).await
}

// ============================================================================
// PAGINATION
// ============================================================================

mod pagination {
    use super::*;

    #[tokio::test]
    async fn test_second_page_requests_rows_10_to_19() {
        let (service, gateway) = service(numbered_book(25).await);

        let page = service.fetch_page(PageRequest::new(2, 10)).await.unwrap();

        assert_eq!(page.rows.len(), 10);
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages(), 3);

        let executed = gateway.executed_queries().await;
        assert_eq!(executed.len(), 1);
        assert_eq!(executed[0].range_bounds(), Some((10, 19)));
        assert!(executed[0].count_exact);
        assert_eq!(executed[0].selection, Selection::All);
    }

    #[tokio::test]
    async fn test_total_ignores_page_size() {
        let (service, _) = service(numbered_book(7).await);

        let page = service.fetch_page(PageRequest::new(1, 3)).await.unwrap();

        assert_eq!(page.rows.len(), 3);
        assert_eq!(page.total, 7);
    }

    #[tokio::test]
    async fn test_default_sort_is_newest_first() {
        let (service, gateway) = service(numbered_book(5).await);

        let page = service.fetch_page(PageRequest::default()).await.unwrap();

        let created: Vec<_> = page.rows.iter().map(|p| p.created_at).collect();
        let mut sorted = created.clone();
        sorted.sort_by(|a, b| b.cmp(a));
        assert_eq!(created, sorted);

        let executed = gateway.executed_queries().await;
        assert_eq!(executed[0].ordering[0].column, "created_at");
        assert_eq!(executed[0].ordering[0].order, SortOrder::Descending);
    }

    #[tokio::test]
    async fn test_custom_sort() {
        let (service, _) = service(numbered_book(4).await);

        let page = service
            .fetch_page(PageRequest::default().sorted_by(PolicyField::PolicyNumber, SortOrder::Ascending))
            .await
            .unwrap();

        let numbers: Vec<&str> = page.rows.iter().map(|p| p.policy_number.as_str()).collect();
        assert_eq!(numbers, vec!["N-000", "N-001", "N-002", "N-003"]);
    }

    #[tokio::test]
    async fn test_page_past_end_is_empty_with_total() {
        let (service, _) = service(numbered_book(5).await);

        let page = service.fetch_page(PageRequest::new(4, 10)).await.unwrap();

        assert!(page.is_empty());
        assert_eq!(page.total, 5);
    }

    #[tokio::test]
    async fn test_zero_page_size_never_reaches_gateway() {
        let (service, gateway) = service(numbered_book(5).await);

        let result = service.fetch_page(PageRequest::new(1, 0)).await;

        assert!(matches!(result, Err(DashboardError::InvalidPageRequest(_))));
        assert!(gateway.executed_queries().await.is_empty());
    }
}

// ============================================================================
// FILTERING
// ============================================================================

mod filtering {
    use super::*;

    #[tokio::test]
    async fn test_region_filter_returns_only_matching_rows() {
        let (service, _) = service(numbered_book(10).await);

        let page = service
            .fetch_page(PageRequest::new(1, 50).filter(PolicyField::Region, "East"))
            .await
            .unwrap();

        assert_eq!(page.total, 5);
        assert!(page.rows.iter().all(|p| p.region.as_deref() == Some("East")));
    }

    #[tokio::test]
    async fn test_empty_filter_value_emits_no_predicate() {
        let (service, gateway) = service(numbered_book(10).await);

        let page = service
            .fetch_page(
                PageRequest::new(1, 50)
                    .filter(PolicyField::Region, "")
                    .filter_opt(PolicyField::Status, None),
            )
            .await
            .unwrap();

        assert_eq!(page.total, 10);
        assert!(gateway.executed_queries().await[0].predicates.is_empty());
    }

    #[tokio::test]
    async fn test_filters_are_anded() {
        let (service, _) = service(seeded_gateway().await);

        let page = service
            .fetch_page(
                PageRequest::new(1, 50)
                    .filter(PolicyField::Region, "East")
                    .filter(PolicyField::AgentId, ProfileId::new("agent-2")),
            )
            .await
            .unwrap();

        assert_eq!(page.total, 1);
        assert_eq!(page.rows[0].id, PolicyId::new("pol-east-2"));
    }

    #[tokio::test]
    async fn test_fetch_matching_orders_oldest_first() {
        let (service, _) = service(seeded_gateway().await);

        let rows = service.fetch_matching(&FilterCriteria::default()).await.unwrap();

        assert_eq!(rows.len(), 5);
        assert_eq!(rows[0].id, PolicyId::new("pol-east-1"));
        assert_eq!(rows[4].id, PolicyId::new("pol-east-3"));
    }

    #[tokio::test]
    async fn test_fetch_matching_date_range_uses_bare_end_date() {
        let (service, _) = service(seeded_gateway().await);
        let criteria = FilterCriteria {
            start_date: NaiveDate::from_ymd_opt(2024, 1, 10),
            end_date: NaiveDate::from_ymd_opt(2024, 2, 1),
            ..Default::default()
        };

        let rows = service.fetch_matching(&criteria).await.unwrap();

        // The 1 Feb 09:00 policy sits after midnight of the end date
        let ids: Vec<&str> = rows.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["pol-west-1"]);
    }

    #[tokio::test]
    async fn test_fetch_matching_combines_criteria() {
        let (service, gateway) = service(seeded_gateway().await);
        let criteria = FilterCriteria {
            region: Some("East".to_string()),
            policy_type: Some("Life".to_string()),
            ..Default::default()
        };

        let rows = service.fetch_matching(&criteria).await.unwrap();

        assert_eq!(rows.len(), 2);
        let executed = gateway.executed_queries().await;
        assert_eq!(executed[0].predicates.len(), 2);
        assert!(executed[0].range.is_none());
    }
}

// ============================================================================
// LOOKUP
// ============================================================================

mod lookup {
    use super::*;

    #[tokio::test]
    async fn test_fetch_policy_found() {
        let (service, _) = service(seeded_gateway().await);

        let policy = service.fetch_policy(&PolicyId::new("pol-west-1")).await.unwrap();

        assert_eq!(policy.status.as_deref(), Some("Pending"));
    }

    #[tokio::test]
    async fn test_fetch_policy_missing() {
        let (service, _) = service(seeded_gateway().await);

        let result = service.fetch_policy(&PolicyId::new("nope")).await;

        assert!(matches!(result, Err(DashboardError::NotFound { .. })));
    }
}

// ============================================================================
// FAILURES
// ============================================================================

mod failures {
    use super::*;

    #[tokio::test]
    async fn test_gateway_failure_is_query_failed() {
        let gateway = numbered_book(5).await;
        gateway.fail_table(Table::Policies, "connection reset").await;
        let (service, gateway) = service(gateway);

        assert_query_failed(service.fetch_page(PageRequest::default()).await);
        assert_query_failed(service.fetch_matching(&FilterCriteria::default()).await);

        // No retry
        assert_eq!(gateway.executed_queries().await.len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_row_fails_the_whole_page() {
        let gateway = numbered_book(2).await;
        gateway
            .insert_raw(
                Table::Policies,
                vec![serde_json::json!({ "id": "broken", "created_at": "not a time" })],
            )
            .await;
        let (service, _) = service(gateway);

        let result = service.fetch_page(PageRequest::new(1, 10)).await;

        match result {
            Err(DashboardError::QueryFailed(core_kernel::PortError::Transformation { .. })) => {}
            other => panic!("expected transformation failure, got {:?}", other),
        }
    }
}
