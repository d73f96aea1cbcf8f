//! Policy query service
//!
//! Wraps a `DataGateway` and turns page requests and filter criteria into
//! gateway queries. Failures are propagated as `DashboardError::QueryFailed`;
//! nothing is retried here.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use core_kernel::{OperationMetadata, PolicyId};

use crate::error::{DashboardError, DashboardResult};
use crate::filters::FilterCriteria;
use crate::policy::Policy;
use crate::ports::DataGateway;
use crate::query::{GatewayQuery, PolicyField, RowRange, ScalarValue, SortOrder, Table};

/// Parameters for one page of the policy list
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    /// 1-based page number
    pub page: u32,
    pub page_size: u32,
    pub sort_by: PolicyField,
    pub order: SortOrder,
    /// Equality filters. `None` and empty text emit no predicate.
    pub filters: BTreeMap<PolicyField, Option<ScalarValue>>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: 10,
            sort_by: PolicyField::CreatedAt,
            order: SortOrder::Descending,
            filters: BTreeMap::new(),
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self {
            page,
            page_size,
            ..Default::default()
        }
    }

    pub fn sorted_by(mut self, field: PolicyField, order: SortOrder) -> Self {
        self.sort_by = field;
        self.order = order;
        self
    }

    pub fn filter(mut self, field: PolicyField, value: impl Into<ScalarValue>) -> Self {
        self.filters.insert(field, Some(value.into()));
        self
    }

    /// Sets a filter that may be absent
    pub fn filter_opt(mut self, field: PolicyField, value: Option<ScalarValue>) -> Self {
        self.filters.insert(field, value);
        self
    }

    pub fn validate(&self) -> DashboardResult<()> {
        if self.page < 1 {
            return Err(DashboardError::InvalidPageRequest(
                "page must be at least 1".to_string(),
            ));
        }
        if self.page_size < 1 {
            return Err(DashboardError::InvalidPageRequest(
                "page_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Zero-based inclusive row window for this page
    pub fn range(&self) -> RowRange {
        RowRange::for_page(self.page, self.page_size)
    }

    /// Filters that actually constrain the query
    pub fn active_filters(&self) -> impl Iterator<Item = (PolicyField, &ScalarValue)> {
        self.filters.iter().filter_map(|(field, value)| match value {
            Some(value) if !value.is_blank() => Some((*field, value)),
            _ => None,
        })
    }
}

/// One page of rows plus the total number of matching rows
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub rows: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(u64::from(self.page_size))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Reads policies through the injected gateway
#[derive(Clone)]
pub struct PolicyQueryService {
    gateway: Arc<dyn DataGateway>,
    initiated_by: Option<String>,
}

impl PolicyQueryService {
    pub fn new(gateway: Arc<dyn DataGateway>) -> Self {
        Self {
            gateway,
            initiated_by: None,
        }
    }

    /// Tags every gateway call with the acting user
    pub fn on_behalf_of(mut self, user: impl Into<String>) -> Self {
        self.initiated_by = Some(user.into());
        self
    }

    pub fn gateway(&self) -> &Arc<dyn DataGateway> {
        &self.gateway
    }

    fn metadata(&self, operation: &str) -> OperationMetadata {
        let metadata = OperationMetadata::default().with_context("operation", operation);
        match &self.initiated_by {
            Some(user) => metadata.initiated_by(user.clone()),
            None => metadata,
        }
    }

    /// Fetches one page of policies with the exact total of matching rows
    ///
    /// # Errors
    ///
    /// `InvalidPageRequest` for a zero page or page size, `QueryFailed` when the
    /// gateway fails or a row does not decode.
    pub async fn fetch_page(&self, request: PageRequest) -> DashboardResult<Page<Policy>> {
        request.validate()?;

        let mut query = GatewayQuery::from(Table::Policies)
            .count_exact()
            .range(request.range())
            .order(request.sort_by, request.order);
        for (field, value) in request.active_filters() {
            query = query.eq(field, value.clone());
        }

        debug!(
            page = request.page,
            page_size = request.page_size,
            sort_by = %request.sort_by,
            order = request.order.keyword(),
            predicates = query.predicates.len(),
            "Fetching policy page"
        );

        let response = self
            .gateway
            .execute(query, Some(self.metadata("fetch_page")))
            .await
            .map_err(|e| {
                warn!(error = %e, page = request.page, "Policy page query failed");
                DashboardError::QueryFailed(e)
            })?;

        let rows: Vec<Policy> = response.decode()?;
        let total = response.count.unwrap_or(rows.len() as u64);

        Ok(Page {
            rows,
            total,
            page: request.page,
            page_size: request.page_size,
        })
    }

    /// Fetches every policy matching the dashboard filters, oldest first
    pub async fn fetch_matching(&self, criteria: &FilterCriteria) -> DashboardResult<Vec<Policy>> {
        let query = Self::matching_query(criteria);

        debug!(
            predicates = query.predicates.len(),
            "Fetching policies for dashboard"
        );

        let response = self
            .gateway
            .execute(query, Some(self.metadata("fetch_matching")))
            .await
            .map_err(|e| {
                warn!(error = %e, "Dashboard policy query failed");
                DashboardError::QueryFailed(e)
            })?;

        Ok(response.decode()?)
    }

    /// The query `fetch_matching` issues for the given criteria
    pub fn matching_query(criteria: &FilterCriteria) -> GatewayQuery {
        let mut query = GatewayQuery::from(Table::Policies).order(PolicyField::CreatedAt, SortOrder::Ascending);

        if let Some(region) = criteria.region.as_deref().filter(|r| !r.is_empty()) {
            query = query.eq(PolicyField::Region, region);
        }
        if let Some(agent) = criteria.agent.as_ref().filter(|a| !a.as_str().is_empty()) {
            query = query.eq(PolicyField::AgentId, agent.clone());
        }
        if let Some(policy_type) = criteria.policy_type.as_deref().filter(|t| !t.is_empty()) {
            query = query.eq(PolicyField::PolicyType, policy_type);
        }
        if let Some(start) = criteria.start_date {
            query = query.gte(PolicyField::CreatedAt, start);
        }
        if let Some(end) = criteria.end_date {
            query = query.lte(PolicyField::CreatedAt, end);
        }

        query
    }

    /// Looks up a single policy for the detail view
    pub async fn fetch_policy(&self, id: &PolicyId) -> DashboardResult<Policy> {
        let query = GatewayQuery::from(Table::Policies)
            .eq(PolicyField::Id, id.clone())
            .limit(1);

        let response = self
            .gateway
            .execute(query, Some(self.metadata("fetch_policy")))
            .await?;

        response
            .decode::<Policy>()?
            .into_iter()
            .next()
            .ok_or_else(|| DashboardError::not_found("Policy", id))
    }
}
