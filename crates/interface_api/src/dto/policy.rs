//! Policy DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use domain_policy::{Page, PageRequest, Policy, PolicyField, SortOrder};

use crate::error::ApiError;

/// Largest page the list endpoint serves
pub const MAX_PAGE_SIZE: u32 = 100;

/// Query string of `GET /policies`
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ListPoliciesQuery {
    #[validate(range(min = 1))]
    pub page: Option<u32>,
    #[validate(range(min = 1, max = 100))]
    pub page_size: Option<u32>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub status: Option<String>,
    pub region: Option<String>,
    pub policy_type: Option<String>,
    pub agent_id: Option<String>,
}

impl ListPoliciesQuery {
    /// Validates the query and converts it into a domain page request
    pub fn into_page_request(self) -> Result<PageRequest, ApiError> {
        self.validate()?;

        let defaults = PageRequest::default();
        let sort_by = match self.sort_by.as_deref() {
            Some(column) => column.parse::<PolicyField>()?,
            None => defaults.sort_by,
        };
        let order = match self.order.as_deref() {
            Some(order) => order.parse::<SortOrder>()?,
            None => defaults.order,
        };

        let request = PageRequest::new(
            self.page.unwrap_or(defaults.page),
            self.page_size.unwrap_or(defaults.page_size),
        )
        .sorted_by(sort_by, order)
        .filter_opt(PolicyField::Status, self.status.map(Into::into))
        .filter_opt(PolicyField::Region, self.region.map(Into::into))
        .filter_opt(PolicyField::PolicyType, self.policy_type.map(Into::into))
        .filter_opt(PolicyField::AgentId, self.agent_id.map(Into::into));

        Ok(request)
    }
}

/// Body of `GET /policies`
#[derive(Debug, Serialize)]
pub struct PolicyPageResponse {
    pub data: Vec<Policy>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub total_pages: u64,
}

impl From<Page<Policy>> for PolicyPageResponse {
    fn from(page: Page<Policy>) -> Self {
        Self {
            total_pages: page.total_pages(),
            data: page.rows,
            page: page.page,
            page_size: page.page_size,
            total: page.total,
        }
    }
}
