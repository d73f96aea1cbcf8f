//! Filter state
//!
//! `FilterStateController` owns the active `FilterCriteria` and the dropdown
//! option lists. Every change is published on a watch channel; subscribers
//! (the dashboard loader, an HTTP session) react to the new criteria.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, warn};

use core_kernel::{OperationMetadata, PortError, ProfileId};

use crate::error::{DashboardError, DashboardResult};
use crate::policy::{AgentOption, PolicyTypeEntry, RegionSample};
use crate::ports::DataGateway;
use crate::query::{GatewayQuery, PolicyField, PolicyTypeField, ProfileField, Selection, Table};

/// Maximum rows sampled per option list
pub const OPTIONS_SAMPLE_LIMIT: u64 = 100;

/// The active dashboard filters. Every field is optional and independent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub region: Option<String>,
    pub agent: Option<ProfileId>,
    pub policy_type: Option<String>,
    /// Inclusive lower bound on the creation timestamp
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound on the creation timestamp
    pub end_date: Option<NaiveDate>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self == &FilterCriteria::default()
    }

    /// Returns a copy with one field replaced. Only an empty `value` clears
    /// the field; text values are stored exactly as given.
    pub fn with(&self, key: FilterKey, value: &str) -> DashboardResult<FilterCriteria> {
        let mut next = self.clone();
        let text = (!value.is_empty()).then(|| value.to_string());

        match key {
            FilterKey::Region => next.region = text,
            FilterKey::Agent => next.agent = text.map(ProfileId::new),
            FilterKey::PolicyType => next.policy_type = text,
            FilterKey::StartDate => next.start_date = parse_date(key, value)?,
            FilterKey::EndDate => next.end_date = parse_date(key, value)?,
        }

        Ok(next)
    }
}

fn parse_date(key: FilterKey, value: &str) -> DashboardResult<Option<NaiveDate>> {
    if value.is_empty() {
        return Ok(None);
    }
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(Some)
        .map_err(|e| DashboardError::invalid_filter(key.as_str(), format!("'{}' is not a YYYY-MM-DD date: {}", value, e)))
}

/// The five settable filter fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterKey {
    Region,
    Agent,
    PolicyType,
    StartDate,
    EndDate,
}

impl FilterKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKey::Region => "region",
            FilterKey::Agent => "agent",
            FilterKey::PolicyType => "policy_type",
            FilterKey::StartDate => "start_date",
            FilterKey::EndDate => "end_date",
        }
    }
}

impl FromStr for FilterKey {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "region" => Ok(FilterKey::Region),
            "agent" | "agent_id" => Ok(FilterKey::Agent),
            "type" | "policy_type" => Ok(FilterKey::PolicyType),
            "startDate" | "start_date" => Ok(FilterKey::StartDate),
            "endDate" | "end_date" => Ok(FilterKey::EndDate),
            other => Err(DashboardError::UnknownField(other.to_string())),
        }
    }
}

impl fmt::Display for FilterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Distinct values offered in the filter dropdowns
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub regions: Vec<String>,
    pub agents: Vec<AgentOption>,
    pub policy_types: Vec<String>,
}

/// Source of truth for the active filters and the option lists
pub struct FilterStateController {
    gateway: Arc<dyn DataGateway>,
    criteria: watch::Sender<FilterCriteria>,
    options: watch::Sender<FilterOptions>,
}

impl FilterStateController {
    pub fn new(gateway: Arc<dyn DataGateway>) -> Self {
        let (criteria, _) = watch::channel(FilterCriteria::default());
        let (options, _) = watch::channel(FilterOptions::default());
        Self {
            gateway,
            criteria,
            options,
        }
    }

    /// Current criteria
    pub fn criteria(&self) -> FilterCriteria {
        self.criteria.borrow().clone()
    }

    /// Current option lists
    pub fn options(&self) -> FilterOptions {
        self.options.borrow().clone()
    }

    /// Receiver notified on every published criteria change
    pub fn subscribe(&self) -> watch::Receiver<FilterCriteria> {
        self.criteria.subscribe()
    }

    /// Replaces one field and publishes the new criteria
    ///
    /// # Errors
    ///
    /// `InvalidFilter` when a date value does not parse; the current criteria
    /// are left untouched and nothing is published.
    pub fn set_filter(&self, key: FilterKey, value: &str) -> DashboardResult<FilterCriteria> {
        let next = self.criteria.borrow().with(key, value)?;
        debug!(key = %key, value, "Filter changed");
        self.criteria.send_replace(next.clone());
        Ok(next)
    }

    /// Clears every field and publishes the empty criteria
    pub fn reset(&self) -> FilterCriteria {
        self.criteria.send_replace(FilterCriteria::default());
        FilterCriteria::default()
    }

    /// Samples the three option lists from the gateway
    ///
    /// The lists are fetched independently. A failed list stays empty and the
    /// failure is only logged.
    pub async fn load_options(&self) -> FilterOptions {
        let (regions, agents, policy_types) =
            tokio::join!(self.load_regions(), self.load_agents(), self.load_policy_types());

        let options = FilterOptions {
            regions: regions.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load region options");
                Vec::new()
            }),
            agents: agents.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load agent options");
                Vec::new()
            }),
            policy_types: policy_types.unwrap_or_else(|e| {
                warn!(error = %e, "Failed to load policy type options");
                Vec::new()
            }),
        };

        debug!(
            regions = options.regions.len(),
            agents = options.agents.len(),
            policy_types = options.policy_types.len(),
            "Filter options loaded"
        );

        self.options.send_replace(options.clone());
        options
    }

    async fn sample(&self, query: GatewayQuery) -> Result<crate::query::QueryResponse, PortError> {
        let metadata = OperationMetadata::default().with_context("operation", "load_options");
        self.gateway
            .execute(query.limit(OPTIONS_SAMPLE_LIMIT), Some(metadata))
            .await
    }

    async fn load_regions(&self) -> Result<Vec<String>, PortError> {
        let response = self
            .sample(GatewayQuery::from(Table::Policies).select(Selection::of(&[PolicyField::Region])))
            .await?;

        let regions: IndexSet<String> = response
            .decode::<RegionSample>()?
            .into_iter()
            .filter_map(|sample| sample.region)
            .filter(|region| !region.is_empty())
            .collect();

        Ok(regions.into_iter().collect())
    }

    async fn load_agents(&self) -> Result<Vec<AgentOption>, PortError> {
        let response = self
            .sample(
                GatewayQuery::from(Table::Profiles)
                    .select(Selection::of(&[ProfileField::Id, ProfileField::FullName])),
            )
            .await?;
        response.decode()
    }

    async fn load_policy_types(&self) -> Result<Vec<String>, PortError> {
        let response = self
            .sample(GatewayQuery::from(Table::PolicyTypes).select(Selection::of(&[PolicyTypeField::Name])))
            .await?;
        Ok(response
            .decode::<PolicyTypeEntry>()?
            .into_iter()
            .map(|entry| entry.name)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_key_aliases() {
        assert_eq!("type".parse::<FilterKey>().unwrap(), FilterKey::PolicyType);
        assert_eq!("startDate".parse::<FilterKey>().unwrap(), FilterKey::StartDate);
        assert_eq!("end_date".parse::<FilterKey>().unwrap(), FilterKey::EndDate);
        assert!("status".parse::<FilterKey>().is_err());
    }

    #[test]
    fn test_with_replaces_one_field() {
        let criteria = FilterCriteria::default()
            .with(FilterKey::Region, "East")
            .unwrap()
            .with(FilterKey::PolicyType, "Life")
            .unwrap();

        assert_eq!(criteria.region.as_deref(), Some("East"));
        assert_eq!(criteria.policy_type.as_deref(), Some("Life"));

        let cleared = criteria.with(FilterKey::Region, "").unwrap();
        assert_eq!(cleared.region, None);
        assert_eq!(cleared.policy_type.as_deref(), Some("Life"));
    }

    #[test]
    fn test_bad_date_is_rejected() {
        let err = FilterCriteria::default()
            .with(FilterKey::StartDate, "01/02/2024")
            .unwrap_err();
        assert!(matches!(err, DashboardError::InvalidFilter { ref key, .. } if key == "start_date"));
    }
}
