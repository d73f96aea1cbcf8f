//! Policy Dashboard Domain
//!
//! This crate implements the read side of the insurance-policy dashboard:
//! querying policies through a hosted data platform, holding filter state,
//! aggregating fetched rows into chart buckets, and managing the session.
//!
//! # Architecture
//!
//! The domain depends only on the ports it declares:
//! - **DataGateway**: executes typed `GatewayQuery` values against the store
//! - **AuthPort**: current user and sign-out
//!
//! Adapters live in `adapters` (REST platform) and in `infra_db` (PostgreSQL).
//!
//! # Data flow
//!
//! ```text
//! FilterStateController --criteria--> PolicyQueryService --rows--> aggregation
//!          |                                                          |
//!          +------------------ DashboardLoader (generations) ---------+
//!                                        |
//!                                  DashboardSnapshot
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_policy::{DashboardSession, FilterKey};
//!
//! let session = DashboardSession::new(gateway);
//! session.start().await?;
//! let outcome = session.apply_filter(FilterKey::Region, "East").await?;
//! ```

pub mod adapters;
pub mod aggregation;
pub mod dashboard;
pub mod error;
pub mod filters;
pub mod policy;
pub mod ports;
pub mod query;
pub mod services;
pub mod session;

pub use aggregation::{
    group_by_month, group_by_status, group_by_type, summary_counts, DashboardView, MonthBucket,
    StatusBucket, SummaryCounts, TypeBucket, UNKNOWN_STATUS,
};
pub use dashboard::{DashboardLoader, DashboardSession, DashboardSnapshot, LoadOutcome};
pub use error::{DashboardError, DashboardResult};
pub use filters::{FilterCriteria, FilterKey, FilterOptions, FilterStateController, OPTIONS_SAMPLE_LIMIT};
pub use policy::{AgentOption, Policy, PolicyTypeEntry, Profile, StatusCategory};
pub use ports::{AuthPort, DataGateway};
pub use query::{
    Comparison, Field, GatewayQuery, PolicyField, PolicyTypeField, ProfileField, QueryResponse,
    RowRange, ScalarValue, Selection, SortOrder, Table,
};
pub use services::{Page, PageRequest, PolicyQueryService};
pub use session::{AuthUser, Navigation, SessionContext, SessionState};
