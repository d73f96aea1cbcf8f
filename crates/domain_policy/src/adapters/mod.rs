//! Hosted Data Platform Adapters
//!
//! Adapter implementations of the dashboard ports for a hosted data platform
//! speaking the PostgREST dialect for reads and a GoTrue-style API for auth.
//!
//! # Available Adapters
//!
//! - **RestGateway**: `DataGateway` over `GET /rest/v1/{table}`
//! - **RestAuth**: `AuthPort` over `/auth/v1/user` and `/auth/v1/logout`
//! - **MockGateway** / **MockAuth**: in-memory mocks (re-exported from the ports module)
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_policy::adapters::{RestGateway, RestGatewayConfig};
//! use domain_policy::DataGateway;
//! use std::sync::Arc;
//!
//! let config = RestGatewayConfig {
//!     base_url: "https://project.example.co".to_string(),
//!     api_key: "anon-key".to_string(),
//!     ..Default::default()
//! };
//!
//! let gateway: Arc<dyn DataGateway> = Arc::new(RestGateway::new(config)?);
//! ```

pub mod rest;

pub use rest::{parse_content_range, query_params, RestAuth, RestGateway, RestGatewayConfig};

#[cfg(any(test, feature = "mock"))]
pub use crate::ports::mock::{MockAuth, MockGateway};
