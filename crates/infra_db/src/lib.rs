//! Infrastructure Database Layer
//!
//! This crate provides a PostgreSQL implementation of the dashboard's
//! `DataGateway` port using SQLx, for deployments that read the policy tables
//! directly instead of going through the hosted platform's REST endpoint.
//!
//! # Architecture
//!
//! `PostgresGateway` renders each typed `GatewayQuery` into one parameterised
//! statement. Rows come back as `jsonb`, so the domain decodes them exactly
//! like rows fetched over REST.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, DatabaseConfig, PostgresGateway};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/policies")).await?;
//! let gateway: Arc<dyn DataGateway> = Arc::new(PostgresGateway::new(pool));
//! ```

pub mod pool;
pub mod error;
pub mod gateway;

pub use pool::{DatabasePool, create_pool, create_pool_from_url, DatabaseConfig};
pub use error::DatabaseError;
pub use gateway::{PostgresGateway, build_select, build_count};
