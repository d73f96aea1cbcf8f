//! Core Kernel - Foundational types shared by the policy dashboard crates
//!
//! This crate provides the fundamental building blocks used across all modules:
//! - Opaque identifiers for records owned by the hosted data platform
//! - Timestamps that keep their own offset, and the `YYYY-MM` month keys derived from them
//! - Port infrastructure for swappable gateway adapters

pub mod temporal;
pub mod identifiers;
pub mod ports;
pub mod error;

pub use temporal::{Timestamp, MonthKey, TemporalError};
pub use identifiers::{PolicyId, ProfileId, UserId};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
    OperationMetadata,
};
pub use error::CoreError;
