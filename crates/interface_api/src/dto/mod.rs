//! Request and response bodies

pub mod dashboard;
pub mod policy;
pub mod session;
