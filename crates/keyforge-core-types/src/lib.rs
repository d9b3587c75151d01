//! Core types shared across keyforge facilities
//!
//! This crate provides foundational types used by both the error and the
//! logging facilities of `keyforge-core`:
//!
//! - **Correlation types**: InvocationId, SiteLabel
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod schema;

pub use correlation::{InvocationId, SiteLabel};
