//! Data models for the `SafeRoute` library
//!
//! This module contains the core domain models organized by concern:
//! - Location: Risk-scored reference locations, query points and ranked results
//! - Route: Walkable coordinate paths returned by route providers

pub mod location;
pub mod route;

// Re-export all public types for convenient access
pub use location::{LocationRecord, QueryPoint, RankedResult, RiskLevel};
pub use route::RoutePath;
