//! Core types and utilities for masterkey.
//!
//! This crate provides the foundational types used throughout the master-key
//! engine:
//!
//! - **Identifiers**: Strongly-typed IDs for doors, hierarchy levels, zones,
//!   and keyed-alike groups
//! - **Standards**: The static ANSI/BHMA A156.28 and EN 1303 registry
//! - **Keying approaches** and **facility types**
//! - **Error types**: Common error definitions shared across crates
//!
//! # Example
//!
//! ```
//! use masterkey_core::{get_standard, FacilityType, StandardId};
//!
//! let standard: StandardId = "EN".parse().unwrap();
//! assert_eq!(get_standard(standard).max_differs, 7776);
//!
//! // Unknown ids fail instead of falling back to a default.
//! assert!("ANSII".parse::<StandardId>().is_err());
//! assert!("Warehouse".parse::<FacilityType>().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod approach;
pub mod error;
pub mod ids;
pub mod standard;

pub use approach::KeyingApproach;
pub use error::{CoreError, Result};
pub use ids::{DoorId, HierarchyId, IdError, KaGroupId, ZoneId};
pub use standard::{
    describe_depth, get_recommended_hierarchy, get_standard, max_differs,
    security_grade_description, validate_bitting, DepthBand, DepthLimits, FacilityType,
    LevelDefinition, MacsViolation, PinConfig, Recommendation, Standard, StandardId,
};
