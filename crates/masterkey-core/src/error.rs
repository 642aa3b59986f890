//! Common error types for masterkey.
//!
//! This module provides shared error types that are used across multiple crates.

use thiserror::Error;

/// A result type using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core errors that can occur throughout the masterkey system.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// The standard identifier is not one of the supported standards.
    #[error("unknown keying standard: {0:?} (expected ANSI_BHMA or EN)")]
    UnknownStandard(String),

    /// The facility type is not one of the recognised facility types.
    #[error("unknown facility type: {0:?}")]
    UnknownFacilityType(String),

    /// The keying approach is not one of the supported approaches.
    #[error("unknown keying approach: {0:?}")]
    UnknownApproach(String),

    /// A bitting code contains something other than decimal cut depths.
    #[error("invalid bitting code: {0:?}")]
    InvalidBitting(String),

    /// An invalid identifier was provided.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] crate::ids::IdError),
}
