//! Error types shared by the stores, index and query service.

use thiserror::Error;

/// Why a boundary ring or point location was rejected at load time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryViolation {
    #[error("coordinate {index} is not finite")]
    NonFinite { index: usize },

    #[error("coordinate {index} is outside lon [-180, 180] / lat [-90, 90]")]
    OutOfRange { index: usize },

    #[error("ring has {count} vertices, at least 4 are required")]
    TooFewVertices { count: usize },

    #[error("ring is not closed (first vertex differs from last)")]
    NotClosed,

    #[error("edge {index} has zero length")]
    DegenerateEdge { index: usize },

    #[error("edges {first} and {second} intersect")]
    SelfIntersecting { first: usize, second: usize },

    #[error("polygon has {count} interior ring(s); only single-ring boundaries are supported")]
    InteriorRings { count: usize },
}

/// Errors surfaced by the containment core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FenceError {
    /// A record failed validation and was skipped; the rest of the batch loads.
    #[error("invalid geometry for record '{id}': {violation}")]
    InvalidGeometry {
        id: String,
        violation: GeometryViolation,
    },

    /// A record reused an identifier already accepted in the same store.
    #[error("duplicate id '{0}'")]
    DuplicateId(String),

    /// Malformed query input.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no region has location key {0}")]
    NoSuchLocation(i64),

    #[error("'{0}' not found")]
    NotFound(String),

    /// Queried before any load was published.
    #[error("index unavailable: no data has been loaded")]
    IndexUnavailable,
}

impl FenceError {
    /// Whether the external layer should answer with a client error.
    ///
    /// Everything else maps to a server error.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FenceError::InvalidArgument(_)
                | FenceError::NoSuchLocation(_)
                | FenceError::NotFound(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, FenceError>;
