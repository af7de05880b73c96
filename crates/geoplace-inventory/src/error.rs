//! Inventory lookup errors.

use thiserror::Error;

/// Result type alias for single-best-node lookups.
pub type LookupResult<T> = Result<T, LookupError>;

/// Why a single-best-node lookup returned nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// Every name resolved, but no eligible node lives there.
    #[error("no nodes match given locations")]
    NoLocationMatch,

    /// A name could not be resolved by the geography reference and no other
    /// name produced a node.
    #[error("location identifier could not be resolved: {0:?}")]
    UnresolvableLocation(String),
}
