//! Geography lookup errors.

use thiserror::Error;

/// Result type alias for geography lookups.
pub type GeoResult<T> = Result<T, GeoError>;

/// Errors returned by a [`GeoReference`](crate::GeoReference).
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("no subdivision matches {0:?}")]
    UnknownSubdivision(String),

    #[error("given country identifier does not match any country: {0:?}")]
    UnknownCountry(String),

    #[error("no continent matches {0:?}")]
    UnknownContinent(String),

    #[error("failed to read gazetteer table: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse gazetteer table: {0}")]
    Parse(#[from] toml::de::Error),
}

impl GeoError {
    /// Whether the error means "identifier not found" rather than a data problem.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            GeoError::UnknownSubdivision(_)
                | GeoError::UnknownCountry(_)
                | GeoError::UnknownContinent(_)
        )
    }
}
