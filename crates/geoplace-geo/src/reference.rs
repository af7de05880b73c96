//! The geography reference port.
//!
//! Consumers depend on the [`GeoReference`] trait only; the concrete
//! gazetteer is injected at construction time.

use std::sync::Arc;

use crate::error::GeoResult;

/// A resolved first-level subdivision (a "city" in label vocabulary).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subdivision {
    /// ISO 3166-1 alpha-2 code of the owning country.
    pub country: String,
    /// Region code within the country, e.g. `03` for Braga.
    pub region: String,
    /// Continent code of the owning country.
    pub continent: String,
}

impl Subdivision {
    /// Canonical index key: `"<country>-<region>"`.
    pub fn city_code(&self) -> String {
        format!("{}-{}", self.country, self.region)
    }
}

/// A resolved country.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Country {
    pub alpha2: String,
    pub continent: String,
}

/// A resolved continent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Continent {
    pub code: String,
}

/// Read-only lookup of free-text geography identifiers.
///
/// Implementations must be cheap and non-blocking: lookups run inside
/// placement decisions and while the node inventory holds its write lock.
pub trait GeoReference: Send + Sync {
    /// Resolve a subdivision (city) name.
    fn resolve_subdivision(&self, name: &str) -> GeoResult<Subdivision>;

    /// Resolve a country by common name or alpha code.
    fn resolve_country(&self, identifier: &str) -> GeoResult<Country>;

    /// Resolve a continent by name or code.
    fn resolve_continent(&self, name: &str) -> GeoResult<Continent>;
}

impl<T: GeoReference + ?Sized> GeoReference for Arc<T> {
    fn resolve_subdivision(&self, name: &str) -> GeoResult<Subdivision> {
        (**self).resolve_subdivision(name)
    }

    fn resolve_country(&self, identifier: &str) -> GeoResult<Country> {
        (**self).resolve_country(identifier)
    }

    fn resolve_continent(&self, name: &str) -> GeoResult<Continent> {
        (**self).resolve_continent(name)
    }
}
