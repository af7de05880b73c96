//! Table-backed gazetteer.
//!
//! All lookups are case-insensitive and ignore surrounding whitespace.
//! The table itself is plain data (`GazetteerData`) so operators can
//! extend the builtin set from a TOML file:
//!
//! ```toml
//! [[countries]]
//! name = "Portugal"
//! alpha2 = "PT"
//! alpha3 = "PRT"
//! continent = "EU"
//!
//! [[subdivisions]]
//! name = "Braga"
//! country = "PT"
//! code = "03"
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::builtin;
use crate::error::{GeoError, GeoResult};
use crate::reference::{Continent, Country, GeoReference, Subdivision};

/// A continent row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContinentRecord {
    pub code: String,
    pub name: String,
}

/// A country row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountryRecord {
    pub name: String,
    pub alpha2: String,
    pub alpha3: String,
    /// Continent code.
    pub continent: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// A first-level subdivision row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubdivisionRecord {
    pub name: String,
    /// Alpha-2 code of the owning country.
    pub country: String,
    /// Region code within the country.
    pub code: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Serializable gazetteer table.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GazetteerData {
    #[serde(default)]
    pub continents: Vec<ContinentRecord>,
    #[serde(default)]
    pub countries: Vec<CountryRecord>,
    #[serde(default)]
    pub subdivisions: Vec<SubdivisionRecord>,
}

impl GazetteerData {
    /// Parse a table from TOML text.
    pub fn from_toml_str(content: &str) -> GeoResult<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// In-memory [`GeoReference`] built from a [`GazetteerData`] table.
#[derive(Debug, Clone, Default)]
pub struct Gazetteer {
    /// Lowercased name or code → continent code.
    continents: HashMap<String, String>,
    /// Lowercased name, alias, alpha-2 or alpha-3 → country.
    countries_by_name: HashMap<String, Country>,
    countries_by_alpha: HashMap<String, Country>,
    /// Lowercased subdivision name or alias → subdivision.
    subdivisions: HashMap<String, SubdivisionEntry>,
}

/// A subdivision keyed to its country. The continent is read from the
/// country table at lookup time so it follows later merges.
#[derive(Debug, Clone)]
struct SubdivisionEntry {
    country: String,
    region: String,
}

impl Gazetteer {
    /// An empty gazetteer that resolves nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// The reference table shipped with the crate.
    pub fn builtin() -> Self {
        let mut gazetteer = Self::new();
        gazetteer.merge(&builtin::data());
        gazetteer
    }

    /// Build a gazetteer from a table.
    pub fn from_data(data: &GazetteerData) -> Self {
        let mut gazetteer = Self::new();
        gazetteer.merge(data);
        gazetteer
    }

    /// Parse a TOML table into a gazetteer.
    pub fn from_toml_str(content: &str) -> GeoResult<Self> {
        Ok(Self::from_data(&GazetteerData::from_toml_str(content)?))
    }

    /// Load a TOML table from disk.
    pub fn from_file(path: &Path) -> GeoResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Add every row of `data`, overriding existing entries with the same key.
    ///
    /// Subdivisions whose country is unknown (neither in `data` nor already
    /// present) are skipped. A country row that changes continent moves the
    /// subdivisions merged before it as well.
    pub fn merge(&mut self, data: &GazetteerData) {
        for continent in &data.continents {
            let code = continent.code.trim().to_uppercase();
            self.continents.insert(normalize(&continent.name), code.clone());
            self.continents.insert(normalize(&code), code);
        }

        for record in &data.countries {
            let country = Country {
                alpha2: record.alpha2.trim().to_uppercase(),
                continent: record.continent.trim().to_uppercase(),
            };
            self.countries_by_name.insert(normalize(&record.name), country.clone());
            for alias in &record.aliases {
                self.countries_by_name.insert(normalize(alias), country.clone());
            }
            self.countries_by_alpha.insert(normalize(&record.alpha2), country.clone());
            self.countries_by_alpha.insert(normalize(&record.alpha3), country);
        }

        for record in &data.subdivisions {
            let Some(country) = self.countries_by_alpha.get(&normalize(&record.country)) else {
                warn!(
                    subdivision = %record.name,
                    country = %record.country,
                    "skipping subdivision of unknown country"
                );
                continue;
            };
            let subdivision = SubdivisionEntry {
                country: country.alpha2.clone(),
                region: record.code.trim().to_uppercase(),
            };
            self.subdivisions.insert(normalize(&record.name), subdivision.clone());
            for alias in &record.aliases {
                self.subdivisions.insert(normalize(alias), subdivision.clone());
            }
        }

        debug!(
            continents = self.continents.len(),
            countries = self.countries_by_alpha.len(),
            subdivisions = self.subdivisions.len(),
            "gazetteer table merged"
        );
    }

    /// Number of distinct lookup keys for subdivisions (names and aliases).
    pub fn subdivision_keys(&self) -> usize {
        self.subdivisions.len()
    }
}

impl GeoReference for Gazetteer {
    fn resolve_subdivision(&self, name: &str) -> GeoResult<Subdivision> {
        let entry = self
            .subdivisions
            .get(&normalize(name))
            .ok_or_else(|| GeoError::UnknownSubdivision(name.to_string()))?;
        let country = self
            .countries_by_alpha
            .get(&normalize(&entry.country))
            .ok_or_else(|| GeoError::UnknownSubdivision(name.to_string()))?;
        Ok(Subdivision {
            country: entry.country.clone(),
            region: entry.region.clone(),
            continent: country.continent.clone(),
        })
    }

    fn resolve_country(&self, identifier: &str) -> GeoResult<Country> {
        let key = normalize(identifier);
        self.countries_by_name
            .get(&key)
            .or_else(|| self.countries_by_alpha.get(&key))
            .cloned()
            .ok_or_else(|| GeoError::UnknownCountry(identifier.to_string()))
    }

    fn resolve_continent(&self, name: &str) -> GeoResult<Continent> {
        self.continents
            .get(&normalize(name))
            .map(|code| Continent { code: code.clone() })
            .ok_or_else(|| GeoError::UnknownContinent(name.to_string()))
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}
