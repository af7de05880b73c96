//! Candidate resolver: location names to filtered candidate sets.
//!
//! Tiers are tried narrowest first, widening a tier's names to their
//! broader geography before moving on to the next declared tier:
//!
//! ```text
//! city → city's country → city's continent
//!      → country → country's continent
//!      → continent
//! ```

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use geoplace_geo::{GeoReference, GeoResult};
use geoplace_inventory::{GeoTier, Node, NodeFilter, NodeInventory};
use tracing::debug;

use crate::location::LocationConstraint;

/// One step of the fallback cascade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CascadeStep {
    City,
    CityCountry,
    CityContinent,
    Country,
    CountryContinent,
    Continent,
}

impl CascadeStep {
    /// Every step, in the order a constraint is checked.
    pub const ORDER: [CascadeStep; 6] = [
        CascadeStep::City,
        CascadeStep::CityCountry,
        CascadeStep::CityContinent,
        CascadeStep::Country,
        CascadeStep::CountryContinent,
        CascadeStep::Continent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CascadeStep::City => "city",
            CascadeStep::CityCountry => "city-country",
            CascadeStep::CityContinent => "city-continent",
            CascadeStep::Country => "country",
            CascadeStep::CountryContinent => "country-continent",
            CascadeStep::Continent => "continent",
        }
    }

    /// The constraint segment this step reads its names from.
    pub fn names<'a>(&self, constraint: &'a LocationConstraint) -> &'a [String] {
        match self {
            CascadeStep::City | CascadeStep::CityCountry | CascadeStep::CityContinent => {
                &constraint.cities
            }
            CascadeStep::Country | CascadeStep::CountryContinent => &constraint.countries,
            CascadeStep::Continent => &constraint.continents,
        }
    }
}

impl fmt::Display for CascadeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves constraint tiers against the inventory.
#[derive(Clone)]
pub struct CandidateResolver {
    inventory: NodeInventory,
    geo: Arc<dyn GeoReference>,
}

impl CandidateResolver {
    pub fn new(inventory: NodeInventory, geo: Arc<dyn GeoReference>) -> Self {
        Self { inventory, geo }
    }

    /// Exact city buckets, then each city's country, then its continent.
    pub fn by_city_then_widen(&self, cities: &[String], filter: Option<&NodeFilter>) -> Vec<Node> {
        self.first_non_empty(
            &[CascadeStep::City, CascadeStep::CityCountry, CascadeStep::CityContinent],
            cities,
            filter,
        )
    }

    /// Exact country buckets, then each country's continent.
    pub fn by_country_then_widen(
        &self,
        countries: &[String],
        filter: Option<&NodeFilter>,
    ) -> Vec<Node> {
        self.first_non_empty(
            &[CascadeStep::Country, CascadeStep::CountryContinent],
            countries,
            filter,
        )
    }

    /// Exact continent buckets only.
    pub fn by_continent_exact(
        &self,
        continents: &[String],
        filter: Option<&NodeFilter>,
    ) -> Vec<Node> {
        self.step(CascadeStep::Continent, continents, filter)
    }

    /// Walk the whole cascade and return the first non-empty step.
    pub fn resolve(
        &self,
        constraint: &LocationConstraint,
        filter: Option<&NodeFilter>,
    ) -> Option<(CascadeStep, Vec<Node>)> {
        CascadeStep::ORDER.into_iter().find_map(|step| {
            let candidates = self.step(step, step.names(constraint), filter);
            if candidates.is_empty() {
                debug!(%step, "no candidates, widening");
                None
            } else {
                Some((step, candidates))
            }
        })
    }

    /// Candidates for a single step, pooled across names and de-duplicated.
    pub fn step(
        &self,
        step: CascadeStep,
        names: &[String],
        filter: Option<&NodeFilter>,
    ) -> Vec<Node> {
        if names.is_empty() {
            return Vec::new();
        }

        match step {
            CascadeStep::City => {
                pool(self.inventory.nodes_by_city(names, filter).into_values().flatten())
            }
            CascadeStep::CityCountry => self.widened(GeoTier::Country, names, filter, |name| {
                self.geo.resolve_subdivision(name).map(|city| city.country)
            }),
            CascadeStep::CityContinent => self.widened(GeoTier::Continent, names, filter, |name| {
                self.geo.resolve_subdivision(name).map(|city| city.continent)
            }),
            CascadeStep::Country => {
                pool(self.inventory.nodes_by_country(names, filter).into_values().flatten())
            }
            CascadeStep::CountryContinent => {
                self.widened(GeoTier::Continent, names, filter, |name| {
                    self.geo.resolve_country(name).map(|country| country.continent)
                })
            }
            CascadeStep::Continent => {
                pool(self.inventory.nodes_by_continent(names, filter).into_values().flatten())
            }
        }
    }

    fn first_non_empty(
        &self,
        steps: &[CascadeStep],
        names: &[String],
        filter: Option<&NodeFilter>,
    ) -> Vec<Node> {
        steps
            .iter()
            .map(|step| self.step(*step, names, filter))
            .find(|candidates| !candidates.is_empty())
            .unwrap_or_default()
    }

    /// Map names to broader canonical codes and collect those buckets.
    fn widened<F>(
        &self,
        tier: GeoTier,
        names: &[String],
        filter: Option<&NodeFilter>,
        widen: F,
    ) -> Vec<Node>
    where
        F: Fn(&str) -> GeoResult<String>,
    {
        let mut codes: Vec<String> = Vec::new();
        for name in names {
            match widen(name) {
                Ok(code) if !codes.contains(&code) => codes.push(code),
                Ok(_) => {}
                Err(e) => debug!(%tier, %name, error = %e, "cannot widen location"),
            }
        }

        pool(
            codes
                .iter()
                .flat_map(|code| self.inventory.nodes_in_bucket(tier, code, filter)),
        )
    }
}

/// Collect nodes, keeping the first occurrence of each name.
fn pool(nodes: impl IntoIterator<Item = Node>) -> Vec<Node> {
    let mut seen = HashSet::new();
    nodes
        .into_iter()
        .filter(|node| seen.insert(node.name.clone()))
        .collect()
}
