//! Node inventory: primary node table plus derived geography indices.
//!
//! Every mutation takes the write lock once for the whole add, update or
//! delete, so readers observe each lifecycle event either completely or not
//! at all. Buckets store node names only; the node itself lives in the
//! primary table, which is the single source of truth.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use geoplace_geo::{GeoReference, GeoResult};
use rand::seq::IndexedRandom;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::error::{LookupError, LookupResult};
use crate::filter::{NodeFilter, matches};
use crate::node::{LabelKeys, Node, RawNode};

/// Granularity of a geography index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeoTier {
    City,
    Country,
    Continent,
}

impl GeoTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            GeoTier::City => "city",
            GeoTier::Country => "country",
            GeoTier::Continent => "continent",
        }
    }
}

impl fmt::Display for GeoTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sizes of the primary table and of each index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub nodes: usize,
    pub cities: usize,
    pub countries: usize,
    pub continents: usize,
}

/// A cached node and the bucket keys it was filed under when registered.
#[derive(Debug, Clone)]
struct Entry {
    node: Node,
    city: Option<String>,
    country: Option<String>,
    continent: Option<String>,
}

impl Entry {
    fn keys(&self) -> impl Iterator<Item = (GeoTier, &String)> {
        [
            (GeoTier::City, self.city.as_ref()),
            (GeoTier::Country, self.country.as_ref()),
            (GeoTier::Continent, self.continent.as_ref()),
        ]
        .into_iter()
        .filter_map(|(tier, key)| key.map(|key| (tier, key)))
    }
}

#[derive(Debug, Default)]
struct IndexState {
    nodes: HashMap<String, Entry>,
    cities: HashMap<String, Vec<String>>,
    countries: HashMap<String, Vec<String>>,
    continents: HashMap<String, Vec<String>>,
}

impl IndexState {
    fn buckets(&self, tier: GeoTier) -> &HashMap<String, Vec<String>> {
        match tier {
            GeoTier::City => &self.cities,
            GeoTier::Country => &self.countries,
            GeoTier::Continent => &self.continents,
        }
    }

    fn buckets_mut(&mut self, tier: GeoTier) -> &mut HashMap<String, Vec<String>> {
        match tier {
            GeoTier::City => &mut self.cities,
            GeoTier::Country => &mut self.countries,
            GeoTier::Continent => &mut self.continents,
        }
    }

    fn insert(&mut self, entry: Entry) {
        let name = entry.node.name.clone();
        for (tier, key) in entry.keys() {
            self.buckets_mut(tier)
                .entry(key.clone())
                .or_default()
                .push(name.clone());
        }
        self.nodes.insert(name, entry);
    }

    fn remove(&mut self, name: &str) -> Option<Entry> {
        let entry = self.nodes.remove(name)?;
        for (tier, key) in entry.keys() {
            let buckets = self.buckets_mut(tier);
            if let Some(members) = buckets.get_mut(key) {
                members.retain(|member| member != name);
                if members.is_empty() {
                    buckets.remove(key);
                }
            }
        }
        Some(entry)
    }

    fn bucket(&self, tier: GeoTier, key: &str, filter: Option<&NodeFilter>) -> Vec<Node> {
        self.buckets(tier)
            .get(key)
            .map(|names| {
                names
                    .iter()
                    .filter_map(|name| self.nodes.get(name))
                    .map(|entry| &entry.node)
                    .filter(|node| matches(node, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// Concurrently readable cache of the cluster's edge nodes.
///
/// Cloning is cheap and yields a handle to the same inventory.
#[derive(Clone)]
pub struct NodeInventory {
    geo: Arc<dyn GeoReference>,
    keys: Arc<LabelKeys>,
    state: Arc<RwLock<IndexState>>,
    pub(crate) applied: Arc<watch::Sender<u64>>,
}

impl NodeInventory {
    /// Create an empty inventory using the default label keys.
    pub fn new(geo: Arc<dyn GeoReference>) -> Self {
        Self {
            geo,
            keys: Arc::new(LabelKeys::default()),
            state: Arc::new(RwLock::new(IndexState::default())),
            applied: Arc::new(watch::channel(0).0),
        }
    }

    /// Override the label keys used to read raw nodes.
    pub fn with_label_keys(mut self, keys: LabelKeys) -> Self {
        self.keys = Arc::new(keys);
        self
    }

    /// The geography reference used for indexing.
    pub fn geo(&self) -> &Arc<dyn GeoReference> {
        &self.geo
    }

    pub fn label_keys(&self) -> &LabelKeys {
        &self.keys
    }

    // ── Lifecycle events ────────────────────────────────────────────

    /// Register a node reported as added.
    ///
    /// Nodes without the edge role label are ignored. A node whose name is
    /// already cached replaces the previous entry.
    pub fn apply_add(&self, raw: &RawNode) {
        if !self.keys.is_edge(raw) {
            debug!(node = %raw.name, "ignoring node without edge role");
            return;
        }

        let entry = self.prepare(raw);
        let mut state = self.state.write().expect("inventory lock");
        if state.remove(&raw.name).is_some() {
            warn!(node = %raw.name, "node already cached, replacing entry");
        }
        Self::log_added(&entry);
        state.insert(entry);
    }

    /// Apply an update reported by the control plane.
    pub fn apply_update(&self, old: &RawNode, new: &RawNode) {
        let was_edge = self.keys.is_edge(old);
        let is_edge = self.keys.is_edge(new);

        match (was_edge, is_edge) {
            (false, true) => self.apply_add(new),
            (true, false) => self.apply_delete(old),
            (false, false) => {
                debug!(node = %new.name, "ignoring update of non-edge node");
            }
            (true, true) if self.keys.has_significant_change(old, new) => {
                let entry = self.prepare(new);
                let mut state = self.state.write().expect("inventory lock");
                state.remove(&old.name);
                state.remove(&new.name);
                info!(old = %old.name, new = %new.name, "node re-indexed after location change");
                state.insert(entry);
            }
            (true, true) => {
                let mut state = self.state.write().expect("inventory lock");
                if let Some(entry) = state.nodes.get_mut(&new.name) {
                    entry.node.labels = new.labels.clone();
                    entry.node.available_cpu = new.available_cpu();
                    entry.node.available_memory = new.available_memory();
                    debug!(
                        node = %new.name,
                        cpu = entry.node.available_cpu,
                        memory = entry.node.available_memory,
                        "node resources refreshed"
                    );
                } else {
                    warn!(node = %new.name, "update for uncached edge node, adding it");
                    let entry = self.prepare(new);
                    Self::log_added(&entry);
                    state.insert(entry);
                }
            }
        }
    }

    /// Remove a node reported as deleted. Unknown nodes are a no-op.
    pub fn apply_delete(&self, raw: &RawNode) {
        if !self.keys.is_edge(raw) {
            debug!(node = %raw.name, "ignoring delete of node without edge role");
            return;
        }

        let mut state = self.state.write().expect("inventory lock");
        if state.remove(&raw.name).is_some() {
            info!(node = %raw.name, "node deleted from inventory");
        } else {
            debug!(node = %raw.name, "node not cached, nothing to delete");
        }
    }

    /// Deduct a placed workload's requests from a node's available capacity.
    ///
    /// Returns `false` when the node is not cached.
    pub fn reserve(&self, name: &str, cpu: u64, memory: u64) -> bool {
        let mut state = self.state.write().expect("inventory lock");
        match state.nodes.get_mut(name) {
            Some(entry) => {
                entry.node.available_cpu = entry.node.available_cpu.saturating_sub(cpu);
                entry.node.available_memory = entry.node.available_memory.saturating_sub(memory);
                debug!(
                    node = %name,
                    cpu = entry.node.available_cpu,
                    memory = entry.node.available_memory,
                    "capacity reserved"
                );
                true
            }
            None => false,
        }
    }

    /// Deduct a workload's requests only if the node still has room for
    /// them.
    ///
    /// The capacity check and the deduction happen under one write lock, so
    /// two decisions racing for the same capacity cannot both succeed.
    /// Returns `false` when the node is not cached or lacks capacity.
    pub fn try_reserve(&self, name: &str, cpu: u64, memory: u64) -> bool {
        let mut state = self.state.write().expect("inventory lock");
        let Some(entry) = state.nodes.get_mut(name) else {
            return false;
        };
        if !NodeFilter::resources(cpu, memory).matches(&entry.node) {
            debug!(
                node = %name,
                cpu = entry.node.available_cpu,
                memory = entry.node.available_memory,
                "not enough capacity left to reserve"
            );
            return false;
        }

        entry.node.available_cpu -= cpu;
        entry.node.available_memory -= memory;
        debug!(
            node = %name,
            cpu = entry.node.available_cpu,
            memory = entry.node.available_memory,
            "capacity reserved"
        );
        true
    }

    /// Give back capacity taken by [`reserve`](Self::reserve) or
    /// [`try_reserve`](Self::try_reserve). Unknown nodes are a no-op.
    pub fn release(&self, name: &str, cpu: u64, memory: u64) {
        let mut state = self.state.write().expect("inventory lock");
        if let Some(entry) = state.nodes.get_mut(name) {
            entry.node.available_cpu = entry.node.available_cpu.saturating_add(cpu);
            entry.node.available_memory = entry.node.available_memory.saturating_add(memory);
            debug!(
                node = %name,
                cpu = entry.node.available_cpu,
                memory = entry.node.available_memory,
                "capacity released"
            );
        }
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub fn count_nodes(&self) -> usize {
        self.state.read().expect("inventory lock").nodes.len()
    }

    /// Snapshot of every cached node.
    pub fn all_nodes(&self) -> Vec<Node> {
        self.nodes_matching(None)
    }

    /// Snapshot of every cached node that passes `filter`.
    pub fn nodes_matching(&self, filter: Option<&NodeFilter>) -> Vec<Node> {
        let state = self.state.read().expect("inventory lock");
        state
            .nodes
            .values()
            .map(|entry| &entry.node)
            .filter(|node| matches(node, filter))
            .cloned()
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<Node> {
        let state = self.state.read().expect("inventory lock");
        state.nodes.get(name).map(|entry| entry.node.clone())
    }

    pub fn bucket_sizes(&self) -> IndexStats {
        let state = self.state.read().expect("inventory lock");
        IndexStats {
            nodes: state.nodes.len(),
            cities: state.cities.len(),
            countries: state.countries.len(),
            continents: state.continents.len(),
        }
    }

    /// Filtered members of one bucket, addressed by canonical code.
    pub fn nodes_in_bucket(
        &self,
        tier: GeoTier,
        key: &str,
        filter: Option<&NodeFilter>,
    ) -> Vec<Node> {
        let state = self.state.read().expect("inventory lock");
        state.bucket(tier, key, filter)
    }

    /// Filtered nodes per city name. Unresolvable or empty names are omitted.
    pub fn nodes_by_city(
        &self,
        cities: &[String],
        filter: Option<&NodeFilter>,
    ) -> HashMap<String, Vec<Node>> {
        self.nodes_by(GeoTier::City, cities, filter, |name| self.resolve_key(GeoTier::City, name))
    }

    /// Filtered nodes per country identifier.
    pub fn nodes_by_country(
        &self,
        countries: &[String],
        filter: Option<&NodeFilter>,
    ) -> HashMap<String, Vec<Node>> {
        self.nodes_by(GeoTier::Country, countries, filter, |name| {
            self.resolve_key(GeoTier::Country, name)
        })
    }

    /// Filtered nodes per continent name.
    pub fn nodes_by_continent(
        &self,
        continents: &[String],
        filter: Option<&NodeFilter>,
    ) -> HashMap<String, Vec<Node>> {
        self.nodes_by(GeoTier::Continent, continents, filter, |name| {
            self.resolve_key(GeoTier::Continent, name)
        })
    }

    /// One eligible node from the first listed city that has any.
    pub fn any_node_by_city(
        &self,
        cities: &[String],
        filter: Option<&NodeFilter>,
    ) -> LookupResult<Node> {
        self.any_node(GeoTier::City, cities, filter, |name| self.resolve_key(GeoTier::City, name))
    }

    /// One eligible node in the country of the first listed city that has any.
    pub fn any_node_by_city_country(
        &self,
        cities: &[String],
        filter: Option<&NodeFilter>,
    ) -> LookupResult<Node> {
        self.any_node(GeoTier::Country, cities, filter, |name| {
            self.geo.resolve_subdivision(name).map(|city| city.country)
        })
    }

    /// One eligible node in the continent of the first listed city that has any.
    pub fn any_node_by_city_continent(
        &self,
        cities: &[String],
        filter: Option<&NodeFilter>,
    ) -> LookupResult<Node> {
        self.any_node(GeoTier::Continent, cities, filter, |name| {
            self.geo.resolve_subdivision(name).map(|city| city.continent)
        })
    }

    pub fn any_node_by_country(
        &self,
        countries: &[String],
        filter: Option<&NodeFilter>,
    ) -> LookupResult<Node> {
        self.any_node(GeoTier::Country, countries, filter, |name| {
            self.resolve_key(GeoTier::Country, name)
        })
    }

    pub fn any_node_by_country_continent(
        &self,
        countries: &[String],
        filter: Option<&NodeFilter>,
    ) -> LookupResult<Node> {
        self.any_node(GeoTier::Continent, countries, filter, |name| {
            self.geo.resolve_country(name).map(|country| country.continent)
        })
    }

    pub fn any_node_by_continent(
        &self,
        continents: &[String],
        filter: Option<&NodeFilter>,
    ) -> LookupResult<Node> {
        self.any_node(GeoTier::Continent, continents, filter, |name| {
            self.resolve_key(GeoTier::Continent, name)
        })
    }

    // ── Internal helpers ────────────────────────────────────────────

    /// Resolve a free-text identifier to the bucket key of `tier`.
    fn resolve_key(&self, tier: GeoTier, value: &str) -> GeoResult<String> {
        match tier {
            GeoTier::City => self.geo.resolve_subdivision(value).map(|city| city.city_code()),
            GeoTier::Country => self.geo.resolve_country(value).map(|country| country.alpha2),
            GeoTier::Continent => self.geo.resolve_continent(value).map(|continent| continent.code),
        }
    }

    /// Build the cache entry for a raw node, resolving its geography labels.
    fn prepare(&self, raw: &RawNode) -> Entry {
        Entry {
            node: raw.to_node(),
            city: self.index_key(raw, GeoTier::City, self.keys.city(raw)),
            country: self.index_key(raw, GeoTier::Country, self.keys.country(raw)),
            continent: self.index_key(raw, GeoTier::Continent, self.keys.continent(raw)),
        }
    }

    fn index_key(&self, raw: &RawNode, tier: GeoTier, value: Option<&str>) -> Option<String> {
        let value = value?;
        match self.resolve_key(tier, value) {
            Ok(key) => Some(key),
            Err(e) => {
                error!(
                    node = %raw.name,
                    %tier,
                    label = value,
                    error = %e,
                    "node geography not indexed"
                );
                None
            }
        }
    }

    fn log_added(entry: &Entry) {
        info!(
            node = %entry.node.name,
            city = ?entry.city,
            country = ?entry.country,
            continent = ?entry.continent,
            "node added to inventory"
        );
    }

    fn nodes_by<F>(
        &self,
        tier: GeoTier,
        names: &[String],
        filter: Option<&NodeFilter>,
        resolve: F,
    ) -> HashMap<String, Vec<Node>>
    where
        F: Fn(&str) -> GeoResult<String>,
    {
        let state = self.state.read().expect("inventory lock");
        let mut found = HashMap::new();

        for name in names.iter().filter(|name| !name.trim().is_empty()) {
            match resolve(name) {
                Ok(key) => {
                    let options = state.bucket(tier, &key, filter);
                    if !options.is_empty() {
                        found.insert(name.clone(), options);
                    }
                }
                Err(e) => debug!(%tier, %name, error = %e, "skipping unresolvable location"),
            }
        }

        found
    }

    fn any_node<F>(
        &self,
        tier: GeoTier,
        names: &[String],
        filter: Option<&NodeFilter>,
        resolve: F,
    ) -> LookupResult<Node>
    where
        F: Fn(&str) -> GeoResult<String>,
    {
        let state = self.state.read().expect("inventory lock");
        let mut unresolved = None;

        for name in names.iter().filter(|name| !name.trim().is_empty()) {
            match resolve(name) {
                Ok(key) => {
                    let options = state.bucket(tier, &key, filter);
                    if let Some(node) = options.choose(&mut rand::rng()) {
                        return Ok(node.clone());
                    }
                }
                Err(e) => {
                    debug!(%tier, %name, error = %e, "location identifier not resolvable");
                    unresolved.get_or_insert_with(|| name.clone());
                }
            }
        }

        Err(unresolved.map_or(LookupError::NoLocationMatch, LookupError::UnresolvableLocation))
    }
}

#[cfg(test)]
mod tests {
    use geoplace_geo::Gazetteer;

    use super::*;

    fn test_inventory() -> NodeInventory {
        NodeInventory::new(Arc::new(Gazetteer::builtin()))
    }

    fn edge_node(name: &str, city: &str, country: &str, continent: &str) -> RawNode {
        let keys = LabelKeys::default();
        RawNode::new(name)
            .with_label(&keys.role, "")
            .with_label(&keys.city, city)
            .with_label(&keys.country, country)
            .with_label(&keys.continent, continent)
            .with_allocatable(20_000, 20_000)
    }

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn starts_empty() {
        let inventory = test_inventory();
        assert_eq!(inventory.count_nodes(), 0);
        assert!(inventory.all_nodes().is_empty());
        assert_eq!(inventory.bucket_sizes(), IndexStats::default());
    }

    #[test]
    fn add_edge_node_indexes_every_tier() {
        let inventory = test_inventory();
        inventory.apply_add(&edge_node("Node0", "Braga", "Portugal", "Europe"));

        assert_eq!(inventory.count_nodes(), 1);
        assert_eq!(inventory.nodes_in_bucket(GeoTier::City, "PT-03", None).len(), 1);
        assert_eq!(inventory.nodes_in_bucket(GeoTier::Country, "PT", None).len(), 1);
        assert_eq!(inventory.nodes_in_bucket(GeoTier::Continent, "EU", None).len(), 1);

        let city = inventory.any_node_by_city(&names(&["Braga"]), None).unwrap();
        assert_eq!(city.name, "Node0");
        let country = inventory.any_node_by_country(&names(&["Portugal"]), None).unwrap();
        assert_eq!(country.name, "Node0");
        let continent = inventory.any_node_by_continent(&names(&["Europe"]), None).unwrap();
        assert_eq!(continent.name, "Node0");
    }

    #[test]
    fn unresolvable_geography_still_registers_node() {
        let inventory = test_inventory();
        inventory.apply_add(&edge_node("Node0", "RANDOM_C_123", "RANDOM_C_123", "RANDOM_C_123"));

        assert_eq!(
            inventory.bucket_sizes(),
            IndexStats {
                nodes: 1,
                cities: 0,
                countries: 0,
                continents: 0,
            }
        );
    }

    #[test]
    fn one_bad_label_does_not_block_the_others() {
        let inventory = test_inventory();
        inventory.apply_add(&edge_node("Node0", "RANDOM_C_123", "PT", "Europe"));

        let stats = inventory.bucket_sizes();
        assert_eq!(stats.cities, 0);
        assert_eq!(stats.countries, 1);
        assert_eq!(stats.continents, 1);
    }

    #[test]
    fn synonyms_share_a_bucket() {
        let inventory = test_inventory();
        inventory.apply_add(&edge_node("Node0", "Lisboa", "Portugal", "Europe"));
        inventory.apply_add(&edge_node("Node1", "Lisbon", "PT", "EU"));

        let stats = inventory.bucket_sizes();
        assert_eq!(stats.cities, 1);
        assert_eq!(stats.countries, 1);
        assert_eq!(stats.continents, 1);
        assert_eq!(inventory.nodes_in_bucket(GeoTier::City, "PT-11", None).len(), 2);
    }

    #[test]
    fn ignores_node_without_edge_role() {
        let inventory = test_inventory();
        inventory.apply_add(&RawNode::new("Node0").with_allocatable(1, 1));
        assert_eq!(inventory.count_nodes(), 0);
    }

    #[test]
    fn re_adding_same_name_replaces_entry() {
        let inventory = test_inventory();
        inventory.apply_add(&edge_node("Node0", "Braga", "Portugal", "Europe"));
        inventory.apply_add(&edge_node("Node0", "Porto", "Portugal", "Europe"));

        assert_eq!(inventory.count_nodes(), 1);
        assert!(inventory.nodes_in_bucket(GeoTier::City, "PT-03", None).is_empty());
        assert_eq!(inventory.nodes_in_bucket(GeoTier::City, "PT-13", None).len(), 1);
        assert_eq!(inventory.nodes_in_bucket(GeoTier::Country, "PT", None).len(), 1);
    }

    #[test]
    fn significant_update_moves_city_bucket() {
        let inventory = test_inventory();
        let old = edge_node("Node0", "Braga", "Portugal", "Europe");
        inventory.apply_add(&old);
        assert_eq!(inventory.nodes_in_bucket(GeoTier::City, "PT-03", None).len(), 1);

        let new = edge_node("Node0", "Porto", "Portugal", "Europe");
        inventory.apply_update(&old, &new);

        assert!(inventory.nodes_in_bucket(GeoTier::City, "PT-03", None).is_empty());
        assert_eq!(inventory.nodes_in_bucket(GeoTier::City, "PT-13", None).len(), 1);
        assert_eq!(inventory.count_nodes(), 1);
    }

    #[test]
    fn insignificant_update_mutates_in_place() {
        let inventory = test_inventory();
        let old = edge_node("Node0", "Braga", "Portugal", "Europe");
        inventory.apply_add(&old);

        let new = old
            .clone()
            .with_label("test_label", "test")
            .with_allocatable(30_000, 40_000)
            .with_reserved(10_000, 0);
        inventory.apply_update(&old, &new);

        let node = inventory.get("Node0").unwrap();
        assert_eq!(node.labels.get("test_label").map(String::as_str), Some("test"));
        assert_eq!(node.available_cpu, 20_000);
        assert_eq!(node.available_memory, 40_000);
        assert_eq!(inventory.nodes_in_bucket(GeoTier::City, "PT-03", None).len(), 1);
    }

    #[test]
    fn gaining_role_adds_and_losing_role_deletes() {
        let inventory = test_inventory();
        let keys = LabelKeys::default();
        let plain = RawNode::new("Node0").with_label(&keys.city, "Braga");
        let edge = edge_node("Node0", "Braga", "", "");

        inventory.apply_update(&plain, &edge);
        assert_eq!(inventory.count_nodes(), 1);
        assert_eq!(inventory.bucket_sizes().cities, 1);

        inventory.apply_update(&edge, &plain);
        assert_eq!(inventory.count_nodes(), 0);
        assert_eq!(inventory.bucket_sizes(), IndexStats::default());
    }

    #[test]
    fn update_between_non_edge_nodes_is_ignored() {
        let inventory = test_inventory();
        inventory.apply_update(&RawNode::new("a"), &RawNode::new("a").with_allocatable(5, 5));
        assert_eq!(inventory.count_nodes(), 0);
    }

    #[test]
    fn update_of_uncached_edge_node_adds_it() {
        let inventory = test_inventory();
        let raw = edge_node("Node0", "Braga", "Portugal", "Europe");
        inventory.apply_update(&raw, &raw.clone().with_allocatable(1, 1));
        assert_eq!(inventory.get("Node0").unwrap().available_cpu, 1);
        assert_eq!(inventory.bucket_sizes().cities, 1);
    }

    #[test]
    fn add_then_delete_restores_prior_state() {
        let inventory = test_inventory();
        inventory.apply_add(&edge_node("Node1", "Madrid", "Spain", "Europe"));
        let before = inventory.bucket_sizes();

        let node = edge_node("Node0", "Braga", "Portugal", "Europe");
        inventory.apply_add(&node);
        inventory.apply_delete(&node);

        assert_eq!(inventory.bucket_sizes(), before);
        assert!(inventory.nodes_in_bucket(GeoTier::City, "PT-03", None).is_empty());
        assert!(inventory.nodes_in_bucket(GeoTier::Country, "PT", None).is_empty());
        assert_eq!(inventory.nodes_in_bucket(GeoTier::Continent, "EU", None).len(), 1);
    }

    #[test]
    fn delete_of_unknown_node_is_noop() {
        let inventory = test_inventory();
        inventory.apply_add(&edge_node("Node0", "Braga", "Portugal", "Europe"));
        let before = inventory.bucket_sizes();

        inventory.apply_delete(&edge_node("Ghost", "RANDOM_C_123", "RANDOM_C_123", ""));
        inventory.apply_delete(&edge_node("Ghost", "Braga", "Portugal", "Europe"));

        assert_eq!(inventory.bucket_sizes(), before);
    }

    #[test]
    fn delete_without_role_label_is_noop() {
        let inventory = test_inventory();
        inventory.apply_add(&edge_node("Node0", "", "", ""));
        inventory.apply_delete(&RawNode::new("Node0"));
        assert_eq!(inventory.count_nodes(), 1);
    }

    #[test]
    fn nodes_matching_applies_filter() {
        let inventory = test_inventory();
        inventory.apply_add(&edge_node("big", "Braga", "Portugal", "Europe"));
        inventory.apply_add(
            &edge_node("small", "Braga", "Portugal", "Europe").with_allocatable(5_000, 5_000),
        );

        let filter = NodeFilter::resources(10_000, 10_000);
        let matching = inventory.nodes_matching(Some(&filter));
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].name, "big");
        assert_eq!(inventory.all_nodes().len(), 2);
    }

    #[test]
    fn nodes_by_city_omits_unresolvable_and_empty() {
        let inventory = test_inventory();
        inventory.apply_add(&edge_node("Node0", "Braga", "Portugal", "Europe"));

        let found = inventory.nodes_by_city(&names(&["Braga", "Porto", "RANDOM_C_123", ""]), None);
        assert_eq!(found.len(), 1);
        assert_eq!(found["Braga"][0].name, "Node0");

        let filter = NodeFilter::resources(50_000, 0);
        assert!(inventory.nodes_by_city(&names(&["Braga"]), Some(&filter)).is_empty());
    }

    #[test]
    fn nodes_by_country_and_continent_key_by_input_name() {
        let inventory = test_inventory();
        inventory.apply_add(&edge_node("Node0", "Braga", "Portugal", "Europe"));

        let by_country = inventory.nodes_by_country(&names(&["PT", "Spain"]), None);
        assert_eq!(by_country.keys().collect::<Vec<_>>(), vec!["PT"]);

        let by_continent = inventory.nodes_by_continent(&names(&["Europe", "Asia"]), None);
        assert_eq!(by_continent.keys().collect::<Vec<_>>(), vec!["Europe"]);
    }

    #[test]
    fn any_node_widens_from_city() {
        let inventory = test_inventory();
        inventory.apply_add(&edge_node("Node0", "Braga", "Portugal", "Europe"));

        let same_country = inventory.any_node_by_city_country(&names(&["Porto"]), None).unwrap();
        assert_eq!(same_country.name, "Node0");

        let same_continent = inventory
            .any_node_by_city_continent(&names(&["Madrid"]), None)
            .unwrap();
        assert_eq!(same_continent.name, "Node0");
    }

    #[test]
    fn any_node_widens_from_country() {
        let inventory = test_inventory();
        inventory.apply_add(&edge_node("Node0", "Braga", "Portugal", "Europe"));

        let node = inventory.any_node_by_country(&names(&["PT"]), None).unwrap();
        assert_eq!(node.name, "Node0");

        let node = inventory.any_node_by_country_continent(&names(&["Spain"]), None).unwrap();
        assert_eq!(node.name, "Node0");
    }

    #[test]
    fn any_node_distinguishes_unresolvable_from_no_match() {
        let inventory = test_inventory();

        assert_eq!(
            inventory.any_node_by_city(&names(&["Braga"]), None),
            Err(LookupError::NoLocationMatch)
        );
        assert_eq!(
            inventory.any_node_by_city_country(&names(&["RANDOM_C_123"]), None),
            Err(LookupError::UnresolvableLocation("RANDOM_C_123".to_string()))
        );
        assert_eq!(
            inventory.any_node_by_city_continent(&names(&["Braga"]), None),
            Err(LookupError::NoLocationMatch)
        );
        assert_eq!(
            inventory.any_node_by_country(&names(&["Nowhere", "PT"]), None),
            Err(LookupError::UnresolvableLocation("Nowhere".to_string()))
        );
        assert_eq!(
            inventory.any_node_by_continent(&names(&[]), None),
            Err(LookupError::NoLocationMatch)
        );
    }

    #[test]
    fn any_node_keeps_scanning_after_unresolvable_name() {
        let inventory = test_inventory();
        inventory.apply_add(&edge_node("Node0", "Braga", "Portugal", "Europe"));

        let node = inventory.any_node_by_city(&names(&["RANDOM_C_123", "Braga"]), None).unwrap();
        assert_eq!(node.name, "Node0");
    }

    #[test]
    fn any_node_prefers_earlier_names() {
        let inventory = test_inventory();
        inventory.apply_add(&edge_node("braga", "Braga", "Portugal", "Europe"));
        inventory.apply_add(&edge_node("porto", "Porto", "Portugal", "Europe"));

        for _ in 0..20 {
            let node = inventory.any_node_by_city(&names(&["Porto", "Braga"]), None).unwrap();
            assert_eq!(node.name, "porto");
        }
    }

    #[test]
    fn reserve_reduces_available_capacity() {
        let inventory = test_inventory();
        inventory.apply_add(&edge_node("Node0", "Braga", "Portugal", "Europe"));

        assert!(inventory.reserve("Node0", 15_000, 25_000));
        let node = inventory.get("Node0").unwrap();
        assert_eq!(node.available_cpu, 5_000);
        assert_eq!(node.available_memory, 0);

        assert!(!inventory.reserve("Ghost", 1, 1));
    }

    #[test]
    fn try_reserve_refuses_what_is_already_taken() {
        let inventory = test_inventory();
        inventory.apply_add(&edge_node("Node0", "Braga", "Portugal", "Europe"));

        assert!(inventory.try_reserve("Node0", 15_000, 15_000));
        assert!(!inventory.try_reserve("Node0", 15_000, 15_000));
        assert!(!inventory.try_reserve("Node0", 1_000, 6_000));
        assert!(inventory.try_reserve("Node0", 5_000, 0));

        let node = inventory.get("Node0").unwrap();
        assert_eq!(node.available_cpu, 0);
        assert_eq!(node.available_memory, 5_000);
        assert!(!inventory.try_reserve("Ghost", 0, 0));
    }

    #[test]
    fn release_returns_reserved_capacity() {
        let inventory = test_inventory();
        inventory.apply_add(&edge_node("Node0", "Braga", "Portugal", "Europe"));

        assert!(inventory.try_reserve("Node0", 15_000, 15_000));
        inventory.release("Node0", 15_000, 15_000);
        assert!(inventory.try_reserve("Node0", 20_000, 20_000));

        inventory.release("Ghost", 1, 1);
        assert!(inventory.get("Ghost").is_none());
    }

    #[test]
    fn concurrent_try_reserve_never_overcommits() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::thread;

        let inventory = test_inventory();
        inventory.apply_add(&edge_node("Node0", "Braga", "Portugal", "Europe"));
        let granted = Arc::new(AtomicUsize::new(0));

        let workers: Vec<_> = (0..8)
            .map(|_| {
                let inventory = inventory.clone();
                let granted = granted.clone();
                thread::spawn(move || {
                    if inventory.try_reserve("Node0", 15_000, 15_000) {
                        granted.fetch_add(1, Ordering::SeqCst);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        assert_eq!(granted.load(Ordering::SeqCst), 1);
        assert_eq!(inventory.get("Node0").unwrap().available_cpu, 5_000);
    }

    #[test]
    fn readers_never_observe_partial_index() {
        use std::thread;

        let inventory = test_inventory();
        let node = edge_node("Node0", "Braga", "Portugal", "Europe");

        let writer = {
            let inventory = inventory.clone();
            thread::spawn(move || {
                for _ in 0..500 {
                    inventory.apply_add(&node);
                    inventory.apply_delete(&node);
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let inventory = inventory.clone();
                thread::spawn(move || {
                    for _ in 0..500 {
                        let stats = inventory.bucket_sizes();
                        assert_eq!(stats.cities, stats.nodes);
                        assert_eq!(stats.countries, stats.nodes);
                        assert_eq!(stats.continents, stats.nodes);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
        assert_eq!(inventory.count_nodes(), 0);
    }
}
