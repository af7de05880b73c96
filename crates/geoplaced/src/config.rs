//! geoplaced.toml configuration.
//!
//! Every section is optional:
//!
//! ```toml
//! [scheduler]
//! algorithm = "location"
//!
//! [labels]
//! role = "node-role.kubernetes.io/edge"
//! city = "node.geoplace.io/city"
//!
//! [workload_labels]
//! required = "deployment.geoplace.io/requiredLocation"
//!
//! [geo]
//! extra_table = "/etc/geoplace/gazetteer.toml"
//!
//! [log]
//! filter = "info,geoplaced=debug"
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use geoplace_geo::Gazetteer;
use geoplace_inventory::LabelKeys;
use geoplace_placement::{AlgorithmKind, LocationLabels};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub scheduler: SchedulerSection,
    pub labels: LabelKeys,
    pub workload_labels: LocationLabels,
    pub geo: GeoSection,
    pub log: LogSection,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerSection {
    pub algorithm: AlgorithmKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeoSection {
    /// Table merged over the builtin gazetteer.
    pub extra_table: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            filter: "info,geoplaced=debug".to_string(),
        }
    }
}

impl DaemonConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// The builtin gazetteer, extended by the configured table if any.
    pub fn gazetteer(&self) -> anyhow::Result<Gazetteer> {
        let mut gazetteer = Gazetteer::builtin();
        if let Some(path) = &self.geo.extra_table {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("reading gazetteer table {}", path.display()))?;
            let data = geoplace_geo::GazetteerData::from_toml_str(&content)
                .with_context(|| format!("parsing gazetteer table {}", path.display()))?;
            gazetteer.merge(&data);
        }
        Ok(gazetteer)
    }
}
