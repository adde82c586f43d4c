//! Declarative hierarchy definitions.
//!
//! ```toml
//! [[derive]]
//! tag = ":dog"
//! parent = ":animal"
//!
//! [[derive]]
//! tag = "[:dog :dog]"
//! parent = ":pair"
//! ```
//!
//! Tags use the literal syntax of [`crate::tag`]. Loading replays each edge
//! through [`Hierarchy::derive`] in file order, so cyclic and redundant edges
//! are rejected exactly as they would be at runtime.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Hierarchy;
use crate::error::{DispatchError, DispatchResult};
use crate::tag::Tag;

/// One `tag -> parent` edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeConfig {
    pub tag: Tag,
    pub parent: Tag,
}

/// A list of edges to derive, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyConfig {
    #[serde(default)]
    pub derive: Vec<EdgeConfig>,
}

impl HierarchyConfig {
    pub fn from_toml_str(src: &str) -> DispatchResult<Self> {
        toml::from_str(src).map_err(|e| DispatchError::Config(e.to_string()))
    }

    pub fn from_json_str(src: &str) -> DispatchResult<Self> {
        serde_json::from_str(src).map_err(|e| DispatchError::Config(e.to_string()))
    }

    /// Load a config file, choosing the format by extension (`.json`, else TOML).
    pub fn from_path(path: impl AsRef<Path>) -> DispatchResult<Self> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path)
            .map_err(|e| DispatchError::Config(format!("{}: {}", path.display(), e)))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&src),
            _ => Self::from_toml_str(&src),
        }
    }

    /// The direct edges of an existing hierarchy.
    ///
    /// A hierarchy holding a redundant direct edge may fail to `build` again,
    /// depending on edge order. Serialize the [`Hierarchy`] itself for an exact
    /// snapshot.
    pub fn from_hierarchy(h: &Hierarchy) -> Self {
        HierarchyConfig {
            derive: h
                .edges()
                .into_iter()
                .map(|(tag, parent)| EdgeConfig { tag, parent })
                .collect(),
        }
    }

    pub fn to_toml_string(&self) -> DispatchResult<String> {
        toml::to_string(self).map_err(|e| DispatchError::Config(e.to_string()))
    }

    /// Derive every edge into `base`.
    pub fn apply(&self, base: &Hierarchy) -> DispatchResult<Hierarchy> {
        self.derive.iter().try_fold(base.clone(), |h, edge| {
            h.derive(edge.tag.clone(), edge.parent.clone())
        })
    }

    pub fn build(&self) -> DispatchResult<Hierarchy> {
        self.apply(&Hierarchy::new())
    }
}
