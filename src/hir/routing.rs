//! Plugin routing: redirects, deprecations and tombstones declared by a
//! collection's runtime metadata.
//!
//! ```yaml
//! plugin_routing:
//!   modules:
//!     old_name:
//!       redirect: community.general.new_name
//!       deprecation:
//!         removal_version: 3.0.0
//!         warning_text: Use new_name instead.
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;
use tracing::warn;

/// Removal details attached to a deprecation or a tombstone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct RemovalInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub removal_version: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub removal_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub warning_text: Option<String>,
}

/// Routing entry for one plugin name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct PluginRoute {
    #[serde(default, deserialize_with = "lenient_string")]
    pub redirect: Option<String>,
    #[serde(default)]
    pub deprecation: Option<RemovalInfo>,
    #[serde(default)]
    pub tombstone: Option<RemovalInfo>,
}

impl PluginRoute {
    pub fn redirect(target: impl Into<String>) -> Self {
        Self {
            redirect: Some(target.into()),
            ..Self::default()
        }
    }

    pub fn tombstone(info: RemovalInfo) -> Self {
        Self {
            tombstone: Some(info),
            ..Self::default()
        }
    }

    pub fn with_deprecation(mut self, info: RemovalInfo) -> Self {
        self.deprecation = Some(info);
        self
    }

    pub fn is_tombstoned(&self) -> bool {
        self.tombstone.is_some()
    }

    /// The redirect target, unless the plugin has been removed.
    pub fn live_redirect(&self) -> Option<&str> {
        match self.tombstone {
            Some(_) => None,
            None => self.redirect.as_deref(),
        }
    }
}

/// Module routes declared by one collection, in file order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RoutingTable {
    /// `namespace.collection` the routes belong to.
    pub collection: String,
    pub modules: IndexMap<String, PluginRoute>,
}

impl RoutingTable {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            modules: IndexMap::new(),
        }
    }

    pub fn with_module(mut self, name: impl Into<String>, route: PluginRoute) -> Self {
        self.modules.insert(name.into(), route);
        self
    }

    /// Parse a runtime metadata file.
    ///
    /// Only a file that is not YAML at all is an error. A missing
    /// `plugin_routing.modules` section yields an empty table, and single
    /// entries that do not have the expected shape are skipped.
    pub fn parse(collection: impl Into<String>, text: &str) -> Result<Self, serde_yaml::Error> {
        let mut table = Self::new(collection);
        let document: Value = serde_yaml::from_str(text)?;

        let Some(modules) = document
            .get("plugin_routing")
            .and_then(|routing| routing.get("modules"))
            .and_then(Value::as_mapping)
        else {
            return Ok(table);
        };

        for (name, entry) in modules {
            let Some(name) = scalar_to_string(name) else {
                continue;
            };
            match PluginRoute::deserialize(entry.clone()) {
                Ok(route) => {
                    table.modules.insert(name, route);
                }
                Err(err) => {
                    warn!(
                        "[ROUTING] skipping malformed route {}.{}: {}",
                        table.collection, name, err
                    );
                }
            }
        }
        Ok(table)
    }

    pub fn get(&self, name: &str) -> Option<&PluginRoute> {
        self.modules.get(name)
    }

    /// Fully qualified names of routes that still lead somewhere.
    pub fn live_redirect_fqcns(&self) -> impl Iterator<Item = String> + '_ {
        self.modules
            .iter()
            .filter(|(_, route)| route.live_redirect().is_some())
            .map(|(name, _)| format!("{}.{}", self.collection, name))
    }
}

/// Split an FQCN into `namespace.collection` and the plugin name.
///
/// Names with fewer than three segments are not fully qualified.
pub fn split_fqcn(fqcn: &str) -> Option<(&str, &str)> {
    let first = fqcn.find('.')?;
    let second = first + 1 + fqcn[first + 1..].find('.')?;
    let name = &fqcn[second + 1..];
    if first == 0 || second == first + 1 || name.is_empty() {
        return None;
    }
    Some((&fqcn[..second], name))
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Runtime files write versions as bare numbers (`removal_version: 2.0`).
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_to_string))
}
