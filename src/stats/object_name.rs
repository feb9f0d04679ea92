//! Object names used to discover statistic sources.
//!
//! Names follow the `domain:key=value,key=value` layout. A pattern may end
//! with a `*` property, in which case names carrying extra key properties
//! still match.

use std::collections::BTreeMap;
use std::str::FromStr;

use thiserror::Error;

/// Errors raised while parsing an object name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ObjectNameError {
    /// No `:` separating the domain from the key properties.
    #[error("missing ':' domain separator in '{0}'")]
    MissingDomain(String),

    /// A key property that is not `key=value`.
    #[error("invalid key property '{property}' in '{name}'")]
    InvalidProperty { name: String, property: String },

    /// The same key appears twice.
    #[error("duplicate key '{key}' in '{name}'")]
    DuplicateKey { name: String, key: String },

    /// Neither key properties nor a wildcard.
    #[error("no key properties in '{0}'")]
    Empty(String),
}

/// A parsed `domain:key=value,...` name, optionally a wildcard pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectName {
    domain: String,
    properties: BTreeMap<String, String>,
    wildcard: bool,
}

impl ObjectName {
    /// Domain part, before the `:`.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Value of a key property, if present.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Whether this is a property-list wildcard pattern.
    pub fn is_pattern(&self) -> bool {
        self.wildcard
    }

    /// Whether `name` is selected by this pattern.
    ///
    /// Domains must be equal and every key property of the pattern must be
    /// present in `name` with the same value. Without a wildcard the
    /// property sets must also be the same size.
    pub fn matches(&self, name: &ObjectName) -> bool {
        if self.domain != name.domain {
            return false;
        }
        let selected = self
            .properties
            .iter()
            .all(|(k, v)| name.properties.get(k) == Some(v));
        selected && (self.wildcard || self.properties.len() == name.properties.len())
    }
}

impl FromStr for ObjectName {
    type Err = ObjectNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (domain, list) = s
            .split_once(':')
            .ok_or_else(|| ObjectNameError::MissingDomain(s.to_string()))?;

        let mut properties = BTreeMap::new();
        let mut wildcard = false;
        for property in list.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            if property == "*" {
                wildcard = true;
                continue;
            }
            let (key, value) = property
                .split_once('=')
                .filter(|(k, _)| !k.is_empty())
                .ok_or_else(|| ObjectNameError::InvalidProperty {
                    name: s.to_string(),
                    property: property.to_string(),
                })?;
            if properties
                .insert(key.to_string(), value.to_string())
                .is_some()
            {
                return Err(ObjectNameError::DuplicateKey {
                    name: s.to_string(),
                    key: key.to_string(),
                });
            }
        }

        if properties.is_empty() && !wildcard {
            return Err(ObjectNameError::Empty(s.to_string()));
        }

        Ok(Self {
            domain: domain.to_string(),
            properties,
            wildcard,
        })
    }
}

impl std::fmt::Display for ObjectName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:", self.domain)?;
        let mut parts: Vec<String> = self
            .properties
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        if self.wildcard {
            parts.push("*".to_string());
        }
        write!(f, "{}", parts.join(","))
    }
}
