//! Dimension sources: index-addressable option lists.
//!
//! The engine never owns option data. Each list dimension (avatars, niches,
//! patterns, locations) is backed by a [`DimensionSource`] that can return
//! option `i` in O(1). Sources may be remote; `fetch` is async and the
//! engine holds no locks while awaiting it.

pub mod location;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::SourceError;
use crate::template::{Variables, Variant};

pub use location::{Location, LocationCatalog, LocationMode};

/// Concrete value of one option in a list dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DimensionValue {
    /// Canonical identity of the option; feeds the structural fingerprint.
    pub key: String,
    /// Human-readable label reported back in results.
    pub label: String,
    /// Grammar entries contributed to `[[KEY]]` resolution.
    pub variant: Variant,
    /// Values contributed to `{{key}}` resolution.
    pub variables: Variables,
    pub location: Option<Location>,
}

/// Index-addressable lookup for one dimension.
#[async_trait]
pub trait DimensionSource: Send + Sync {
    /// Dimension identifier (e.g., "avatar", "niche", "location").
    fn id(&self) -> &str;

    /// Number of options. Must be known before any index is decoded.
    fn len(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return option `index`, where `index < len()`.
    async fn fetch(&self, index: u64) -> Result<DimensionValue, SourceError>;
}

/// The list dimensions supplied to the engine.
///
/// `location` is a catalog rather than a list: each request picks its
/// entries with `location_mode` and `location_target_id`, and decides
/// whether they take part at all. `lists` always take part, in the order
/// given.
#[derive(Clone, Default)]
pub struct DimensionSources {
    pub location: Option<Arc<LocationCatalog>>,
    pub lists: Vec<Arc<dyn DimensionSource>>,
}

impl DimensionSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_list(mut self, source: impl DimensionSource + 'static) -> Self {
        self.lists.push(Arc::new(source));
        self
    }

    /// Catalog that location requests select from.
    pub fn with_location_catalog(mut self, catalog: LocationCatalog) -> Self {
        self.location = Some(Arc::new(catalog));
        self
    }
}

/// Persona used to fill grammar tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Avatar {
    pub id: String,
    pub name: String,
    /// Grammar entries such as `pronoun`, `isare`, `hashave`.
    #[serde(default)]
    pub grammar: Variant,
}

/// Structural pattern that contributes variables such as a headline style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    pub id: String,
    #[serde(default)]
    pub variables: Variables,
}

/// A source backed by an in-memory list.
#[derive(Debug, Clone)]
pub struct StaticSource {
    id: String,
    values: Vec<DimensionValue>,
}

impl StaticSource {
    pub fn new(id: impl Into<String>, values: Vec<DimensionValue>) -> Self {
        Self {
            id: id.into(),
            values,
        }
    }

    /// Plain labels exposed as `{{<id>}}` variables.
    pub fn labels(id: impl Into<String>, labels: &[String]) -> Self {
        let id = id.into();
        let values = labels
            .iter()
            .map(|label| DimensionValue {
                key: label.clone(),
                label: label.clone(),
                variables: [(id.clone(), label.clone())].into_iter().collect(),
                ..DimensionValue::default()
            })
            .collect();
        Self { id, values }
    }

    /// Avatars contribute their grammar entries plus `{{avatar_name}}`.
    pub fn avatars(avatars: &[Avatar]) -> Self {
        let values = avatars
            .iter()
            .map(|avatar| DimensionValue {
                key: avatar.id.clone(),
                label: avatar.name.clone(),
                variant: avatar.grammar.clone(),
                variables: [("avatar_name".to_string(), avatar.name.clone())]
                    .into_iter()
                    .collect(),
                location: None,
            })
            .collect();
        Self::new("avatar", values)
    }

    /// Patterns contribute their variables plus `{{pattern}}`.
    pub fn patterns(patterns: &[Pattern]) -> Self {
        let values = patterns
            .iter()
            .map(|pattern| {
                let mut variables = pattern.variables.clone();
                variables.insert("pattern".to_string(), pattern.id.clone());
                DimensionValue {
                    key: pattern.id.clone(),
                    label: pattern.id.clone(),
                    variables,
                    ..DimensionValue::default()
                }
            })
            .collect();
        Self::new("pattern", values)
    }

    /// Locations contribute `city`, `county`, `state` and `state_code` variables.
    pub fn locations(locations: Vec<Location>) -> Self {
        let values = locations
            .into_iter()
            .map(|location| DimensionValue {
                key: location.key(),
                label: location.label(),
                variables: location.variables(),
                variant: Variant::new(),
                location: Some(location),
            })
            .collect();
        Self::new("location", values)
    }
}

#[async_trait]
impl DimensionSource for StaticSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn len(&self) -> u64 {
        self.values.len() as u64
    }

    async fn fetch(&self, index: u64) -> Result<DimensionValue, SourceError> {
        usize::try_from(index)
            .ok()
            .and_then(|i| self.values.get(i))
            .cloned()
            .ok_or_else(|| SourceError::NotFound {
                dimension: self.id.clone(),
                index,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_labels_source() {
        let source = StaticSource::labels("niche", &["roofing".to_string(), "hvac".to_string()]);
        assert_eq!(source.id(), "niche");
        assert_eq!(source.len(), 2);

        let value = source.fetch(1).await.unwrap();
        assert_eq!(value.key, "hvac");
        assert_eq!(value.variables.get("niche").map(String::as_str), Some("hvac"));
    }

    #[tokio::test]
    async fn test_fetch_out_of_range() {
        let source = StaticSource::labels("niche", &[]);
        assert!(source.is_empty());
        assert_eq!(
            source.fetch(0).await,
            Err(SourceError::NotFound {
                dimension: "niche".to_string(),
                index: 0
            })
        );
    }

    #[tokio::test]
    async fn test_avatar_source_carries_grammar() {
        let avatar = Avatar {
            id: "av-1".to_string(),
            name: "Sarah".to_string(),
            grammar: [("pronoun".to_string(), "she".to_string())]
                .into_iter()
                .collect(),
        };
        let source = StaticSource::avatars(&[avatar]);
        let value = source.fetch(0).await.unwrap();
        assert_eq!(value.key, "av-1");
        assert_eq!(value.variant.get("pronoun").map(String::as_str), Some("she"));
        assert_eq!(value.variables.get("avatar_name").map(String::as_str), Some("Sarah"));
    }

    #[tokio::test]
    async fn test_pattern_source() {
        let pattern = Pattern {
            id: "listicle".to_string(),
            variables: [("headline_style".to_string(), "Top 10".to_string())]
                .into_iter()
                .collect(),
        };
        let value = StaticSource::patterns(&[pattern]).fetch(0).await.unwrap();
        assert_eq!(value.variables.get("pattern").map(String::as_str), Some("listicle"));
        assert_eq!(value.variables.len(), 2);
    }
}
