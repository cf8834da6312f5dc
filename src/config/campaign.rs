//! Campaign files: one template plus the option lists it is crossed with.
//!
//! ```toml
//! site_id = "acme-plumbing"
//! template_file = "article.txt"
//! niches = ["drain cleaning", "water heaters"]
//!
//! [[avatars]]
//! id = "homeowner"
//! name = "Sam"
//! grammar = { pronoun = "they", isare = "are" }
//!
//! [locations]
//! mode = "city"
//! target_id = "TX"
//! catalog_file = "locations.json"
//! ```
//!
//! Relative paths resolve against the campaign file's directory.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cartesian::CartesianConfig;
use crate::config::loader::{parse_toml, read_file, ConfigError};
use crate::config::types::Defaults;
use crate::sources::{Avatar, DimensionSources, LocationCatalog, LocationMode, Pattern, StaticSource};

/// A campaign as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Campaign {
    /// Site identifier; used as the fingerprint namespace when set,
    /// otherwise `defaults.namespace` applies.
    #[serde(default)]
    pub site_id: Option<String>,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub template_file: Option<PathBuf>,
    #[serde(default)]
    pub avatars: Vec<Avatar>,
    #[serde(default)]
    pub niches: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<Pattern>,
    #[serde(default)]
    pub locations: Option<CampaignLocations>,
    #[serde(skip)]
    base_dir: PathBuf,
}

/// Location settings for a campaign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignLocations {
    #[serde(default)]
    pub mode: LocationMode,
    /// State code/name or county id narrowing the selection.
    #[serde(default)]
    pub target_id: Option<String>,
    /// JSON or TOML catalog file.
    #[serde(default)]
    pub catalog_file: Option<PathBuf>,
    /// Inline catalog, used when no file is given.
    #[serde(default)]
    pub catalog: Option<LocationCatalog>,
}

impl Campaign {
    /// Load and validate a campaign file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = read_file(path)?;
        let mut campaign: Campaign = parse_toml(path, &content)?;
        campaign.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        campaign.validate()?;
        Ok(campaign)
    }

    /// Validates the campaign.
    ///
    /// Checks:
    /// - `site_id`, when present, is not blank
    /// - Exactly one of `template` / `template_file` is set
    /// - Avatar and pattern ids are not blank
    /// - A location mode other than `none` has a catalog
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site_id.as_deref().is_some_and(|id| id.trim().is_empty()) {
            return Err(validation("site_id must not be empty"));
        }

        match (&self.template, &self.template_file) {
            (Some(_), Some(_)) => {
                return Err(validation("set either template or template_file, not both"))
            }
            (None, None) => return Err(validation("template or template_file is required")),
            _ => {}
        }

        if let Some(avatar) = self.avatars.iter().find(|a| a.id.trim().is_empty()) {
            return Err(validation(format!("avatar '{}' has an empty id", avatar.name)));
        }

        if self.patterns.iter().any(|p| p.id.trim().is_empty()) {
            return Err(validation("pattern ids must not be empty"));
        }

        if let Some(locations) = &self.locations {
            let has_catalog = locations.catalog_file.is_some() || locations.catalog.is_some();
            if locations.mode != LocationMode::None && !has_catalog {
                return Err(validation("locations need catalog_file or an inline catalog"));
            }
        }

        Ok(())
    }

    /// The template text, reading `template_file` if needed.
    pub fn template(&self) -> Result<String, ConfigError> {
        match (&self.template, &self.template_file) {
            (Some(inline), _) => Ok(inline.clone()),
            (None, Some(file)) => read_file(&self.resolve(file)),
            (None, None) => Err(validation("template or template_file is required")),
        }
    }

    /// The location catalog, if the campaign uses one.
    pub fn catalog(&self) -> Result<Option<LocationCatalog>, ConfigError> {
        let Some(locations) = &self.locations else {
            return Ok(None);
        };
        match (&locations.catalog_file, &locations.catalog) {
            (Some(file), _) => LocationCatalog::load(&self.resolve(file)).map(Some),
            (None, Some(inline)) => Ok(Some(inline.clone())),
            (None, None) => Ok(None),
        }
    }

    /// Dimension sources for the campaign: avatars, niches, patterns, locations.
    ///
    /// Empty lists are left out rather than collapsing the space to zero.
    /// The location catalog is passed whole; the request built by
    /// [`Campaign::cartesian_config`] carries the mode and target.
    pub fn sources(&self) -> Result<DimensionSources, ConfigError> {
        let mut sources = DimensionSources::new();

        if !self.avatars.is_empty() {
            sources = sources.with_list(StaticSource::avatars(&self.avatars));
        }
        if !self.niches.is_empty() {
            sources = sources.with_list(StaticSource::labels("niche", &self.niches));
        }
        if !self.patterns.is_empty() {
            sources = sources.with_list(StaticSource::patterns(&self.patterns));
        }

        if let Some(catalog) = self.catalog()? {
            sources = sources.with_location_catalog(catalog);
        }

        Ok(sources)
    }

    /// Fingerprint namespace: `site_id`, or `defaults.namespace` without one.
    pub fn namespace<'a>(&'a self, defaults: &'a Defaults) -> &'a str {
        self.site_id.as_deref().unwrap_or(&defaults.namespace)
    }

    /// Generation request for the first batch of this campaign.
    pub fn cartesian_config(&self, defaults: &Defaults) -> CartesianConfig {
        let (include_locations, location_mode, location_target_id) = match &self.locations {
            Some(l) => (l.mode != LocationMode::None, l.mode, l.target_id.clone()),
            None => (false, LocationMode::None, None),
        };
        CartesianConfig {
            max_combinations: defaults.max_combinations,
            include_locations,
            location_mode,
            location_target_id,
            batch_size: defaults.batch_size,
            offset: 0,
            all_or_nothing: false,
            content_dedup: defaults.content_dedup,
            namespace: self.namespace(defaults).to_string(),
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }
}

impl LocationCatalog {
    /// Load a catalog from a `.json` file, or TOML for any other extension.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = read_file(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            serde_json::from_str(&content).map_err(|e| ConfigError::JsonParseError {
                path: path.to_path_buf(),
                source: e,
            })
        } else {
            parse_toml(path, &content)
        }
    }
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        message: message.into(),
    }
}
