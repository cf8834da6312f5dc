//! Location catalog: a state → county → city tree flattened into one dimension.

use serde::{Deserialize, Serialize};

use crate::template::Variables;

/// Granularity of the location dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationMode {
    State,
    County,
    City,
    #[default]
    None,
}

/// One selected location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub county: Option<String>,
    pub state: String,
    pub state_code: String,
}

impl Location {
    /// Stable identity: the explicit id, or `STATE/county/city` from the names present.
    pub fn key(&self) -> String {
        if let Some(id) = &self.id {
            return id.clone();
        }
        let mut key = self.state_code.clone();
        for part in [&self.county, &self.city].into_iter().flatten() {
            key.push('/');
            key.push_str(part);
        }
        key
    }

    /// Display label such as "Austin, TX", "Travis County, TX" or "Texas".
    pub fn label(&self) -> String {
        match (&self.city, &self.county) {
            (Some(city), _) => format!("{}, {}", city, self.state_code),
            (None, Some(county)) => format!("{}, {}", county, self.state_code),
            (None, None) => self.state.clone(),
        }
    }

    /// Template variables for this location; absent levels are omitted.
    pub fn variables(&self) -> Variables {
        let mut variables = Variables::new();
        if let Some(city) = &self.city {
            variables.insert("city".to_string(), city.clone());
        }
        if let Some(county) = &self.county {
            variables.insert("county".to_string(), county.clone());
        }
        variables.insert("state".to_string(), self.state.clone());
        variables.insert("state_code".to_string(), self.state_code.clone());
        variables
    }
}

/// Catalog of every known location.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationCatalog {
    #[serde(default)]
    pub states: Vec<StateEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateEntry {
    pub name: String,
    pub code: String,
    #[serde(default)]
    pub counties: Vec<CountyEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountyEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub cities: Vec<CityEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

impl StateEntry {
    fn matches(&self, target: &str) -> bool {
        self.code.eq_ignore_ascii_case(target) || self.name.eq_ignore_ascii_case(target)
    }

    fn location(&self) -> Location {
        Location {
            id: None,
            city: None,
            county: None,
            state: self.name.clone(),
            state_code: self.code.clone(),
        }
    }
}

impl CountyEntry {
    fn matches(&self, target: &str) -> bool {
        self.id.as_deref() == Some(target)
    }

    fn location(&self, state: &StateEntry) -> Location {
        Location {
            id: self.id.clone(),
            county: Some(self.name.clone()),
            ..state.location()
        }
    }
}

impl CityEntry {
    fn location(&self, county: &CountyEntry, state: &StateEntry) -> Location {
        Location {
            id: self.id.clone(),
            city: Some(self.name.clone()),
            county: Some(county.name.clone()),
            ..state.location()
        }
    }
}

impl LocationCatalog {
    /// Flatten the catalog into the list for `mode`.
    ///
    /// `target` narrows the list: a state code or name keeps that state's
    /// entries, a county id keeps that county's entries, and in city mode a
    /// city id keeps just that city. An unknown target yields an empty list.
    pub fn select(&self, mode: LocationMode, target: Option<&str>) -> Vec<Location> {
        let mut selected = Vec::new();
        for state in &self.states {
            let state_hit = target.is_none_or(|t| state.matches(t));
            match mode {
                LocationMode::None => return selected,
                LocationMode::State => {
                    if state_hit {
                        selected.push(state.location());
                    }
                }
                LocationMode::County => {
                    for county in &state.counties {
                        if state_hit || target.is_some_and(|t| county.matches(t)) {
                            selected.push(county.location(state));
                        }
                    }
                }
                LocationMode::City => {
                    for county in &state.counties {
                        let county_hit = state_hit || target.is_some_and(|t| county.matches(t));
                        for city in &county.cities {
                            let city_hit = target.is_some_and(|t| city.id.as_deref() == Some(t));
                            if county_hit || city_hit {
                                selected.push(city.location(county, state));
                            }
                        }
                    }
                }
            }
        }
        selected
    }

    /// Number of cities across all states.
    pub fn city_count(&self) -> usize {
        self.states
            .iter()
            .flat_map(|s| &s.counties)
            .map(|c| c.cities.len())
            .sum()
    }
}
