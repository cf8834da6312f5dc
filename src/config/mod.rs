//! Configuration: engine defaults and campaign files.

mod campaign;
mod loader;
mod types;

pub use campaign::{Campaign, CampaignLocations};
pub use loader::ConfigError;
pub use types::{Config, Defaults, LedgerConfig};
