pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::Cli;
pub use crate::config::storage::LocalStorage;
pub use crate::config::{HarvestOptions, PortalsOptions};
pub use crate::core::{etl::EtlEngine, harvest::HarvestPipeline, portals::PortalsPipeline};
pub use crate::domain::model::{Dataset, Entry, OutputFormat, PortalAggregate};
pub use crate::utils::error::{EtlError, Result};
