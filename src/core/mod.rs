pub mod etl;
pub mod harvest;
pub mod normalize;
pub mod portals;

pub use crate::domain::model::{Dataset, Entry, OutputFormat, PortalAggregate};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
