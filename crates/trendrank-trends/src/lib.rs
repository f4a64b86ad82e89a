pub mod client;
pub mod error;
pub mod observations;
pub mod types;

pub use client::TrendsClient;
pub use error::TrendsError;
pub use observations::to_observation_table;
pub use types::{GeoMapEntry, Widget};
