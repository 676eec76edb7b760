//! The datastore engine.

pub mod dataset;
pub mod filter;
pub mod laps;
pub mod registry;
pub mod smoothing;
pub mod store;

pub use dataset::DataSet;
pub use filter::{Comparison, Filter, FilterValue};
pub use registry::ChannelRegistry;
pub use store::Datastore;
