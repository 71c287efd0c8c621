pub mod context;
pub mod error;

pub use context::{AppContext, RiverAggregator};
pub use error::{Result, RiverError};
