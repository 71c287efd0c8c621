pub mod history;
pub mod river;

pub use history::{History, MemoryHistory};
pub use river::{FileRiverStore, RiverStore};
