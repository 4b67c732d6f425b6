//! Persistence for the transaction ledger and the adjustment overlay.
//!
//! Both collections are saved and loaded whole; there is no incremental
//! update protocol. [`MemoryStore`] keeps everything in process,
//! [`JsonFileStore`] writes one JSON file per collection.

mod json_file;
mod memory;
mod traits;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use traits::PortfolioStore;
