pub mod json_slot;
pub mod memory_store;
pub mod sqlite_store;

pub use json_slot::{load_json, save_json};
pub use memory_store::MemoryDurableStore;
pub use sqlite_store::SqliteDurableStore;
