//! Persistent key/value storage for the Skillexa client.
//!
//! Everything that must survive a reload goes through the [`KeyValueStore`]
//! trait: the bearer credential, the goals list, tour and spotlight flags.
//! Production code uses [`JsonFileStore`]; tests and headless tooling use
//! [`MemoryStore`]. The surface never errors outward: absent or malformed
//! values degrade to caller-supplied fallbacks.

mod app_data;
mod json_file;
mod keys;
mod memory;
mod traits;

pub use app_data::{AppData, Goal};
pub use json_file::JsonFileStore;
pub use keys::StoreKeys;
pub use memory::MemoryStore;
pub use traits::{KeyValueStore, StoreExt};
