//! Local secure key-value storage
//!
//! Holds the bearer token, cached profile fields, cached preferences and the
//! onboarding/login flags. Two backends:
//! - `MemoryStore` for tests and throwaway runs
//! - `FileStore` for a JSON file persisted on disk

mod file;
pub mod keys;
mod store;

pub use file::FileStore;
pub use store::{MemoryStore, SecureStore};
