mod memory;
mod trait_store;
mod types;

pub use memory::InMemoryStore;
pub use trait_store::{StateStore, StoreError};
pub use types::*;
