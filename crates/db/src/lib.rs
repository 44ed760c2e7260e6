pub mod fixtures;
pub mod repositories;

pub use fixtures::SeedCatalog;
pub use repositories::{InMemoryRepository, MemoryStores};
