/// Course catalog input files.
pub mod catalog;
/// An in-memory node store.
pub mod memory;
mod store;

pub use catalog::{CatalogError, CourseRecord, load_catalog};
pub use memory::{InMemoryStore, MemoryStoreError, NodeRow, StoreExport};
pub use store::{
    CoursePrerequisiteLink, NodeStore, PersistError, PersistedTree, StoredId, persist_tree,
};
