pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use memory::MemorySeenStore;

#[cfg(feature = "sqlite")]
pub use sqlite::SQLiteSeenStore;
