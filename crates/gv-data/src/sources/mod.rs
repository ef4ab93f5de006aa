pub mod memory_source;
pub mod sqlite_source;

pub use memory_source::MemorySource;
pub use sqlite_source::SqliteSource;
