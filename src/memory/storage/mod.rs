//! Storage backends for the memory system.

pub mod ltm_sqlite_storage;

pub use ltm_sqlite_storage::LtmSqliteStorage;
