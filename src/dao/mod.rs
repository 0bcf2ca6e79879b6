/// Persistence backends for cache entries and redeemed codes.
pub mod codes_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
/// Expiring read/write view over the cache table.
pub mod ttl_cache;
