// Waitroom Infrastructure - SQLite Adapter
// Implements: OrderedSetStore

mod connection;
mod error;
mod migration;
mod ordered_set_store;

pub use connection::create_pool;
pub use error::map_sqlx_error;
pub use migration::run_migrations;
pub use ordered_set_store::SqliteOrderedSetStore;

// Note: sqlx::Error conversion is handled by map_sqlx_error
// due to Rust's orphan rules (cannot implement From<sqlx::Error> for AppError here)
