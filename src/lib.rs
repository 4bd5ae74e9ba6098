pub mod auth;
pub mod clients;
pub mod config;
pub mod constants;
pub mod database;
pub mod error;
pub mod format;
pub mod listing;
pub mod models;
pub mod records;
pub mod routes;
pub mod status;
pub mod summary;
pub mod transaction;
pub mod users;
pub mod utils;

// Re-export types at crate root for convenient importing
pub use crate::auth::{AuthKeys, Principal};
pub use crate::database::Db;
pub use crate::error::AppError;
pub use crate::transaction::{TransactionError, with_transaction};

/// Application state shared across all request handlers
#[derive(Clone)]
pub struct AppState {
    /// The billing database (users, clients, records)
    pub main_db: Db,
    /// Token signing and verification keys
    pub auth: AuthKeys,
}
