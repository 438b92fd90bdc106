//! Clients and their phone numbers, stored in PostgreSQL.
//!
//! [`db::Database`] owns one connection and exposes the create, search,
//! update and delete operations; each writing call is its own transaction.

pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use config::Config;
pub use db::Database;
pub use error::ClientError;
pub use models::{Client, ClientChanges, ClientFilter, NewClient, Phone};
