//! # sheep-store
//!
//! SQLite storage for the sheep clicker.
//!
//! [`Database`] owns a `rusqlite::Connection` to the relational schema
//! (players, balances, stats, the global counter, chat and collectibles) and
//! provides typed CRUD helpers for every model in `sheep-shared`.
//! [`LocalStorage`] is the small key-value store used when the relational
//! backend is unavailable.
//!
//! Everything here is synchronous.

pub mod chat;
pub mod collectibles;
pub mod currency;
pub mod database;
pub mod global;
pub mod local;
pub mod migrations;
pub mod stats;
pub mod users;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use local::LocalStorage;
