//! # sheep-shared
//!
//! Domain types and pure game rules shared by the store and the client:
//! the tier table, cosmetic catalogs, reward tables and the progression
//! engine that turns player actions into new profile state.
//!
//! Nothing in this crate performs I/O. Time and randomness are passed in by
//! the caller so every rule is deterministic under test.

pub mod collectibles;
pub mod constants;
pub mod error;
pub mod models;
pub mod progression;
pub mod protocol;
pub mod rewards;
pub mod themes;
pub mod tiers;
pub mod types;

pub use error::ActionError;
pub use models::*;
pub use types::*;
