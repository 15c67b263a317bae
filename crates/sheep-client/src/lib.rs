//! # sheep-client
//!
//! Client-side game session for the global sheep clicker: an optimistic
//! in-memory mirror of the player, a debounced click batcher, a persistence
//! gateway with an offline fallback, and a realtime listener that keeps the
//! global counter and chat in sync with other players.

pub mod backend;
pub mod batcher;
pub mod config;
pub mod events;
pub mod gateway;
pub mod offline;
pub mod realtime;
pub mod session;
pub mod state;
pub mod storage;

use tracing_subscriber::{fmt, EnvFilter};

pub use config::ClientConfig;
pub use events::SessionEvent;
pub use gateway::StorageMode;
pub use session::{ClientError, GameSession};

/// Install the global tracing subscriber. `RUST_LOG` overrides the default
/// filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sheep_client=debug,sheep_store=info,warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
