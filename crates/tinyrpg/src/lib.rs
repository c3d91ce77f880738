//! # TinyRPG
//!
//! A turn-based multiplayer RPG session authority.
//!
//! One server instance owns one session of up to six participants: a
//! pre-game lobby where players pick professions and ready up, then a
//! turn-based combat loop with timed status effects and a last-one-standing
//! win condition. Clients are thin views — they poll for state snapshots
//! and forward user intent as requests; the authority validates everything
//! against the canonical state.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use tinyrpg::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ServerError> {
//!     let server = ServerBuilder::new().bind("0.0.0.0:52000").build().await?;
//!     server.run().await
//! }
//! ```

mod error;
mod handler;
mod server;

pub use error::ServerError;
pub use server::{Server, ServerBuilder};

/// Commonly used types, re-exported from the layer crates.
pub mod prelude {
    pub use crate::{Server, ServerBuilder, ServerError};
    pub use tinyrpg_protocol::{
        ActionRequest, Codec, CombatSnapshot, GameStart, JsonCodec,
        LobbySnapshot, ReasonCode, Request, Response, SlotId, CLIENT_HELLO,
        DEFAULT_PORT, SERVER_HELLO,
    };
    pub use tinyrpg_session::{
        GamePhase, GameSession, ProfessionCatalogue, SessionConfig,
        SessionError,
    };
}
