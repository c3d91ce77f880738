//! Wire protocol for TinyRPG.
//!
//! This crate defines the contract that clients and the session authority
//! speak:
//!
//! - **Types** ([`Request`], [`Response`], the snapshot structs, [`SlotId`],
//!   [`ReasonCode`]) — the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits between transport (raw bytes) and the session
//! core (game rules). It doesn't know about connections or slots being
//! occupied — it only knows how to serialize and deserialize messages.
//!
//! ```text
//! Transport (bytes) → Protocol (Request/Response) → Session (game state)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    ActionRequest, CombatEntry, CombatSnapshot, GameStart, LobbyEntry,
    LobbySnapshot, ParseSlotError, ReasonCode, Request, Response, SlotId,
    CLIENT_HELLO, DEFAULT_PORT, MAX_SLOTS, SERVER_HELLO,
};
