//! Session authority core for TinyRPG.
//!
//! This crate owns the canonical game state and nothing else — no sockets,
//! no envelopes. It is driven entirely through [`GameSession`], the state
//! machine that validates and applies every transition:
//!
//! ```text
//! LOBBY ──(try_start, all occupied slots ready)──→ COMBAT ──(≤1 alive)──→ ENDED
//! ```
//!
//! # Key types
//!
//! - [`GameSession`] — the session state machine: slot table, phase, turn
//!   rotation, win condition
//! - [`Player`] — per-participant state: attributes, status effects,
//!   readiness, liveness
//! - [`ProfessionCatalogue`] — immutable content data (professions and
//!   their actions), loaded once and shared
//! - [`GamePhase`] — lifecycle state machine
//! - [`SessionError`] — expected rejections, each mapping to a wire
//!   [`ReasonCode`](tinyrpg_protocol::ReasonCode)

mod error;
mod player;
mod profession;
mod session;

pub use error::SessionError;
pub use player::{Attributes, Modifier, Player, StatusEffect};
pub use profession::{
    Action, ActionCost, ActionEffect, AttributeKind, BaseAttributes,
    Profession, ProfessionCatalogue, NONE_PROFESSION,
};
pub use session::{
    GamePhase, GameSession, SessionConfig, SessionSnapshot, MAX_NAME_LEN,
    MIN_NAME_LEN,
};
