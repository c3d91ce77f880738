//! Error types for the session core.
//!
//! Every variant here is an *expected* rejection: the state machine hands
//! it back as an ordinary `Err` value and the caller turns it into an
//! `ERROR` response. Nothing in this enum tears down a connection or a
//! session.

use tinyrpg_protocol::{ReasonCode, SlotId};

/// Rejections produced by [`GameSession`](crate::GameSession) operations.
///
/// No state mutation happens on any of these — validation runs to
/// completion before the first write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// All six slots are occupied.
    #[error("lobby is full")]
    LobbyFull,

    /// Another participant already joined under this exact name.
    #[error("name {0:?} is already taken")]
    NameTaken(String),

    /// The request is only legal in the lobby, and combat has begun (or
    /// the match is over).
    #[error("the match has already started")]
    GameStarted,

    /// The display name failed validation at join.
    #[error("invalid display name {0:?}")]
    InvalidName(String),

    /// The profession name is not in the catalogue.
    #[error("unknown profession {0:?}")]
    UnknownProfession(String),

    /// The request is only legal in combat, and the lobby is still open.
    #[error("no match in progress")]
    NoMatchInProgress,

    /// The request was bound to a slot that holds no player.
    #[error("slot {0} is empty")]
    EmptySlot(SlotId),

    /// The requester is not the active slot (or is dead).
    #[error("it is not {0}'s turn")]
    NotYourTurn(SlotId),

    /// The action is not in the acting player's set, or its cost is not
    /// affordable.
    #[error("action unavailable: {0}")]
    ActionUnavailable(String),

    /// The target slot is empty or its player is already dead.
    #[error("invalid target {0}")]
    InvalidTarget(SlotId),
}

impl SessionError {
    /// The machine-readable code this rejection carries on the wire.
    pub fn reason(&self) -> ReasonCode {
        match self {
            Self::LobbyFull => ReasonCode::LobbyFull,
            Self::NameTaken(_) => ReasonCode::NameTaken,
            Self::GameStarted => ReasonCode::GameStarted,
            Self::InvalidName(_) => ReasonCode::InvalidName,
            Self::UnknownProfession(_) => ReasonCode::UnknownProfession,
            Self::NoMatchInProgress => ReasonCode::InvalidCommand,
            Self::EmptySlot(_) => ReasonCode::InvalidCommand,
            Self::NotYourTurn(_) => ReasonCode::NotYourTurn,
            Self::ActionUnavailable(_) => ReasonCode::ActionUnavailable,
            Self::InvalidTarget(_) => ReasonCode::InvalidTarget,
        }
    }
}
