//! Core protocol types for TinyRPG's wire format.
//!
//! Every message is one JSON object per transport frame. Clients send a
//! request envelope `{"request": <string>, "data": <any>}`, the authority
//! answers with a response envelope `{"response": <string>, "data": <any>}`.
//! The exact field names and string tags below are the compatibility
//! surface for independent client implementations — the tests in this
//! module pin them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Greeting the client must send as its first line, before any JSON.
pub const CLIENT_HELLO: &str = "Tiny-PyRPG Client";

/// Greeting the authority answers the handshake with.
pub const SERVER_HELLO: &str = "Tiny-PyRPG Server";

/// Default listening port for the session authority.
pub const DEFAULT_PORT: u16 = 52000;

/// Number of seats in a session. Fixed by the slot model: snapshots always
/// carry exactly the keys `"p1"` through `"p6"`.
pub const MAX_SLOTS: usize = 6;

// ---------------------------------------------------------------------------
// SlotId
// ---------------------------------------------------------------------------

/// One of the six fixed seats in a session.
///
/// On the wire a slot is the string `"p1"`..`"p6"`, both as a value (the
/// `active-player` field) and as a JSON map key in snapshots — which is why
/// this type serializes through its string form rather than deriving.
/// Internally it is a zero-based index so it can address the slot table
/// directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(u8);

impl SlotId {
    /// The lowest slot, `p1`.
    pub const FIRST: SlotId = SlotId(0);

    /// Creates a slot from a zero-based index. `None` if out of range.
    pub fn from_index(index: usize) -> Option<Self> {
        (index < MAX_SLOTS).then(|| SlotId(index as u8))
    }

    /// Creates a slot from its one-based player number (1..=6).
    pub fn from_number(number: u8) -> Option<Self> {
        (1..=MAX_SLOTS as u8)
            .contains(&number)
            .then(|| SlotId(number - 1))
    }

    /// Zero-based index into the slot table.
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// One-based player number, as reported in `player-number` fields.
    pub fn number(self) -> u8 {
        self.0 + 1
    }

    /// All six slots in ascending order.
    pub fn all() -> impl Iterator<Item = SlotId> {
        (0..MAX_SLOTS as u8).map(SlotId)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.number())
    }
}

/// Error returned when parsing a slot string that is not `"p1"`..`"p6"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("slot ids are \"p1\" through \"p6\"")]
pub struct ParseSlotError;

impl FromStr for SlotId {
    type Err = ParseSlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let number = s
            .strip_prefix('p')
            .and_then(|digits| digits.parse::<u8>().ok())
            .ok_or(ParseSlotError)?;
        SlotId::from_number(number).ok_or(ParseSlotError)
    }
}

impl Serialize for SlotId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SlotId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Payload of a `DO ACTION` request: which of the acting player's actions
/// to resolve, and against which slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    pub target: SlotId,
}

/// A client → server request envelope.
///
/// `#[serde(tag = "request", content = "data")]` produces the adjacently
/// tagged form `{"request": "JOIN LOBBY", "data": "Aldric"}`. An envelope
/// whose `request` string is unrecognized fails to decode; the router maps
/// that failure to an `ERROR` / `INVALID COMMAND` response rather than
/// dropping the connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "request", content = "data")]
pub enum Request {
    /// Join the lobby under a display name. Must be the first envelope a
    /// connection sends after the handshake.
    #[serde(rename = "JOIN LOBBY")]
    JoinLobby(String),

    /// Select (or change) a profession while the lobby is open.
    #[serde(rename = "UPDATE PROFESSION")]
    UpdateProfession(String),

    /// Flip the readiness flag while the lobby is open.
    #[serde(rename = "UPDATE READY")]
    UpdateReady(bool),

    /// Poll for the current snapshot. Carries no payload; the reference
    /// client sends `data: null`.
    #[serde(rename = "GET UPDATE")]
    GetUpdate(Option<()>),

    /// Ask the authority to start the match. The reference client sends an
    /// empty string as payload.
    #[serde(rename = "TRY START")]
    TryStart(String),

    /// Resolve one of the active player's actions against a target slot.
    #[serde(rename = "DO ACTION")]
    DoAction(ActionRequest),

    /// End the active player's turn, running upkeep and advancing the
    /// rotation.
    #[serde(rename = "END TURN")]
    EndTurn(String),

    /// Leave the session. The connection closes without a reply.
    #[serde(rename = "EXIT")]
    Exit(String),
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// One slot's entry in a lobby snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbyEntry {
    pub name: String,
    pub profession: String,
    pub profession_description: String,
    pub ready: bool,
}

impl LobbyEntry {
    /// The empty-slot sentinel: blank strings and `ready = true`, so an
    /// unfilled seat never blocks start-eligibility on the client side.
    pub fn empty() -> Self {
        Self {
            name: String::new(),
            profession: String::new(),
            profession_description: String::new(),
            ready: true,
        }
    }
}

/// One slot's entry in a combat snapshot. Attribute pairs are
/// `[current, max]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatEntry {
    pub name: String,
    pub profession: String,
    pub hp: [i32; 2],
    pub ap: [i32; 2],
    pub mana: [i32; 2],
}

impl CombatEntry {
    /// The empty-slot sentinel: blank strings and zeroed attribute pairs.
    pub fn empty() -> Self {
        Self {
            name: String::new(),
            profession: String::new(),
            hp: [0, 0],
            ap: [0, 0],
            mana: [0, 0],
        }
    }
}

/// The serialized view of all six slots while the lobby is open.
///
/// `player_number` identifies the requester's own seat and is present on
/// `JOIN ACCEPT` and on replies to `GET UPDATE`; other lobby responses
/// omit it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LobbySnapshot {
    pub lobby: BTreeMap<SlotId, LobbyEntry>,
    #[serde(
        rename = "player-number",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub player_number: Option<u8>,
}

/// The serialized view of all six slots during (and after) combat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatSnapshot {
    #[serde(rename = "turn-number")]
    pub turn_number: u32,
    #[serde(rename = "active-player")]
    pub active_player: SlotId,
    pub players: BTreeMap<SlotId, CombatEntry>,
    #[serde(
        rename = "player-number",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub player_number: Option<u8>,
}

/// Payload of a `GAME START` response: the opening combat snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStart {
    pub game: CombatSnapshot,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// Machine-readable rejection codes carried by `ERROR` responses.
///
/// A semantic rejection never closes the connection; the code is all the
/// client needs to present a specific message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReasonCode {
    #[serde(rename = "LOBBY FULL")]
    LobbyFull,
    #[serde(rename = "NAME TAKEN")]
    NameTaken,
    #[serde(rename = "GAME STARTED")]
    GameStarted,
    #[serde(rename = "INVALID NAME")]
    InvalidName,
    #[serde(rename = "UNKNOWN PROFESSION")]
    UnknownProfession,
    #[serde(rename = "NOT YOUR TURN")]
    NotYourTurn,
    #[serde(rename = "ACTION UNAVAILABLE")]
    ActionUnavailable,
    #[serde(rename = "INVALID TARGET")]
    InvalidTarget,
    #[serde(rename = "INVALID COMMAND")]
    InvalidCommand,
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Self::LobbyFull => "LOBBY FULL",
            Self::NameTaken => "NAME TAKEN",
            Self::GameStarted => "GAME STARTED",
            Self::InvalidName => "INVALID NAME",
            Self::UnknownProfession => "UNKNOWN PROFESSION",
            Self::NotYourTurn => "NOT YOUR TURN",
            Self::ActionUnavailable => "ACTION UNAVAILABLE",
            Self::InvalidTarget => "INVALID TARGET",
            Self::InvalidCommand => "INVALID COMMAND",
        };
        f.write_str(code)
    }
}

/// A server → client response envelope.
///
/// Same adjacently tagged form as [`Request`]:
/// `{"response": "LOBBY DATA", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "response", content = "data")]
pub enum Response {
    /// The join succeeded; carries the assigned `player-number` and the
    /// full lobby.
    #[serde(rename = "JOIN ACCEPT")]
    JoinAccept(LobbySnapshot),

    /// A lobby snapshot.
    #[serde(rename = "LOBBY DATA")]
    LobbyData(LobbySnapshot),

    /// A combat snapshot.
    #[serde(rename = "GAME DATA")]
    GameData(CombatSnapshot),

    /// The match just started; carries the opening combat snapshot.
    #[serde(rename = "GAME START")]
    GameStart(GameStart),

    /// The request was rejected; carries the reason code.
    #[serde(rename = "ERROR")]
    Error(ReasonCode),
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The wire contract defines exact JSON shapes. These tests verify the
    //! serde attributes produce them, because a mismatch means independent
    //! clients can't parse the authority's messages.

    use super::*;

    fn lobby_with(entries: &[(SlotId, LobbyEntry)]) -> BTreeMap<SlotId, LobbyEntry> {
        let mut lobby: BTreeMap<SlotId, LobbyEntry> =
            SlotId::all().map(|slot| (slot, LobbyEntry::empty())).collect();
        for (slot, entry) in entries {
            lobby.insert(*slot, entry.clone());
        }
        lobby
    }

    // =====================================================================
    // SlotId
    // =====================================================================

    #[test]
    fn test_slot_id_serializes_as_string() {
        let json = serde_json::to_string(&SlotId::FIRST).unwrap();
        assert_eq!(json, "\"p1\"");
        let json = serde_json::to_string(&SlotId::from_number(6).unwrap()).unwrap();
        assert_eq!(json, "\"p6\"");
    }

    #[test]
    fn test_slot_id_deserializes_from_string() {
        let slot: SlotId = serde_json::from_str("\"p3\"").unwrap();
        assert_eq!(slot, SlotId::from_number(3).unwrap());
    }

    #[test]
    fn test_slot_id_rejects_out_of_range() {
        assert!(serde_json::from_str::<SlotId>("\"p0\"").is_err());
        assert!(serde_json::from_str::<SlotId>("\"p7\"").is_err());
        assert!(serde_json::from_str::<SlotId>("\"q1\"").is_err());
        assert!(serde_json::from_str::<SlotId>("\"p\"").is_err());
    }

    #[test]
    fn test_slot_id_number_and_index_agree() {
        for (i, slot) in SlotId::all().enumerate() {
            assert_eq!(slot.index(), i);
            assert_eq!(slot.number() as usize, i + 1);
            assert_eq!(SlotId::from_index(i), Some(slot));
            assert_eq!(SlotId::from_number(slot.number()), Some(slot));
        }
        assert_eq!(SlotId::from_index(6), None);
        assert_eq!(SlotId::from_number(0), None);
    }

    #[test]
    fn test_slot_id_orders_p1_through_p6() {
        let keys: Vec<String> = SlotId::all().map(|s| s.to_string()).collect();
        assert_eq!(keys, ["p1", "p2", "p3", "p4", "p5", "p6"]);
    }

    // =====================================================================
    // Request envelopes — one shape test per recognized value
    // =====================================================================

    #[test]
    fn test_join_lobby_json_format() {
        let json = serde_json::to_value(Request::JoinLobby("Aldric".into())).unwrap();
        assert_eq!(json["request"], "JOIN LOBBY");
        assert_eq!(json["data"], "Aldric");
    }

    #[test]
    fn test_update_profession_json_format() {
        let json =
            serde_json::to_value(Request::UpdateProfession("Warrior".into())).unwrap();
        assert_eq!(json["request"], "UPDATE PROFESSION");
        assert_eq!(json["data"], "Warrior");
    }

    #[test]
    fn test_update_ready_json_format() {
        let json = serde_json::to_value(Request::UpdateReady(true)).unwrap();
        assert_eq!(json["request"], "UPDATE READY");
        assert_eq!(json["data"], true);
    }

    #[test]
    fn test_get_update_carries_null_data() {
        // The reference client sends {"request": "GET UPDATE", "data": null}.
        let decoded: Request =
            serde_json::from_str(r#"{"request": "GET UPDATE", "data": null}"#).unwrap();
        assert_eq!(decoded, Request::GetUpdate(None));

        let json = serde_json::to_value(Request::GetUpdate(None)).unwrap();
        assert!(json["data"].is_null());
    }

    #[test]
    fn test_try_start_carries_empty_string() {
        let decoded: Request =
            serde_json::from_str(r#"{"request": "TRY START", "data": ""}"#).unwrap();
        assert_eq!(decoded, Request::TryStart(String::new()));
    }

    #[test]
    fn test_do_action_json_format() {
        let req = Request::DoAction(ActionRequest {
            action: "Firebolt".into(),
            target: SlotId::from_number(2).unwrap(),
        });
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["request"], "DO ACTION");
        assert_eq!(json["data"]["action"], "Firebolt");
        assert_eq!(json["data"]["target"], "p2");

        let bytes = serde_json::to_vec(&req).unwrap();
        let decoded: Request = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(req, decoded);
    }

    #[test]
    fn test_end_turn_and_exit_round_trip() {
        for req in [Request::EndTurn(String::new()), Request::Exit(String::new())] {
            let bytes = serde_json::to_vec(&req).unwrap();
            let decoded: Request = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(req, decoded);
        }
    }

    #[test]
    fn test_unknown_request_value_fails_to_decode() {
        let unknown = r#"{"request": "CAST FIREBALL", "data": ""}"#;
        assert!(serde_json::from_str::<Request>(unknown).is_err());
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        assert!(serde_json::from_slice::<Request>(b"not json at all").is_err());
        assert!(serde_json::from_str::<Request>(r#"{"name": "hello"}"#).is_err());
    }

    // =====================================================================
    // Snapshots
    // =====================================================================

    #[test]
    fn test_lobby_snapshot_empty_slot_sentinel() {
        let snapshot = LobbySnapshot {
            lobby: lobby_with(&[]),
            player_number: None,
        };
        let json = serde_json::to_value(&snapshot).unwrap();

        for slot in SlotId::all() {
            let entry = &json["lobby"][slot.to_string()];
            assert_eq!(entry["name"], "");
            assert_eq!(entry["profession"], "");
            assert_eq!(entry["profession_description"], "");
            assert_eq!(entry["ready"], true);
        }
        // player-number is omitted entirely when absent.
        assert!(json.get("player-number").is_none());
    }

    #[test]
    fn test_lobby_snapshot_round_trip() {
        let snapshot = LobbySnapshot {
            lobby: lobby_with(&[(
                SlotId::FIRST,
                LobbyEntry {
                    name: "Aldric".into(),
                    profession: "Warrior".into(),
                    profession_description: "Front-line bruiser.".into(),
                    ready: false,
                },
            )]),
            player_number: Some(1),
        };
        let bytes = serde_json::to_vec(&snapshot).unwrap();
        let decoded: LobbySnapshot = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(snapshot, decoded);
    }

    #[test]
    fn test_combat_snapshot_json_format() {
        let mut players: BTreeMap<SlotId, CombatEntry> =
            SlotId::all().map(|slot| (slot, CombatEntry::empty())).collect();
        players.insert(
            SlotId::FIRST,
            CombatEntry {
                name: "Aldric".into(),
                profession: "Warrior".into(),
                hp: [28, 32],
                ap: [12, 12],
                mana: [0, 0],
            },
        );
        let snapshot = CombatSnapshot {
            turn_number: 3,
            active_player: SlotId::from_number(2).unwrap(),
            players,
            player_number: Some(2),
        };
        let json = serde_json::to_value(&snapshot).unwrap();

        assert_eq!(json["turn-number"], 3);
        assert_eq!(json["active-player"], "p2");
        assert_eq!(json["player-number"], 2);
        assert_eq!(json["players"]["p1"]["hp"], serde_json::json!([28, 32]));
        // Empty slots carry the zeroed sentinel.
        assert_eq!(json["players"]["p6"]["hp"], serde_json::json!([0, 0]));
        assert_eq!(json["players"]["p6"]["name"], "");
    }

    // =====================================================================
    // Response envelopes
    // =====================================================================

    #[test]
    fn test_join_accept_json_format() {
        let resp = Response::JoinAccept(LobbySnapshot {
            lobby: lobby_with(&[]),
            player_number: Some(1),
        });
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["response"], "JOIN ACCEPT");
        assert_eq!(json["data"]["player-number"], 1);
        assert!(json["data"]["lobby"].is_object());
    }

    #[test]
    fn test_game_start_json_format() {
        let resp = Response::GameStart(GameStart {
            game: CombatSnapshot {
                turn_number: 1,
                active_player: SlotId::FIRST,
                players: SlotId::all()
                    .map(|slot| (slot, CombatEntry::empty()))
                    .collect(),
                player_number: None,
            },
        });
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["response"], "GAME START");
        assert_eq!(json["data"]["game"]["turn-number"], 1);
        assert_eq!(json["data"]["game"]["active-player"], "p1");
    }

    #[test]
    fn test_error_reason_codes_serialize_with_spaces() {
        let cases = [
            (ReasonCode::LobbyFull, "LOBBY FULL"),
            (ReasonCode::NameTaken, "NAME TAKEN"),
            (ReasonCode::GameStarted, "GAME STARTED"),
            (ReasonCode::InvalidName, "INVALID NAME"),
            (ReasonCode::UnknownProfession, "UNKNOWN PROFESSION"),
            (ReasonCode::NotYourTurn, "NOT YOUR TURN"),
            (ReasonCode::ActionUnavailable, "ACTION UNAVAILABLE"),
            (ReasonCode::InvalidTarget, "INVALID TARGET"),
            (ReasonCode::InvalidCommand, "INVALID COMMAND"),
        ];
        for (code, wire) in cases {
            let json = serde_json::to_value(Response::Error(code)).unwrap();
            assert_eq!(json["response"], "ERROR");
            assert_eq!(json["data"], wire);
            assert_eq!(code.to_string(), wire);
        }
    }

    #[test]
    fn test_response_round_trip() {
        let resp = Response::LobbyData(LobbySnapshot {
            lobby: lobby_with(&[]),
            player_number: None,
        });
        let bytes = serde_json::to_vec(&resp).unwrap();
        let decoded: Response = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(resp, decoded);
    }
}
