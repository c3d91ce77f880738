//! The session state machine: slot table, phase, turn rotation, win
//! condition.
//!
//! One `GameSession` instance is the single source of truth for one
//! session of up to six participants. Every public operation validates
//! against the current phase before touching state; expected rejections
//! come back as [`SessionError`] values, never as partially applied
//! mutations.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tinyrpg_protocol::{
    CombatEntry, CombatSnapshot, LobbyEntry, LobbySnapshot, SlotId, MAX_SLOTS,
};

use crate::profession::{ActionEffect, ProfessionCatalogue};
use crate::{Player, SessionError, StatusEffect};

/// Minimum display-name length accepted at join.
pub const MIN_NAME_LEN: usize = 4;

/// Maximum display-name length accepted at join.
pub const MAX_NAME_LEN: usize = 24;

// ---------------------------------------------------------------------------
// GamePhase
// ---------------------------------------------------------------------------

/// The lifecycle phase of a session.
///
/// Transitions are strictly ordered and one-way:
///
/// ```text
/// Lobby → Combat → Ended
/// ```
///
/// - **Lobby**: slots fill and empty freely, professions and readiness
///   flip at will. Turn state is meaningless.
/// - **Combat**: slot occupancy is frozen; the turn rotation runs.
/// - **Ended**: terminal. At most one living player remains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    Lobby,
    Combat,
    Ended,
}

impl GamePhase {
    pub fn is_lobby(&self) -> bool {
        matches!(self, Self::Lobby)
    }

    pub fn is_combat(&self) -> bool {
        matches!(self, Self::Combat)
    }

    pub fn is_ended(&self) -> bool {
        matches!(self, Self::Ended)
    }

    /// The next phase in the strict ordering, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Lobby => Some(Self::Combat),
            Self::Combat => Some(Self::Ended),
            Self::Ended => None,
        }
    }
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lobby => write!(f, "Lobby"),
            Self::Combat => write!(f, "Combat"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Tunables for a session. Maximum players is fixed at six by the slot
/// model and is not configurable.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Occupied slots required before `try_start` can succeed.
    pub min_players: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { min_players: 1 }
    }
}

// ---------------------------------------------------------------------------
// GameSession
// ---------------------------------------------------------------------------

/// A phase-dependent state snapshot, as served to a polling participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSnapshot {
    Lobby(LobbySnapshot),
    Combat(CombatSnapshot),
}

/// The session authority's canonical state.
///
/// Not thread-safe by itself: callers serialize access at a higher level
/// (the server wraps one instance in a single mutex shared by every
/// connection task).
pub struct GameSession {
    slots: [Option<Player>; MAX_SLOTS],
    phase: GamePhase,
    /// Meaningful only in Combat and Ended.
    turn_number: u32,
    /// Meaningful only in Combat and Ended.
    active_slot: SlotId,
    catalogue: Arc<ProfessionCatalogue>,
    config: SessionConfig,
}

impl GameSession {
    pub fn new(catalogue: Arc<ProfessionCatalogue>, config: SessionConfig) -> Self {
        Self {
            slots: Default::default(),
            phase: GamePhase::Lobby,
            turn_number: 0,
            active_slot: SlotId::FIRST,
            catalogue,
            config,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn turn_number(&self) -> u32 {
        self.turn_number
    }

    pub fn active_slot(&self) -> SlotId {
        self.active_slot
    }

    pub fn player(&self, slot: SlotId) -> Option<&Player> {
        self.slots[slot.index()].as_ref()
    }

    fn occupied(&self) -> impl Iterator<Item = &Player> {
        self.slots.iter().flatten()
    }

    fn alive_count(&self) -> usize {
        self.occupied().filter(|p| p.is_alive()).count()
    }

    // -- Lobby operations ---------------------------------------------------

    /// Allocates the lowest empty slot for a new participant.
    ///
    /// # Errors
    /// - [`SessionError::GameStarted`] once combat has begun
    /// - [`SessionError::InvalidName`] for names outside 4–24 characters
    /// - [`SessionError::NameTaken`] on an exact name collision
    /// - [`SessionError::LobbyFull`] when all six slots are occupied
    pub fn join(&mut self, name: &str) -> Result<SlotId, SessionError> {
        if !self.phase.is_lobby() {
            return Err(SessionError::GameStarted);
        }
        let len = name.chars().count();
        if !(MIN_NAME_LEN..=MAX_NAME_LEN).contains(&len) {
            return Err(SessionError::InvalidName(name.to_string()));
        }
        if self.occupied().any(|p| p.name() == name) {
            return Err(SessionError::NameTaken(name.to_string()));
        }
        let slot = SlotId::all()
            .find(|s| self.slots[s.index()].is_none())
            .ok_or(SessionError::LobbyFull)?;

        self.slots[slot.index()] = Some(Player::new(name));
        tracing::info!(%slot, name, "player joined");
        Ok(slot)
    }

    /// Selects a profession for an occupied slot. Lobby only.
    pub fn update_profession(
        &mut self,
        slot: SlotId,
        profession: &str,
    ) -> Result<(), SessionError> {
        if !self.phase.is_lobby() {
            return Err(SessionError::GameStarted);
        }
        let player = self.slots[slot.index()]
            .as_mut()
            .ok_or(SessionError::EmptySlot(slot))?;
        player.set_profession(&self.catalogue, profession)?;
        tracing::debug!(%slot, profession, "profession updated");
        Ok(())
    }

    /// Flips a slot's readiness flag. Lobby only; no further validation —
    /// a player may flip any number of times.
    pub fn update_ready(
        &mut self,
        slot: SlotId,
        ready: bool,
    ) -> Result<(), SessionError> {
        if !self.phase.is_lobby() {
            return Err(SessionError::GameStarted);
        }
        let player = self.slots[slot.index()]
            .as_mut()
            .ok_or(SessionError::EmptySlot(slot))?;
        player.set_ready(ready);
        tracing::debug!(%slot, ready, "readiness updated");
        Ok(())
    }

    /// Attempts the one-way Lobby → Combat transition. Any occupied slot
    /// may request it; there is no host privilege.
    ///
    /// Returns `Ok(true)` if the match started, `Ok(false)` if the lobby
    /// is not yet eligible — a normal "not yet" outcome, not an error.
    pub fn try_start(&mut self, slot: SlotId) -> Result<bool, SessionError> {
        if !self.phase.is_lobby() {
            return Err(SessionError::GameStarted);
        }
        if self.slots[slot.index()].is_none() {
            return Err(SessionError::EmptySlot(slot));
        }
        if !self.start_eligible() {
            return Ok(false);
        }

        self.phase = GamePhase::Combat;
        self.turn_number = 1;
        self.active_slot = SlotId::all()
            .find(|s| self.slots[s.index()].is_some())
            .expect("eligibility requires an occupied slot");
        tracing::info!(
            active = %self.active_slot,
            players = self.occupied().count(),
            "match started"
        );
        Ok(true)
    }

    /// Start-eligibility: enough occupied slots, every occupied slot
    /// ready, and at least one occupied slot with a real profession.
    fn start_eligible(&self) -> bool {
        let occupied = self.occupied().count();
        occupied >= self.config.min_players
            && self.occupied().all(|p| p.ready())
            && self.occupied().any(|p| p.has_profession())
    }

    // -- Snapshots ----------------------------------------------------------

    /// The snapshot a polling participant receives: lobby while the lobby
    /// is open, combat afterwards (including the terminal state).
    pub fn snapshot_for(&self, requester: SlotId) -> SessionSnapshot {
        if self.phase.is_lobby() {
            SessionSnapshot::Lobby(self.lobby_snapshot(Some(requester)))
        } else {
            SessionSnapshot::Combat(self.combat_snapshot(Some(requester)))
        }
    }

    /// Serializes all six slots in lobby form; empty slots get the
    /// "looks ready" sentinel so they never block start-eligibility on
    /// the client side.
    pub fn lobby_snapshot(&self, requester: Option<SlotId>) -> LobbySnapshot {
        LobbySnapshot {
            lobby: SlotId::all()
                .map(|slot| {
                    let entry = match &self.slots[slot.index()] {
                        Some(player) => player.lobby_entry(),
                        None => LobbyEntry::empty(),
                    };
                    (slot, entry)
                })
                .collect(),
            player_number: requester.map(SlotId::number),
        }
    }

    /// Serializes all six slots in combat form.
    pub fn combat_snapshot(&self, requester: Option<SlotId>) -> CombatSnapshot {
        CombatSnapshot {
            turn_number: self.turn_number,
            active_player: self.active_slot,
            players: SlotId::all()
                .map(|slot| {
                    let entry = match &self.slots[slot.index()] {
                        Some(player) => player.combat_entry(),
                        None => CombatEntry::empty(),
                    };
                    (slot, entry)
                })
                .collect(),
            player_number: requester.map(SlotId::number),
        }
    }

    // -- Combat operations --------------------------------------------------

    fn combat_gate(&self) -> Result<(), SessionError> {
        match self.phase {
            GamePhase::Combat => Ok(()),
            GamePhase::Lobby => Err(SessionError::NoMatchInProgress),
            GamePhase::Ended => Err(SessionError::GameStarted),
        }
    }

    /// Resolves one of the active player's actions against a target slot.
    ///
    /// Validation runs to completion before any mutation: acting out of
    /// turn, unknown or unaffordable actions, and empty or dead targets
    /// all reject with nothing changed.
    pub fn do_action(
        &mut self,
        slot: SlotId,
        action_name: &str,
        target: SlotId,
    ) -> Result<(), SessionError> {
        self.combat_gate()?;
        let actor = self.slots[slot.index()]
            .as_ref()
            .ok_or(SessionError::EmptySlot(slot))?;
        if slot != self.active_slot || !actor.is_alive() {
            return Err(SessionError::NotYourTurn(slot));
        }
        let action = actor
            .action(action_name)
            .cloned()
            .ok_or_else(|| {
                SessionError::ActionUnavailable(format!(
                    "no action named {action_name:?}"
                ))
            })?;
        if !actor.can_afford(action.cost) {
            return Err(SessionError::ActionUnavailable(format!(
                "cannot afford {action_name:?}"
            )));
        }
        let victim = self.slots[target.index()]
            .as_ref()
            .ok_or(SessionError::InvalidTarget(target))?;
        if !victim.is_alive() {
            return Err(SessionError::InvalidTarget(target));
        }

        // Validation passed; apply the cost, then the effect.
        self.slots[slot.index()]
            .as_mut()
            .expect("validated above")
            .pay(action.cost);
        let victim = self.slots[target.index()]
            .as_mut()
            .expect("validated above");
        match action.effect {
            ActionEffect::Damage { amount } => {
                victim.take_damage(amount);
                if !victim.is_alive() {
                    tracing::info!(%target, name = victim.name(), "player slain");
                }
            }
            ActionEffect::Heal { amount } => victim.heal(amount),
            ActionEffect::Inflict {
                attribute,
                change,
                duration,
                duration_delta,
            } => victim.inflict(StatusEffect::new(
                attribute,
                change,
                duration,
                duration_delta,
            )),
        }
        tracing::debug!(%slot, action = action_name, %target, "action resolved");

        self.check_win();
        Ok(())
    }

    /// Ends the active player's turn: runs upkeep on the outgoing player,
    /// advances the rotation past empty and dead slots, and evaluates the
    /// win condition.
    pub fn end_turn(&mut self, slot: SlotId) -> Result<(), SessionError> {
        self.combat_gate()?;
        let player = self.slots[slot.index()]
            .as_ref()
            .ok_or(SessionError::EmptySlot(slot))?;
        if slot != self.active_slot || !player.is_alive() {
            return Err(SessionError::NotYourTurn(slot));
        }

        // Upkeep runs exactly once per player per turn boundary; this is
        // the only call site of process_statuses.
        let player = self.slots[slot.index()]
            .as_mut()
            .expect("validated above");
        player.process_statuses();
        if !player.is_alive() {
            tracing::info!(%slot, name = player.name(), "player died during upkeep");
        }

        self.advance_active();
        self.check_win();
        Ok(())
    }

    /// Releases a slot. Total in every phase and idempotent: in the lobby
    /// the slot is freed; mid-combat the player is eliminated but keeps
    /// its seat in the table; after the end it is a no-op.
    pub fn leave(&mut self, slot: SlotId) {
        match self.phase {
            GamePhase::Lobby => {
                if let Some(player) = self.slots[slot.index()].take() {
                    tracing::info!(%slot, name = player.name(), "player left the lobby");
                }
            }
            GamePhase::Combat => {
                let Some(player) = self.slots[slot.index()].as_mut() else {
                    return;
                };
                if !player.is_alive() {
                    return;
                }
                player.eliminate();
                tracing::info!(%slot, name = player.name(), "player left mid-combat");
                if self.active_slot == slot {
                    self.advance_active();
                }
                self.check_win();
            }
            GamePhase::Ended => {}
        }
    }

    /// Advances `active_slot` to the next live occupied slot in ascending
    /// order, wrapping around. The turn number increments when the
    /// rotation wraps back to (or past) the lowest live slot. Leaves
    /// `active_slot` untouched when no live slot remains — the caller's
    /// win-condition check ends the match.
    fn advance_active(&mut self) {
        let current = self.active_slot.index();
        for step in 1..=MAX_SLOTS {
            let index = (current + step) % MAX_SLOTS;
            let live = self.slots[index]
                .as_ref()
                .is_some_and(|p| p.is_alive());
            if live {
                if index <= current {
                    self.turn_number += 1;
                }
                self.active_slot =
                    SlotId::from_index(index).expect("index in range");
                return;
            }
        }
    }

    /// Transitions Combat → Ended once at most one living player remains.
    fn check_win(&mut self) {
        if !self.phase.is_combat() || self.alive_count() > 1 {
            return;
        }
        self.phase = GamePhase::Ended;
        match self.occupied().find(|p| p.is_alive()) {
            Some(winner) => {
                tracing::info!(
                    winner = winner.name(),
                    turn = self.turn_number,
                    "match ended"
                );
            }
            None => {
                tracing::info!(turn = self.turn_number, "match ended with no survivors");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_next_follows_strict_order() {
        assert_eq!(GamePhase::Lobby.next(), Some(GamePhase::Combat));
        assert_eq!(GamePhase::Combat.next(), Some(GamePhase::Ended));
        assert_eq!(GamePhase::Ended.next(), None);
    }

    #[test]
    fn test_phase_predicates() {
        assert!(GamePhase::Lobby.is_lobby());
        assert!(!GamePhase::Lobby.is_combat());
        assert!(GamePhase::Combat.is_combat());
        assert!(GamePhase::Ended.is_ended());
    }

    #[test]
    fn test_phase_display() {
        assert_eq!(GamePhase::Lobby.to_string(), "Lobby");
        assert_eq!(GamePhase::Combat.to_string(), "Combat");
        assert_eq!(GamePhase::Ended.to_string(), "Ended");
    }

    #[test]
    fn test_default_config_allows_solo_sessions() {
        assert_eq!(SessionConfig::default().min_players, 1);
    }
}
