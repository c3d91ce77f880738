//! Per-participant state: attributes, status effects, and the two wire
//! views.
//!
//! A `Player` is owned exclusively by the session state machine and never
//! outlives the slot it occupies. All cross-player rules (turn order,
//! win condition) live in [`GameSession`](crate::GameSession); this module
//! only knows how one player's numbers move.

use serde::{Deserialize, Serialize};
use tinyrpg_protocol::{CombatEntry, LobbyEntry};

use crate::SessionError;
use crate::profession::{
    Action, ActionCost, AttributeKind, BaseAttributes, Profession,
    ProfessionCatalogue, NONE_PROFESSION,
};

/// Live attribute values. Current values clamp at 0 on decrease; clamping
/// to max happens only at the point a value is set (healing), never during
/// upkeep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub hp: i32,
    pub max_hp: i32,
    pub ap: i32,
    pub max_ap: i32,
    pub mana: i32,
    pub max_mana: i32,
}

impl Attributes {
    pub fn zeroed() -> Self {
        Self { hp: 0, max_hp: 0, ap: 0, max_ap: 0, mana: 0, max_mana: 0 }
    }

    pub fn from_base(base: &BaseAttributes) -> Self {
        Self {
            hp: base.base_hp,
            max_hp: base.base_hp,
            ap: base.base_ap,
            max_ap: base.base_ap,
            mana: base.base_mana,
            max_mana: base.base_mana,
        }
    }

    pub fn get(&self, kind: AttributeKind) -> i32 {
        match kind {
            AttributeKind::Hp => self.hp,
            AttributeKind::Ap => self.ap,
            AttributeKind::Mana => self.mana,
        }
    }

    /// Subtracts `amount` from the named attribute, clamping at 0. A
    /// negative `amount` increases the value with no upper clamp — that is
    /// how healing-type status effects behave during upkeep.
    pub fn reduce(&mut self, kind: AttributeKind, amount: i32) {
        let slot = match kind {
            AttributeKind::Hp => &mut self.hp,
            AttributeKind::Ap => &mut self.ap,
            AttributeKind::Mana => &mut self.mana,
        };
        *slot = (*slot - amount).max(0);
    }

    /// Adds `amount` to the named attribute, clamping at its max.
    pub fn restore(&mut self, kind: AttributeKind, amount: i32) {
        let (slot, max) = match kind {
            AttributeKind::Hp => (&mut self.hp, self.max_hp),
            AttributeKind::Ap => (&mut self.ap, self.max_ap),
            AttributeKind::Mana => (&mut self.mana, self.max_mana),
        };
        *slot = (*slot + amount).min(max);
    }
}

/// A single attribute delta: which attribute, and how much is subtracted
/// per application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifier {
    pub attribute: AttributeKind,
    pub change: i32,
}

/// A timed, decaying modifier applied once per turn during upkeep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusEffect {
    pub modifier: Modifier,
    /// Turns remaining. The effect is removed in the same upkeep pass its
    /// duration reaches 0.
    pub duration: u32,
    /// Decay applied to `change` after each application; `change` floors
    /// at 0.
    pub duration_delta: i32,
}

impl StatusEffect {
    pub fn new(
        attribute: AttributeKind,
        change: i32,
        duration: u32,
        duration_delta: i32,
    ) -> Self {
        Self {
            modifier: Modifier { attribute, change },
            duration,
            duration_delta,
        }
    }
}

/// One participant's mutable state.
#[derive(Debug, Clone)]
pub struct Player {
    name: String,
    profession: Profession,
    attributes: Attributes,
    statuses: Vec<StatusEffect>,
    ready: bool,
    is_alive: bool,
    actions: Vec<Action>,
}

impl Player {
    /// A freshly joined player: the sentinel profession, zeroed
    /// attributes, not ready, alive.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            profession: Profession::none(),
            attributes: Attributes::zeroed(),
            statuses: Vec::new(),
            ready: false,
            is_alive: true,
            actions: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ready(&self) -> bool {
        self.ready
    }

    pub fn is_alive(&self) -> bool {
        self.is_alive
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    pub fn statuses(&self) -> &[StatusEffect] {
        &self.statuses
    }

    pub fn profession(&self) -> &Profession {
        &self.profession
    }

    /// Whether the player has picked something other than the sentinel.
    pub fn has_profession(&self) -> bool {
        self.profession.name != NONE_PROFESSION
    }

    /// Looks up an action in the player's copied set.
    pub fn action(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// Selects a profession: resets all current and max attributes to the
    /// profession's base values and replaces the action set. Active status
    /// effects are independent of profession and persist.
    pub fn set_profession(
        &mut self,
        catalogue: &ProfessionCatalogue,
        name: &str,
    ) -> Result<(), SessionError> {
        let profession = catalogue
            .get(name)
            .ok_or_else(|| SessionError::UnknownProfession(name.to_string()))?;
        self.attributes = Attributes::from_base(&profession.base_attributes);
        self.actions = profession.actions.clone();
        self.profession = profession.clone();
        Ok(())
    }

    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    /// Runs one upkeep pass over the active status effects, in insertion
    /// order: apply the change (clamping the attribute at 0), decrement
    /// the duration, decay the change (flooring at 0), and drop the effect
    /// once its duration reaches 0. A player at 0 hp afterwards is dead.
    ///
    /// Not idempotent — calling this twice in one turn double-applies
    /// every effect. The sole call site is the turn-advance operation.
    pub fn process_statuses(&mut self) {
        let mut i = 0;
        while i < self.statuses.len() {
            let status = &mut self.statuses[i];
            self.attributes
                .reduce(status.modifier.attribute, status.modifier.change);
            status.duration = status.duration.saturating_sub(1);
            status.modifier.change =
                (status.modifier.change - status.duration_delta).max(0);
            if status.duration == 0 {
                self.statuses.remove(i);
            } else {
                i += 1;
            }
        }
        if self.attributes.hp <= 0 {
            self.is_alive = false;
        }
    }

    /// Applies direct damage. A player brought to 0 hp dies immediately.
    pub fn take_damage(&mut self, amount: i32) {
        self.attributes.reduce(AttributeKind::Hp, amount);
        if self.attributes.hp <= 0 {
            self.is_alive = false;
        }
    }

    /// Restores hp, clamped at max.
    pub fn heal(&mut self, amount: i32) {
        self.attributes.restore(AttributeKind::Hp, amount);
    }

    /// Appends a status effect to the ordered list.
    pub fn inflict(&mut self, status: StatusEffect) {
        self.statuses.push(status);
    }

    /// Whether the player can pay an action's cost right now.
    pub fn can_afford(&self, cost: ActionCost) -> bool {
        self.attributes.ap >= cost.ap && self.attributes.mana >= cost.mana
    }

    /// Deducts an action's cost. Callers validate with
    /// [`can_afford`](Self::can_afford) first.
    pub fn pay(&mut self, cost: ActionCost) {
        self.attributes.reduce(AttributeKind::Ap, cost.ap);
        self.attributes.reduce(AttributeKind::Mana, cost.mana);
    }

    /// Marks the player dead without touching attributes (used when a
    /// participant abandons a running match).
    pub fn eliminate(&mut self) {
        self.is_alive = false;
    }

    /// The lobby wire view.
    pub fn lobby_entry(&self) -> LobbyEntry {
        LobbyEntry {
            name: self.name.clone(),
            profession: self.profession.name.clone(),
            profession_description: self.profession.description.clone(),
            ready: self.ready,
        }
    }

    /// The combat wire view.
    pub fn combat_entry(&self) -> CombatEntry {
        CombatEntry {
            name: self.name.clone(),
            profession: self.profession.name.clone(),
            hp: [self.attributes.hp, self.attributes.max_hp],
            ap: [self.attributes.ap, self.attributes.max_ap],
            mana: [self.attributes.mana, self.attributes.max_mana],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn warrior() -> Player {
        let catalogue = ProfessionCatalogue::builtin();
        let mut player = Player::new("Aldric");
        player.set_profession(&catalogue, "Warrior").unwrap();
        player
    }

    #[test]
    fn test_new_player_starts_inert() {
        let player = Player::new("Aldric");
        assert_eq!(player.profession().name, NONE_PROFESSION);
        assert_eq!(*player.attributes(), Attributes::zeroed());
        assert!(!player.ready());
        assert!(player.is_alive());
        assert!(!player.has_profession());
    }

    #[test]
    fn test_set_profession_resets_attributes_and_actions() {
        let catalogue = ProfessionCatalogue::builtin();
        let mut player = warrior();
        assert_eq!(player.attributes().hp, 32);
        assert!(player.action("Slash").is_some());

        player.take_damage(10);
        assert_eq!(player.attributes().hp, 22);

        // Re-selecting discards accumulated damage.
        player.set_profession(&catalogue, "Wizard").unwrap();
        assert_eq!(player.attributes().hp, 18);
        assert_eq!(player.attributes().mana, 24);
        assert!(player.action("Slash").is_none());
        assert!(player.action("Firebolt").is_some());
    }

    #[test]
    fn test_set_profession_is_idempotent() {
        let catalogue = ProfessionCatalogue::builtin();
        let mut once = Player::new("Aldric");
        once.set_profession(&catalogue, "Monk").unwrap();

        let mut twice = Player::new("Aldric");
        twice.set_profession(&catalogue, "Monk").unwrap();
        twice.set_profession(&catalogue, "Monk").unwrap();

        assert_eq!(once.attributes(), twice.attributes());
        assert_eq!(once.action("Flurry"), twice.action("Flurry"));
    }

    #[test]
    fn test_set_profession_unknown_name_fails_without_mutation() {
        let catalogue = ProfessionCatalogue::builtin();
        let mut player = warrior();
        let before = *player.attributes();

        let err = player.set_profession(&catalogue, "Necromancer").unwrap_err();
        assert_eq!(err, SessionError::UnknownProfession("Necromancer".into()));
        assert_eq!(*player.attributes(), before);
        assert_eq!(player.profession().name, "Warrior");
    }

    #[test]
    fn test_set_profession_keeps_statuses() {
        let catalogue = ProfessionCatalogue::builtin();
        let mut player = warrior();
        player.inflict(StatusEffect::new(AttributeKind::Hp, 4, 3, 1));

        player.set_profession(&catalogue, "Cleric").unwrap();
        assert_eq!(player.statuses().len(), 1);
    }

    #[test]
    fn test_status_decay_worked_example() {
        // {hp, change 10, duration 2, delta 5} on hp 20/20:
        // first upkeep → hp 10, status at duration 1 / change 5;
        // second upkeep → hp 5, status removed.
        let catalogue = ProfessionCatalogue::from_json(
            r#"[{
                "name": "Dummy",
                "description": "",
                "base_attributes": {"base_hp": 20, "base_ap": 0, "base_mana": 0},
                "actions": []
            }]"#,
        )
        .unwrap();
        let mut player = Player::new("Aldric");
        player.set_profession(&catalogue, "Dummy").unwrap();
        player.inflict(StatusEffect::new(AttributeKind::Hp, 10, 2, 5));

        player.process_statuses();
        assert_eq!(player.attributes().hp, 10);
        assert_eq!(player.statuses().len(), 1);
        assert_eq!(player.statuses()[0].duration, 1);
        assert_eq!(player.statuses()[0].modifier.change, 5);

        player.process_statuses();
        assert_eq!(player.attributes().hp, 5);
        assert!(player.statuses().is_empty());
        assert!(player.is_alive());
    }

    #[test]
    fn test_statuses_apply_in_insertion_order_and_clamp_at_zero() {
        let mut player = warrior(); // hp 32
        player.inflict(StatusEffect::new(AttributeKind::Hp, 30, 2, 0));
        player.inflict(StatusEffect::new(AttributeKind::Hp, 30, 2, 0));

        player.process_statuses();
        // 32 - 30 = 2, then 2 - 30 clamps to 0: the player is dead.
        assert_eq!(player.attributes().hp, 0);
        assert!(!player.is_alive());
    }

    #[test]
    fn test_healing_status_has_no_max_clamp_during_upkeep() {
        let mut player = warrior();
        player.take_damage(2); // 30/32
        // Negative change is a regeneration effect.
        player.inflict(StatusEffect::new(AttributeKind::Hp, -5, 1, 0));
        player.process_statuses();
        assert_eq!(player.attributes().hp, 35);
    }

    #[test]
    fn test_direct_damage_kills_at_zero() {
        let mut player = warrior();
        player.take_damage(31);
        assert!(player.is_alive());
        player.take_damage(5);
        assert_eq!(player.attributes().hp, 0);
        assert!(!player.is_alive());
    }

    #[test]
    fn test_heal_clamps_at_max() {
        let mut player = warrior();
        player.take_damage(4); // 28/32
        player.heal(100);
        assert_eq!(player.attributes().hp, 32);
    }

    #[test]
    fn test_pay_and_afford() {
        let mut player = warrior(); // ap 12
        let crush = player.action("Crush").unwrap().cost;
        assert!(player.can_afford(crush));
        player.pay(crush);
        assert_eq!(player.attributes().ap, 6);
        player.pay(crush);
        assert_eq!(player.attributes().ap, 0);
        assert!(!player.can_afford(crush));
    }

    #[test]
    fn test_wire_views() {
        let mut player = warrior();
        player.set_ready(true);
        player.take_damage(4);

        let lobby = player.lobby_entry();
        assert_eq!(lobby.name, "Aldric");
        assert_eq!(lobby.profession, "Warrior");
        assert!(lobby.ready);

        let combat = player.combat_entry();
        assert_eq!(combat.hp, [28, 32]);
        assert_eq!(combat.ap, [12, 12]);
        assert_eq!(combat.mana, [0, 0]);
    }
}
