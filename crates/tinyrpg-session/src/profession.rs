//! The profession catalogue: immutable content data consumed by players.
//!
//! A profession is a name, a description, base attributes, and an ordered
//! set of actions. The catalogue is built once at startup (or loaded from
//! JSON) and shared read-only; the session core never mutates it.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the sentinel profession every player starts with: zero
/// attributes, no actions. A lobby cannot start until at least one
/// occupied slot has picked something else.
pub const NONE_PROFESSION: &str = "None";

/// Which player attribute a modifier or status effect applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeKind {
    Hp,
    Ap,
    Mana,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hp => f.write_str("hp"),
            Self::Ap => f.write_str("ap"),
            Self::Mana => f.write_str("mana"),
        }
    }
}

/// Starting attribute values for a profession. Current and max both reset
/// to these when the profession is selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BaseAttributes {
    pub base_hp: i32,
    pub base_ap: i32,
    pub base_mana: i32,
}

/// What resolving an action costs the actor. Deducted only after the whole
/// request validates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ActionCost {
    #[serde(default)]
    pub ap: i32,
    #[serde(default)]
    pub mana: i32,
}

/// The resolution rule of an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActionEffect {
    /// Subtract `amount` from the target's hp, clamped at 0. A target
    /// reaching 0 hp dies immediately.
    Damage { amount: i32 },

    /// Add `amount` to the target's hp, clamped at its max.
    Heal { amount: i32 },

    /// Append a timed status effect to the target: `change` is subtracted
    /// from `attribute` once per upkeep for `duration` turns, decaying by
    /// `duration_delta` per application.
    Inflict {
        attribute: AttributeKind,
        change: i32,
        duration: u32,
        duration_delta: i32,
    },
}

/// One usable action. Players copy their profession's actions at selection
/// time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub cost: ActionCost,
    pub effect: ActionEffect,
}

/// A playable profession.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profession {
    pub name: String,
    pub description: String,
    pub base_attributes: BaseAttributes,
    pub actions: Vec<Action>,
}

impl Profession {
    /// The sentinel profession: zero attributes, no actions.
    pub fn none() -> Self {
        Self {
            name: NONE_PROFESSION.to_string(),
            description: String::new(),
            base_attributes: BaseAttributes::default(),
            actions: Vec::new(),
        }
    }
}

/// Immutable mapping from profession name to its definition.
#[derive(Debug, Clone)]
pub struct ProfessionCatalogue {
    by_name: HashMap<String, Profession>,
}

impl ProfessionCatalogue {
    /// Builds a catalogue from an explicit profession list. The sentinel
    /// [`NONE_PROFESSION`] entry is always present, whether or not the
    /// list carries one.
    pub fn from_professions(
        professions: impl IntoIterator<Item = Profession>,
    ) -> Self {
        let mut by_name = HashMap::new();
        by_name.insert(NONE_PROFESSION.to_string(), Profession::none());
        for profession in professions {
            by_name.insert(profession.name.clone(), profession);
        }
        Self { by_name }
    }

    /// Loads a catalogue from a JSON array of professions, as produced by
    /// serializing `Vec<Profession>`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let professions: Vec<Profession> = serde_json::from_str(json)?;
        Ok(Self::from_professions(professions))
    }

    /// Looks up a profession by exact name.
    pub fn get(&self, name: &str) -> Option<&Profession> {
        self.by_name.get(name)
    }

    /// Profession names in sorted order, for stable display.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> =
            self.by_name.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// The built-in content set: the six playable professions plus the
    /// sentinel.
    pub fn builtin() -> Self {
        Self::from_professions([
            profession(
                "Warrior",
                "Front-line bruiser with deep reserves of health.",
                BaseAttributes { base_hp: 32, base_ap: 12, base_mana: 0 },
                vec![
                    action(
                        "Slash",
                        "A clean sweep of the blade.",
                        ActionCost { ap: 3, mana: 0 },
                        ActionEffect::Damage { amount: 6 },
                    ),
                    action(
                        "Crush",
                        "An overhead blow that spends most of a turn.",
                        ActionCost { ap: 6, mana: 0 },
                        ActionEffect::Damage { amount: 10 },
                    ),
                ],
            ),
            profession(
                "Rogue",
                "Fast and fragile; wins through attrition.",
                BaseAttributes { base_hp: 24, base_ap: 16, base_mana: 0 },
                vec![
                    action(
                        "Stab",
                        "A quick thrust at whatever is closest.",
                        ActionCost { ap: 3, mana: 0 },
                        ActionEffect::Damage { amount: 5 },
                    ),
                    action(
                        "Envenom",
                        "Coats the target in a fading poison.",
                        ActionCost { ap: 6, mana: 0 },
                        ActionEffect::Inflict {
                            attribute: AttributeKind::Hp,
                            change: 4,
                            duration: 3,
                            duration_delta: 1,
                        },
                    ),
                ],
            ),
            profession(
                "Cleric",
                "Keeps the party standing.",
                BaseAttributes { base_hp: 22, base_ap: 8, base_mana: 18 },
                vec![
                    action(
                        "Smite",
                        "A bolt of censure.",
                        ActionCost { ap: 0, mana: 4 },
                        ActionEffect::Damage { amount: 5 },
                    ),
                    action(
                        "Mend",
                        "Closes wounds on the chosen ally.",
                        ActionCost { ap: 0, mana: 5 },
                        ActionEffect::Heal { amount: 8 },
                    ),
                ],
            ),
            profession(
                "Paladin",
                "Armoured all-rounder.",
                BaseAttributes { base_hp: 30, base_ap: 10, base_mana: 8 },
                vec![
                    action(
                        "Strike",
                        "A measured blow from behind the shield.",
                        ActionCost { ap: 3, mana: 0 },
                        ActionEffect::Damage { amount: 5 },
                    ),
                    action(
                        "Lay on Hands",
                        "Channels vigour into the chosen ally.",
                        ActionCost { ap: 0, mana: 6 },
                        ActionEffect::Heal { amount: 6 },
                    ),
                ],
            ),
            profession(
                "Monk",
                "Disciplined striker.",
                BaseAttributes { base_hp: 26, base_ap: 14, base_mana: 6 },
                vec![
                    action(
                        "Palm Strike",
                        "An open-handed blow to the chest.",
                        ActionCost { ap: 3, mana: 0 },
                        ActionEffect::Damage { amount: 5 },
                    ),
                    action(
                        "Flurry",
                        "A storm of strikes too fast to follow.",
                        ActionCost { ap: 7, mana: 0 },
                        ActionEffect::Damage { amount: 8 },
                    ),
                ],
            ),
            profession(
                "Wizard",
                "Glass cannon.",
                BaseAttributes { base_hp: 18, base_ap: 6, base_mana: 24 },
                vec![
                    action(
                        "Firebolt",
                        "A lance of flame.",
                        ActionCost { ap: 0, mana: 6 },
                        ActionEffect::Damage { amount: 9 },
                    ),
                    action(
                        "Curse",
                        "A withering hex that burns itself out.",
                        ActionCost { ap: 0, mana: 8 },
                        ActionEffect::Inflict {
                            attribute: AttributeKind::Hp,
                            change: 5,
                            duration: 2,
                            duration_delta: 2,
                        },
                    ),
                ],
            ),
        ])
    }
}

fn profession(
    name: &str,
    description: &str,
    base_attributes: BaseAttributes,
    actions: Vec<Action>,
) -> Profession {
    Profession {
        name: name.to_string(),
        description: description.to_string(),
        base_attributes,
        actions,
    }
}

fn action(
    name: &str,
    description: &str,
    cost: ActionCost,
    effect: ActionEffect,
) -> Action {
    Action {
        name: name.to_string(),
        description: description.to_string(),
        cost,
        effect,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalogue_has_all_professions() {
        let catalogue = ProfessionCatalogue::builtin();
        for name in ["None", "Warrior", "Rogue", "Cleric", "Paladin", "Monk", "Wizard"] {
            assert!(catalogue.get(name).is_some(), "missing {name}");
        }
        assert_eq!(catalogue.len(), 7);
    }

    #[test]
    fn test_none_profession_is_inert() {
        let catalogue = ProfessionCatalogue::builtin();
        let none = catalogue.get(NONE_PROFESSION).unwrap();
        assert_eq!(none.base_attributes, BaseAttributes::default());
        assert!(none.actions.is_empty());
    }

    #[test]
    fn test_from_professions_always_carries_the_sentinel() {
        let catalogue = ProfessionCatalogue::from_professions([]);
        assert!(catalogue.get(NONE_PROFESSION).is_some());
        assert_eq!(catalogue.len(), 1);
    }

    #[test]
    fn test_catalogue_json_round_trip() {
        let builtin = ProfessionCatalogue::builtin();
        let professions: Vec<&Profession> =
            builtin.names().iter().filter_map(|n| builtin.get(n)).collect();
        let json = serde_json::to_string(&professions).unwrap();

        let loaded = ProfessionCatalogue::from_json(&json).unwrap();
        assert_eq!(loaded.len(), builtin.len());
        assert_eq!(
            loaded.get("Wizard").unwrap().actions,
            builtin.get("Wizard").unwrap().actions
        );
    }

    #[test]
    fn test_action_effect_json_shape() {
        let effect = ActionEffect::Inflict {
            attribute: AttributeKind::Hp,
            change: 4,
            duration: 3,
            duration_delta: 1,
        };
        let json = serde_json::to_value(effect).unwrap();
        assert_eq!(json["kind"], "inflict");
        assert_eq!(json["attribute"], "hp");
        assert_eq!(json["duration"], 3);
    }
}
