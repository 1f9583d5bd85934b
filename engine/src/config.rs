use serde::{Deserialize, Serialize};

use crate::combat::WeaponCategory;
use crate::error::EngineError;

/// Rule ids the derived-stat calculator resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct DerivedRuleIds {
    pub hp: String,
    pub mp: String,
    pub damage_bonus: String,
    pub movement: String,
    pub action_points: String,
    pub initiative: String,
}

impl Default for DerivedRuleIds {
    fn default() -> Self {
        Self {
            hp: "hp_total".into(),
            mp: "mp_total".into(),
            damage_bonus: "damage_bonus_calculation".into(),
            movement: "movement_rate".into(),
            action_points: "action_points".into(),
            initiative: "initiative_rating".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EngineConfig {
    pub derived: DerivedRuleIds,
    pub unarmed_damage: String,
    /// Categories a weapon may have to be equipped.
    pub weapon_categories: Vec<String>,
    /// Weapon categories that add the wielder's damage bonus.
    pub damage_bonus_categories: Vec<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            derived: DerivedRuleIds::default(),
            unarmed_damage: "1d3".into(),
            weapon_categories: WeaponCategory::ALL.iter().map(|c| c.as_str().to_string()).collect(),
            damage_bonus_categories: vec![WeaponCategory::Melee.as_str().to_string()],
        }
    }
}

impl EngineConfig {
    pub fn from_yaml_str(text: &str) -> Result<Self, EngineError> {
        serde_yaml::from_str(text).map_err(|e| EngineError::Config(e.to_string()))
    }

    pub fn from_json_str(text: &str) -> Result<Self, EngineError> {
        serde_json::from_str(text).map_err(|e| EngineError::Config(e.to_string()))
    }

    pub fn is_weapon_category(&self, category: &str) -> bool {
        self.weapon_categories.iter().any(|c| c.eq_ignore_ascii_case(category))
    }

    pub fn gets_damage_bonus(&self, category: &str) -> bool {
        self.damage_bonus_categories.iter().any(|c| c.eq_ignore_ascii_case(category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let cfg = EngineConfig::from_yaml_str("unarmed_damage: 1d4\nderived:\n  hp: hit_points\n").unwrap();
        assert_eq!(cfg.unarmed_damage, "1d4");
        assert_eq!(cfg.derived.hp, "hit_points");
        assert_eq!(cfg.derived.mp, "mp_total");
        assert!(cfg.gets_damage_bonus("Melee"));
        assert!(!cfg.gets_damage_bonus("firearm"));
    }

    #[test]
    fn bad_json_is_a_config_error() {
        assert!(matches!(EngineConfig::from_json_str("{\"weapon_categories\": 3}"), Err(EngineError::Config(_))));
    }
}
