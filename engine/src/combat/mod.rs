//! Weapon damage, the damage bonus and armor mitigation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::rules::Rule;
use crate::value::Value;

pub mod damage;
pub mod equip;

pub use damage::{DamageReport, apply_mitigation, armor_points, build_damage_expression, resolve_damage};
pub use equip::equip_weapon;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponCategory {
    Melee,
    Missile,
    Firearm,
    Energy,
}

impl WeaponCategory {
    pub const ALL: [WeaponCategory; 4] =
        [WeaponCategory::Melee, WeaponCategory::Missile, WeaponCategory::Firearm, WeaponCategory::Energy];

    pub fn as_str(self) -> &'static str {
        match self {
            WeaponCategory::Melee => "melee",
            WeaponCategory::Missile => "missile",
            WeaponCategory::Firearm => "firearm",
            WeaponCategory::Energy => "energy",
        }
    }
}

impl fmt::Display for WeaponCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeaponCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WeaponCategory::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown weapon category '{}'", s))
    }
}

/// Catalog view of a weapon rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Weapon<'r> {
    pub id: &'r str,
    pub name: Option<&'r str>,
    /// Base damage notation; numbers are written out as digits.
    pub damage: Option<String>,
    pub category: Option<&'r str>,
    /// Explicit eligibility flag; when absent the category decides.
    pub applies_damage_bonus: Option<bool>,
}

impl<'r> Weapon<'r> {
    pub fn from_rule(rule: &'r Rule) -> Self {
        let damage = match rule.meta("damage").or_else(|| rule.meta("base_damage")) {
            Some(Value::Str(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Some(v @ (Value::Int(_) | Value::Float(_))) => v.as_i64().map(|n| n.to_string()),
            _ => None,
        };
        let applies_damage_bonus = match rule.meta("applies_damage_bonus") {
            Some(Value::Bool(b)) => Some(*b),
            Some(Value::Int(n)) => Some(*n != 0),
            _ => None,
        };
        Self {
            id: &rule.id,
            name: rule.meta("name").and_then(Value::as_str),
            damage,
            category: rule.category(),
            applies_damage_bonus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weapon_view_reads_metadata() {
        let rule = Rule::new("weapon_club")
            .with_meta("name", "Club")
            .with_meta("damage", "1d6")
            .with_meta("category", "melee")
            .with_meta("applies_damage_bonus", false);
        let w = Weapon::from_rule(&rule);
        assert_eq!(w.damage.as_deref(), Some("1d6"));
        assert_eq!(w.category, Some("melee"));
        assert_eq!(w.applies_damage_bonus, Some(false));
        assert_eq!("Firearm".parse::<WeaponCategory>(), Ok(WeaponCategory::Firearm));
    }
}
