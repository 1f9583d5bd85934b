use serde::Serialize;
use tracing::{debug, warn};

use crate::Dice;
use crate::character::{Character, CharacterStore};
use crate::combat::Weapon;
use crate::config::EngineConfig;
use crate::derived::{damage_bonus, is_neutral_bonus};
use crate::error::EngineError;
use crate::resolver::Resolver;
use crate::value::Value;

/// Damage left after armor. Never negative: armor does not heal.
pub fn apply_mitigation(raw_damage: i64, armor_points: i64) -> i64 {
    raw_damage.saturating_sub(armor_points).max(0)
}

/// Dice notation for the attacker's next hit: weapon damage plus the damage
/// bonus when the weapon is eligible. Unarmed attacks add no bonus.
pub fn build_damage_expression(
    resolver: &Resolver,
    config: &EngineConfig,
    attacker: &Character,
    dice: &mut Dice,
) -> Result<String, EngineError> {
    let Some(weapon_id) = attacker.equipped_weapon.as_deref() else {
        return Ok(config.unarmed_damage.clone());
    };
    let rule = resolver.rule(weapon_id).ok_or_else(|| EngineError::WeaponNotFound(weapon_id.to_string()))?;
    let weapon = Weapon::from_rule(rule);

    let mut expr = match weapon.damage {
        Some(damage) => damage,
        None => {
            warn!(weapon = weapon_id, "weapon has no damage; using unarmed damage");
            config.unarmed_damage.clone()
        }
    };

    let eligible = weapon
        .applies_damage_bonus
        .unwrap_or_else(|| weapon.category.is_some_and(|c| config.gets_damage_bonus(c)));
    if eligible {
        let bonus = damage_bonus(resolver, &config.derived.damage_bonus, &attacker.context(), dice);
        if !is_neutral_bonus(&bonus) {
            if !bonus.starts_with(['+', '-']) {
                expr.push('+');
            }
            expr.push_str(&bonus);
        }
    }
    debug!(attacker = %attacker.id, weapon = weapon_id, %expr, "damage expression");
    Ok(expr)
}

/// Armor points of the character's equipped armor, 0 when unarmored.
pub fn armor_points(resolver: &Resolver, character: &Character) -> i64 {
    let Some(armor_id) = character.equipped_armor.as_deref() else {
        return 0;
    };
    match resolver.rule(armor_id) {
        Some(rule) => rule.meta("armor_points").and_then(Value::as_i64).unwrap_or(0),
        None => {
            warn!(character = %character.id, armor = armor_id, "equipped armor not in catalog; no protection");
            0
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DamageReport {
    pub rolled: i64,
    pub armor_points: i64,
    pub actual: i64,
    /// HP after the hit; `None` when nothing got through and no write happened.
    pub hp_after: Option<i64>,
}

/// Mitigate a rolled hit against the target's armor and write the HP loss.
/// A hit that deals no net damage performs no write.
pub fn resolve_damage<S: CharacterStore + ?Sized>(
    resolver: &Resolver,
    store: &mut S,
    target_id: &str,
    rolled: i64,
) -> Result<DamageReport, EngineError> {
    let target = store.character(target_id)?;
    let armor_points = armor_points(resolver, &target);
    let actual = apply_mitigation(rolled, armor_points);
    let hp_after = if actual > 0 { Some(store.apply_hp_loss(target_id, actual)?) } else { None };
    debug!(target = target_id, rolled, armor_points, actual, ?hp_after, "damage applied");
    Ok(DamageReport { rolled, armor_points, actual, hp_after })
}
