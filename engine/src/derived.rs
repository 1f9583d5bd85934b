//! Derived characteristics: HP, MP, damage bonus, movement, action points and
//! initiative, each read from a well-known rule.
//!
//! HP rounds fractional results up; every other number truncates toward zero.

use serde::Serialize;

use crate::Dice;
use crate::config::DerivedRuleIds;
use crate::context::{Attribute, Context};
use crate::resolver::{Diagnostic, Resolution, Resolver};
use crate::value::{Value, float_to_i64};

pub const NEUTRAL_BONUS: &str = "+0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DerivedStats {
    pub max_hp: i64,
    pub max_mp: i64,
    pub damage_bonus: String,
    pub movement_rate: i64,
    pub action_points: i64,
    pub initiative_rank: i64,
}

/// Derived stats plus whatever the underlying resolutions reported.
#[derive(Debug, Clone, PartialEq)]
pub struct Derivation {
    pub stats: DerivedStats,
    pub diagnostics: Vec<Diagnostic>,
}

pub fn derive(resolver: &Resolver, ids: &DerivedRuleIds, ctx: &Context, dice: &mut Dice) -> Derivation {
    let mut diagnostics = Vec::new();
    let mut number = |rule_id: &str, round: fn(f64) -> f64, dice: &mut Dice| -> i64 {
        let res = resolver.resolve(rule_id, ctx, dice);
        diagnostics.extend(res.diagnostics.iter().cloned());
        float_to_i64(round(res.number_or_zero())).unwrap_or(0)
    };

    let max_hp = number(&ids.hp, f64::ceil, &mut *dice);
    let max_mp = if resolver.registry().contains(&ids.mp) {
        number(&ids.mp, f64::trunc, &mut *dice)
    } else {
        ctx.get(Attribute::Pow.abbrev()).and_then(Value::as_i64).unwrap_or(0)
    };
    let movement_rate = number(&ids.movement, f64::trunc, &mut *dice);
    let action_points = number(&ids.action_points, f64::trunc, &mut *dice);
    let initiative_rank = number(&ids.initiative, f64::trunc, &mut *dice);

    let bonus = resolver.resolve(&ids.damage_bonus, ctx, dice);
    let damage_bonus = bonus_text(&bonus);
    diagnostics.extend(bonus.diagnostics);

    Derivation {
        stats: DerivedStats { max_hp, max_mp, damage_bonus, movement_rate, action_points, initiative_rank },
        diagnostics,
    }
}

/// Resolve only the damage bonus, e.g. `"+1d4"`.
pub fn damage_bonus(resolver: &Resolver, rule_id: &str, ctx: &Context, dice: &mut Dice) -> String {
    bonus_text(&resolver.resolve(rule_id, ctx, dice))
}

/// Damage bonus as signed dice text; nothing usable means `"+0"`.
fn bonus_text(res: &Resolution) -> String {
    match &res.value {
        Some(Value::Str(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(v) => match v.as_i64() {
            Some(n) if n != 0 => format!("{:+}", n),
            _ => NEUTRAL_BONUS.to_string(),
        },
        None => NEUTRAL_BONUS.to_string(),
    }
}

/// Whether a damage bonus adds nothing (`+0`, `0`, `-0` or blank).
pub fn is_neutral_bonus(bonus: &str) -> bool {
    matches!(bonus.trim(), "" | "0" | "+0" | "-0")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_bonus_spellings() {
        assert!(is_neutral_bonus(" +0 "));
        assert!(is_neutral_bonus("-0"));
        assert!(is_neutral_bonus(""));
        assert!(!is_neutral_bonus("+1d4"));
    }

    #[test]
    fn numeric_bonus_gets_a_sign() {
        let res = Resolution { rule_id: "db".into(), value: Some(Value::Int(2)), diagnostics: vec![] };
        assert_eq!(bonus_text(&res), "+2");
    }
}
