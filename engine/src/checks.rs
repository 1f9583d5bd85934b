use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::Dice;
use crate::character::Character;
use crate::error::EngineError;
use crate::resolver::Resolver;

/// Outcome of a percentile skill roll, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuccessTier {
    Failure,
    Success,
    SpecialSuccess,
}

impl fmt::Display for SuccessTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SuccessTier::Failure => "Failure",
            SuccessTier::Success => "Success",
            SuccessTier::SpecialSuccess => "Special Success",
        })
    }
}

/// One fifth of the rating, rounded up.
pub fn special_threshold(total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    total / 5 + i64::from(total % 5 != 0)
}

/// Classify a d100 roll against a skill total.
pub fn classify(roll: i64, total: i64) -> SuccessTier {
    if roll <= special_threshold(total) {
        SuccessTier::SpecialSuccess
    } else if roll <= total {
        SuccessTier::Success
    } else {
        SuccessTier::Failure
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkillCheck {
    pub tier: SuccessTier,
    pub roll: i64,
    pub total: i64,
}

/// Audit entry written for every skill roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollRecord {
    pub character_id: String,
    pub skill_id: String,
    pub roll: i64,
    pub tier: SuccessTier,
}

impl fmt::Display for RollRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[SKILL][{}] {} d100={} -> {}", self.character_id, self.skill_id, self.roll, self.tier)
    }
}

/// In-memory audit log.
#[derive(Debug, Clone, Default)]
pub struct RollHistory {
    pub records: Vec<RollRecord>,
}

impl RollHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sink(&mut self) -> impl FnMut(RollRecord) + '_ {
        move |record| self.records.push(record)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last(&self) -> Option<&RollRecord> {
        self.records.last()
    }
}

/// Base rating from the skill's rule plus allocated points, never below 0.
///
/// The skill must exist; a formula that errors or yields a non-number
/// counts as 0.
pub fn skill_total(
    resolver: &Resolver,
    character: &Character,
    skill_id: &str,
    dice: &mut Dice,
) -> Result<i64, EngineError> {
    if !resolver.registry().contains(skill_id) {
        return Err(EngineError::SkillNotFound(skill_id.to_string()));
    }
    let res = resolver.resolve(skill_id, &character.context(), dice);
    if res.number().is_none() {
        warn!(skill = skill_id, value = ?res.value, "skill base is not a number; using 0");
    }
    let base = res.number_or_zero().trunc() as i64;
    Ok(base.saturating_add(character.skill_points(skill_id)).max(0))
}

/// Roll d100 against the skill and hand the audit record to `audit` before
/// returning.
pub fn roll_skill(
    resolver: &Resolver,
    character: &Character,
    skill_id: &str,
    dice: &mut Dice,
    mut audit: impl FnMut(RollRecord),
) -> Result<SkillCheck, EngineError> {
    let total = skill_total(resolver, character, skill_id, dice)?;
    let roll = i64::from(dice.d100());
    let tier = classify(roll, total);
    debug!(character = %character.id, skill = skill_id, roll, total, %tier, "skill roll");
    audit(RollRecord { character_id: character.id.clone(), skill_id: skill_id.to_string(), roll, tier });
    Ok(SkillCheck { tier, roll, total })
}
