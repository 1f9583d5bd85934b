use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub mod api;
pub mod character;
pub mod checks;
pub mod combat;
pub mod config;
pub mod content;
pub mod context;
pub mod derived;
pub mod dice;
pub mod error;
pub mod expr;
pub mod logging;
pub mod resolver;
pub mod rules;
pub mod source;
pub mod value;

pub use api::{AttackReport, Engine};
pub use character::{Character, CharacterStore, MemoryStore};
pub use checks::{RollHistory, RollRecord, SkillCheck, SuccessTier, classify, special_threshold};
pub use combat::{DamageReport, Weapon, WeaponCategory, apply_mitigation};
pub use config::{DerivedRuleIds, EngineConfig};
pub use context::{Attribute, Context};
pub use derived::{Derivation, DerivedStats};
pub use dice::{DiceExpr, parse_and_roll, parse_dice};
pub use error::{DiceError, EngineError, RegistryError, SourceError};
pub use expr::{EvalError, Expr, ParseError};
pub use resolver::{Diagnostic, Resolution, Resolver};
pub use rules::{Rule, RuleRegistry};
pub use source::{FileSource, Format, MemorySource, RuleSource, TextSource};
pub use value::Value;

/// Random source for every roll the engine makes.
///
/// Scripted values are consumed first (in order), then the seeded generator
/// takes over. Scripted values are clamped into the die's range.
pub struct Dice {
    rng: ChaCha8Rng,
    script: VecDeque<u32>,
}

impl Dice {
    pub fn from_seed(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed), script: VecDeque::new() }
    }

    pub fn from_entropy() -> Self {
        Self::from_seed(rand::random())
    }

    pub fn from_scripted(values: Vec<u32>) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(0), script: values.into() }
    }

    /// One uniform integer in `[1, sides]`. A zero-sided die yields 0.
    pub fn die(&mut self, sides: u32) -> u32 {
        if sides == 0 {
            return 0;
        }
        match self.script.pop_front() {
            Some(v) => v.clamp(1, sides),
            None => self.rng.gen_range(1..=sides),
        }
    }

    pub fn d100(&mut self) -> u32 {
        self.die(100)
    }
}

impl Default for Dice {
    fn default() -> Self {
        Self::from_entropy()
    }
}
