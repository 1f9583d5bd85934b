use serde::Serialize;
use tracing::info;

use crate::Dice;
use crate::character::{Character, CharacterStore};
use crate::checks::{self, RollRecord, SkillCheck};
use crate::combat::{self, DamageReport};
use crate::config::EngineConfig;
use crate::context::Context;
use crate::derived::{self, Derivation, DerivedStats};
use crate::dice::parse_and_roll;
use crate::error::EngineError;
use crate::resolver::{Resolution, Resolver};
use crate::rules::RuleRegistry;
use crate::source::RuleSource;

/// One rule set plus its configuration. Build as many as you like; nothing is
/// shared between engines.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    resolver: Resolver,
    config: EngineConfig,
}

/// A full attack: the expression built, what it rolled, and what got through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttackReport {
    pub attacker: String,
    pub target: String,
    pub expression: String,
    pub damage: DamageReport,
}

impl Engine {
    pub fn new(registry: RuleRegistry) -> Self {
        Self::with_config(registry, EngineConfig::default())
    }

    pub fn with_config(registry: RuleRegistry, config: EngineConfig) -> Self {
        Self { resolver: Resolver::new(registry), config }
    }

    pub fn from_sources(sources: &[&dyn RuleSource], config: EngineConfig) -> Result<Self, EngineError> {
        let registry = RuleRegistry::load(sources)?;
        info!(rules = registry.len(), "rule registry loaded");
        Ok(Self::with_config(registry, config))
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn registry(&self) -> &RuleRegistry {
        self.resolver.registry()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn resolve(&self, rule_id: &str, ctx: &Context, dice: &mut Dice) -> Resolution {
        self.resolver.resolve(rule_id, ctx, dice)
    }

    pub fn derive(&self, character: &Character, dice: &mut Dice) -> Derivation {
        derived::derive(&self.resolver, &self.config.derived, &character.context(), dice)
    }

    /// Derive the character's stats and set current HP/MP to their maxima.
    pub fn initialize_state<S: CharacterStore + ?Sized>(
        &self,
        store: &mut S,
        character_id: &str,
        dice: &mut Dice,
    ) -> Result<DerivedStats, EngineError> {
        let character = store.character(character_id)?;
        let stats = self.derive(&character, dice).stats;
        store.set_current_hp_mp(character_id, stats.max_hp, stats.max_mp)?;
        info!(character = character_id, hp = stats.max_hp, mp = stats.max_mp, "state initialized");
        Ok(stats)
    }

    pub fn skill_total<S: CharacterStore + ?Sized>(
        &self,
        store: &S,
        character_id: &str,
        skill_id: &str,
        dice: &mut Dice,
    ) -> Result<i64, EngineError> {
        let character = store.character(character_id)?;
        checks::skill_total(&self.resolver, &character, skill_id, dice)
    }

    pub fn roll_skill<S: CharacterStore + ?Sized>(
        &self,
        store: &S,
        character_id: &str,
        skill_id: &str,
        dice: &mut Dice,
        audit: impl FnMut(RollRecord),
    ) -> Result<SkillCheck, EngineError> {
        let character = store.character(character_id)?;
        checks::roll_skill(&self.resolver, &character, skill_id, dice, audit)
    }

    pub fn build_damage_expression(&self, attacker: &Character, dice: &mut Dice) -> Result<String, EngineError> {
        combat::build_damage_expression(&self.resolver, &self.config, attacker, dice)
    }

    pub fn compute_attack_damage<S: CharacterStore + ?Sized>(
        &self,
        store: &S,
        attacker_id: &str,
        dice: &mut Dice,
    ) -> Result<String, EngineError> {
        let attacker = store.character(attacker_id)?;
        self.build_damage_expression(&attacker, dice)
    }

    /// Roll a damage expression; bad notation rolls 0.
    pub fn roll_damage(&self, expression: &str, dice: &mut Dice) -> i64 {
        parse_and_roll(dice, expression)
    }

    pub fn resolve_damage<S: CharacterStore + ?Sized>(
        &self,
        store: &mut S,
        target_id: &str,
        rolled: i64,
    ) -> Result<DamageReport, EngineError> {
        combat::resolve_damage(&self.resolver, store, target_id, rolled)
    }

    /// Build, roll and apply one hit from `attacker_id` to `target_id`.
    pub fn attack<S: CharacterStore + ?Sized>(
        &self,
        store: &mut S,
        attacker_id: &str,
        target_id: &str,
        dice: &mut Dice,
    ) -> Result<AttackReport, EngineError> {
        store.character(target_id)?;
        let expression = self.compute_attack_damage(store, attacker_id, dice)?;
        let rolled = self.roll_damage(&expression, dice);
        let damage = self.resolve_damage(store, target_id, rolled)?;
        Ok(AttackReport { attacker: attacker_id.to_string(), target: target_id.to_string(), expression, damage })
    }

    pub fn equip_weapon<S: CharacterStore + ?Sized>(
        &self,
        store: &mut S,
        character_id: &str,
        weapon_id: &str,
    ) -> Result<bool, EngineError> {
        combat::equip_weapon(&self.resolver, &self.config, store, character_id, weapon_id)
    }
}
