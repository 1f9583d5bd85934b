use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::context::{Attribute, Context};
use crate::error::EngineError;

/// A persisted character as the engine sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Characteristic scores keyed by abbreviation (`STR`, `CON`, ...).
    #[serde(default)]
    pub attributes: IndexMap<String, i64>,
    /// Points allocated to skills on top of their base formula.
    #[serde(default)]
    pub skill_points: IndexMap<String, i64>,
    #[serde(default)]
    pub equipped_weapon: Option<String>,
    #[serde(default)]
    pub equipped_armor: Option<String>,
    #[serde(default)]
    pub current_hp: Option<i64>,
    #[serde(default)]
    pub current_mp: Option<i64>,
}

impl Character {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            attributes: IndexMap::new(),
            skill_points: IndexMap::new(),
            equipped_weapon: None,
            equipped_armor: None,
            current_hp: None,
            current_mp: None,
        }
    }

    pub fn with_attr(mut self, attr: Attribute, score: i64) -> Self {
        self.attributes.insert(attr.abbrev().to_string(), score);
        self
    }

    pub fn with_skill_points(mut self, skill_id: &str, points: i64) -> Self {
        self.skill_points.insert(skill_id.to_string(), points);
        self
    }

    pub fn with_weapon(mut self, weapon_id: &str) -> Self {
        self.equipped_weapon = Some(weapon_id.to_string());
        self
    }

    pub fn with_armor(mut self, armor_id: &str) -> Self {
        self.equipped_armor = Some(armor_id.to_string());
        self
    }

    pub fn attr(&self, attr: Attribute) -> i64 {
        self.attributes
            .iter()
            .find(|(k, _)| k.parse::<Attribute>() == Ok(attr))
            .map(|(_, v)| *v)
            .unwrap_or(0)
    }

    pub fn skill_points(&self, skill_id: &str) -> i64 {
        self.skill_points.get(skill_id).copied().unwrap_or(0)
    }

    /// Variables for rule resolution: every characteristic under its
    /// abbreviation and its full name. Unrecognised attribute keys pass
    /// through as-is.
    pub fn context(&self) -> Context {
        let mut ctx = Context::new();
        for (key, score) in &self.attributes {
            match key.parse::<Attribute>() {
                Ok(attr) => {
                    ctx.set(attr.abbrev(), *score);
                    ctx.set(attr.full_name(), *score);
                }
                Err(_) => {
                    ctx.set(key, *score);
                }
            }
        }
        ctx
    }
}

/// Storage collaborator. The engine reads characters and asks for the few
/// writes the rules produce; persistence is the implementor's business.
pub trait CharacterStore {
    fn character(&self, id: &str) -> Result<Character, EngineError>;

    fn set_equipped_weapon(&mut self, id: &str, weapon_id: &str) -> Result<(), EngineError>;

    /// Subtract `amount` from current HP. Returns the new value.
    ///
    /// Fails with `StateNotInitialized` if the character has no current HP
    /// yet (see `Engine::initialize_state`).
    fn apply_hp_loss(&mut self, id: &str, amount: i64) -> Result<i64, EngineError>;

    fn set_current_hp_mp(&mut self, id: &str, hp: i64, mp: i64) -> Result<(), EngineError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    characters: IndexMap<String, Character>,
    writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, character: Character) {
        self.characters.insert(character.id.clone(), character);
    }

    pub fn get(&self, id: &str) -> Option<&Character> {
        self.characters.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Character> {
        self.characters.values()
    }

    /// Number of mutating calls that reached the store.
    pub fn writes(&self) -> usize {
        self.writes
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Character, EngineError> {
        self.characters.get_mut(id).ok_or_else(|| EngineError::CharacterNotFound(id.to_string()))
    }
}

impl FromIterator<Character> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = Character>>(iter: I) -> Self {
        let mut store = MemoryStore::new();
        for c in iter {
            store.insert(c);
        }
        store
    }
}

impl CharacterStore for MemoryStore {
    fn character(&self, id: &str) -> Result<Character, EngineError> {
        self.characters.get(id).cloned().ok_or_else(|| EngineError::CharacterNotFound(id.to_string()))
    }

    fn set_equipped_weapon(&mut self, id: &str, weapon_id: &str) -> Result<(), EngineError> {
        self.get_mut(id)?.equipped_weapon = Some(weapon_id.to_string());
        self.writes += 1;
        Ok(())
    }

    fn apply_hp_loss(&mut self, id: &str, amount: i64) -> Result<i64, EngineError> {
        let c = self.get_mut(id)?;
        let current = c.current_hp.ok_or_else(|| EngineError::StateNotInitialized(id.to_string()))?;
        let hp = current.saturating_sub(amount);
        c.current_hp = Some(hp);
        self.writes += 1;
        Ok(hp)
    }

    fn set_current_hp_mp(&mut self, id: &str, hp: i64, mp: i64) -> Result<(), EngineError> {
        let c = self.get_mut(id)?;
        c.current_hp = Some(hp);
        c.current_mp = Some(mp);
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn context_has_both_spellings() {
        let c = Character::new("c1", "Ash").with_attr(Attribute::Str, 13).with_attr(Attribute::Pow, 11);
        let ctx = c.context();
        assert_eq!(ctx.get("STR"), Some(&Value::Int(13)));
        assert_eq!(ctx.get("strength"), Some(&Value::Int(13)));
        assert_eq!(ctx.get("power"), Some(&Value::Int(11)));
        assert_eq!(c.attr(Attribute::Dex), 0);
    }

    #[test]
    fn unknown_character_is_an_error() {
        let mut store = MemoryStore::new();
        assert!(matches!(store.apply_hp_loss("ghost", 3), Err(EngineError::CharacterNotFound(_))));
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn hp_loss_needs_initialized_state() {
        let mut store: MemoryStore = [Character::new("t", "Target")].into_iter().collect();
        assert!(matches!(store.apply_hp_loss("t", 5), Err(EngineError::StateNotInitialized(ref id)) if id == "t"));
        assert_eq!(store.get("t").and_then(|c| c.current_hp), None);
        assert_eq!(store.writes(), 0);

        store.set_current_hp_mp("t", 12, 10).unwrap();
        assert_eq!(store.apply_hp_loss("t", 5).unwrap(), 7);
    }
}
