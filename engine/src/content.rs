//! The bundled BRP quick-start rule pack and sample characters.

use crate::api::Engine;
use crate::character::Character;
use crate::config::EngineConfig;
use crate::error::{EngineError, SourceError};
use crate::rules::{Rule, RuleRegistry};
use crate::source::{Format, RuleSource, TextSource, parse_rules};

const CORE: &str = include_str!("../content/rules/core.json");
const SKILLS: &str = include_str!("../content/rules/skills.yaml");
const EQUIPMENT: &str = include_str!("../content/rules/equipment.json");
const CHARACTERS: &str = include_str!("../content/characters/sample.json");

pub fn builtin_sources() -> Vec<TextSource> {
    vec![
        TextSource::json("builtin:core.json", CORE),
        TextSource::yaml("builtin:skills.yaml", SKILLS),
        TextSource::json("builtin:equipment.json", EQUIPMENT),
    ]
}

pub fn builtin_rules() -> Result<Vec<Rule>, SourceError> {
    let mut rules = parse_rules(CORE, Format::Json, "builtin:core.json")?;
    rules.extend(parse_rules(SKILLS, Format::Yaml, "builtin:skills.yaml")?);
    rules.extend(parse_rules(EQUIPMENT, Format::Json, "builtin:equipment.json")?);
    Ok(rules)
}

pub fn builtin_registry() -> Result<RuleRegistry, EngineError> {
    let sources = builtin_sources();
    let refs: Vec<&dyn RuleSource> = sources.iter().map(|s| s as &dyn RuleSource).collect();
    Ok(RuleRegistry::load(&refs)?)
}

pub fn builtin_engine() -> Result<Engine, EngineError> {
    Ok(Engine::with_config(builtin_registry()?, EngineConfig::default()))
}

pub fn builtin_characters() -> Result<Vec<Character>, SourceError> {
    serde_json::from_str(CHARACTERS)
        .map_err(|source| SourceError::Json { origin: "builtin:sample.json".to_string(), source })
}
