use tracing::{info, warn};

use crate::character::CharacterStore;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::resolver::Resolver;

/// Equip `weapon_id` on the character.
///
/// An unknown character is an error. A weapon id missing from the catalog, or
/// one whose category is not a weapon category, is refused with `Ok(false)`
/// and nothing is written.
pub fn equip_weapon<S: CharacterStore + ?Sized>(
    resolver: &Resolver,
    config: &EngineConfig,
    store: &mut S,
    character_id: &str,
    weapon_id: &str,
) -> Result<bool, EngineError> {
    store.character(character_id)?;

    let Some(rule) = resolver.rule(weapon_id) else {
        warn!(character = character_id, weapon = weapon_id, "equip refused: not in catalog");
        return Ok(false);
    };
    match rule.category() {
        Some(category) if config.is_weapon_category(category) => {}
        category => {
            warn!(character = character_id, weapon = weapon_id, ?category, "equip refused: not a weapon");
            return Ok(false);
        }
    }

    store.set_equipped_weapon(character_id, weapon_id)?;
    info!(character = character_id, weapon = weapon_id, "weapon equipped");
    Ok(true)
}
