use brp_engine::content::{builtin_characters, builtin_engine, builtin_rules, builtin_sources};
use brp_engine::{CharacterStore, Dice, MemoryStore, RollHistory, RuleRegistry, RuleSource, SuccessTier};

#[test]
fn builtin_pack_loads_without_parse_errors() {
    let rules = builtin_rules().unwrap();
    assert!(rules.iter().any(|r| r.id == "damage_bonus_calculation"));
    assert!(rules.iter().any(|r| r.id == "skill_dodge"));
    assert!(rules.iter().any(|r| r.id == "weapon_fist"));

    let engine = builtin_engine().unwrap();
    assert_eq!(engine.registry().len(), rules.len());
    let mut dice = Dice::from_seed(1);
    let ctx = brp_engine::Context::new();
    for id in engine.registry().ids() {
        let res = engine.resolve(id, &ctx, &mut dice);
        assert!(
            !matches!(res.error(), Some(brp_engine::EvalError::Parse(_))),
            "{id} does not parse: {:?}",
            res.error()
        );
    }
}

#[test]
fn builtin_sources_name_themselves() {
    let sources = builtin_sources();
    let names: Vec<String> = sources.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["builtin:core.json", "builtin:skills.yaml", "builtin:equipment.json"]);

    let core_only: [&dyn RuleSource; 1] = [&sources[0]];
    let registry = RuleRegistry::load(&core_only).unwrap();
    assert!(registry.contains("hp_total"));
    assert!(!registry.contains("skill_dodge"));
}

#[test]
fn sample_characters_play_a_round() {
    let engine = builtin_engine().unwrap();
    let mut store: MemoryStore = builtin_characters().unwrap().into_iter().collect();
    let mut dice = Dice::from_seed(2025);

    let ana = engine.initialize_state(&mut store, "char_001", &mut dice).unwrap();
    assert_eq!(ana.max_hp, 13);
    assert_eq!(ana.max_mp, 11);
    assert_eq!(ana.damage_bonus, "+1d4");
    engine.initialize_state(&mut store, "char_002", &mut dice).unwrap();
    let bandit_hp = store.character("char_002").unwrap().current_hp;
    assert_eq!(bandit_hp, Some(12));

    assert_eq!(engine.compute_attack_damage(&store, "char_001", &mut dice).unwrap(), "1d8+1+1d4");
    assert_eq!(engine.compute_attack_damage(&store, "char_002", &mut dice).unwrap(), "1d6+1d4");

    let mut history = RollHistory::new();
    let check = engine
        .roll_skill(&store, "char_001", "skill_dodge", &mut Dice::from_scripted(vec![7]), history.sink())
        .unwrap();
    assert_eq!(check.total, 42);
    assert_eq!(check.tier, SuccessTier::SpecialSuccess);
    assert_eq!(history.len(), 1);

    let hit = engine.attack(&mut store, "char_001", "char_002", &mut Dice::from_scripted(vec![8, 4])).unwrap();
    assert_eq!(hit.damage.rolled, 13);
    assert_eq!(hit.damage.actual, 6);
    assert_eq!(store.character("char_002").unwrap().current_hp, Some(6));
}
