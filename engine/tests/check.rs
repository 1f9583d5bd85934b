use brp_engine::checks::{roll_skill, skill_total};
use brp_engine::{
    Attribute, Character, Dice, EngineError, MemoryStore, Resolver, RollHistory, RollRecord, Rule, RuleRegistry,
    SuccessTier, classify, special_threshold,
};

fn resolver() -> Resolver {
    Resolver::new(
        RuleRegistry::new(vec![
            Rule::new("skill_dodge").with_formula("DEX * 2", ["DEX"]),
            Rule::new("skill_climb").with_formula("40", Vec::<String>::new()),
            Rule::new("skill_zero").with_formula("0", Vec::<String>::new()),
            Rule::new("skill_broken").with_formula("DEX / 0", ["DEX"]),
            Rule::new("skill_lore").with_description("Ask the GM."),
        ])
        .unwrap(),
    )
}

fn hero() -> Character {
    Character::new("char_001", "Ana").with_attr(Attribute::Dex, 14).with_skill_points("skill_dodge", 12)
}

#[test]
fn boundary_rolls_classify_exactly() {
    let total = 45;
    let special = special_threshold(total);
    assert_eq!(special, 9);
    assert_eq!(classify(1, total), SuccessTier::SpecialSuccess);
    assert_eq!(classify(special, total), SuccessTier::SpecialSuccess);
    assert_eq!(classify(special + 1, total), SuccessTier::Success);
    assert_eq!(classify(total, total), SuccessTier::Success);
    assert_eq!(classify(total + 1, total), SuccessTier::Failure);
    assert_eq!(classify(100, total), SuccessTier::Failure);
}

#[test]
fn zero_total_always_fails() {
    for roll in 1..=100 {
        assert_eq!(classify(roll, 0), SuccessTier::Failure);
    }
}

#[test]
fn hundred_or_more_never_fails() {
    for roll in 1..=100 {
        assert_ne!(classify(roll, 100), SuccessTier::Failure);
        assert_ne!(classify(roll, 130), SuccessTier::Failure);
    }
}

#[test]
fn total_adds_allocated_points() {
    let r = resolver();
    let mut dice = Dice::from_seed(1);
    assert_eq!(skill_total(&r, &hero(), "skill_dodge", &mut dice).unwrap(), 40);
    assert_eq!(skill_total(&r, &hero(), "skill_climb", &mut dice).unwrap(), 40);
}

#[test]
fn unusable_skill_formula_counts_as_zero() {
    let r = resolver();
    let mut dice = Dice::from_seed(1);
    assert_eq!(skill_total(&r, &hero(), "skill_broken", &mut dice).unwrap(), 0);
    assert_eq!(skill_total(&r, &hero(), "skill_lore", &mut dice).unwrap(), 0);
    let penalized = hero().with_skill_points("skill_zero", -20);
    assert_eq!(skill_total(&r, &penalized, "skill_zero", &mut dice).unwrap(), 0);
}

#[test]
fn unknown_skill_is_a_hard_error() {
    let r = resolver();
    let err = skill_total(&r, &hero(), "skill_flying", &mut Dice::from_seed(1)).unwrap_err();
    assert!(matches!(err, EngineError::SkillNotFound(id) if id == "skill_flying"));
}

#[test]
fn scripted_roll_is_audited_before_returning() {
    let r = resolver();
    let mut history = RollHistory::new();
    let mut dice = Dice::from_scripted(vec![8]);
    let check = roll_skill(&r, &hero(), "skill_dodge", &mut dice, history.sink()).unwrap();
    assert_eq!((check.tier, check.roll, check.total), (SuccessTier::SpecialSuccess, 8, 40));
    assert_eq!(
        history.last(),
        Some(&RollRecord {
            character_id: "char_001".into(),
            skill_id: "skill_dodge".into(),
            roll: 8,
            tier: SuccessTier::SpecialSuccess,
        })
    );
    assert_eq!(history.last().unwrap().to_string(), "[SKILL][char_001] skill_dodge d100=8 -> Special Success");
}

#[test]
fn failed_lookup_writes_no_audit_record() {
    let r = resolver();
    let mut history = RollHistory::new();
    let out = roll_skill(&r, &hero(), "skill_flying", &mut Dice::from_seed(1), history.sink());
    assert!(out.is_err());
    assert!(history.is_empty());
}

#[test]
fn engine_rolls_by_character_id() {
    let engine = brp_engine::content::builtin_engine().unwrap();
    let store: MemoryStore = [hero()].into_iter().collect();
    let mut seen = Vec::new();
    let check = engine
        .roll_skill(&store, "char_001", "skill_dodge", &mut Dice::from_scripted(vec![41]), |rec| seen.push(rec))
        .unwrap();
    assert_eq!(check.tier, SuccessTier::Failure);
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].tier, check.tier);

    let missing = engine.roll_skill(&store, "char_404", "skill_dodge", &mut Dice::from_seed(1), |_| {});
    assert!(matches!(missing, Err(EngineError::CharacterNotFound(_))));
}

#[test]
fn same_seed_same_checks() {
    let r = resolver();
    let run = |seed| {
        let mut dice = Dice::from_seed(seed);
        (0..10)
            .map(|_| roll_skill(&r, &hero(), "skill_dodge", &mut dice, |_| {}).unwrap())
            .collect::<Vec<_>>()
    };
    assert_eq!(run(77), run(77));
}

#[test]
fn threshold_holds_at_the_top_of_the_range() {
    assert_eq!(special_threshold(i64::MAX), i64::MAX / 5 + 1);
    assert_eq!(special_threshold(i64::MAX - 2), i64::MAX / 5);
    assert_eq!(classify(100, i64::MAX), SuccessTier::SpecialSuccess);

    let r = Resolver::new(
        RuleRegistry::new(vec![Rule::new("skill_big").with_formula("9223372036854775807", Vec::<String>::new())])
            .unwrap(),
    );
    let c = hero().with_skill_points("skill_big", 10);
    let mut dice = Dice::from_scripted(vec![100]);
    assert_eq!(skill_total(&r, &c, "skill_big", &mut dice).unwrap(), i64::MAX);
    let check = roll_skill(&r, &c, "skill_big", &mut dice, |_| {}).unwrap();
    assert_eq!(check.tier, SuccessTier::SpecialSuccess);
}
