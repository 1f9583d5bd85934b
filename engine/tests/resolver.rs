use brp_engine::{Context, Diagnostic, Dice, EvalError, Resolver, Rule, RuleRegistry, Value};

fn resolver(rules: Vec<Rule>) -> Resolver {
    Resolver::new(RuleRegistry::new(rules).unwrap())
}

#[test]
fn formula_sees_bound_inputs() {
    let r = resolver(vec![Rule::new("hp_total").with_formula("(CON + SIZ) / 2", ["CON", "SIZ"])]);
    let ctx = Context::new().with("CON", 12).with("SIZ", 14);
    let res = r.resolve("hp_total", &ctx, &mut Dice::from_seed(1));
    assert_eq!(res.value, Some(Value::Float(13.0)));
    assert!(res.diagnostics.is_empty());
}

#[test]
fn unknown_rule_is_absent_with_a_diagnostic() {
    let r = resolver(vec![]);
    let res = r.resolve("nonexistent_rule", &Context::new(), &mut Dice::from_seed(1));
    assert!(res.is_absent());
    assert!(!res.rule_found());
    assert_eq!(res.diagnostics, vec![Diagnostic::RuleNotFound { rule_id: "nonexistent_rule".into() }]);
    assert_eq!(res.diagnostics[0].to_string(), "rule 'nonexistent_rule' not found");
}

#[test]
fn missing_inputs_default_to_zero() {
    let r = resolver(vec![Rule::new("move").with_formula("DEX + SIZ + 1", ["DEX", "SIZ"])]);
    let ctx = Context::new().with("dex", 10);
    let res = r.resolve("move", &ctx, &mut Dice::from_seed(1));
    assert_eq!(res.value, Some(Value::Int(11)));
    assert_eq!(res.missing_variables(), vec!["SIZ"]);
}

#[test]
fn only_declared_inputs_are_visible() {
    let r = resolver(vec![Rule::new("leak").with_formula("STR + POW", ["STR"])]);
    let ctx = Context::new().with("STR", 10).with("POW", 10);
    let res = r.resolve("leak", &ctx, &mut Dice::from_seed(1));
    assert!(res.is_absent());
    assert_eq!(res.error(), Some(&EvalError::UnknownVariable("pow".into())));
}

#[test]
fn evaluation_failure_is_a_tagged_diagnostic() {
    let r = resolver(vec![Rule::new("broken").with_formula("STR / 0", ["STR"])]);
    let res = r.resolve("broken", &Context::new().with("STR", 3), &mut Dice::from_seed(1));
    assert!(res.is_absent());
    assert!(res.rule_found());
    assert_eq!(res.error(), Some(&EvalError::DivisionByZero));
    assert_eq!(res.number_or_zero(), 0.0);
}

#[test]
fn formula_that_does_not_parse_is_reported_every_time() {
    let r = resolver(vec![Rule::new("bad").with_formula("import os", Vec::<String>::new())]);
    for _ in 0..2 {
        let res = r.resolve("bad", &Context::new(), &mut Dice::from_seed(1));
        assert!(matches!(res.error(), Some(EvalError::Parse(_))));
    }
}

#[test]
fn data_only_rules_return_their_table_or_description() {
    let table = Value::List(vec![Value::Int(1), Value::Int(2)]);
    let r = resolver(vec![
        Rule::new("table_only").with_table(table.clone()),
        Rule::new("prose").with_description("Roll under your skill."),
        Rule::new("empty"),
    ]);
    let mut dice = Dice::from_seed(1);
    let ctx = Context::new();
    assert_eq!(r.resolve("table_only", &ctx, &mut dice).value, Some(table));
    assert_eq!(r.resolve("prose", &ctx, &mut dice).text(), Some("Roll under your skill."));
    let empty = r.resolve("empty", &ctx, &mut dice);
    assert!(empty.is_absent());
    assert!(empty.diagnostics.is_empty());
}

#[test]
fn formula_reads_its_own_table() {
    let table: Value = serde_json::from_str(r#"{"2-12": "-1d6", "25-32": "+1d4"}"#).unwrap();
    let r = resolver(vec![Rule::new("db")
        .with_formula("lookup(data_table, STR + SIZ, '+0')", ["STR", "SIZ"])
        .with_table(table)]);
    let ctx = Context::new().with("STR", 6).with("SIZ", 6);
    assert_eq!(r.resolve("db", &ctx, &mut Dice::from_seed(1)).text(), Some("-1d6"));
}

#[test]
fn resolving_twice_gives_the_same_answer() {
    let r = resolver(vec![Rule::new("ap").with_formula("if(DEX > 15, 2, 1)", ["DEX"])]);
    let ctx = Context::new().with("DEX", 16);
    let mut dice = Dice::from_seed(9);
    let first = r.resolve("ap", &ctx, &mut dice);
    let second = r.resolve("ap", &ctx, &mut dice);
    assert_eq!(first, second);
    assert_eq!(first.value, Some(Value::Int(2)));
}

#[test]
fn duplicate_ids_are_rejected() {
    let err = RuleRegistry::new(vec![Rule::new("a"), Rule::new("a")]).unwrap_err();
    assert_eq!(err.to_string(), "rule 'a' is defined more than once (again in memory)");
}

#[test]
fn roll_builtin_with_huge_modifier_saturates() {
    let r = resolver(vec![Rule::new("big_roll").with_formula("roll('9223372036854775807+1d6')", Vec::<String>::new())]);
    let res = r.resolve("big_roll", &Context::new(), &mut Dice::from_scripted(vec![4]));
    assert_eq!(res.value, Some(Value::Int(i64::MAX)));
    assert!(res.diagnostics.is_empty());
}
