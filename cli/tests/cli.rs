use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    Command::cargo_bin("brp-cli").unwrap()
}

#[test]
fn roll_is_seeded() {
    let first = cli().args(["roll", "2d6+3", "--seed", "7", "--times", "3"]).output().unwrap();
    let second = cli().args(["roll", "2d6+3", "--seed", "7", "--times", "3"]).output().unwrap();
    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);
    assert_eq!(String::from_utf8_lossy(&first.stdout).lines().count(), 3);
}

#[test]
fn roll_rejects_bad_notation() {
    cli().args(["roll", "2x6"]).assert().failure().stderr(predicate::str::contains("invalid dice expression"));
}

#[test]
fn resolve_with_vars() {
    cli()
        .args(["resolve", "hp_total", "--var", "CON=13", "--var", "SIZ=14"])
        .assert()
        .success()
        .stdout(predicate::str::diff("13.5\n"));
    cli()
        .args(["resolve", "damage_bonus_calculation", "--var", "STR=6", "--var", "SIZ=6"])
        .assert()
        .success()
        .stdout(predicate::str::contains("-1d6"));
}

#[test]
fn resolve_unknown_rule_fails_loudly() {
    cli()
        .args(["resolve", "nonexistent_rule"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rule 'nonexistent_rule' not found"));
}

#[test]
fn derive_sample_character() {
    cli()
        .args(["derive", "--id", "char_001"])
        .assert()
        .success()
        .stdout(predicate::str::contains("max_hp=13 max_mp=11 damage_bonus=+1d4"));
}

#[test]
fn skill_prints_audit_record() {
    cli()
        .args(["skill", "skill_dodge", "--seed", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("skill_dodge: total=42"))
        .stdout(predicate::str::contains("[SKILL][char_001] skill_dodge d100="));
}

#[test]
fn unknown_skill_is_an_error() {
    cli().args(["skill", "skill_flying"]).assert().failure().stderr(predicate::str::contains("skill_flying"));
}

#[test]
fn attack_against_fixed_armor() {
    cli()
        .args(["attack", "--armor", "100"])
        .assert()
        .success()
        .stdout(predicate::str::contains("rolled 1d8+1+1d4").and(predicate::str::ends_with("=> 0\n")));
}

#[test]
fn user_rules_replace_the_bundled_pack() {
    let dir = std::env::temp_dir().join(format!("brp-cli-tests-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let rules = dir.join("house.yaml");
    fs::write(&rules, "rules:\n  - id: luck\n    formula: POW * 5\n    input_variables: [POW]\n").unwrap();
    let utf16 = dir.join("house16.json");
    let mut bytes = vec![0xFF, 0xFE];
    for unit in r#"[{"id": "sanity", "formula": "POW * 5", "input_variables": ["POW"]}]"#.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    fs::write(&utf16, bytes).unwrap();

    cli()
        .args(["resolve", "luck", "--var", "POW=12", "--rules"])
        .arg(&rules)
        .assert()
        .success()
        .stdout(predicate::str::diff("60\n"));
    cli()
        .args(["resolve", "sanity", "--var", "POW=10", "--rules"])
        .arg(&utf16)
        .assert()
        .success()
        .stdout(predicate::str::diff("50\n"));
    cli().args(["resolve", "hp_total", "--rules"]).arg(&rules).assert().failure();
}
