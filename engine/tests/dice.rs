use brp_engine::dice::{MAX_DICE, roll_value};
use brp_engine::{Dice, DiceError, DiceExpr, Value, parse_and_roll, parse_dice};

#[test]
fn classic_notation_rolls_scripted_faces() {
    let mut dice = Dice::from_scripted(vec![3, 5]);
    assert_eq!(parse_and_roll(&mut dice, "2d6+3"), 11);
}

#[test]
fn notation_is_case_and_space_insensitive() {
    let expr = parse_dice(" 2D6 + 1 ").unwrap();
    assert_eq!(expr, DiceExpr::new(2, 6, 1));
    assert_eq!(expr.to_string(), "2d6+1");
}

#[test]
fn compound_expression_rolls_every_group() {
    let expr = parse_dice("1d8+1+1d4").unwrap();
    assert_eq!(expr.to_string(), "1d8+1+1d4");
    assert_eq!(expr.dice_count(), 2);
    assert_eq!(expr.modifier(), 1);
    assert_eq!((expr.min(), expr.max()), (3, 13));

    let mut dice = Dice::from_scripted(vec![8, 4]);
    assert_eq!(expr.roll_with_faces(&mut dice), (vec![8, 4], 13));
}

#[test]
fn negative_bonus_group_subtracts() {
    let mut dice = Dice::from_scripted(vec![6, 2]);
    assert_eq!(parse_and_roll(&mut dice, "1d8+1-1d6"), 5);
}

#[test]
fn plain_integers_are_already_resolved_damage() {
    let mut dice = Dice::from_seed(1);
    assert_eq!(parse_and_roll(&mut dice, "7"), 7);
    assert_eq!(parse_and_roll(&mut dice, " -3 "), -3);
    assert_eq!(roll_value(&mut dice, &Value::Int(4)), 4);
    assert_eq!(roll_value(&mut dice, &Value::Float(4.9)), 4);
}

#[test]
fn bad_notation_rolls_zero() {
    let mut dice = Dice::from_seed(1);
    for bad in ["", "abc", "2d", "1d6+", "0d6", "3d0", "1d6*2", "d"] {
        assert_eq!(parse_and_roll(&mut dice, bad), 0, "{bad:?}");
    }
    assert_eq!(roll_value(&mut dice, &Value::Null), 0);
}

#[test]
fn parse_errors_say_what_went_wrong() {
    assert_eq!(parse_dice("   "), Err(DiceError::Empty));
    assert_eq!(parse_dice("0d6"), Err(DiceError::ZeroDice("0d6".into())));
    assert_eq!(parse_dice("1d6+"), Err(DiceError::DanglingOperator));
    assert_eq!(parse_dice("2x6"), Err(DiceError::Unexpected { found: 'x', pos: 1 }));
    assert_eq!(
        parse_dice("600d6+600d6"),
        Err(DiceError::TooManyDice { count: 1200, limit: MAX_DICE })
    );
    assert_eq!(parse_dice("99999999999999999999d6"), Err(DiceError::NumberTooLarge));
}

#[test]
fn seeded_rolls_are_reproducible() {
    let mut a = Dice::from_seed(2025);
    let mut b = Dice::from_seed(2025);
    let left: Vec<i64> = (0..20).map(|_| parse_and_roll(&mut a, "3d6+2")).collect();
    let right: Vec<i64> = (0..20).map(|_| parse_and_roll(&mut b, "3d6+2")).collect();
    assert_eq!(left, right);
    assert!(left.iter().all(|r| (5..=20).contains(r)));
}

#[test]
fn scripted_faces_are_clamped_then_seeded_rng_takes_over() {
    let mut dice = Dice::from_scripted(vec![0, 250]);
    assert_eq!(dice.die(6), 1);
    assert_eq!(dice.die(6), 6);
    let next = dice.die(6);
    assert!((1..=6).contains(&next));
    assert_eq!(dice.die(0), 0);
}

#[test]
fn huge_modifiers_saturate_instead_of_overflowing() {
    let mut dice = Dice::from_scripted(vec![6]);
    assert_eq!(parse_and_roll(&mut dice, "9223372036854775807+1d6"), i64::MAX);

    let mut dice = Dice::from_scripted(vec![6]);
    assert_eq!(parse_and_roll(&mut dice, "-9223372036854775807-1d6"), i64::MIN);

    let expr = parse_dice("9223372036854775807+9223372036854775807+2d6").unwrap();
    assert_eq!(expr.modifier(), i64::MAX);
    assert_eq!((expr.min(), expr.max()), (i64::MAX, i64::MAX));
}
