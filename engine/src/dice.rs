//! Dice notation: parsing and rolling strings like `"2d6+3"` or `"1d8+1+1d4"`.
//!
//! The grammar is additive: any number of `NdM` groups and flat integers
//! chained with `+`/`-`, an optional leading sign, case-insensitive, with
//! whitespace ignored. Every `NdM` group is rolled independently.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::Dice;
use crate::error::DiceError;
use crate::value::Value;

/// Upper bound on dice rolled by one expression.
pub const MAX_DICE: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiceTerm {
    /// `count` dice with `sides` faces; `negative` subtracts the roll.
    Dice { count: u32, sides: u32, negative: bool },
    Flat(i64),
}

/// A parsed dice notation string, terms kept in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiceExpr {
    pub terms: Vec<DiceTerm>,
}

impl DiceExpr {
    /// The classic single-group form `NdM+K`.
    pub fn new(count: u32, sides: u32, modifier: i64) -> Self {
        let mut terms = vec![DiceTerm::Dice { count, sides, negative: false }];
        if modifier != 0 {
            terms.push(DiceTerm::Flat(modifier));
        }
        Self { terms }
    }

    /// Sum of the flat terms.
    pub fn modifier(&self) -> i64 {
        self.terms.iter().fold(0i64, |acc, t| match t {
            DiceTerm::Flat(n) => acc.saturating_add(*n),
            DiceTerm::Dice { .. } => acc,
        })
    }

    pub fn dice_count(&self) -> u64 {
        self.terms
            .iter()
            .map(|t| match t {
                DiceTerm::Dice { count, .. } => *count as u64,
                DiceTerm::Flat(_) => 0,
            })
            .sum()
    }

    /// Lowest possible total, saturating at the `i64` range.
    pub fn min(&self) -> i64 {
        self.terms.iter().fold(0i64, |acc, t| acc.saturating_add(term_bounds(t).0))
    }

    /// Highest possible total, saturating at the `i64` range.
    pub fn max(&self) -> i64 {
        self.terms.iter().fold(0i64, |acc, t| acc.saturating_add(term_bounds(t).1))
    }

    pub fn roll(&self, dice: &mut Dice) -> i64 {
        self.roll_with_faces(dice).1
    }

    /// Roll and also return every face rolled, in term order.
    pub fn roll_with_faces(&self, dice: &mut Dice) -> (Vec<u32>, i64) {
        let mut faces = Vec::with_capacity(self.dice_count() as usize);
        let mut total = 0i64;
        for term in &self.terms {
            match *term {
                DiceTerm::Dice { count, sides, negative } => {
                    let mut sum = 0i64;
                    for _ in 0..count {
                        let face = dice.die(sides);
                        faces.push(face);
                        sum += face as i64;
                    }
                    total = if negative { total.saturating_sub(sum) } else { total.saturating_add(sum) };
                }
                DiceTerm::Flat(n) => total = total.saturating_add(n),
            }
        }
        debug!(expression = %self, ?faces, total, "rolled dice");
        (faces, total)
    }
}

fn term_bounds(term: &DiceTerm) -> (i64, i64) {
    match *term {
        DiceTerm::Dice { count, sides, negative } => {
            let lo = count as i64;
            let hi = count as i64 * sides as i64;
            if negative { (-hi, -lo) } else { (lo, hi) }
        }
        DiceTerm::Flat(n) => (n, n),
    }
}

impl fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, term) in self.terms.iter().enumerate() {
            match *term {
                DiceTerm::Dice { count, sides, negative } => {
                    if negative {
                        write!(f, "-")?;
                    } else if i > 0 {
                        write!(f, "+")?;
                    }
                    write!(f, "{}d{}", count, sides)?;
                }
                DiceTerm::Flat(n) => {
                    if n < 0 {
                        write!(f, "-{}", n.unsigned_abs())?;
                    } else if i > 0 {
                        write!(f, "+{}", n)?;
                    } else {
                        write!(f, "{}", n)?;
                    }
                }
            }
        }
        Ok(())
    }
}

impl FromStr for DiceExpr {
    type Err = DiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_dice(s)
    }
}

/// Parse dice notation. See the module docs for the grammar.
pub fn parse_dice(notation: &str) -> Result<DiceExpr, DiceError> {
    let chars: Vec<(usize, char)> = notation
        .char_indices()
        .filter(|(_, c)| !c.is_whitespace())
        .map(|(i, c)| (i, c.to_ascii_lowercase()))
        .collect();
    if chars.is_empty() {
        return Err(DiceError::Empty);
    }

    let mut pos = 0;
    let mut negative = false;
    match chars[0].1 {
        '+' => pos = 1,
        '-' => {
            negative = true;
            pos = 1;
        }
        _ => {}
    }

    let mut terms = Vec::new();
    let mut rolled: u64 = 0;
    loop {
        if pos == chars.len() {
            return Err(DiceError::DanglingOperator);
        }
        let start = pos;
        let count = read_number(&chars, &mut pos)?;
        if pos < chars.len() && chars[pos].1 == 'd' {
            pos += 1;
            let sides = read_number(&chars, &mut pos)?.ok_or_else(|| unexpected(&chars, pos))?;
            let count = count.unwrap_or(1);
            if count == 0 || sides == 0 {
                let text: String = chars[start..pos].iter().map(|(_, c)| c).collect();
                return Err(DiceError::ZeroDice(text));
            }
            rolled = rolled.saturating_add(count);
            if rolled > MAX_DICE {
                return Err(DiceError::TooManyDice { count: rolled, limit: MAX_DICE });
            }
            let count = u32::try_from(count).map_err(|_| DiceError::NumberTooLarge)?;
            let sides = u32::try_from(sides).map_err(|_| DiceError::NumberTooLarge)?;
            terms.push(DiceTerm::Dice { count, sides, negative });
        } else {
            let n = count.ok_or_else(|| unexpected(&chars, pos))?;
            let n = i64::try_from(n).map_err(|_| DiceError::NumberTooLarge)?;
            terms.push(DiceTerm::Flat(if negative { -n } else { n }));
        }

        if pos == chars.len() {
            break;
        }
        negative = match chars[pos].1 {
            '+' => false,
            '-' => true,
            _ => return Err(unexpected(&chars, pos)),
        };
        pos += 1;
    }

    Ok(DiceExpr { terms })
}

fn read_number(chars: &[(usize, char)], pos: &mut usize) -> Result<Option<u64>, DiceError> {
    let mut value: Option<u64> = None;
    while let Some(&(_, c)) = chars.get(*pos) {
        let Some(digit) = c.to_digit(10) else { break };
        let acc = value.unwrap_or(0);
        value = Some(
            acc.checked_mul(10)
                .and_then(|v| v.checked_add(digit as u64))
                .ok_or(DiceError::NumberTooLarge)?,
        );
        *pos += 1;
    }
    Ok(value)
}

fn unexpected(chars: &[(usize, char)], pos: usize) -> DiceError {
    match chars.get(pos) {
        Some(&(at, found)) => DiceError::Unexpected { found, pos: at },
        None => DiceError::DanglingOperator,
    }
}

/// Parse and roll; unparseable text is a non-fatal failure that rolls 0.
pub fn parse_and_roll(dice: &mut Dice, notation: &str) -> i64 {
    match parse_dice(notation) {
        Ok(expr) => expr.roll(dice),
        Err(err) => {
            warn!(notation, %err, "invalid dice expression; treating roll as 0");
            0
        }
    }
}

/// Roll a value that is either already a number or a dice notation string.
pub fn roll_value(dice: &mut Dice, value: &Value) -> i64 {
    match value {
        Value::Str(s) => parse_and_roll(dice, s),
        other => match other.as_i64() {
            Some(n) => n,
            None => {
                warn!(kind = other.type_name(), "cannot roll a non-dice value; treating roll as 0");
                0
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_sign_applies_to_first_group() {
        let expr = parse_dice("-1d6").unwrap();
        assert_eq!(expr.terms, vec![DiceTerm::Dice { count: 1, sides: 6, negative: true }]);
        assert_eq!((expr.min(), expr.max()), (-6, -1));
    }

    #[test]
    fn implicit_single_die() {
        assert_eq!(parse_dice("d6").unwrap(), DiceExpr::new(1, 6, 0));
    }

    #[test]
    fn display_keeps_term_order() {
        let expr = parse_dice(" 1D8 + 1 + 1d4 ").unwrap();
        assert_eq!(expr.to_string(), "1d8+1+1d4");
        assert_eq!(expr.modifier(), 1);
        assert_eq!(expr.dice_count(), 2);
    }
}
