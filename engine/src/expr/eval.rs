use std::cmp::Ordering;

use indexmap::IndexMap;

use super::EvalError;
use super::ast::{BinOp, Builtin, Expr, UnaryOp};
use crate::Dice;
use crate::dice::roll_value;
use crate::value::{Value, float_to_i64};

const MAX_EVAL_DEPTH: usize = 1024;

/// Everything a formula can see: its bound variables and its table.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    pub vars: &'a IndexMap<String, Value>,
    pub table: Option<&'a Value>,
}

impl<'a> Scope<'a> {
    pub fn new(vars: &'a IndexMap<String, Value>, table: Option<&'a Value>) -> Self {
        Self { vars, table }
    }
}

pub fn eval(expr: &Expr, scope: &Scope<'_>, dice: &mut Dice) -> Result<Value, EvalError> {
    Evaluator { scope, dice, depth: 0 }.eval(expr)
}

struct Evaluator<'s, 'a, 'd> {
    scope: &'s Scope<'a>,
    dice: &'d mut Dice,
    depth: usize,
}

impl Evaluator<'_, '_, '_> {
    fn eval(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        self.depth += 1;
        if self.depth > MAX_EVAL_DEPTH {
            return Err(EvalError::TooDeep);
        }
        let out = self.eval_inner(expr);
        self.depth -= 1;
        out
    }

    fn eval_inner(&mut self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Literal(v) => Ok(v.clone()),
            Expr::Var(name) => self
                .scope
                .vars
                .get(name)
                .cloned()
                .ok_or_else(|| EvalError::UnknownVariable(name.clone())),
            Expr::Table => self.scope.table.cloned().ok_or(EvalError::NoTable),
            Expr::Unary { op, operand } => {
                let v = self.eval(operand)?;
                unary(*op, v)
            }
            Expr::Binary { op: BinOp::And, lhs, rhs } => {
                if !self.eval(lhs)?.truthy() {
                    return Ok(Value::Bool(false));
                }
                Ok(Value::Bool(self.eval(rhs)?.truthy()))
            }
            Expr::Binary { op: BinOp::Or, lhs, rhs } => {
                if self.eval(lhs)?.truthy() {
                    return Ok(Value::Bool(true));
                }
                Ok(Value::Bool(self.eval(rhs)?.truthy()))
            }
            Expr::Binary { op, lhs, rhs } => {
                let l = self.eval(lhs)?;
                let r = self.eval(rhs)?;
                binary(*op, l, r)
            }
            Expr::Index { target, key } => {
                let key = self.eval(key)?;
                if let (Expr::Table, Some(table)) = (target.as_ref(), self.scope.table) {
                    return index(table, &key);
                }
                let container = self.eval(target)?;
                index(&container, &key)
            }
            Expr::Call { func, args } => self.call(*func, args),
        }
    }

    fn call(&mut self, func: Builtin, args: &[Expr]) -> Result<Value, EvalError> {
        // Trees built by hand skip the parser's arity check.
        func.check_arity(args.len()).map_err(|reason| EvalError::InvalidArgument { func: func.name(), reason })?;
        if func == Builtin::If {
            let cond = self.eval(&args[0])?;
            return self.eval(if cond.truthy() { &args[1] } else { &args[2] });
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(self.eval(arg)?);
        }

        match func {
            Builtin::Min => extremum(func, values, Ordering::Less),
            Builtin::Max => extremum(func, values, Ordering::Greater),
            Builtin::Abs => match &values[0] {
                Value::Float(f) => Ok(Value::Float(f.abs())),
                v => int_like(v)
                    .ok_or_else(|| not_a_number(func, v))?
                    .checked_abs()
                    .map(Value::Int)
                    .ok_or(EvalError::Overflow),
            },
            Builtin::Round => round(&values),
            Builtin::Ceil => to_integer(func, &values[0], f64::ceil),
            Builtin::Floor => to_integer(func, &values[0], f64::floor),
            Builtin::Roll => Ok(Value::Int(roll_value(self.dice, &values[0]))),
            Builtin::Lookup => {
                let mut values = values.into_iter();
                let container = values.next().unwrap_or_default();
                let key = values.next().unwrap_or_default();
                match index(&container, &key) {
                    Err(EvalError::KeyNotFound(_)) if args.len() == 3 => Ok(values.next().unwrap_or_default()),
                    other => other,
                }
            }
            Builtin::If => Ok(if values[0].truthy() { values[1].clone() } else { values[2].clone() }),
        }
    }
}

fn unary(op: UnaryOp, v: Value) -> Result<Value, EvalError> {
    match (op, v) {
        (UnaryOp::Not, v) => Ok(Value::Bool(!v.truthy())),
        (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
        (UnaryOp::Neg, v) => match int_like(&v) {
            Some(n) => n.checked_neg().map(Value::Int).ok_or(EvalError::Overflow),
            None => Err(EvalError::TypeMismatch(format!("cannot negate a {}", v.type_name()))),
        },
    }
}

fn binary(op: BinOp, l: Value, r: Value) -> Result<Value, EvalError> {
    match op {
        BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div => arithmetic(op, l, r),
        BinOp::Eq => Ok(Value::Bool(equals(&l, &r))),
        BinOp::NotEq => Ok(Value::Bool(!equals(&l, &r))),
        BinOp::Lt | BinOp::LtEq | BinOp::Gt | BinOp::GtEq => {
            let ord = compare(&l, &r).ok_or_else(|| {
                EvalError::TypeMismatch(format!(
                    "cannot compare {} {} {}",
                    l.type_name(),
                    op.symbol(),
                    r.type_name()
                ))
            })?;
            Ok(Value::Bool(match op {
                BinOp::Lt => ord == Ordering::Less,
                BinOp::LtEq => ord != Ordering::Greater,
                BinOp::Gt => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            }))
        }
        BinOp::And => Ok(Value::Bool(l.truthy() && r.truthy())),
        BinOp::Or => Ok(Value::Bool(l.truthy() || r.truthy())),
    }
}

fn arithmetic(op: BinOp, l: Value, r: Value) -> Result<Value, EvalError> {
    if let (BinOp::Add, Value::Str(a), Value::Str(b)) = (op, &l, &r) {
        return Ok(Value::Str(format!("{}{}", a, b)));
    }
    if op != BinOp::Div {
        if let (Some(a), Some(b)) = (int_like(&l), int_like(&r)) {
            let out = match op {
                BinOp::Add => a.checked_add(b),
                BinOp::Sub => a.checked_sub(b),
                _ => a.checked_mul(b),
            };
            return out.map(Value::Int).ok_or(EvalError::Overflow);
        }
    }
    let (Some(a), Some(b)) = (number(&l), number(&r)) else {
        return Err(EvalError::TypeMismatch(format!(
            "unsupported operands for {}: {} and {}",
            op.symbol(),
            l.type_name(),
            r.type_name()
        )));
    };
    let out = match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        _ => {
            if b == 0.0 {
                return Err(EvalError::DivisionByZero);
            }
            a / b
        }
    };
    if out.is_finite() { Ok(Value::Float(out)) } else { Err(EvalError::Overflow) }
}

fn equals(l: &Value, r: &Value) -> bool {
    match (number(l), number(r)) {
        (Some(a), Some(b)) => a == b,
        _ => l == r,
    }
}

fn compare(l: &Value, r: &Value) -> Option<Ordering> {
    match (l, r) {
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => {
            if let (Some(a), Some(b)) = (int_like(l), int_like(r)) {
                return Some(a.cmp(&b));
            }
            number(l)?.partial_cmp(&number(r)?)
        }
    }
}

/// Integers and bools take the exact integer path.
fn int_like(v: &Value) -> Option<i64> {
    match v {
        Value::Int(n) => Some(*n),
        Value::Bool(b) => Some(*b as i64),
        _ => None,
    }
}

fn number(v: &Value) -> Option<f64> {
    match v {
        Value::Int(_) | Value::Float(_) | Value::Bool(_) => v.as_f64(),
        _ => None,
    }
}

fn not_a_number(func: Builtin, v: &Value) -> EvalError {
    EvalError::InvalidArgument { func: func.name(), reason: format!("expected a number, got {}", v.type_name()) }
}

fn extremum(func: Builtin, values: Vec<Value>, keep: Ordering) -> Result<Value, EvalError> {
    let items = match values.as_slice() {
        [Value::List(items)] => items.clone(),
        _ => values,
    };
    let mut best: Option<Value> = None;
    for item in items {
        if number(&item).is_none() {
            return Err(not_a_number(func, &item));
        }
        best = match best {
            Some(current) if compare(&item, &current) != Some(keep) => Some(current),
            _ => Some(item),
        };
    }
    best.ok_or_else(|| EvalError::InvalidArgument { func: func.name(), reason: "empty sequence".into() })
}

fn round(values: &[Value]) -> Result<Value, EvalError> {
    let x = &values[0];
    let digits = match values.get(1) {
        None => None,
        Some(d) => Some(int_like(d).ok_or_else(|| not_a_number(Builtin::Round, d))?),
    };
    if let Some(n) = int_like(x) {
        return Ok(Value::Int(n));
    }
    let f = number(x).ok_or_else(|| not_a_number(Builtin::Round, x))?;
    match digits {
        None => float_to_i64(f.round_ties_even()).map(Value::Int).ok_or(EvalError::Overflow),
        Some(d) => {
            let scale = 10f64.powi(d.clamp(-308, 308) as i32);
            let out = (f * scale).round_ties_even() / scale;
            if out.is_finite() { Ok(Value::Float(out)) } else { Ok(Value::Float(f)) }
        }
    }
}

fn to_integer(func: Builtin, v: &Value, op: fn(f64) -> f64) -> Result<Value, EvalError> {
    if let Some(n) = int_like(v) {
        return Ok(Value::Int(n));
    }
    let f = number(v).ok_or_else(|| not_a_number(func, v))?;
    float_to_i64(op(f)).map(Value::Int).ok_or(EvalError::Overflow)
}

fn index(container: &Value, key: &Value) -> Result<Value, EvalError> {
    match container {
        Value::List(_) | Value::Table(_) => lookup_in(container, key)
            .cloned()
            .ok_or_else(|| EvalError::KeyNotFound(key.to_string())),
        other => Err(EvalError::TypeMismatch(format!("cannot look up a key in a {}", other.type_name()))),
    }
}

/// Find `key` in a list or table.
///
/// Lists are indexed by position unless every element is a band record
/// (`{min, max, value}`), in which case a numeric key selects the band
/// containing it. Tables match the key exactly, then case-insensitively,
/// then (for numeric keys) by band-shaped keys such as `"6-12"` or `"57+"`.
pub fn lookup_in<'v>(container: &'v Value, key: &Value) -> Option<&'v Value> {
    match container {
        Value::List(items) => {
            if !items.is_empty() && items.iter().all(is_band_record) {
                let x = band_key(key)?;
                return items.iter().find(|rec| record_contains(rec, x)).map(band_value);
            }
            match key {
                Value::Int(i) => usize::try_from(*i).ok().and_then(|i| items.get(i)),
                _ => None,
            }
        }
        Value::Table(map) => {
            let text = key.key_string();
            if let Some(text) = &text {
                if let Some(v) = map.get(text.as_str()) {
                    return Some(v);
                }
                if let Some((_, v)) = map.iter().find(|(k, _)| k.eq_ignore_ascii_case(text)) {
                    return Some(v);
                }
            }
            let x = band_key(key)?;
            map.iter()
                .find(|(k, _)| parse_band(k).is_some_and(|(lo, hi)| in_band(x, lo, hi)))
                .map(|(_, v)| v)
        }
        _ => None,
    }
}

fn band_key(key: &Value) -> Option<f64> {
    match key {
        Value::Int(_) | Value::Float(_) => key.as_f64(),
        _ => None,
    }
}

fn in_band(x: f64, lo: Option<f64>, hi: Option<f64>) -> bool {
    lo.is_none_or(|lo| x >= lo) && hi.is_none_or(|hi| x <= hi)
}

/// `"6-12"`, `"6..12"`, `"57+"`.
fn parse_band(text: &str) -> Option<(Option<f64>, Option<f64>)> {
    let t = text.trim();
    if let Some(lo) = t.strip_suffix('+') {
        return Some((Some(lo.trim().parse().ok()?), None));
    }
    let (lo, hi) = match t.split_once("..") {
        Some(parts) => parts,
        None => {
            let dash = t.get(1..)?.find('-')? + 1;
            (&t[..dash], &t[dash + 1..])
        }
    };
    Some((Some(lo.trim().parse().ok()?), Some(hi.trim().parse().ok()?)))
}

const MIN_KEYS: [&str; 2] = ["min", "min_stat"];
const MAX_KEYS: [&str; 2] = ["max", "max_stat"];
const VALUE_KEYS: [&str; 3] = ["value", "dice_modifier", "result"];

fn first_of<'v>(record: &'v Value, keys: &[&str]) -> Option<&'v Value> {
    keys.iter().find_map(|k| record.get(k))
}

fn is_band_record(v: &Value) -> bool {
    matches!(v, Value::Table(_)) && (first_of(v, &MIN_KEYS).is_some() || first_of(v, &MAX_KEYS).is_some())
}

fn record_contains(record: &Value, x: f64) -> bool {
    let lo = first_of(record, &MIN_KEYS).and_then(Value::as_f64);
    let hi = first_of(record, &MAX_KEYS).and_then(Value::as_f64);
    in_band(x, lo, hi)
}

fn band_value(record: &Value) -> &Value {
    first_of(record, &VALUE_KEYS).unwrap_or(record)
}
