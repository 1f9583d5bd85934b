//! The formula language rules are written in.
//!
//! A deliberately small, closed grammar: numbers, strings, variables bound
//! by the caller, arithmetic, comparisons, `and`/`or`/`not`, indexing into the
//! rule's data table, and a fixed set of built-in functions. Formula text is
//! parsed into an [`Expr`] tree first; nothing outside that tree can run.

mod ast;
mod eval;
mod lexer;
mod parser;

use thiserror::Error;

pub use ast::{BinOp, Builtin, Expr, UnaryOp};
pub use eval::{Scope, eval, lookup_in};
pub use parser::{MAX_DEPTH, parse};

use crate::Dice;
use crate::value::Value;

/// Longest formula text accepted.
pub const MAX_FORMULA_LEN: usize = 4096;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (at offset {pos})")]
pub struct ParseError {
    pub message: String,
    pub pos: usize,
}

impl ParseError {
    pub fn new(message: impl Into<String>, pos: usize) -> Self {
        Self { message: message.into(), pos }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("syntax error: {0}")]
    Parse(#[from] ParseError),
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    #[error("rule has no data table")]
    NoTable,
    #[error("division by zero")]
    DivisionByZero,
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    #[error("key {0} not found in table")]
    KeyNotFound(String),
    #[error("invalid argument to {func}(): {reason}")]
    InvalidArgument { func: &'static str, reason: String },
    #[error("numeric overflow")]
    Overflow,
    #[error("formula is nested too deeply")]
    TooDeep,
}

/// Parse and evaluate in one step.
pub fn evaluate(formula: &str, scope: &Scope<'_>, dice: &mut Dice) -> Result<Value, EvalError> {
    let expr = compile(formula)?;
    eval(&expr, scope, dice)
}

/// Parse formula text, enforcing the length limit.
pub fn compile(formula: &str) -> Result<Expr, ParseError> {
    if formula.len() > MAX_FORMULA_LEN {
        return Err(ParseError::new(
            format!("formula longer than {} bytes", MAX_FORMULA_LEN),
            MAX_FORMULA_LEN,
        ));
    }
    parse(formula)
}
