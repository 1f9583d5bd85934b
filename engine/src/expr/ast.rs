use std::fmt;

use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Eq => "==",
            BinOp::NotEq => "!=",
            BinOp::Lt => "<",
            BinOp::LtEq => "<=",
            BinOp::Gt => ">",
            BinOp::GtEq => ">=",
            BinOp::And => "and",
            BinOp::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// The closed set of functions a formula may call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Min,
    Max,
    Abs,
    Round,
    Ceil,
    Floor,
    Roll,
    Lookup,
    If,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name.to_ascii_lowercase().as_str() {
            "min" => Builtin::Min,
            "max" => Builtin::Max,
            "abs" => Builtin::Abs,
            "round" => Builtin::Round,
            "ceil" => Builtin::Ceil,
            "floor" => Builtin::Floor,
            "roll" => Builtin::Roll,
            "lookup" => Builtin::Lookup,
            "if" => Builtin::If,
            _ => return None,
        })
    }

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Abs => "abs",
            Builtin::Round => "round",
            Builtin::Ceil => "ceil",
            Builtin::Floor => "floor",
            Builtin::Roll => "roll",
            Builtin::Lookup => "lookup",
            Builtin::If => "if",
        }
    }

    /// Accepted argument counts, inclusive.
    pub fn arity(self) -> (usize, usize) {
        match self {
            Builtin::Min | Builtin::Max => (1, usize::MAX),
            Builtin::Abs | Builtin::Ceil | Builtin::Floor | Builtin::Roll => (1, 1),
            Builtin::Round => (1, 2),
            Builtin::Lookup => (2, 3),
            Builtin::If => (3, 3),
        }
    }

    /// `Err` describes the mismatch, e.g. `"takes 1 argument(s), got 0"`.
    pub fn check_arity(self, got: usize) -> Result<(), String> {
        let (lo, hi) = self.arity();
        if got >= lo && got <= hi {
            return Ok(());
        }
        let expected = if lo == hi {
            lo.to_string()
        } else if hi == usize::MAX {
            format!("at least {}", lo)
        } else {
            format!("{} to {}", lo, hi)
        };
        Err(format!("takes {} argument(s), got {}", expected, got))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Literal(Value),
    /// Canonical (lowercase) variable name.
    Var(String),
    /// The rule's attached data table.
    Table,
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Call { func: Builtin, args: Vec<Expr> },
    Index { target: Box<Expr>, key: Box<Expr> },
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(Value::Str(s)) => write!(f, "{:?}", s),
            Expr::Literal(v) => write!(f, "{}", v),
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Table => write!(f, "data_table"),
            Expr::Unary { op: UnaryOp::Neg, operand } => write!(f, "(-{})", operand),
            Expr::Unary { op: UnaryOp::Not, operand } => write!(f, "(not {})", operand),
            Expr::Binary { op, lhs, rhs } => write!(f, "({} {} {})", lhs, op.symbol(), rhs),
            Expr::Call { func, args } => {
                write!(f, "{}(", func.name())?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Expr::Index { target, key } => write!(f, "{}[{}]", target, key),
        }
    }
}
