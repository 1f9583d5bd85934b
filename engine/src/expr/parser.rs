use super::ParseError;
use super::ast::{BinOp, Builtin, Expr, UnaryOp};
use super::lexer::{Token, TokenKind, tokenize};
use crate::value::Value;

/// Maximum nesting of sub-expressions.
pub const MAX_DEPTH: usize = 64;

/// Parse formula text into an expression tree.
///
/// Only the allow-listed grammar is accepted: anything else (unknown
/// functions, attribute access, statements) is rejected here, before any
/// evaluation happens.
pub fn parse(src: &str) -> Result<Expr, ParseError> {
    let tokens = tokenize(src)?;
    let mut parser = Parser { tokens, pos: 0, depth: 0 };
    let expr = parser.parse_expr()?;
    match parser.peek() {
        TokenKind::Eof => Ok(expr),
        other => Err(ParseError::new(format!("unexpected {} after expression", describe(other)), parser.offset())),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn peek_at(&self, ahead: usize) -> &TokenKind {
        &self.tokens[(self.pos + ahead).min(self.tokens.len() - 1)].kind
    }

    fn offset(&self) -> usize {
        self.tokens[self.pos.min(self.tokens.len() - 1)].pos
    }

    fn advance(&mut self) -> TokenKind {
        let kind = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        kind
    }

    fn expect(&mut self, want: &TokenKind) -> Result<(), ParseError> {
        if self.peek() == want {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::new(
                format!("expected {}, found {}", describe(want), describe(self.peek())),
                self.offset(),
            ))
        }
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ParseError::new("formula is nested too deeply", self.offset()));
        }
        Ok(())
    }

    fn parse_expr(&mut self) -> Result<Expr, ParseError> {
        self.enter()?;
        let expr = self.parse_or();
        self.depth -= 1;
        expr
    }

    // Precedence levels, loosest first.

    fn parse_or(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_and()?;
        while self.at_keyword("or") {
            self.advance();
            let rhs = self.parse_and()?;
            lhs = binary(BinOp::Or, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_not()?;
        while self.at_keyword("and") {
            self.advance();
            let rhs = self.parse_not()?;
            lhs = binary(BinOp::And, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_not(&mut self) -> Result<Expr, ParseError> {
        if self.at_keyword("not") {
            self.advance();
            self.enter()?;
            let operand = self.parse_not();
            self.depth -= 1;
            return Ok(Expr::Unary { op: UnaryOp::Not, operand: Box::new(operand?) });
        }
        self.parse_cmp()
    }

    fn parse_cmp(&mut self) -> Result<Expr, ParseError> {
        let lhs = self.parse_add()?;
        let Some(op) = cmp_op(self.peek()) else {
            return Ok(lhs);
        };
        self.advance();
        let rhs = self.parse_add()?;
        if cmp_op(self.peek()).is_some() {
            return Err(ParseError::new("comparisons cannot be chained", self.offset()));
        }
        Ok(binary(op, lhs, rhs))
    }

    fn parse_add(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_mul()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinOp::Add,
                TokenKind::Minus => BinOp::Sub,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_mul()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_mul(&mut self) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinOp::Mul,
                TokenKind::Slash => BinOp::Div,
                _ => break,
            };
            self.advance();
            let rhs = self.parse_unary()?;
            lhs = binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        match self.peek() {
            TokenKind::Minus => {
                self.advance();
                self.enter()?;
                let operand = self.parse_unary();
                self.depth -= 1;
                Ok(Expr::Unary { op: UnaryOp::Neg, operand: Box::new(operand?) })
            }
            TokenKind::Plus => {
                self.advance();
                self.parse_unary()
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, ParseError> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek() {
                TokenKind::LBracket => {
                    self.advance();
                    let key = self.parse_expr()?;
                    self.expect(&TokenKind::RBracket)?;
                    expr = Expr::Index { target: Box::new(expr), key: Box::new(key) };
                }
                TokenKind::Dot => {
                    let at = self.offset();
                    self.advance();
                    let is_get = matches!(self.peek(), TokenKind::Ident(name) if name.eq_ignore_ascii_case("get"))
                        && matches!(self.peek_at(1), TokenKind::LParen);
                    if !is_get {
                        return Err(ParseError::new("attribute access is not allowed", at));
                    }
                    self.advance();
                    let mut args = vec![expr];
                    args.extend(self.parse_args()?);
                    check_arity(Builtin::Lookup, args.len(), at)?;
                    expr = Expr::Call { func: Builtin::Lookup, args };
                }
                _ => return Ok(expr),
            }
        }
    }

    fn parse_primary(&mut self) -> Result<Expr, ParseError> {
        let at = self.offset();
        match self.advance() {
            TokenKind::Int(n) => Ok(Expr::Literal(Value::Int(n))),
            TokenKind::Float(f) => Ok(Expr::Literal(Value::Float(f))),
            TokenKind::Str(s) => Ok(Expr::Literal(Value::Str(s))),
            TokenKind::LParen => {
                let inner = self.parse_expr()?;
                self.expect(&TokenKind::RParen)?;
                Ok(inner)
            }
            TokenKind::Ident(name) => self.parse_ident(name, at),
            other => Err(ParseError::new(format!("unexpected {}", describe(&other)), at)),
        }
    }

    fn parse_ident(&mut self, name: String, at: usize) -> Result<Expr, ParseError> {
        let canonical = name.to_ascii_lowercase();
        match canonical.as_str() {
            "true" => return Ok(Expr::Literal(Value::Bool(true))),
            "false" => return Ok(Expr::Literal(Value::Bool(false))),
            "data_table" | "table" => return Ok(Expr::Table),
            "and" | "or" | "not" => {
                return Err(ParseError::new(format!("unexpected keyword '{}'", canonical), at));
            }
            "math" if matches!(self.peek(), TokenKind::Dot) => {
                self.advance();
                let fn_at = self.offset();
                return match self.advance() {
                    TokenKind::Ident(func) => self.parse_call(&func, fn_at),
                    _ => Err(ParseError::new("expected a function name after 'math.'", fn_at)),
                };
            }
            _ => {}
        }
        if matches!(self.peek(), TokenKind::LParen) {
            return self.parse_call(&name, at);
        }
        Ok(Expr::Var(canonical))
    }

    fn parse_call(&mut self, name: &str, at: usize) -> Result<Expr, ParseError> {
        let func = Builtin::from_name(name)
            .ok_or_else(|| ParseError::new(format!("unknown function '{}'", name), at))?;
        let args = self.parse_args()?;
        check_arity(func, args.len(), at)?;
        Ok(Expr::Call { func, args })
    }

    fn parse_args(&mut self) -> Result<Vec<Expr>, ParseError> {
        self.expect(&TokenKind::LParen)?;
        let mut args = Vec::new();
        if matches!(self.peek(), TokenKind::RParen) {
            self.advance();
            return Ok(args);
        }
        loop {
            args.push(self.parse_expr()?);
            match self.advance() {
                TokenKind::Comma => continue,
                TokenKind::RParen => return Ok(args),
                other => {
                    return Err(ParseError::new(
                        format!("expected ',' or ')', found {}", describe(&other)),
                        self.offset(),
                    ));
                }
            }
        }
    }

    fn at_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), TokenKind::Ident(name) if name.eq_ignore_ascii_case(keyword))
    }
}

fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
    Expr::Binary { op, lhs: Box::new(lhs), rhs: Box::new(rhs) }
}

fn cmp_op(kind: &TokenKind) -> Option<BinOp> {
    Some(match kind {
        TokenKind::EqEq => BinOp::Eq,
        TokenKind::BangEq => BinOp::NotEq,
        TokenKind::Lt => BinOp::Lt,
        TokenKind::LtEq => BinOp::LtEq,
        TokenKind::Gt => BinOp::Gt,
        TokenKind::GtEq => BinOp::GtEq,
        _ => return None,
    })
}

fn check_arity(func: Builtin, got: usize, at: usize) -> Result<(), ParseError> {
    func.check_arity(got).map_err(|reason| ParseError::new(format!("{}() {}", func.name(), reason), at))
}

fn describe(kind: &TokenKind) -> String {
    match kind {
        TokenKind::Int(n) => format!("number {}", n),
        TokenKind::Float(f) => format!("number {}", f),
        TokenKind::Str(s) => format!("string {:?}", s),
        TokenKind::Ident(name) => format!("'{}'", name),
        TokenKind::Plus => "'+'".into(),
        TokenKind::Minus => "'-'".into(),
        TokenKind::Star => "'*'".into(),
        TokenKind::Slash => "'/'".into(),
        TokenKind::LParen => "'('".into(),
        TokenKind::RParen => "')'".into(),
        TokenKind::LBracket => "'['".into(),
        TokenKind::RBracket => "']'".into(),
        TokenKind::Comma => "','".into(),
        TokenKind::Dot => "'.'".into(),
        TokenKind::EqEq => "'=='".into(),
        TokenKind::BangEq => "'!='".into(),
        TokenKind::Lt => "'<'".into(),
        TokenKind::LtEq => "'<='".into(),
        TokenKind::Gt => "'>'".into(),
        TokenKind::GtEq => "'>='".into(),
        TokenKind::Eof => "end of formula".into(),
    }
}
