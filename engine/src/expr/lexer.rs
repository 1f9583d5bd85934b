use super::ParseError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
    EqEq,
    BangEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: usize,
}

pub fn tokenize(src: &str) -> Result<Vec<Token>, ParseError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let start = i;
        let single = |kind| Token { kind, pos: start };
        match c {
            b' ' | b'\t' | b'\r' | b'\n' => {
                i += 1;
            }
            b'+' => {
                tokens.push(single(TokenKind::Plus));
                i += 1;
            }
            b'-' => {
                tokens.push(single(TokenKind::Minus));
                i += 1;
            }
            b'*' => {
                tokens.push(single(TokenKind::Star));
                i += 1;
            }
            b'/' => {
                tokens.push(single(TokenKind::Slash));
                i += 1;
            }
            b'(' => {
                tokens.push(single(TokenKind::LParen));
                i += 1;
            }
            b')' => {
                tokens.push(single(TokenKind::RParen));
                i += 1;
            }
            b'[' => {
                tokens.push(single(TokenKind::LBracket));
                i += 1;
            }
            b']' => {
                tokens.push(single(TokenKind::RBracket));
                i += 1;
            }
            b',' => {
                tokens.push(single(TokenKind::Comma));
                i += 1;
            }
            b'.' if !bytes.get(i + 1).is_some_and(u8::is_ascii_digit) => {
                tokens.push(single(TokenKind::Dot));
                i += 1;
            }
            b'=' | b'!' | b'<' | b'>' => {
                let eq = bytes.get(i + 1) == Some(&b'=');
                let kind = match (c, eq) {
                    (b'=', true) => TokenKind::EqEq,
                    (b'!', true) => TokenKind::BangEq,
                    (b'<', true) => TokenKind::LtEq,
                    (b'>', true) => TokenKind::GtEq,
                    (b'<', false) => TokenKind::Lt,
                    (b'>', false) => TokenKind::Gt,
                    _ => return Err(ParseError::new(format!("unexpected '{}'", c as char), start)),
                };
                tokens.push(single(kind));
                i += if eq { 2 } else { 1 };
            }
            b'\'' | b'"' => {
                let quote = c;
                i += 1;
                let body_start = i;
                while i < bytes.len() && bytes[i] != quote {
                    i += 1;
                }
                if i == bytes.len() {
                    return Err(ParseError::new("unterminated string", start));
                }
                let body = src[body_start..i].to_string();
                i += 1;
                tokens.push(Token { kind: TokenKind::Str(body), pos: start });
            }
            b'0'..=b'9' | b'.' => {
                while i < bytes.len() && bytes[i].is_ascii_digit() {
                    i += 1;
                }
                let mut is_float = false;
                if i < bytes.len() && bytes[i] == b'.' {
                    is_float = true;
                    i += 1;
                    while i < bytes.len() && bytes[i].is_ascii_digit() {
                        i += 1;
                    }
                }
                let text = &src[start..i];
                let kind = if is_float {
                    text.parse::<f64>()
                        .map(TokenKind::Float)
                        .map_err(|_| ParseError::new(format!("bad number '{}'", text), start))?
                } else {
                    text.parse::<i64>()
                        .map(TokenKind::Int)
                        .map_err(|_| ParseError::new(format!("number '{}' is too large", text), start))?
                };
                tokens.push(Token { kind, pos: start });
            }
            c if c.is_ascii_alphabetic() || c == b'_' => {
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                tokens.push(Token { kind: TokenKind::Ident(src[start..i].to_string()), pos: start });
            }
            _ => {
                let found = src[start..].chars().next().unwrap_or('?');
                return Err(ParseError::new(format!("unexpected '{}'", found), start));
            }
        }
    }

    tokens.push(Token { kind: TokenKind::Eof, pos: src.len() });
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn numbers_and_operators() {
        assert_eq!(
            kinds("(CON+SIZ)/2.5 >= .5"),
            vec![
                TokenKind::LParen,
                TokenKind::Ident("CON".into()),
                TokenKind::Plus,
                TokenKind::Ident("SIZ".into()),
                TokenKind::RParen,
                TokenKind::Slash,
                TokenKind::Float(2.5),
                TokenKind::GtEq,
                TokenKind::Float(0.5),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn rejects_stray_characters() {
        let err = tokenize("STR; drop").unwrap_err();
        assert_eq!(err.pos, 3);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        assert!(tokenize("roll('1d6)").is_err());
    }
}
