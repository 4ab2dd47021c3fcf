//! Equation source to [`Expr`]: a small lexer followed by a
//! precedence-climbing parser.

use std::f64::consts::{E, PI};
use std::iter::Peekable;
use std::str::CharIndices;

use super::ast::{BinaryOp, Expr};
use crate::error::{Error, Result};

/// Parse an equation right-hand side.
///
/// Identifiers may contain `.` so instance-scoped names such as `D1.V1`
/// parse as a single symbol. Numbers take SPICE scale suffixes (`1k`,
/// `4.7u`, `2meg`); `^` and `**` both denote a right-associative power.
pub fn parse_expression(input: &str) -> Result<Expr> {
    let tokens = tokenize(input)?;
    let mut parser = Parser {
        tokens,
        next: 0,
        end: input.len(),
    };
    let expr = parser.expression(0)?;
    match parser.peek() {
        None => Ok(expr),
        Some(tok) => Err(parse_error(tok.at, "unexpected trailing input")),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Kind {
    Number(f64),
    Ident(String),
    Op(BinaryOp),
    LParen,
    RParen,
    Comma,
}

#[derive(Debug, Clone, PartialEq)]
struct Token {
    kind: Kind,
    /// Byte offset into the source.
    at: usize,
}

fn parse_error(position: usize, message: impl Into<String>) -> Error {
    Error::Parse {
        position,
        message: message.into(),
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut chars = input.char_indices().peekable();
    let mut tokens = Vec::new();

    while let Some(&(at, c)) = chars.peek() {
        let kind = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '0'..='9' | '.' => Kind::Number(lex_number(input, &mut chars)?),
            c if c.is_ascii_alphabetic() || c == '_' => {
                let end = take_while(input, &mut chars, |c| {
                    c.is_ascii_alphanumeric() || c == '_' || c == '.'
                });
                Kind::Ident(input[at..end].to_string())
            }
            _ => {
                chars.next();
                match c {
                    '+' => Kind::Op(BinaryOp::Add),
                    '-' => Kind::Op(BinaryOp::Sub),
                    '/' => Kind::Op(BinaryOp::Div),
                    '^' => Kind::Op(BinaryOp::Pow),
                    '*' if chars.next_if(|&(_, c)| c == '*').is_some() => Kind::Op(BinaryOp::Pow),
                    '*' => Kind::Op(BinaryOp::Mul),
                    '(' => Kind::LParen,
                    ')' => Kind::RParen,
                    ',' => Kind::Comma,
                    other => {
                        return Err(parse_error(at, format!("unexpected character '{other}'")))
                    }
                }
            }
        };
        tokens.push(Token { kind, at });
    }
    Ok(tokens)
}

/// Consume characters matching `pred`; returns the end byte offset.
fn take_while(
    input: &str,
    chars: &mut Peekable<CharIndices<'_>>,
    pred: impl Fn(char) -> bool,
) -> usize {
    while chars.next_if(|&(_, c)| pred(c)).is_some() {}
    chars.peek().map_or(input.len(), |&(i, _)| i)
}

/// Mantissa, optional exponent, optional scale suffix.
fn lex_number(input: &str, chars: &mut Peekable<CharIndices<'_>>) -> Result<f64> {
    let start = chars.peek().map_or(input.len(), |&(i, _)| i);
    let mut end = take_while(input, chars, |c| c.is_ascii_digit());
    if chars.next_if(|&(_, c)| c == '.').is_some() {
        end = take_while(input, chars, |c| c.is_ascii_digit());
    }

    // `e` opens an exponent only when digits follow; `1e` alone is a suffix.
    let rest = &input[end..];
    let exponent_len = exponent_length(rest);
    if exponent_len > 0 {
        while chars.next_if(|&(i, _)| i < end + exponent_len).is_some() {}
        end += exponent_len;
    }

    let mantissa = &input[start..end];
    let value: f64 = mantissa
        .parse()
        .map_err(|_| parse_error(start, format!("invalid number '{mantissa}'")))?;

    let suffix_end = take_while(input, chars, |c| c.is_ascii_alphabetic());
    let suffix = &input[end..suffix_end];
    let scale = scale_suffix(suffix)
        .ok_or_else(|| parse_error(end, format!("unknown scale suffix '{suffix}'")))?;
    Ok(value * scale)
}

fn exponent_length(rest: &str) -> usize {
    let bytes = rest.as_bytes();
    if !matches!(bytes.first(), Some(b'e' | b'E')) {
        return 0;
    }
    let sign = usize::from(matches!(bytes.get(1), Some(b'+' | b'-')));
    let digits = bytes[1 + sign..]
        .iter()
        .take_while(|b| b.is_ascii_digit())
        .count();
    if digits == 0 {
        0
    } else {
        1 + sign + digits
    }
}

fn scale_suffix(suffix: &str) -> Option<f64> {
    let scale = match suffix.to_ascii_lowercase().as_str() {
        "" => 1.0,
        "t" => 1e12,
        "g" => 1e9,
        "meg" => 1e6,
        "k" => 1e3,
        "m" => 1e-3,
        "u" => 1e-6,
        "n" => 1e-9,
        "p" => 1e-12,
        "f" => 1e-15,
        _ => return None,
    };
    Some(scale)
}

/// Left and right binding power of an infix operator.
fn binding_power(op: BinaryOp) -> (u8, u8) {
    match op {
        BinaryOp::Add | BinaryOp::Sub => (1, 2),
        BinaryOp::Mul | BinaryOp::Div => (3, 4),
        BinaryOp::Pow => (6, 5),
    }
}

/// Prefix minus binds looser than `^`, so `-2^2` is `-(2^2)`.
const PREFIX_POWER: u8 = 5;

struct Parser {
    tokens: Vec<Token>,
    next: usize,
    end: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.next)
    }

    fn bump(&mut self) -> Option<Token> {
        let tok = self.tokens.get(self.next).cloned();
        self.next += usize::from(tok.is_some());
        tok
    }

    fn position(&self) -> usize {
        self.peek().map_or(self.end, |t| t.at)
    }

    fn expect(&mut self, kind: Kind, what: &str) -> Result<()> {
        match self.bump() {
            Some(tok) if tok.kind == kind => Ok(()),
            Some(tok) => Err(parse_error(tok.at, format!("expected {what}"))),
            None => Err(parse_error(self.end, format!("expected {what}"))),
        }
    }

    fn expression(&mut self, min_power: u8) -> Result<Expr> {
        let mut lhs = self.prefix()?;
        while let Some(Token {
            kind: Kind::Op(op), ..
        }) = self.peek()
        {
            let op = *op;
            let (left, right) = binding_power(op);
            if left < min_power {
                break;
            }
            self.bump();
            let rhs = self.expression(right)?;
            lhs = Expr::binary(op, lhs, rhs);
        }
        Ok(lhs)
    }

    fn prefix(&mut self) -> Result<Expr> {
        let at = self.position();
        let Some(tok) = self.bump() else {
            return Err(parse_error(at, "unexpected end of expression"));
        };
        match tok.kind {
            Kind::Number(value) => Ok(Expr::Constant(value)),
            Kind::Ident(name) => self.identifier(name),
            Kind::LParen => {
                let inner = self.expression(0)?;
                self.expect(Kind::RParen, "')'")?;
                Ok(inner)
            }
            Kind::Op(BinaryOp::Sub) => Ok(-self.expression(PREFIX_POWER)?),
            Kind::Op(BinaryOp::Add) => self.expression(PREFIX_POWER),
            Kind::Op(_) | Kind::RParen | Kind::Comma => {
                Err(parse_error(tok.at, "expected an operand"))
            }
        }
    }

    fn identifier(&mut self, name: String) -> Result<Expr> {
        if matches!(self.peek(), Some(Token { kind: Kind::LParen, .. })) {
            self.bump();
            let args = self.arguments()?;
            return Ok(Expr::call(name.to_lowercase(), args));
        }
        Ok(match name.to_lowercase().as_str() {
            "pi" => Expr::Constant(PI),
            "e" => Expr::Constant(E),
            _ => Expr::symbol(name),
        })
    }

    fn arguments(&mut self) -> Result<Vec<Expr>> {
        let mut args = Vec::new();
        if matches!(self.peek(), Some(Token { kind: Kind::RParen, .. })) {
            self.bump();
            return Ok(args);
        }
        loop {
            args.push(self.expression(0)?);
            match self.bump() {
                Some(Token { kind: Kind::Comma, .. }) => {}
                Some(Token { kind: Kind::RParen, .. }) => return Ok(args),
                Some(tok) => return Err(parse_error(tok.at, "expected ',' or ')' in arguments")),
                None => return Err(parse_error(self.end, "expected ',' or ')' in arguments")),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_at(source: &str) -> (usize, String) {
        match parse_expression(source) {
            Err(Error::Parse { position, message }) => (position, message),
            other => panic!("expected a parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_non_ascii_is_reported_whole() {
        let (position, message) = error_at("V1 + é");
        assert_eq!(position, 5);
        assert_eq!(message, "unexpected character 'é'");
    }

    #[test]
    fn test_error_positions() {
        assert_eq!(error_at("1 +").0, 3);
        assert_eq!(error_at("(1 + 2").0, 6);
        assert_eq!(error_at("1 2").0, 2);
        assert_eq!(error_at("3xyz"), (1, "unknown scale suffix 'xyz'".to_string()));
    }

    #[test]
    fn test_unary_minus_binds_looser_than_power() {
        let expr = parse_expression("-2^2").unwrap();
        assert_eq!(expr.to_string(), "-(2 ^ 2)");
        let expr = parse_expression("2^-1").unwrap();
        assert_eq!(expr, Expr::Constant(2.0).pow(-Expr::Constant(1.0)));
    }

    #[test]
    fn test_exponent_needs_digits() {
        assert_eq!(parse_expression("1e3").unwrap(), Expr::Constant(1e3));
        assert_eq!(parse_expression("2.5E-1").unwrap(), Expr::Constant(0.25));
        assert!(parse_expression("1e").is_err());
    }

    #[test]
    fn test_function_names_are_lowercased() {
        let expr = parse_expression("EXP(D1.V1)").unwrap();
        assert_eq!(expr, Expr::call("exp", vec![Expr::symbol("D1.V1")]));
        assert_eq!(parse_expression("max()").unwrap(), Expr::call("max", vec![]));
    }
}
