//! Structural checks, run on the raw text before lexing and on the token
//! sequence after it.

use crate::error::SyntaxError;
use crate::token::{Token, TokenKind};

const OPERATORS: &str = "+-*/^";

/// Validate the raw text of an expression: non blank, balanced parenthesis,
/// no run of operators (a `-` may follow another operator), and no trailing
/// operator.
///
/// # Examples
///
/// ```
/// # use calculaterm::validate_expression;
/// assert!(validate_expression("2*(x + 1)").is_ok());
///
/// let err = validate_expression("(x + 1").unwrap_err();
/// assert_eq!(err.position, 0);
/// ```
pub fn validate_expression(text: &str) -> Result<(), SyntaxError> {
    if text.trim().is_empty() {
        return Err(SyntaxError::new("empty expression", 0));
    }

    let mut open = Vec::new();
    for (i, c) in text.char_indices() {
        match c {
            '(' => open.push(i),
            ')' => {
                if open.pop().is_none() {
                    return Err(SyntaxError::new("unmatched closing parenthesis", i));
                }
            }
            _ => {}
        }
    }
    if let Some(&position) = open.last() {
        return Err(SyntaxError::new("unclosed parenthesis", position));
    }

    // the start of the text behaves as if it followed an operator
    let mut previous_is_operator = true;
    for (i, c) in text.char_indices() {
        let is_operator = OPERATORS.contains(c);
        if is_operator && previous_is_operator && c != '-' {
            return Err(SyntaxError::new("consecutive operators", i));
        }
        previous_is_operator = is_operator;
    }

    if let Some((i, c)) = text.char_indices().rev().find(|(_, c)| !c.is_whitespace()) {
        if OPERATORS.contains(c) {
            return Err(SyntaxError::new("trailing operator", i));
        }
    }

    Ok(())
}

/// Validate adjacent pairs in a token sequence, and its first and last
/// tokens.
///
/// A number, variable or constant directly followed by a number, variable,
/// constant, function or opening parenthesis is accepted: the parser reads
/// it as an implicit multiplication.
pub fn validate_tokens(tokens: &[Token]) -> Result<(), SyntaxError> {
    let (first, last) = match (tokens.first(), tokens.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(SyntaxError::new("empty token sequence", 0)),
    };

    for pair in tokens.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        let message = match (current.kind, next.kind) {
            (TokenKind::Operator(_), TokenKind::Operator(_)) => Some("consecutive operators"),
            (TokenKind::Number, TokenKind::Number) => Some("missing operator between numbers"),
            (TokenKind::Function, kind) if kind != TokenKind::LParen => {
                Some("missing opening parenthesis after function")
            }
            (TokenKind::LParen, TokenKind::RParen) => Some("empty parentheses"),
            (TokenKind::LParen, TokenKind::Operator(_)) => {
                Some("operator after opening parenthesis")
            }
            (TokenKind::RParen, TokenKind::LParen)
            | (TokenKind::RParen, TokenKind::Function)
            | (TokenKind::RParen, TokenKind::Variable)
            | (TokenKind::RParen, TokenKind::Constant)
            | (TokenKind::RParen, TokenKind::Number) => {
                Some("missing operator after closing parenthesis")
            }
            _ => None,
        };
        if let Some(message) = message {
            return Err(SyntaxError::new(message, next.position));
        }
    }

    if first.is_operator() && first.text != "-" {
        return Err(SyntaxError::new(
            "expression cannot start with operator",
            first.position,
        ));
    }
    if last.is_operator() {
        return Err(SyntaxError::new(
            "expression cannot end with operator",
            last.position,
        ));
    }

    Ok(())
}
