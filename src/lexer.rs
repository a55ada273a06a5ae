use crate::error::SyntaxError;
use crate::registry::Registry;
use crate::token::{Op, Token, TokenKind};
use crate::util::{DERIVATIVE, VARIABLE};
use crate::validate::validate_expression;
use std::iter::Peekable;
use std::str::CharIndices;

/// Split `text` into tokens, classifying identifiers against `registry`.
///
/// Identifiers are resolved in this order: built-in constant, user constant,
/// built-in function, user function. The text is validated (see
/// [`validate_expression`](fn.validate_expression.html)) before lexing.
///
/// # Examples
///
/// ```
/// # use calculaterm::{tokenize, Registry, TokenKind};
/// let registry = Registry::new();
/// let tokens = tokenize("2 pi sin(x)", &registry).unwrap();
/// let kinds: Vec<_> = tokens.iter().map(|t| t.kind).collect();
/// assert_eq!(
///     kinds,
///     vec![
///         TokenKind::Number,
///         TokenKind::Constant,
///         TokenKind::Function,
///         TokenKind::LParen,
///         TokenKind::Variable,
///         TokenKind::RParen,
///     ]
/// );
/// assert_eq!(tokens[3].position, 8);
/// ```
pub fn tokenize(text: &str, registry: &Registry) -> Result<Vec<Token>, SyntaxError> {
    if let Some(position) = text.find('=') {
        return Err(SyntaxError::new(
            "definitions must be processed separately",
            position,
        ));
    }
    validate_expression(text)?;

    let mut lexer = Lexer::new(text);
    let mut tokens = Vec::new();
    while let Some(lexeme) = lexer.next_lexeme()? {
        let token = match lexeme {
            Lexeme::Token(token) => token,
            Lexeme::Identifier(name, position) => match registry.classify(name) {
                Some(kind) => Token::new(kind, name, position),
                None => {
                    return Err(SyntaxError::new(
                        format!("unknown identifier: {}", name),
                        position,
                    ))
                }
            },
        };
        tokens.push(token);
    }
    log::trace!("tokenized {:?} into {} tokens", text, tokens.len());
    Ok(tokens)
}

/// Replace every identifier token spelled `old` in `text` by `new`. Other
/// identifiers containing `old` as a substring are left untouched, as is
/// everything the lexer would reject.
pub fn rename_identifier(text: &str, old: &str, new: &str) -> String {
    let mut renamed = text.to_owned();
    for (position, _) in identifiers(text)
        .into_iter()
        .rev()
        .filter(|&(_, name)| name == old)
    {
        renamed.replace_range(position..position + old.len(), new);
    }
    renamed
}

/// List the identifiers of `text` with their positions, without resolving
/// them. Lexing errors are skipped over.
pub fn identifiers(text: &str) -> Vec<(usize, &str)> {
    let mut lexer = Lexer::new(text);
    let mut found = Vec::new();
    loop {
        match lexer.next_lexeme() {
            Ok(Some(Lexeme::Identifier(name, position))) => found.push((position, name)),
            Ok(Some(Lexeme::Token(_))) | Err(_) => {}
            Ok(None) => break,
        }
    }
    found
}

/// Either a fully classified token, or an identifier waiting to be looked up
#[derive(Debug, PartialEq)]
enum Lexeme<'a> {
    Token(Token),
    Identifier(&'a str, usize),
}

/// An helper struct for lexing the input
struct Lexer<'a> {
    text: &'a str,
    input: Peekable<CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Lexer<'a> {
        Lexer {
            text,
            input: text.char_indices().peekable(),
        }
    }

    /// Byte offset of the next unread character
    fn offset(&mut self) -> usize {
        let len = self.text.len();
        self.input.peek().map_or(len, |&(i, _)| i)
    }

    /// Every error path consumes at least one character, so callers may keep
    /// pulling lexemes after an error.
    fn next_lexeme(&mut self) -> Result<Option<Lexeme<'a>>, SyntaxError> {
        let (start, c) = match self.input.next() {
            Some(next) => next,
            None => return Ok(None),
        };

        let token = match c {
            c if c.is_whitespace() => return self.next_lexeme(),
            c if c.is_ascii_digit() || c == '.' => return self.number(start).map(Some),
            '(' => Token::new(TokenKind::LParen, "(", start),
            ')' => Token::new(TokenKind::RParen, ")", start),
            'x' => Token::new(TokenKind::Variable, VARIABLE, start),
            'd' if self.text[start..].starts_with(DERIVATIVE) => {
                // 'd' is already consumed
                for _ in 1..DERIVATIVE.len() {
                    self.input.next();
                }
                Token::new(TokenKind::Function, DERIVATIVE, start)
            }
            c if c.is_ascii_lowercase() => {
                while let Some(&(_, c)) = self.input.peek() {
                    if c.is_ascii_lowercase() || c.is_ascii_digit() {
                        self.input.next();
                    } else {
                        break;
                    }
                }
                let end = self.offset();
                return Ok(Some(Lexeme::Identifier(&self.text[start..end], start)));
            }
            c => match Op::from_char(c) {
                Some(op) => Token::new(TokenKind::Operator(op), c.to_string(), start),
                None => return Err(SyntaxError::new("invalid character", start)),
            },
        };
        Ok(Some(Lexeme::Token(token)))
    }

    /// Read a decimal number whose first character (at `start`) was already
    /// consumed
    fn number(&mut self, start: usize) -> Result<Lexeme<'a>, SyntaxError> {
        let mut seen_dot = &self.text[start..start + 1] == ".";
        while let Some(&(i, c)) = self.input.peek() {
            if c == '.' {
                if seen_dot {
                    self.input.next();
                    return Err(SyntaxError::new("multiple decimal points in number", i));
                }
                seen_dot = true;
            } else if !c.is_ascii_digit() {
                break;
            }
            self.input.next();
        }
        let end = self.offset();
        let number = &self.text[start..end];
        if number == "." {
            return Err(SyntaxError::new("invalid number format", start));
        }

        // Another number after whitespace is a missing operator, not an
        // implicit multiplication
        while let Some(&(_, c)) = self.input.peek() {
            if c.is_whitespace() {
                self.input.next();
            } else {
                break;
            }
        }
        if let Some(&(i, c)) = self.input.peek() {
            if c.is_ascii_digit() || c == '.' {
                return Err(SyntaxError::new("missing operator between numbers", i));
            }
        }

        Ok(Lexeme::Token(Token::new(TokenKind::Number, number, start)))
    }
}
