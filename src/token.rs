/// Classification of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Decimal literal
    Number,
    /// One of `+ - * / ^`
    Operator(Op),
    /// Built-in or user function name, or `d/dx`
    Function,
    /// Left parenthesis
    LParen,
    /// Right parenthesis
    RParen,
    /// The free variable `x`
    Variable,
    /// Built-in or user constant name
    Constant,
}

/// A lexed token, remembering where it came from in the source text
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What kind of token this is
    pub kind: TokenKind,
    /// The source text of the token
    pub text: String,
    /// Byte offset of the first character of the token
    pub position: usize,
}

impl Token {
    /// Create a token of `kind` spelled `text`, found at byte `position`
    pub fn new<S: Into<String>>(kind: TokenKind, text: S, position: usize) -> Self {
        Token {
            kind,
            text: text.into(),
            position,
        }
    }

    /// Check whether this token is one of the binary operators
    pub fn is_operator(&self) -> bool {
        matches!(self.kind, TokenKind::Operator(_))
    }
}

/// Allowed operators in the algorithm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `^`
    Exp,
}

impl Op {
    /// The operator spelled `c`, if any
    pub fn from_char(c: char) -> Option<Op> {
        match c {
            '+' => Some(Op::Plus),
            '-' => Some(Op::Minus),
            '*' => Some(Op::Mul),
            '/' => Some(Op::Div),
            '^' => Some(Op::Exp),
            _ => None,
        }
    }

    /// The character spelling this operator
    pub fn as_char(self) -> char {
        match self {
            Self::Plus => '+',
            Self::Minus => '-',
            Self::Mul => '*',
            Self::Div => '/',
            Self::Exp => '^',
        }
    }

    /// Get the operator precedence. Operators with higher precedence should be
    /// evaluated first.
    pub fn precedence(self) -> u8 {
        match self {
            Self::Plus | Self::Minus => 1,
            Self::Mul | Self::Div => 2,
            Self::Exp => 3,
        }
    }

    /// Check if the operator is left associative. Every operator is,
    /// exponentiation included: `2^3^2` is `(2^3)^2`.
    pub fn is_left_associative(self) -> bool {
        true
    }
}
