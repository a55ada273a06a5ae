use crate::error::SyntaxError;
use crate::token::{Op, Token, TokenKind};
use crate::util::{Builtin, CONSTANTS, DERIVATIVE, FUNCTIONS};

/// Ast nodes for the expressions
#[derive(Debug, Clone)]
pub enum Ast {
    /// The free variable `x`
    Variable,
    /// A constant value
    Value(f64),
    /// A user constant, looked up at evaluation time
    Constant(String),
    /// <left> + <right>
    Add(Box<Ast>, Box<Ast>),
    /// <left> - <right>
    Sub(Box<Ast>, Box<Ast>),
    /// <left> * <right>
    Mul(Box<Ast>, Box<Ast>),
    /// <left> / <right>
    Div(Box<Ast>, Box<Ast>),
    /// <left> ^ <right>
    Exp(Box<Ast>, Box<Ast>),
    /// builtin(<arg>)
    Function(Builtin, Box<Ast>),
    /// user function call, looked up at evaluation time
    Call(String, Box<Ast>),
    /// d/dx(<arg>), the derivative of the sub-tree with respect to `x`
    Derivative(Box<Ast>),
}

impl PartialEq<Self> for Ast {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Ast::Variable, Ast::Variable) => true,
            (Ast::Value(v), Ast::Value(v2)) => v.to_le_bytes() == v2.to_le_bytes(),
            (Ast::Constant(a), Ast::Constant(a2)) => a == a2,
            (Ast::Add(a, b), Ast::Add(a2, b2)) => a == a2 && b == b2,
            (Ast::Sub(a, b), Ast::Sub(a2, b2)) => a == a2 && b == b2,
            (Ast::Mul(a, b), Ast::Mul(a2, b2)) => a == a2 && b == b2,
            (Ast::Div(a, b), Ast::Div(a2, b2)) => a == a2 && b == b2,
            (Ast::Exp(a, b), Ast::Exp(a2, b2)) => a == a2 && b == b2,
            (Ast::Function(a, b), Ast::Function(a2, b2)) => a == a2 && b == b2,
            (Ast::Call(a, b), Ast::Call(a2, b2)) => a == a2 && b == b2,
            (Ast::Derivative(a), Ast::Derivative(a2)) => a == a2,
            _ => false,
        }
    }
}

impl Ast {
    /// Construct the AST for a vector of tokens in reverse polish notation.
    /// This function eats the tokens as it uses them, and fails if any token
    /// is left over or if function applications are nested deeper than
    /// `max_depth`. Operators do not count: `x + x + ... + x` has depth 0.
    pub fn from_postfix(mut tokens: Vec<Token>, max_depth: usize) -> Result<Self, SyntaxError> {
        let end = tokens.last().map_or(0, |t| t.position);
        let ast = Self::from_tokens_internal(&mut tokens, end, 0, max_depth)?;
        if let Some(extra) = tokens.pop() {
            return Err(SyntaxError::new(
                "incorrect number of values in final stack",
                extra.position,
            ));
        }
        Ok(ast.optimize())
    }

    fn from_tokens_internal(
        tokens: &mut Vec<Token>,
        position: usize,
        depth: usize,
        max_depth: usize,
    ) -> Result<Self, SyntaxError> {
        if depth > max_depth {
            return Err(SyntaxError::new("expression is nested too deeply", position));
        }
        let token = tokens
            .pop()
            .ok_or_else(|| SyntaxError::new("not enough operands", position))?;
        let position = token.position;
        let operand = |tokens: &mut Vec<Token>, depth| {
            Self::from_tokens_internal(tokens, position, depth, max_depth).map(Box::new)
        };

        match token.kind {
            TokenKind::Number => token
                .text
                .parse()
                .map(Self::Value)
                .map_err(|_| SyntaxError::new("invalid number format", token.position)),
            TokenKind::Variable => Ok(Self::Variable),
            TokenKind::Constant => match CONSTANTS.get(token.text.as_str()) {
                Some(&value) => Ok(Self::Value(value)),
                None => Ok(Self::Constant(token.text)),
            },
            TokenKind::Operator(op) => {
                let right = operand(tokens, depth)?;
                let left = operand(tokens, depth)?;
                Ok(match op {
                    Op::Plus => Self::Add(left, right),
                    Op::Minus => Self::Sub(left, right),
                    Op::Mul => Self::Mul(left, right),
                    Op::Div => Self::Div(left, right),
                    Op::Exp => Self::Exp(left, right),
                })
            }
            TokenKind::Function => {
                let arg = operand(tokens, depth + 1)?;
                if token.text == DERIVATIVE {
                    Ok(Self::Derivative(arg))
                } else if let Some(&builtin) = FUNCTIONS.get(token.text.as_str()) {
                    Ok(Self::Function(builtin, arg))
                } else {
                    Ok(Self::Call(token.text, arg))
                }
            }
            TokenKind::LParen | TokenKind::RParen => Err(SyntaxError::new(
                "parenthesis left after conversion to postfix",
                token.position,
            )),
        }
    }

    /// If the AST node correspond to a constant, get `Some(constant)`. Else,
    /// get `None`
    pub fn value(&self) -> Option<f64> {
        if let Self::Value(value) = *self {
            Some(value)
        } else {
            None
        }
    }

    /// Check whether the tree reads the free variable. A derivative always
    /// counts as depending on it.
    pub fn uses_variable(&self) -> bool {
        match self {
            Self::Variable | Self::Derivative(_) => true,
            Self::Value(_) | Self::Constant(_) => false,
            Self::Add(a, b) | Self::Sub(a, b) | Self::Mul(a, b) | Self::Div(a, b) | Self::Exp(a, b) => {
                a.uses_variable() || b.uses_variable()
            }
            Self::Function(_, arg) | Self::Call(_, arg) => arg.uses_variable(),
        }
    }

    /// Check whether the tree references the user definition `name`
    pub fn references(&self, name: &str) -> bool {
        match self {
            Self::Variable | Self::Value(_) => false,
            Self::Constant(constant) => constant == name,
            Self::Add(a, b) | Self::Sub(a, b) | Self::Mul(a, b) | Self::Div(a, b) | Self::Exp(a, b) => {
                a.references(name) || b.references(name)
            }
            Self::Call(function, arg) => function == name || arg.references(name),
            Self::Function(_, arg) | Self::Derivative(arg) => arg.references(name),
        }
    }

    /// Point every reference to the user definition `old` at `new` instead
    pub fn rename(&mut self, old: &str, new: &str) {
        match self {
            Self::Variable | Self::Value(_) => {}
            Self::Constant(constant) => {
                if constant == old {
                    *constant = new.into();
                }
            }
            Self::Add(a, b) | Self::Sub(a, b) | Self::Mul(a, b) | Self::Div(a, b) | Self::Exp(a, b) => {
                a.rename(old, new);
                b.rename(old, new);
            }
            Self::Call(function, arg) => {
                if function == old {
                    *function = new.into();
                }
                arg.rename(old, new);
            }
            Self::Function(_, arg) | Self::Derivative(arg) => arg.rename(old, new),
        }
    }

    /// Optimize the AST by doing constants propagation. A node is only folded
    /// when it evaluates successfully: `1/0` stays a division, and fails when
    /// evaluated.
    pub fn optimize(self) -> Self {
        match self {
            Self::Variable | Self::Value(_) | Self::Constant(_) => self,
            Self::Call(name, arg) => Self::Call(name, Box::new(arg.optimize())),
            Self::Derivative(arg) => Self::Derivative(Box::new(arg.optimize())),
            Self::Function(func, arg) => {
                let arg = arg.optimize();
                if let Some(Ok(value)) = arg.value().map(|a| func.call(a)) {
                    return Self::Value(value);
                }
                Self::Function(func, Box::new(arg))
            }
            Self::Add(left, right) => Self::fold(Op::Plus, *left, *right),
            Self::Sub(left, right) => Self::fold(Op::Minus, *left, *right),
            Self::Mul(left, right) => Self::fold(Op::Mul, *left, *right),
            Self::Div(left, right) => Self::fold(Op::Div, *left, *right),
            Self::Exp(left, right) => Self::fold(Op::Exp, *left, *right),
        }
    }

    fn fold(op: Op, left: Ast, right: Ast) -> Self {
        let left = left.optimize();
        let right = right.optimize();
        if let (Some(a), Some(b)) = (left.value(), right.value()) {
            if let Ok(value) = crate::expr::apply(op, a, b) {
                return Self::Value(value);
            }
        }
        let (left, right) = (Box::new(left), Box::new(right));
        match op {
            Op::Plus => Self::Add(left, right),
            Op::Minus => Self::Sub(left, right),
            Op::Mul => Self::Mul(left, right),
            Op::Div => Self::Div(left, right),
            Op::Exp => Self::Exp(left, right),
        }
    }
}
