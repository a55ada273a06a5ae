use thiserror::Error;

/// Error raised while lexing, validating or parsing an expression.
///
/// `position` is a byte offset into the text that was handed to the lexer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at position {position}")]
pub struct SyntaxError {
    /// What went wrong
    pub message: String,
    /// Byte offset of the offending character
    pub position: usize,
}

impl SyntaxError {
    pub(crate) fn new<S: Into<String>>(message: S, position: usize) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Failure of a compiled function at a given input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    /// `a / 0`
    #[error("division by zero")]
    DivisionByZero,
    /// `a ^ b` produced NaN or an infinity
    #[error("invalid power operation result: {base}^{exponent}")]
    InvalidPower {
        /// Left operand
        base: f64,
        /// Right operand
        exponent: f64,
    },
    /// Argument outside of the domain of a built-in function
    #[error("domain error: {function}({operand}) - {reason}")]
    OutOfDomain {
        /// Name of the function
        function: String,
        /// Offending argument
        operand: f64,
        /// Human readable description of the domain
        reason: &'static str,
    },
    /// A function application produced NaN or an infinity
    #[error("domain error: {function}({operand}) produced an invalid result")]
    InvalidResult {
        /// Name of the function
        function: String,
        /// Argument of the application
        operand: f64,
    },
    /// One of the stencil points of a numerical derivative is undefined
    #[error("derivative does not exist at this point")]
    NoDerivative,
    /// A user definition referenced by the program is gone from the registry
    #[error("unknown identifier: {0}")]
    Undefined(String),
    /// Too many nested user function calls
    #[error("recursion limit of {0} nested calls exceeded")]
    RecursionLimit(usize),
    /// Too many nested derivatives, counting those reached through user
    /// function calls
    #[error("derivatives nested deeper than {0} levels")]
    DerivativeLimit(usize),
}

impl DomainError {
    /// Check whether this error comes from an evaluation limit rather than
    /// from the function itself. Such errors abort the whole evaluation.
    pub fn is_limit(&self) -> bool {
        matches!(self, Self::RecursionLimit(_) | Self::DerivativeLimit(_))
    }
}

/// Rejection of a `name = expression` definition, or of a rename.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DefinitionError {
    /// Bad spacing around the name
    #[error("{message} at position {position}")]
    Malformed {
        /// What went wrong
        message: &'static str,
        /// Byte offset of the offending character
        position: usize,
    },
    /// No `=` in the text
    #[error("missing '=' in definition")]
    MissingEquals,
    /// Nothing before `=`
    #[error("empty name in definition")]
    EmptyName,
    /// The name is not a run of lowercase letters and digits starting with
    /// a letter
    #[error("invalid identifier name: {0}")]
    InvalidIdentifier(String),
    /// `x` can not be defined
    #[error("cannot redefine variable 'x'")]
    ReservedVariable,
    /// The name is a built-in function
    #[error("cannot redefine built-in function: {0}")]
    BuiltinFunction(String),
    /// The name is a built-in constant
    #[error("cannot redefine built-in constant: {0}")]
    BuiltinConstant(String),
    /// The name already holds a user function
    #[error("function {0} is already defined")]
    DuplicateFunction(String),
    /// The name already holds a user constant
    #[error("constant {0} is already defined")]
    DuplicateConstant(String),
    /// No user definition has this name
    #[error("{0} is not defined")]
    NotDefined(String),
    /// The right hand side does not compile
    #[error("invalid expression in definition: {0}")]
    InvalidExpression(#[source] SyntaxError),
    /// The right hand side of a constant fails at `x = 0`
    #[error("invalid constant definition: {0}")]
    InvalidConstant(#[source] DomainError),
}

/// Failure of the secant solver.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RootError {
    /// Two consecutive iterates have (almost) the same image
    #[error("no convergence (flat gradient)")]
    FlatGradient,
    /// The iteration budget was exhausted
    #[error("failed to converge after {0} iterations")]
    NoConvergence(usize),
    /// The function is undefined at one of the iterates
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Any error produced by the engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// The text does not compile
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    /// A function failed at some input
    #[error(transparent)]
    Domain(#[from] DomainError),
    /// A definition or rename was rejected
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    /// A root search failed
    #[error(transparent)]
    Root(#[from] RootError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positioned_messages() {
        let err = SyntaxError::new("unclosed parenthesis", 3);
        assert_eq!(err.to_string(), "unclosed parenthesis at position 3");

        let err = DefinitionError::Malformed {
            message: "identifier cannot contain spaces",
            position: 1,
        };
        assert_eq!(
            err.to_string(),
            "identifier cannot contain spaces at position 1"
        );
    }

    #[test]
    fn wrapping() {
        let err: EngineError = DomainError::DivisionByZero.into();
        assert_eq!(err.to_string(), "division by zero");

        let err: RootError = DomainError::NoDerivative.into();
        assert_eq!(err, RootError::Domain(DomainError::NoDerivative));
        assert_eq!(err.to_string(), "derivative does not exist at this point");

        let err = DefinitionError::InvalidExpression(SyntaxError::new("unknown identifier: q", 0));
        assert_eq!(
            err.to_string(),
            "invalid expression in definition: unknown identifier: q at position 0"
        );
    }
}
