use crate::ast::Ast;
use crate::derivative::numerical_derivative;
use crate::error::{DomainError, EngineError, SyntaxError};
use crate::lexer::{rename_identifier, tokenize};
use crate::parser::to_postfix;
use crate::registry::Registry;
use crate::token::Op;
use crate::util::DERIVATIVE;
use crate::validate::validate_tokens;

/// Compile `source` against `registry`.
///
/// This is the entry point for an expression that is not a definition: text
/// containing `=` is rejected, and should go through
/// [`Registry::define_or_update`](struct.Registry.html#method.define_or_update).
pub fn compile(source: &str, registry: &Registry) -> Result<Function, EngineError> {
    Ok(Function::compile(source, registry)?)
}

/// Evaluate `function` at `x`, resolving user definitions in `registry`.
pub fn evaluate(function: &Function, x: f64, registry: &Registry) -> Result<f64, DomainError> {
    function.eval(x, registry)
}

/// Compile and evaluate a single expression from `input`.
///
/// Returns `Ok(result)` if the evaluation is successful, or `Err(cause)` if
/// compiling or evaluating the expression failed.
///
/// # Example
///
/// ```
/// # use calculaterm::{eval, Registry};
/// let registry = Registry::new();
/// assert_eq!(eval("45 - 2^3", 0.0, &registry), Ok(37.0));
/// assert_eq!(eval("3 * x", -5.0, &registry), Ok(-15.0));
/// assert!(eval("1 / x", 0.0, &registry).is_err());
/// ```
pub fn eval(input: &str, x: f64, registry: &Registry) -> Result<f64, EngineError> {
    let function = Function::compile(input, registry)?;
    Ok(function.eval(x, registry)?)
}

/// A compiled function of the single real variable `x`.
///
/// User constants and functions referenced by the expression are resolved by
/// name each time the function is evaluated, in the registry handed to
/// [`eval`](#method.eval).
///
/// # Examples
/// ```
/// # use calculaterm::{Function, Registry};
/// let registry = Registry::new();
/// let f = Function::compile("2*x + 1", &registry).unwrap();
/// assert_eq!(f.eval(3.0, &registry), Ok(7.0));
/// assert_eq!(f.eval(-1.0, &registry), Ok(-1.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    source: String,
    ast: Ast,
}

impl Function {
    /// Compile the given mathematical `source` into a `Function`: lex it
    /// against `registry`, validate the tokens, convert them to postfix and
    /// build the tree.
    ///
    /// # Examples
    /// ```
    /// # use calculaterm::{Function, Registry};
    /// let registry = Registry::new();
    /// // A valid expression
    /// assert!(Function::compile("3 + 5 * sin(x)", &registry).is_ok());
    /// // an invalid expression
    /// let err = Function::compile("3 + * 2", &registry).unwrap_err();
    /// assert_eq!(err.position, 4);
    /// ```
    pub fn compile(source: &str, registry: &Registry) -> Result<Self, SyntaxError> {
        let limits = registry.limits();
        let tokens = tokenize(source, registry)?;
        if let Some(token) = tokens.get(limits.max_expression_length) {
            return Err(SyntaxError::new("expression is too long", token.position));
        }
        validate_tokens(&tokens)?;
        let postfix = to_postfix(&tokens)?;
        let ast = Ast::from_postfix(postfix, limits.max_expression_depth)?;
        Ok(Self {
            source: source.to_owned(),
            ast,
        })
    }

    /// Evaluate the function at `x`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use calculaterm::{DomainError, Function, Registry};
    /// let registry = Registry::new();
    /// let f = Function::compile("sqrt(x)", &registry).unwrap();
    /// assert_eq!(f.eval(9.0, &registry), Ok(3.0));
    /// assert!(matches!(
    ///     f.eval(-4.0, &registry),
    ///     Err(DomainError::OutOfDomain { .. })
    /// ));
    /// ```
    pub fn eval(&self, x: f64, registry: &Registry) -> Result<f64, DomainError> {
        Evaluator { registry }.eval(&self.ast, x, Depth::default())
    }

    /// The text this function was compiled from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The compiled tree
    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// Check whether the function reads `x`. A function that does not is a
    /// constant.
    pub fn uses_variable(&self) -> bool {
        self.ast.uses_variable()
    }

    /// Check whether the function references the user definition `name`
    pub fn references(&self, name: &str) -> bool {
        self.ast.references(name)
    }

    /// Rename every reference to the user definition `old`, both in the
    /// compiled tree and in the source text.
    pub fn rename(&mut self, old: &str, new: &str) {
        self.ast.rename(old, new);
        self.source = rename_identifier(&self.source, old, new);
    }
}

/// Apply a binary operator, failing on division by zero and on non finite
/// powers
pub(crate) fn apply(op: Op, a: f64, b: f64) -> Result<f64, DomainError> {
    match op {
        Op::Plus => Ok(a + b),
        Op::Minus => Ok(a - b),
        Op::Mul => Ok(a * b),
        Op::Div => {
            if b == 0.0 {
                Err(DomainError::DivisionByZero)
            } else {
                Ok(a / b)
            }
        }
        Op::Exp => {
            let result = libm::pow(a, b);
            if result.is_finite() {
                Ok(result)
            } else {
                Err(DomainError::InvalidPower {
                    base: a,
                    exponent: b,
                })
            }
        }
    }
}

fn finite(function: &str, operand: f64, result: f64) -> Result<f64, DomainError> {
    if result.is_finite() {
        Ok(result)
    } else {
        Err(DomainError::InvalidResult {
            function: function.into(),
            operand,
        })
    }
}

struct Evaluator<'a> {
    registry: &'a Registry,
}

/// Nesting reached by the evaluation of a node
#[derive(Debug, Clone, Copy, Default)]
struct Depth {
    /// User function calls currently on the stack
    calls: usize,
    /// Derivatives currently on the stack
    derivatives: usize,
}

impl<'a> Evaluator<'a> {
    fn eval(&self, ast: &Ast, x: f64, depth: Depth) -> Result<f64, DomainError> {
        match *ast {
            Ast::Variable => Ok(x),
            Ast::Value(number) => Ok(number),
            Ast::Constant(ref name) => self
                .registry
                .constant(name)
                .ok_or_else(|| DomainError::Undefined(name.clone())),
            Ast::Add(ref left, ref right) => self.binary(Op::Plus, left, right, x, depth),
            Ast::Sub(ref left, ref right) => self.binary(Op::Minus, left, right, x, depth),
            Ast::Mul(ref left, ref right) => self.binary(Op::Mul, left, right, x, depth),
            Ast::Div(ref left, ref right) => self.binary(Op::Div, left, right, x, depth),
            Ast::Exp(ref left, ref right) => self.binary(Op::Exp, left, right, x, depth),
            Ast::Function(ref func, ref arg) => func.call(self.eval(arg, x, depth)?),
            Ast::Call(ref name, ref arg) => {
                let a = self.eval(arg, x, depth)?;
                let function = self
                    .registry
                    .function(name)
                    .ok_or_else(|| DomainError::Undefined(name.clone()))?;
                let limit = self.registry.limits().max_call_depth;
                if depth.calls >= limit {
                    return Err(DomainError::RecursionLimit(limit));
                }
                let inner = Depth {
                    calls: depth.calls + 1,
                    ..depth
                };
                let result = self.eval(function.ast(), a, inner)?;
                finite(name, a, result)
            }
            Ast::Derivative(ref operand) => {
                let limit = self.registry.limits().max_derivative_depth;
                if depth.derivatives >= limit {
                    return Err(DomainError::DerivativeLimit(limit));
                }
                let inner = Depth {
                    derivatives: depth.derivatives + 1,
                    ..depth
                };
                let result = numerical_derivative(|t| self.eval(operand, t, inner), x)?;
                finite(DERIVATIVE, x, result)
            }
        }
    }

    fn binary(&self, op: Op, left: &Ast, right: &Ast, x: f64, depth: Depth) -> Result<f64, DomainError> {
        let a = self.eval(left, x, depth)?;
        let b = self.eval(right, x, depth)?;
        apply(op, a, b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use test_case::test_case;

    #[test]
    fn parse() {
        let registry = Registry::new();
        let valid_expressions = [
            "3 + 5",
            "(3 + 5)*45",
            "(3. + 5.0)*\t\n45",
            "(3 + 5^.5)*45",
            "sin(34.0) ^ sqrt(28.0)",
            "-x + 2x - pi x",
            "d/dx(d/dx(x^3))",
        ];
        for expr in &valid_expressions {
            assert!(Function::compile(expr, &registry).is_ok(), "{}", expr);
        }
    }

    #[test_case("3 + 5", 0.0 => Ok(8.0) ; "sum")]
    #[test_case("2 - 5", 0.0 => Ok(-3.0) ; "difference")]
    #[test_case("2 * 5", 0.0 => Ok(10.0) ; "product")]
    #[test_case("10 / 5", 0.0 => Ok(2.0) ; "quotient")]
    #[test_case("2 ^ 3", 0.0 => Ok(8.0) ; "power")]
    #[test_case("2^3^2", 0.0 => Ok(64.0) ; "power is left associative")]
    #[test_case("-3", 0.0 => Ok(-3.0) ; "negation")]
    #[test_case("-x^2", 3.0 => Ok(-9.0) ; "negation binds looser than power")]
    #[test_case("3 + 5 * 2", 0.0 => Ok(13.0) ; "precedence")]
    #[test_case("sqrt(9)", 0.0 => Ok(3.0) ; "builtin")]
    #[test_case("2*x+1", 3.0 => Ok(7.0) ; "linear")]
    #[test_case("2x + 1", 3.0 => Ok(7.0) ; "implicit product")]
    #[test_case("x x x", 2.0 => Ok(8.0) ; "implicit cube")]
    #[test_case("3(x - 1)", 2.0 => Ok(3.0) ; "implicit product with group")]
    #[test_case("abs(x)", -2.5 => Ok(2.5) ; "absolute value")]
    #[test_case("1/x", 0.0 => Err(DomainError::DivisionByZero) ; "division by zero")]
    #[test_case("(0-8)^(1/3)", 0.0 => Err(DomainError::InvalidPower { base: -8.0, exponent: 1.0 / 3.0 }) ; "root of negative")]
    #[test_case("ln(x)", 0.0 => Err(DomainError::OutOfDomain { function: "ln".into(), operand: 0.0, reason: "logarithm of non-positive number" }) ; "log of zero")]
    fn evaluation(input: &str, x: f64) -> Result<f64, DomainError> {
        let registry = Registry::new();
        Function::compile(input, &registry).unwrap().eval(x, &registry)
    }

    #[test]
    fn purity() {
        let registry = Registry::new();
        let f = Function::compile("sin(x) * exp(x) / (1 + x^2)", &registry).unwrap();
        let first: Vec<_> = (0..20).map(|i| f.eval(f64::from(i) * 0.3, &registry)).collect();
        let second: Vec<_> = (0..20).map(|i| f.eval(f64::from(i) * 0.3, &registry)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn derivatives() {
        let registry = Registry::new();
        let f = Function::compile("d/dx(x^2)", &registry).unwrap();
        assert_abs_diff_eq!(f.eval(3.0, &registry).unwrap(), 6.0, epsilon = 1e-4);

        let f = Function::compile("2 + d/dx(sin(x))", &registry).unwrap();
        assert_abs_diff_eq!(f.eval(0.0, &registry).unwrap(), 3.0, epsilon = 1e-4);

        let f = Function::compile("d/dx(d/dx(x^3))", &registry).unwrap();
        assert_abs_diff_eq!(f.eval(1.0, &registry).unwrap(), 6.0, epsilon = 1e-3);

        let f = Function::compile("d/dx(sqrt(x))", &registry).unwrap();
        assert_eq!(f.eval(0.0, &registry), Err(DomainError::NoDerivative));
    }

    #[test]
    fn derivative_nesting_is_bounded() {
        let registry = Registry::new();
        let f = Function::compile("d/dx(d/dx(d/dx(d/dx(x^4))))", &registry).unwrap();
        assert!(f.eval(1.0, &registry).is_ok());

        let f = Function::compile("d/dx(d/dx(d/dx(d/dx(d/dx(x^5)))))", &registry).unwrap();
        assert_eq!(f.eval(1.0, &registry), Err(DomainError::DerivativeLimit(4)));
    }

    #[test]
    fn long_flat_expressions() {
        let registry = Registry::new();
        let f = Function::compile(&vec!["x"; 300].join("+"), &registry).unwrap();
        assert_eq!(f.eval(2.0, &registry), Ok(600.0));

        let f = Function::compile(&vec!["1"; 300].join(" + "), &registry).unwrap();
        assert_eq!(f.ast().value(), Some(300.0));

        let f = Function::compile(&vec!["x"; 300].join("*"), &registry).unwrap();
        assert_eq!(f.eval(1.0, &registry), Ok(1.0));

        let err = Function::compile(&vec!["x"; 600].join("-"), &registry).unwrap_err();
        assert_eq!(err.message, "expression is too long");
        assert_eq!(err.position, 1024);
    }

    #[test]
    fn user_definitions() {
        let mut registry = Registry::new();
        registry.define_or_update("r = 5").unwrap();
        registry.define_or_update("sq = x^2").unwrap();

        let area = Function::compile("pi*r^2", &registry).unwrap();
        for &x in &[-3.0, 0.0, 42.0] {
            assert_abs_diff_eq!(
                area.eval(x, &registry).unwrap(),
                std::f64::consts::PI * 25.0,
                epsilon = 1e-12
            );
        }
        assert!(!area.uses_variable());

        let f = Function::compile("sq(x + 1) + r", &registry).unwrap();
        assert_eq!(f.eval(2.0, &registry), Ok(14.0));
    }

    #[test]
    fn nested_errors_propagate() {
        let mut registry = Registry::new();
        registry.define_or_update("inv = 1/x").unwrap();
        let f = Function::compile("inv(x - 1) + 2", &registry).unwrap();
        assert_eq!(f.eval(3.0, &registry), Ok(2.5));
        assert_eq!(f.eval(1.0, &registry), Err(DomainError::DivisionByZero));
    }

    #[test]
    fn removed_definitions_are_undefined() {
        let mut registry = Registry::new();
        registry.define_or_update("k = 2").unwrap();
        let f = Function::compile("k x", &registry).unwrap();
        registry.remove("k");
        assert_eq!(f.eval(1.0, &registry), Err(DomainError::Undefined("k".into())));
    }

    #[test]
    fn rename() {
        let mut registry = Registry::new();
        registry.define_or_update("r = 2").unwrap();
        let mut f = Function::compile("r x + 2r", &registry).unwrap();
        f.rename("r", "s");
        assert_eq!(f.source(), "s x + 2s");
        assert!(f.references("s"));
        assert!(!f.references("r"));
    }
}
