#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(
    clippy::needless_return,
    clippy::missing_docs_in_private_items,
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::non_ascii_literal
)]

//! Calculaterm, a crate for algebraic expressions of a single variable `x`.
//!
//! This crate compiles expressions, embedded in strings, into functions that
//! can be evaluated at any `x`. The easiest way to use this crate is with the
//! [`eval`](fn.eval.html) function:
//!
//! ```
//! use calculaterm::{eval, Registry};
//! let registry = Registry::new();
//! assert_eq!(eval("3 + 5 * 2", 0.0, &registry), Ok(13.0));
//! assert_eq!(eval("2x^2", 3.0, &registry), Ok(18.0));
//! ```
//!
//! The [`Registry`](struct.Registry.html) holds named constants and functions.
//! Definitions are written `name = expression`: an expression reading `x`
//! defines a function, any other one a constant.
//!
//! ```
//! use calculaterm::{eval, Registry};
//!
//! let mut registry = Registry::new();
//! registry.define_or_update("r = 2").unwrap();
//! registry.define_or_update("area = pi x^2").unwrap();
//! assert_eq!(eval("area(r) / pi", 0.0, &registry), Ok(4.0));
//! ```
//!
//! It is also possible to separate the compilation from the evaluation with
//! the [`Function`](struct.Function.html) type, and to look for roots or
//! intersections of compiled functions.
//!
//! ```
//! use calculaterm::{find_intersection, Function, Registry};
//!
//! let registry = Registry::new();
//! let f = Function::compile("cos(x)", &registry).unwrap();
//! let g = Function::compile("x", &registry).unwrap();
//! let x = find_intersection(&f, &g, &registry, 1.0).unwrap();
//! assert!((x - 0.739_085).abs() < 1e-6);
//! ```
//!
//! # Language definition
//!
//! The language contains the following elements:
//!
//! - decimal literals: `12`, `0.5`, `.25`. There is no exponent notation, and
//!   no unary plus;
//! - the variable `x`;
//! - left and right parenthesis;
//! - operators: `+`, `-`, `*`, `/` and `^`. All of them are left
//!   associative, `^` included: `2^3^2` is `64`. A leading `-` negates the
//!   rest of the expression;
//! - implicit multiplication: `2x`, `3(x+1)`, `2pi`, `x sin(x)`;
//! - the built-in constants `pi`, `e`, `phi` and `tau`;
//! - the built-in functions `sin`, `cos`, `tan`, `asin`, `acos`, `atan`,
//!   `sqrt`, `ln`, `exp` and `abs`;
//! - the derivative `d/dx(expression)`, computed numerically;
//! - names defined in the registry. A user function is called with one
//!   argument, `f(2x)`, and a user constant is used as is.
//!
//! Any other symbol is forbidden in the input. Errors report the byte offset
//! where they were found.
//!
//! # Technical details
//!
//! Calculaterm is based on an AST interpreter, and uses a Shunting-Yard
//! algorithm for parsing the expressions. Constant sub-expressions are folded
//! at compile time. User definitions are resolved by name at evaluation, so
//! redefining a name is seen by every function using it.

#[macro_use]
extern crate lazy_static;

mod ast;
mod config;
mod derivative;
mod error;
mod expr;
mod lexer;
mod parser;
mod plot;
mod registry;
mod root;
mod token;
mod util;
mod validate;
mod workbook;

pub use ast::Ast;
pub use config::Limits;
pub use derivative::numerical_derivative;
pub use error::{DefinitionError, DomainError, EngineError, RootError, SyntaxError};
pub use expr::{compile, eval, evaluate, Function};
pub use lexer::{identifiers, rename_identifier, tokenize};
pub use parser::to_postfix;
pub use plot::{sample, Viewport};
pub use registry::{split_definition, Definition, Registry};
pub use root::{find_intersection, find_root, SecantSolver};
pub use token::{Op, Token, TokenKind};
pub use util::{is_identifier, Builtin, Domain, CONSTANTS, FUNCTIONS};
pub use validate::{validate_expression, validate_tokens};
pub use workbook::{Expression, Workbook};
