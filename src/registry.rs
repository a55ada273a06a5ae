//! Named definitions: built-in constants and functions, and the constants and
//! functions defined by the user.

use crate::config::Limits;
use crate::error::DefinitionError;
use crate::expr::Function;
use crate::token::TokenKind;
use crate::util::{is_identifier, Builtin, CONSTANTS, FUNCTIONS, VARIABLE};
use hashbrown::HashMap;

/// What a name refers to
#[derive(Debug, Clone, PartialEq)]
pub enum Definition {
    /// One of `e`, `pi`, `phi`, `tau`
    BuiltinConstant(f64),
    /// One of the built-in functions of one argument
    BuiltinFunction(Builtin),
    /// A user expression depending on `x`
    UserFunction(Function),
    /// A user expression not depending on `x`, evaluated once
    UserConstant {
        /// The value of the expression at `x = 0`
        value: f64,
        /// The expression, as written
        source: String,
    },
}

impl Definition {
    /// Check whether this definition comes with every registry
    pub fn is_builtin(&self) -> bool {
        matches!(self, Self::BuiltinConstant(_) | Self::BuiltinFunction(_))
    }
}

/// Mapping from names to definitions. Names are unique across built-in and
/// user definitions, and `x` can never be defined.
///
/// The registry is passed explicitly to everything that resolves a name. A
/// sweep of evaluations (one redraw, one root search) holds a shared borrow of
/// it, so no definition can change under it. [`generation`](#method.generation)
/// changes on every mutation, for hosts caching results across sweeps.
///
/// # Examples
///
/// ```
/// # use calculaterm::{Function, Registry};
/// let mut registry = Registry::new();
/// registry.define_or_update("r = 5").unwrap();
/// registry.define_or_update("double = 2x").unwrap();
///
/// let f = Function::compile("double(r) + 1", &registry).unwrap();
/// assert_eq!(f.eval(0.0, &registry), Ok(11.0));
///
/// assert!(registry.define_or_update("pi = 3").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct Registry {
    entries: HashMap<String, Definition>,
    limits: Limits,
    generation: u64,
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_limits(Limits::default())
    }
}

impl Registry {
    /// Create a registry holding only the built-in definitions
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding only the built-in definitions, evaluating
    /// under `limits`
    pub fn with_limits(limits: Limits) -> Self {
        let mut entries = HashMap::new();
        for (&name, &value) in CONSTANTS.iter() {
            entries.insert(name.to_owned(), Definition::BuiltinConstant(value));
        }
        for (&name, &builtin) in FUNCTIONS.iter() {
            entries.insert(name.to_owned(), Definition::BuiltinFunction(builtin));
        }
        Self {
            entries,
            limits,
            generation: 0,
        }
    }

    /// Limits applied to compilation and evaluation
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Counter bumped by every change to the definitions
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The definition of `name`, built-in or not
    pub fn get(&self, name: &str) -> Option<&Definition> {
        self.entries.get(name)
    }

    /// Check whether `name` is defined
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Classify an identifier for the lexer: built-in constant, user
    /// constant, built-in function, then user function. Names being unique,
    /// at most one of those matches.
    pub fn classify(&self, name: &str) -> Option<TokenKind> {
        match self.entries.get(name)? {
            Definition::BuiltinConstant(_) | Definition::UserConstant { .. } => {
                Some(TokenKind::Constant)
            }
            Definition::BuiltinFunction(_) | Definition::UserFunction(_) => {
                Some(TokenKind::Function)
            }
        }
    }

    /// Value of a built-in or user constant
    pub fn constant(&self, name: &str) -> Option<f64> {
        match self.entries.get(name)? {
            Definition::BuiltinConstant(value) | Definition::UserConstant { value, .. } => {
                Some(*value)
            }
            _ => None,
        }
    }

    /// A user function
    pub fn function(&self, name: &str) -> Option<&Function> {
        match self.entries.get(name)? {
            Definition::UserFunction(function) => Some(function),
            _ => None,
        }
    }

    /// Iterate over the user definitions, in no particular order
    pub fn user_definitions(&self) -> impl Iterator<Item = (&str, &Definition)> {
        self.entries
            .iter()
            .filter(|(_, definition)| !definition.is_builtin())
            .map(|(name, definition)| (name.as_str(), definition))
    }

    /// Check that `name` can be given to a new user definition
    pub fn check_available(&self, name: &str) -> Result<(), DefinitionError> {
        if name.is_empty() {
            return Err(DefinitionError::EmptyName);
        }
        if !is_identifier(name) {
            return Err(DefinitionError::InvalidIdentifier(name.into()));
        }
        if name == VARIABLE {
            return Err(DefinitionError::ReservedVariable);
        }
        match self.entries.get(name) {
            None => Ok(()),
            Some(Definition::BuiltinFunction(_)) => {
                Err(DefinitionError::BuiltinFunction(name.into()))
            }
            Some(Definition::BuiltinConstant(_)) => {
                Err(DefinitionError::BuiltinConstant(name.into()))
            }
            Some(Definition::UserFunction(_)) => {
                Err(DefinitionError::DuplicateFunction(name.into()))
            }
            Some(Definition::UserConstant { .. }) => {
                Err(DefinitionError::DuplicateConstant(name.into()))
            }
        }
    }

    /// Process a `name = expression` definition, and return the defined name.
    ///
    /// An expression reading `x` (or taking a derivative, as in
    /// `name = d/dx(expr)`) defines a function. Any other expression is
    /// evaluated once, at `x = 0`, and defines a constant.
    ///
    /// # Examples
    ///
    /// ```
    /// # use calculaterm::{DefinitionError, Definition, Registry};
    /// let mut registry = Registry::new();
    /// assert_eq!(registry.define_or_update("area = 2*3").unwrap(), "area");
    /// assert_eq!(registry.constant("area"), Some(6.0));
    ///
    /// registry.define_or_update("slope = d/dx(x^2)").unwrap();
    /// assert!(registry.function("slope").is_some());
    ///
    /// assert_eq!(
    ///     registry.define_or_update("area = 7"),
    ///     Err(DefinitionError::DuplicateConstant("area".into()))
    /// );
    /// assert_eq!(
    ///     registry.define_or_update("x = 7"),
    ///     Err(DefinitionError::ReservedVariable)
    /// );
    /// ```
    pub fn define_or_update(&mut self, text: &str) -> Result<String, DefinitionError> {
        let (name, offset, rhs) = split_definition_at(text)?;
        self.define(&name, rhs).map_err(|err| match err {
            DefinitionError::InvalidExpression(mut syntax) => {
                syntax.position += offset;
                DefinitionError::InvalidExpression(syntax)
            }
            other => other,
        })?;
        Ok(name)
    }

    /// Compile `source` and define it under `name`
    pub fn define(&mut self, name: &str, source: &str) -> Result<&Definition, DefinitionError> {
        self.check_available(name)?;
        let function =
            Function::compile(source, self).map_err(DefinitionError::InvalidExpression)?;
        self.register(name, function)
    }

    /// Define an already compiled function under `name`, as a function if it
    /// reads `x` and as a constant otherwise.
    pub fn register(&mut self, name: &str, function: Function) -> Result<&Definition, DefinitionError> {
        self.check_available(name)?;
        let definition = if function.uses_variable() {
            Definition::UserFunction(function)
        } else {
            let value = function
                .eval(0.0, self)
                .map_err(DefinitionError::InvalidConstant)?;
            Definition::UserConstant {
                value,
                source: function.source().to_owned(),
            }
        };
        log::debug!("defined {} as {:?}", name, definition);
        self.generation += 1;
        Ok(self.entries.entry(name.to_owned()).or_insert(definition))
    }

    /// Remove a user definition. Built-in definitions cannot be removed.
    pub fn remove(&mut self, name: &str) -> Option<Definition> {
        if self.entries.get(name)?.is_builtin() {
            return None;
        }
        log::debug!("removed {}", name);
        self.generation += 1;
        self.entries.remove(name)
    }

    /// Move the user definition `old` to `new`, and point every user function
    /// referencing `old` at `new`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use calculaterm::Registry;
    /// let mut registry = Registry::new();
    /// registry.define_or_update("r = 3").unwrap();
    /// registry.define_or_update("f = r x").unwrap();
    /// registry.rename("r", "radius").unwrap();
    ///
    /// assert_eq!(registry.constant("radius"), Some(3.0));
    /// assert_eq!(registry.function("f").unwrap().source(), "radius x");
    /// assert_eq!(registry.function("f").unwrap().eval(2.0, &registry), Ok(6.0));
    /// ```
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), DefinitionError> {
        match self.entries.get(old) {
            Some(definition) if !definition.is_builtin() => {}
            _ => return Err(DefinitionError::NotDefined(old.into())),
        }
        if old == new {
            return Ok(());
        }
        self.check_available(new)?;

        if let Some(definition) = self.entries.remove(old) {
            self.entries.insert(new.to_owned(), definition);
        }
        for definition in self.entries.values_mut() {
            match definition {
                Definition::UserFunction(function) if function.references(old) => {
                    function.rename(old, new)
                }
                Definition::UserConstant { source, .. } => {
                    *source = crate::lexer::rename_identifier(source, old, new)
                }
                _ => {}
            }
        }
        log::debug!("renamed {} to {}", old, new);
        self.generation += 1;
        Ok(())
    }
}

/// Split `name = expression` into the lowercased name and the trimmed
/// expression, checking the spaces around the name: at most one space before
/// `=`, none inside the name.
///
/// # Examples
///
/// ```
/// # use calculaterm::{split_definition, DefinitionError};
/// assert_eq!(split_definition("r = 5"), Ok(("r".to_string(), "5")));
/// assert_eq!(split_definition("Area=pi r^2"), Ok(("area".to_string(), "pi r^2")));
/// assert_eq!(
///     split_definition("my var = 1"),
///     Err(DefinitionError::Malformed {
///         message: "identifier cannot contain spaces",
///         position: 2
///     })
/// );
/// ```
pub fn split_definition(text: &str) -> Result<(String, &str), DefinitionError> {
    let (name, _, body) = split_definition_at(text)?;
    Ok((name, body))
}

/// Same as [`split_definition`], also returning the byte offset of the
/// expression in `text`
pub(crate) fn split_definition_at(text: &str) -> Result<(String, usize, &str), DefinitionError> {
    let equals = text.find('=').ok_or(DefinitionError::MissingEquals)?;
    let left = &text[..equals];

    let core = left.trim_end_matches(' ');
    let trailing = left.len() - core.len();
    if trailing > 1 {
        return Err(DefinitionError::Malformed {
            message: "only one space allowed before '='",
            position: equals - trailing + 1,
        });
    }

    let start = core.len() - core.trim_start().len();
    let core = core.trim_start();
    if let Some(space) = core.find(char::is_whitespace) {
        return Err(DefinitionError::Malformed {
            message: "identifier cannot contain spaces",
            position: start + space,
        });
    }

    let name = core.to_lowercase();
    if name.is_empty() {
        return Err(DefinitionError::EmptyName);
    }
    let rhs = &text[equals + 1..];
    let offset = text.len() - rhs.trim_start().len();
    Ok((name, offset, rhs.trim()))
}
