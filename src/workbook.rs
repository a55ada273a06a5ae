//! Rows of expressions, as typed by a user, kept consistent with a registry.
//!
//! Every row has a name, `y1`, `y2`, ... by default, or the one given with
//! `name = expression`. A row compiling successfully is registered under its
//! name, so that other rows can reference it. Renaming a row rewrites every
//! other row referencing it.

use crate::error::{DefinitionError, DomainError, EngineError};
use crate::expr::Function;
use crate::lexer::{identifiers, rename_identifier};
use crate::plot::{sample, Viewport};
use crate::registry::{split_definition_at, Registry};
use crate::util::is_identifier;

/// One row of a workbook
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    text: String,
    body: String,
    /// Byte offset of `body` in `text`
    offset: usize,
    name: String,
    function: Option<Function>,
    error: Option<EngineError>,
    enabled: bool,
}

impl Expression {
    fn empty(name: String) -> Self {
        let text = format!("{} = ", name);
        Expression {
            offset: text.len(),
            text,
            body: String::new(),
            name,
            function: None,
            error: None,
            enabled: true,
        }
    }

    /// The text of the row, as typed
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The expression part of the row, without any `name =` prefix
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The name the row is registered under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The compiled function, unless the row is empty or in error
    pub fn function(&self) -> Option<&Function> {
        self.function.as_ref()
    }

    /// Why the row does not compile, if it does not
    pub fn error(&self) -> Option<&EngineError> {
        self.error.as_ref()
    }

    /// Check whether the row is plotted
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// An ordered list of rows sharing one registry
///
/// # Examples
///
/// ```
/// # use calculaterm::Workbook;
/// let mut workbook = Workbook::new();
/// let r = workbook.push_row();
/// workbook.edit(r, "r = 5").unwrap();
/// let area = workbook.push_row();
/// workbook.edit(area, "pi r^2").unwrap();
///
/// // renaming r updates the rows using it
/// workbook.edit(r, "radius = 5").unwrap();
/// assert_eq!(workbook.rows()[area].text(), "pi radius^2");
/// assert!((workbook.evaluate(area, 0.0).unwrap() - 78.539_816).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Workbook {
    registry: Registry,
    rows: Vec<Expression>,
}

impl Workbook {
    /// Create a workbook without rows, over a registry of built-ins
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a workbook over an existing registry
    pub fn with_registry(registry: Registry) -> Self {
        Workbook {
            registry,
            rows: Vec::new(),
        }
    }

    /// The registry holding the rows' definitions
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The rows, in order
    pub fn rows(&self) -> &[Expression] {
        &self.rows
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check whether there is no row
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Append an empty row, and return its index
    pub fn push_row(&mut self) -> usize {
        self.insert_row(self.rows.len())
    }

    /// Insert an empty row at `index` (or at the end if `index` is past it),
    /// and return its index. The row gets the first free name `y<n>`, `n`
    /// starting at `index + 1`.
    pub fn insert_row(&mut self, index: usize) -> usize {
        let index = index.min(self.rows.len());
        let mut slot = index + 1;
        while self.is_taken(&default_name(slot)) {
            slot += 1;
        }
        self.rows.insert(index, Expression::empty(default_name(slot)));
        index
    }

    /// Replace the text of the row at `index`, and recompile it.
    ///
    /// Text containing `=` names the row: when the name changes, the row is
    /// renamed and every other row referencing the old name is rewritten.
    /// Rows depending on this one are recompiled. On error, the row is
    /// removed from the registry and keeps no function.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn edit(&mut self, index: usize, text: &str) -> Result<(), EngineError> {
        self.rows[index].text = text.to_owned();
        let result = self.apply_edit(index, text);
        if let Err(ref error) = result {
            self.mark_failed(index, error.clone());
        }
        let name = self.rows[index].name.clone();
        self.refresh_dependents(&name, Some(index));
        result
    }

    fn apply_edit(&mut self, index: usize, text: &str) -> Result<(), EngineError> {
        // a rejected edit leaves nothing to recompile
        self.rows[index].body.clear();
        self.rows[index].offset = 0;

        let raw = text.trim();
        let (offset, body) = if raw.contains('=') {
            let (name, offset, rhs) = split_definition_at(text)?;
            if !is_identifier(&name) {
                return Err(DefinitionError::InvalidIdentifier(name).into());
            }
            if name != self.rows[index].name {
                self.rename_row(index, &name)?;
            }
            (offset, rhs.to_owned())
        } else {
            (text.len() - text.trim_start().len(), raw.to_owned())
        };
        let row = &mut self.rows[index];
        row.body = body;
        row.offset = offset;
        self.recompile(index)
    }

    /// Rename the definition `old` to `new`: the row named `old` if any, its
    /// registry entry, and every reference to it in the other rows.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), DefinitionError> {
        if old == new {
            return Ok(());
        }
        let owner = self.rows.iter().position(|row| row.name == old);
        if owner.is_none() && !self.registry.contains(old) {
            return Err(DefinitionError::NotDefined(old.into()));
        }
        self.check_name(new)?;
        if self.registry.contains(old) {
            self.registry.rename(old, new)?;
        }
        if let Some(index) = owner {
            self.rows[index].name = new.to_owned();
        }
        self.propagate_rename(old, new, None);
        Ok(())
    }

    /// Remove the row at `index`. Following rows still carrying their default
    /// name move down one slot: `y4` becomes `y3`, and references follow.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove_row(&mut self, index: usize) -> Expression {
        let removed = self.rows.remove(index);
        self.registry.remove(&removed.name);

        for i in index..self.rows.len() {
            let (old, new) = (default_name(i + 2), default_name(i + 1));
            if self.rows[i].name == old {
                if let Err(err) = self.rename(&old, &new) {
                    log::warn!("cannot move {} to {}: {}", old, new, err);
                }
            }
        }
        self.refresh_dependents(&removed.name, None);
        removed
    }

    /// Enable or disable plotting of the row at `index`
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn set_enabled(&mut self, index: usize, enabled: bool) {
        self.rows[index].enabled = enabled;
    }

    /// Evaluate the row at `index`. A row in error fails with its error, an
    /// empty row is undefined everywhere.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn evaluate(&self, index: usize, x: f64) -> Result<f64, EngineError> {
        let row = &self.rows[index];
        if let Some(error) = &row.error {
            return Err(error.clone());
        }
        match &row.function {
            Some(function) => Ok(function.eval(x, &self.registry)?),
            None => Err(DomainError::Undefined(row.name.clone()).into()),
        }
    }

    /// Sample every enabled row without error across `viewport`. Returns the
    /// index of each row with its runs of in-range points.
    pub fn plot(&self, viewport: &Viewport) -> Vec<(usize, Vec<Vec<(f64, f64)>>)> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| row.enabled && row.error.is_none())
            .filter_map(|(index, row)| {
                let function = row.function.as_ref()?;
                Some((index, sample(function, &self.registry, viewport)))
            })
            .collect()
    }

    fn is_taken(&self, name: &str) -> bool {
        self.registry.contains(name) || self.rows.iter().any(|row| row.name == name)
    }

    fn check_name(&self, name: &str) -> Result<(), DefinitionError> {
        self.registry.check_available(name)?;
        if self.rows.iter().any(|row| row.name == name) {
            return Err(DefinitionError::DuplicateFunction(name.into()));
        }
        Ok(())
    }

    fn rename_row(&mut self, index: usize, new: &str) -> Result<(), DefinitionError> {
        let old = self.rows[index].name.clone();
        self.check_name(new)?;
        if self.registry.contains(&old) {
            self.registry.rename(&old, new)?;
        }
        self.rows[index].name = new.to_owned();
        self.propagate_rename(&old, new, Some(index));
        Ok(())
    }

    /// Rewrite `old` into `new` in every row but `skip`, and recompile the
    /// rows whose expression changed
    fn propagate_rename(&mut self, old: &str, new: &str, skip: Option<usize>) {
        let mut changed = Vec::new();
        for (index, row) in self.rows.iter_mut().enumerate() {
            if Some(index) == skip {
                continue;
            }
            let body = rename_identifier(&row.body, old, new);
            if body != row.body {
                row.body = body;
                changed.push(index);
            }
            let text = rename_identifier(&row.text, old, new);
            if text != row.text {
                // the expression stays the tail of the text
                row.offset = text.trim_end().len().saturating_sub(row.body.len());
                row.text = text;
            }
        }
        log::debug!("renamed {} to {} in {} rows", old, new, changed.len());

        for index in changed {
            if let Err(err) = self.recompile(index) {
                log::warn!("row {} failed after renaming {}: {}", self.rows[index].name, old, err);
            }
        }
    }

    /// Recompile the rows referencing `name`, then the rows referencing
    /// those, and so on. Each row is recompiled at most once.
    fn refresh_dependents(&mut self, name: &str, skip: Option<usize>) {
        let mut visited = vec![false; self.rows.len()];
        if let Some(index) = skip {
            visited[index] = true;
        }
        let mut pending = vec![name.to_owned()];
        while let Some(name) = pending.pop() {
            for index in 0..self.rows.len() {
                if visited[index] {
                    continue;
                }
                let depends = identifiers(&self.rows[index].body)
                    .iter()
                    .any(|&(_, identifier)| identifier == name);
                if depends {
                    visited[index] = true;
                    if let Err(err) = self.recompile(index) {
                        log::debug!("row {} depends on {}: {}", self.rows[index].name, name, err);
                    }
                    pending.push(self.rows[index].name.clone());
                }
            }
        }
    }

    fn recompile(&mut self, index: usize) -> Result<(), EngineError> {
        match self.compile_row(index) {
            Ok(function) => {
                let row = &mut self.rows[index];
                row.function = function;
                row.error = None;
                Ok(())
            }
            Err(error) => {
                self.mark_failed(index, error.clone());
                Err(error)
            }
        }
    }

    fn compile_row(&mut self, index: usize) -> Result<Option<Function>, EngineError> {
        let name = self.rows[index].name.clone();
        self.registry.remove(&name);
        let row = &self.rows[index];
        if row.body.trim().is_empty() {
            return Ok(None);
        }
        let offset = row.offset;
        let function = Function::compile(&row.body, &self.registry).map_err(|mut err| {
            err.position += offset;
            err
        })?;
        self.registry.register(&name, function.clone())?;
        Ok(Some(function))
    }

    fn mark_failed(&mut self, index: usize, error: EngineError) {
        let row = &mut self.rows[index];
        self.registry.remove(&row.name);
        row.function = None;
        row.error = Some(error);
    }
}

fn default_name(slot: usize) -> String {
    format!("y{}", slot)
}
