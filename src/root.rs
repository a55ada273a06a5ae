use crate::error::{DomainError, RootError};
use crate::expr::Function;
use crate::registry::Registry;

/// Secant method solver.
///
/// Starting from `guess` and `guess + seed_offset`, iterate
/// `x2 = x1 - f(x1) (x1 - x0) / (f(x1) - f(x0))` until `|f(x)| < tolerance`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SecantSolver {
    /// Residual below which a point is a root
    pub tolerance: f64,
    /// `|f(x1) - f(x0)|` below which the secant is considered flat
    pub flat_gradient: f64,
    /// Number of secant steps before giving up
    pub max_iterations: usize,
    /// Distance between the two seeds
    pub seed_offset: f64,
}

impl Default for SecantSolver {
    fn default() -> Self {
        Self {
            tolerance: 1e-9,
            flat_gradient: 1e-15,
            max_iterations: 100,
            seed_offset: 0.1,
        }
    }
}

impl SecantSolver {
    /// Create a solver with the default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Find a root of `f` near `guess`. Any failure of `f` aborts the search.
    pub fn solve<F>(&self, f: F, guess: f64) -> Result<f64, RootError>
    where
        F: Fn(f64) -> Result<f64, DomainError>,
    {
        let mut x0 = guess;
        let mut x1 = guess + self.seed_offset;

        let mut y0 = f(x0)?;
        if y0.abs() < self.tolerance {
            return Ok(x0);
        }

        for iteration in 0..self.max_iterations {
            let y1 = f(x1)?;
            log::trace!("secant iteration {}: f({}) = {}", iteration, x1, y1);
            if y1.abs() < self.tolerance {
                return Ok(x1);
            }
            if (y1 - y0).abs() < self.flat_gradient {
                return Err(RootError::FlatGradient);
            }

            let x2 = x1 - y1 * (x1 - x0) / (y1 - y0);
            x0 = x1;
            y0 = y1;
            x1 = x2;
        }

        Err(RootError::NoConvergence(self.max_iterations))
    }
}

/// Find a root of `f` near `guess` with the default solver.
///
/// # Examples
///
/// ```
/// # use calculaterm::{find_root, RootError};
/// let root = find_root(|x| Ok(x * x - 2.0), 1.0).unwrap();
/// assert!((root - 2f64.sqrt()).abs() < 1e-9);
///
/// assert_eq!(find_root(|_| Ok(1.0), 0.0), Err(RootError::FlatGradient));
/// ```
pub fn find_root<F>(f: F, guess: f64) -> Result<f64, RootError>
where
    F: Fn(f64) -> Result<f64, DomainError>,
{
    SecantSolver::default().solve(f, guess)
}

/// Find an `x` near `guess` where `f(x) = g(x)`, as a root of `f - g`. The
/// difference fails wherever `f` or `g` does.
///
/// # Examples
///
/// ```
/// # use calculaterm::{find_intersection, Function, Registry};
/// let registry = Registry::new();
/// let f = Function::compile("x^2", &registry).unwrap();
/// let g = Function::compile("x + 2", &registry).unwrap();
/// let x = find_intersection(&f, &g, &registry, 1.5).unwrap();
/// assert!((x - 2.0).abs() < 1e-6);
/// ```
pub fn find_intersection(
    f: &Function,
    g: &Function,
    registry: &Registry,
    guess: f64,
) -> Result<f64, RootError> {
    let difference = |x: f64| -> Result<f64, DomainError> {
        Ok(f.eval(x, registry)? - g.eval(x, registry)?)
    };
    find_root(difference, guess)
}
