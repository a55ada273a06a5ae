//! Sampling of compiled functions for a renderer. Nothing here draws: a
//! renderer maps the returned points to pixels and joins consecutive points of
//! a run.

use crate::expr::Function;
use crate::registry::Registry;

/// Window of the plane shown by a renderer, and its width in pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Left edge of the window
    pub x_min: f64,
    /// Right edge of the window
    pub x_max: f64,
    /// Bottom edge of the window
    pub y_min: f64,
    /// Top edge of the window
    pub y_max: f64,
    /// Width of the drawing area, in pixel columns
    pub width: usize,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x_min: -10.0,
            x_max: 10.0,
            y_min: -10.0,
            y_max: 10.0,
            width: 80,
        }
    }
}

impl Viewport {
    /// Number of samples taken across the window: two per pixel column
    pub fn resolution(&self) -> usize {
        2 * self.width
    }

    /// The abscissas at which a function is sampled, evenly spaced from
    /// `x_min` to `x_max` inclusive
    pub fn abscissas(&self) -> impl Iterator<Item = f64> {
        let n = self.resolution();
        let (x_min, x_max) = (self.x_min, self.x_max);
        let step = if n > 1 {
            (x_max - x_min) / (n - 1) as f64
        } else {
            0.0
        };
        (0..n).map(move |i| x_min + step * i as f64)
    }

    /// Check whether `y` is within the vertical span of the window
    pub fn contains(&self, y: f64) -> bool {
        self.y_min <= y && y <= self.y_max
    }
}

/// Evaluate `function` across `viewport`, and group the in-range points into
/// runs of consecutive samples. A sample outside `[y_min, y_max]`, or where
/// the function is undefined, ends the current run.
///
/// # Examples
///
/// ```
/// # use calculaterm::{sample, Function, Registry, Viewport};
/// let registry = Registry::new();
/// let f = Function::compile("1/x", &registry).unwrap();
/// let viewport = Viewport { x_min: -1.0, x_max: 1.0, y_min: -5.0, y_max: 5.0, width: 5 };
/// let runs = sample(&f, &registry, &viewport);
/// // 1/x leaves the window around 0, splitting the curve in two
/// assert_eq!(runs.len(), 2);
/// assert!(runs.iter().flatten().all(|&(_, y)| y.abs() <= 5.0));
/// ```
pub fn sample(function: &Function, registry: &Registry, viewport: &Viewport) -> Vec<Vec<(f64, f64)>> {
    let mut runs = Vec::new();
    let mut current = Vec::new();
    for x in viewport.abscissas() {
        match function.eval(x, registry) {
            Ok(y) if viewport.contains(y) => current.push((x, y)),
            _ => {
                if !current.is_empty() {
                    runs.push(std::mem::take(&mut current));
                }
            }
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abscissas_cover_the_window() {
        let viewport = Viewport {
            width: 3,
            ..Viewport::default()
        };
        let xs: Vec<_> = viewport.abscissas().collect();
        assert_eq!(xs, vec![-10.0, -6.0, -2.0, 2.0, 6.0, 10.0]);
        assert_eq!(Viewport::default().resolution(), 160);
    }

    #[test]
    fn one_run_for_a_continuous_curve() {
        let registry = Registry::new();
        let f = Function::compile("x/2", &registry).unwrap();
        let runs = sample(&f, &registry, &Viewport::default());
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].len(), 160);
    }

    #[test]
    fn undefined_points_split_runs() {
        let registry = Registry::new();
        let f = Function::compile("sqrt(x)", &registry).unwrap();
        let viewport = Viewport {
            x_min: -1.0,
            x_max: 1.0,
            y_min: -2.0,
            y_max: 2.0,
            width: 2,
        };
        let runs = sample(&f, &registry, &viewport);
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].len(), 2);
        assert!(runs[0].iter().all(|&(x, _)| x > 0.0));
    }

    #[test]
    fn out_of_range_is_skipped() {
        let registry = Registry::new();
        let f = Function::compile("100", &registry).unwrap();
        assert!(sample(&f, &registry, &Viewport::default()).is_empty());
    }
}
