use crate::error::DomainError;

/// Machine epsilon surrogate used to size the step
const EPSILON: f64 = 2.2e-16;

/// Derivative of `f` at `x`, from the fourth order central difference
///
/// `(-f(x+2h) + 8f(x+h) - 8f(x-h) + f(x-2h)) / 12h`, with
/// `h = EPSILON^(1/5) * max(1, |x|)`.
///
/// `f` is also evaluated at `x` itself. If any of the five evaluations fails,
/// the derivative does not exist. An evaluation hitting a limit (see
/// [`DomainError::is_limit`](enum.DomainError.html#method.is_limit)) stops
/// the stencil at once and is returned as is.
///
/// # Examples
///
/// ```
/// # use calculaterm::{numerical_derivative, DomainError};
/// let d = numerical_derivative(|x| Ok(x * x), 3.0).unwrap();
/// assert!((d - 6.0).abs() < 1e-6);
///
/// let sqrt = |x: f64| if x < 0.0 { Err(DomainError::NoDerivative) } else { Ok(x.sqrt()) };
/// assert_eq!(numerical_derivative(sqrt, 0.0), Err(DomainError::NoDerivative));
/// ```
pub fn numerical_derivative<F>(f: F, x: f64) -> Result<f64, DomainError>
where
    F: Fn(f64) -> Result<f64, DomainError>,
{
    let h = EPSILON.powf(1.0 / 5.0) * x.abs().max(1.0);

    let point = |t: f64| match f(t) {
        Ok(y) => Ok(Some(y)),
        Err(err) if err.is_limit() => Err(err),
        Err(_) => Ok(None),
    };
    let a = point(x + 2.0 * h)?;
    let b = point(x + h)?;
    let c = point(x - h)?;
    let d = point(x - 2.0 * h)?;
    let at_x = point(x)?;

    match (a, b, c, d, at_x) {
        (Some(a), Some(b), Some(c), Some(d), Some(_)) => {
            Ok((-a + 8.0 * b - 8.0 * c + d) / (12.0 * h))
        }
        _ => Err(DomainError::NoDerivative),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::cell::Cell;

    #[test]
    fn polynomials() {
        let cube = |x: f64| Ok(x * x * x);
        assert_abs_diff_eq!(numerical_derivative(cube, 2.0).unwrap(), 12.0, epsilon = 1e-6);
        assert_abs_diff_eq!(numerical_derivative(|_| Ok(4.0), 1e6).unwrap(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn step_scales_with_x() {
        let d = numerical_derivative(|x: f64| Ok(x.ln()), 1e4).unwrap();
        assert_abs_diff_eq!(d, 1e-4, epsilon = 1e-9);
    }

    #[test]
    fn evaluates_five_points() {
        let calls = Cell::new(0);
        let f = |x: f64| {
            calls.set(calls.get() + 1);
            Ok(x)
        };
        numerical_derivative(f, 0.5).unwrap();
        assert_eq!(calls.get(), 5);

        calls.set(0);
        let g = |_: f64| {
            calls.set(calls.get() + 1);
            Err(DomainError::DivisionByZero)
        };
        assert!(numerical_derivative(g, 0.5).is_err());
        assert_eq!(calls.get(), 5);
    }

    #[test]
    fn limits_stop_the_stencil() {
        let calls = Cell::new(0);
        let f = |_: f64| {
            calls.set(calls.get() + 1);
            Err(DomainError::RecursionLimit(32))
        };
        assert_eq!(numerical_derivative(f, 1.0), Err(DomainError::RecursionLimit(32)));
        assert_eq!(calls.get(), 1);

        let g = |x: f64| if x > 1.0 { Err(DomainError::DerivativeLimit(4)) } else { Ok(x) };
        assert_eq!(numerical_derivative(g, 1.0), Err(DomainError::DerivativeLimit(4)));
    }

    #[test]
    fn undefined_at_the_point() {
        // defined around 0 but not at 0
        let f = |x: f64| if x == 0.0 { Err(DomainError::DivisionByZero) } else { Ok(1.0) };
        assert_eq!(numerical_derivative(f, 0.0), Err(DomainError::NoDerivative));
    }
}
