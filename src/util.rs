use crate::error::DomainError;
use hashbrown::HashMap;

/// Name of the numerical derivative operator
pub const DERIVATIVE: &str = "d/dx";

/// Name of the free variable
pub const VARIABLE: &str = "x";

/// Input domain of a built-in function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    /// Every real number
    Real,
    /// `a > 0`
    Positive,
    /// `a >= 0`
    NonNegative,
    /// `-1 <= a <= 1`
    UnitInterval,
}

/// A built-in unary function with its domain
#[derive(Debug, Clone, Copy)]
pub struct Builtin {
    /// Name of the function in expressions
    pub name: &'static str,
    function: fn(f64) -> f64,
    domain: Domain,
}

impl PartialEq for Builtin {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Builtin {
    fn new(name: &'static str, function: fn(f64) -> f64, domain: Domain) -> Self {
        Builtin {
            name,
            function,
            domain,
        }
    }

    /// Apply the function to `a`, checking its domain and the result.
    pub fn call(&self, a: f64) -> Result<f64, DomainError> {
        let reason = match self.domain {
            Domain::Real => None,
            Domain::Positive if a <= 0.0 => Some("logarithm of non-positive number"),
            Domain::NonNegative if a < 0.0 => Some("square root of negative number"),
            Domain::UnitInterval if !(-1.0..=1.0).contains(&a) => {
                Some("argument must be between -1 and 1")
            }
            _ => None,
        };
        if let Some(reason) = reason {
            return Err(DomainError::OutOfDomain {
                function: self.name.into(),
                operand: a,
                reason,
            });
        }

        let result = (self.function)(a);
        if result.is_finite() {
            Ok(result)
        } else {
            Err(DomainError::InvalidResult {
                function: self.name.into(),
                operand: a,
            })
        }
    }
}

lazy_static! {
    /// Built-in functions, by name
    pub static ref FUNCTIONS: HashMap<&'static str, Builtin> = {
        let mut map = HashMap::new();
        for builtin in &[
            Builtin::new("sin", f64::sin, Domain::Real),
            Builtin::new("cos", f64::cos, Domain::Real),
            Builtin::new("tan", f64::tan, Domain::Real),
            Builtin::new("sqrt", f64::sqrt, Domain::NonNegative),
            Builtin::new("ln", f64::ln, Domain::Positive),
            Builtin::new("exp", f64::exp, Domain::Real),
            Builtin::new("abs", f64::abs, Domain::Real),
            Builtin::new("asin", f64::asin, Domain::UnitInterval),
            Builtin::new("acos", f64::acos, Domain::UnitInterval),
            Builtin::new("atan", f64::atan, Domain::Real),
        ] {
            map.insert(builtin.name, *builtin);
        }
        map.shrink_to_fit();
        map
    };

    /// Built-in constants, by name
    pub static ref CONSTANTS: HashMap<&'static str, f64> = {
        let mut map = HashMap::new();
        map.insert("e", std::f64::consts::E);
        map.insert("pi", std::f64::consts::PI);
        // golden ratio
        map.insert("phi", 1.618_033_988_749_895);
        map.insert("tau", std::f64::consts::TAU);
        map.shrink_to_fit();
        map
    };
}

/// Check if `name` is a valid user identifier: a lowercase ASCII letter
/// followed by lowercase letters and digits.
///
/// # Examples
///
/// ```
/// # use calculaterm::is_identifier;
/// assert!(is_identifier("r2"));
/// assert!(!is_identifier("2r"));
/// assert!(!is_identifier("Area"));
/// ```
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    if !chars.next().map_or(false, |c| c.is_ascii_lowercase()) {
        return false;
    }
    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("ln", 0.0 ; "ln of zero")]
    #[test_case("ln", -1.0 ; "ln of negative")]
    #[test_case("sqrt", -4.0 ; "sqrt of negative")]
    #[test_case("asin", 1.5 ; "asin above one")]
    #[test_case("acos", -1.01 ; "acos below minus one")]
    fn out_of_domain(name: &str, a: f64) {
        let result = FUNCTIONS[name].call(a);
        assert!(matches!(result, Err(DomainError::OutOfDomain { .. })));
    }

    #[test]
    fn in_domain() {
        assert_eq!(FUNCTIONS["sqrt"].call(9.0), Ok(3.0));
        assert_eq!(FUNCTIONS["sqrt"].call(0.0), Ok(0.0));
        assert_eq!(FUNCTIONS["abs"].call(-2.5), Ok(2.5));
    }

    #[test]
    fn invalid_result() {
        assert_eq!(
            FUNCTIONS["exp"].call(1000.0),
            Err(DomainError::InvalidResult {
                function: "exp".into(),
                operand: 1000.0
            })
        );
    }

    #[test]
    fn tables_are_disjoint() {
        for name in CONSTANTS.keys() {
            assert!(!FUNCTIONS.contains_key(name));
        }
        assert!(!FUNCTIONS.contains_key(VARIABLE));
        assert!(CONSTANTS.contains_key("tau"));
    }

    #[test]
    fn identifiers() {
        for name in &["r", "area", "y1", "a2b3"] {
            assert!(is_identifier(name));
        }
        for name in &["", "1y", "Y1", "a_b", "a b", "é"] {
            assert!(!is_identifier(name));
        }
    }
}
