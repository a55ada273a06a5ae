/// Limits bounding compilation and evaluation
///
/// Evaluation of user functions is recursive, and row edits can make two
/// definitions call each other, so the nesting of calls is capped. Each
/// derivative evaluates its operand five times, so the nesting of derivatives
/// has its own, much smaller, cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of nested user function calls during one evaluation
    pub max_call_depth: usize,

    /// Maximum number of nested derivatives during one evaluation, counting
    /// the derivatives reached through user function calls
    pub max_derivative_depth: usize,

    /// Maximum nesting of function applications (built-in, user or `d/dx`)
    /// in a compiled expression
    pub max_expression_depth: usize,

    /// Maximum number of tokens in an expression
    pub max_expression_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_call_depth: 32,
            max_derivative_depth: 4,
            max_expression_depth: 256,
            max_expression_length: 1024,
        }
    }
}

impl Limits {
    /// Create a new Limits with default values
    pub fn new() -> Self {
        Self::default()
    }
}
