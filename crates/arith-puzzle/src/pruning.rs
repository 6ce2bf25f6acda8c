//! Numeric legality rules for the search.
//!
//! Every candidate result goes through these checks before it becomes a
//! step, so anything rejected here can never appear in a solution path.
//! The replayer and the formula checker reuse the same tolerance.

use crate::puzzle::Operator;

/// Results with a larger magnitude are discarded
pub const MAGNITUDE_LIMIT: f64 = 50_000.0;

/// Non-zero results smaller than this are treated as precision noise
pub const PRECISION_FLOOR: f64 = 1e-6;

/// Tolerance for matching a value against the target
pub const TARGET_TOLERANCE: f64 = 1e-5;

/// Power operands must lie in these inclusive windows
pub const MAX_POWER_EXPONENT: f64 = 3.0;
pub const MAX_POWER_BASE: f64 = 100.0;

pub fn is_integer(value: f64) -> bool {
    value.is_finite() && value.fract() == 0.0
}

pub fn matches_target(value: f64, target: f64) -> bool {
    (value - target).abs() < TARGET_TOLERANCE
}

/// Magnitude guard: exact zero passes, near-zero noise does not
pub fn within_magnitude(value: f64) -> bool {
    if !value.is_finite() {
        return false;
    }
    let magnitude = value.abs();
    if magnitude > MAGNITUDE_LIMIT {
        return false;
    }
    !(magnitude < PRECISION_FLOOR && value != 0.0)
}

/// Check the power operand windows: integer exponent in [0, 3], integer base in [0, 100]
pub fn power_operands_allowed(base: f64, exponent: f64) -> bool {
    is_integer(exponent)
        && (0.0..=MAX_POWER_EXPONENT).contains(&exponent)
        && is_integer(base)
        && (0.0..=MAX_POWER_BASE).contains(&base)
}

/// Apply a binary operator, or `None` when the candidate is illegal.
///
/// `Sqrt` is never a binary candidate.
pub fn apply_binary(op: Operator, left: f64, right: f64, allow_decimals: bool) -> Option<f64> {
    let result = match op {
        Operator::Add => left + right,
        Operator::Sub => left - right,
        Operator::Mul => left * right,
        Operator::Div => {
            if right == 0.0 {
                return None;
            }
            let quotient = left / right;
            if !allow_decimals && !is_integer(quotient) {
                return None;
            }
            quotient
        }
        Operator::Pow => {
            if !power_operands_allowed(left, right) {
                return None;
            }
            left.powi(right as i32)
        }
        Operator::Sqrt => return None,
    };

    within_magnitude(result).then_some(result)
}

/// Apply square root to a single operand, or `None` when illegal
pub fn apply_sqrt(operand: f64, allow_decimals: bool) -> Option<f64> {
    if operand < 0.0 {
        return None;
    }
    let result = operand.sqrt();
    if !allow_decimals && !is_integer(result) {
        return None;
    }
    within_magnitude(result).then_some(result)
}
