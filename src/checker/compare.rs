//! Token comparison helpers for checkers

/// Compare floating values with tolerance `epsilon`.
///
/// Uses absolute error when `|expected| < 1` and relative error otherwise.
/// Non-finite values never compare equal.
pub fn compare_epsilon(expected: f64, actual: f64, epsilon: f64) -> bool {
    if !expected.is_finite() || !actual.is_finite() {
        return false;
    }
    let absolute_error = (expected - actual).abs();
    if expected.abs() < 1.0 {
        absolute_error <= epsilon
    } else {
        absolute_error / expected.abs() <= epsilon
    }
}

/// ASCII case-insensitive string equality
pub fn compare_strings_ignore_case(lhs: &str, rhs: &str) -> bool {
    lhs.eq_ignore_ascii_case(rhs)
}

/// Whether a token looks like a plain decimal: `[-]digits[.digits]`
pub fn is_float_token(token: &str) -> bool {
    let body = token.strip_prefix('-').unwrap_or(token);
    if body.is_empty() || body.starts_with('.') || body.ends_with('.') {
        return false;
    }
    let mut dots = 0;
    for c in body.chars() {
        match c {
            '0'..='9' => {}
            '.' => dots += 1,
            _ => return false,
        }
    }
    dots <= 1
}
