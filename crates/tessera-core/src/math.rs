use num_bigint::BigUint;

use crate::constants::RATE_PRECISION;
use crate::types::{Amount, Rate};

/// `a * b / d`, rounded down, without intermediate overflow.
///
/// Returns 0 when `d` is 0 and saturates at `u128::MAX` if the quotient
/// itself does not fit.
pub fn mul_div(a: u128, b: u128, d: u128) -> u128 {
    if d == 0 {
        return 0;
    }
    if let Some(p) = a.checked_mul(b) {
        return p / d;
    }
    let q = BigUint::from(a) * BigUint::from(b) / BigUint::from(d);
    u128::try_from(&q).unwrap_or(u128::MAX)
}

/// `amount * rate`, with `rate` scaled by `RATE_PRECISION`.
pub fn apply_rate(amount: Amount, rate: Rate) -> Amount {
    mul_div(amount, rate, RATE_PRECISION)
}

/// `amount * (1 - rate)`.
pub fn apply_complement(amount: Amount, rate: Rate) -> Amount {
    mul_div(amount, RATE_PRECISION.saturating_sub(rate), RATE_PRECISION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::ONE_TOKEN;

    #[test]
    fn mul_div_handles_wide_products() {
        let big = 1_000_000_000 * ONE_TOKEN; // 1e27
        assert_eq!(mul_div(big, big, big), big);
        assert_eq!(mul_div(big, 3 * big, 4 * big), 3 * big / 4);
    }

    #[test]
    fn zero_divisor_yields_zero() {
        assert_eq!(mul_div(5, 5, 0), 0);
    }

    #[test]
    fn rate_helpers() {
        let quarter = RATE_PRECISION / 4;
        assert_eq!(apply_rate(400, quarter), 100);
        assert_eq!(apply_complement(400, quarter), 300);
        assert_eq!(apply_complement(400, RATE_PRECISION), 0);
    }
}
