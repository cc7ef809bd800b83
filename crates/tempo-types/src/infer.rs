//! Type algebra: interval arithmetic over static ranges and the
//! admissibility predicates used by the checker.
//!
//! All interval operations saturate at the `i64` bounds.

use crate::typed::Ty;

/// Range of `-e` for `e` in `[low, high]`.
pub fn neg_range(low: i64, high: i64) -> (i64, i64) {
    (high.saturating_neg(), low.saturating_neg())
}

/// Range of `e1 + e2`.
pub fn add_range(a: (i64, i64), b: (i64, i64)) -> (i64, i64) {
    (a.0.saturating_add(b.0), a.1.saturating_add(b.1))
}

/// Range of `e1 - e2`.
pub fn sub_range(a: (i64, i64), b: (i64, i64)) -> (i64, i64) {
    (a.0.saturating_sub(b.1), a.1.saturating_sub(b.0))
}

/// Range of `e1 * e2`: extrema over the endpoint products.
pub fn mul_range(a: (i64, i64), b: (i64, i64)) -> (i64, i64) {
    let products = [
        a.0.saturating_mul(b.0),
        a.0.saturating_mul(b.1),
        a.1.saturating_mul(b.0),
        a.1.saturating_mul(b.1),
    ];
    (
        *products.iter().min().unwrap(),
        *products.iter().max().unwrap(),
    )
}

/// Range of `e1 / e2` (truncating division).
///
/// Extrema occur at endpoint divisors and at the smallest-magnitude nonzero
/// divisors the range admits (±1 when contained). A divisor range of exactly
/// `[0,0]` yields the full integer range; the runtime fault is the VM's
/// concern.
pub fn div_range(a: (i64, i64), b: (i64, i64)) -> (i64, i64) {
    let mut divisors = Vec::with_capacity(4);
    for d in [b.0, b.1] {
        if d != 0 {
            divisors.push(d);
        }
    }
    if b.0 <= 1 && 1 <= b.1 {
        divisors.push(1);
    }
    if b.0 <= -1 && -1 <= b.1 {
        divisors.push(-1);
    }
    if divisors.is_empty() {
        return (i64::MIN, i64::MAX);
    }
    let mut lo = i64::MAX;
    let mut hi = i64::MIN;
    for n in [a.0, a.1] {
        for &d in &divisors {
            // i64::MIN / -1 overflows
            let q = if n == i64::MIN && d == -1 {
                i64::MAX
            } else {
                n / d
            };
            lo = lo.min(q);
            hi = hi.max(q);
        }
    }
    (lo, hi)
}

/// Range of `e1 % e2` (remainder takes the dividend's sign).
pub fn mod_range(a: (i64, i64), b: (i64, i64)) -> (i64, i64) {
    let m = b.0.saturating_abs().max(b.1.saturating_abs()).max(1);
    let bound = m.saturating_sub(1);
    let lo = if a.0 < 0 { bound.saturating_neg() } else { 0 };
    let hi = if a.1 > 0 { bound } else { 0 };
    (lo, hi)
}

/// Whether every value of `from` is representable in `into`: violations of
/// this produce the "possible value loss" warning on assignment.
pub fn range_contained(from: (i64, i64), into: (i64, i64)) -> bool {
    into.0 <= from.0 && from.1 <= into.1
}

/// Whether an integer assignment `l = r` is admissible.
pub fn integer_assignable(ltype: Ty, rtype: Ty) -> bool {
    ltype.is_int() && rtype.is_int()
}

/// Whether a clock reset `c = r` is admissible (sign of `r` checked
/// separately).
pub fn clock_assignable(ltype: Ty, rtype: Ty) -> bool {
    matches!(ltype, Ty::Clock) && rtype.is_int()
}
