//! Exact rational scalars.
//!
//! Coefficient arithmetic for the structure engine must stay exact:
//! exponential rates like -3/2 and polynomial coefficients are compared
//! for equality, and floating point would make those comparisons lie.

use std::cmp::Ordering;
use std::fmt;

use num_traits::{One, Zero};

// Callers pass a nonzero denominator, so the result divides a nonzero
// i64 and the narrowing cast is lossless.
#[allow(clippy::cast_possible_wrap)]
fn gcd(a: i64, b: i64) -> i64 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a as i64
}

fn gcd128(a: i128, b: i128) -> i128 {
    let (mut a, mut b) = (a.abs(), b.abs());
    while b != 0 {
        let t = a % b;
        a = b;
        b = t;
    }
    a
}

/// An exact rational number over i64.
///
/// Invariant: denominator > 0 and gcd(numerator, denominator) == 1.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Q {
    num: i64,
    den: i64,
}

impl Q {
    /// Creates a rational from numerator and denominator.
    ///
    /// # Panics
    ///
    /// Panics if `den` is zero.
    #[must_use]
    pub fn new(num: i64, den: i64) -> Self {
        assert!(den != 0, "rational with zero denominator");
        let sign = if den < 0 { -1 } else { 1 };
        let g = gcd(num, den).max(1);
        Self {
            num: sign * num / g,
            den: (den / g).abs(),
        }
    }

    /// Creates a rational from an integer.
    #[must_use]
    pub fn from_integer(n: i64) -> Self {
        Self { num: n, den: 1 }
    }

    /// The numerator (sign-carrying).
    #[must_use]
    pub fn numer(self) -> i64 {
        self.num
    }

    /// The denominator (always positive).
    #[must_use]
    pub fn denom(self) -> i64 {
        self.den
    }

    /// Returns true if this rational is an integer.
    #[must_use]
    pub fn is_integer(self) -> bool {
        self.den == 1
    }

    /// Absolute value.
    #[must_use]
    pub fn abs(self) -> Self {
        Self {
            num: self.num.abs(),
            den: self.den,
        }
    }

    /// Sign: -1, 0 or 1.
    #[must_use]
    pub fn signum(self) -> i64 {
        self.num.signum()
    }

    /// Builds a reduced rational from wide intermediates, if it fits in
    /// an i64-backed representation.
    fn from_wide(num: i128, den: i128) -> Option<Self> {
        let (num, den) = if den < 0 { (-num, -den) } else { (num, den) };
        let g = gcd128(num, den).max(1);
        Some(Self {
            num: i64::try_from(num / g).ok()?,
            den: i64::try_from(den / g).ok()?,
        })
    }

    /// Overflow-aware addition; `None` when the result leaves i64 range.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        Self::from_wide(
            i128::from(self.num) * i128::from(rhs.den) + i128::from(rhs.num) * i128::from(self.den),
            i128::from(self.den) * i128::from(rhs.den),
        )
    }

    /// Overflow-aware subtraction.
    #[must_use]
    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        Self::from_wide(
            i128::from(self.num) * i128::from(rhs.den) - i128::from(rhs.num) * i128::from(self.den),
            i128::from(self.den) * i128::from(rhs.den),
        )
    }

    /// Overflow-aware multiplication.
    #[must_use]
    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        Self::from_wide(
            i128::from(self.num) * i128::from(rhs.num),
            i128::from(self.den) * i128::from(rhs.den),
        )
    }

    /// Overflow-aware negation (`i64::MIN` numerators cannot flip sign).
    #[must_use]
    pub fn checked_neg(self) -> Option<Self> {
        Some(Self {
            num: self.num.checked_neg()?,
            den: self.den,
        })
    }

    /// Multiplicative inverse, or `None` for zero or an inverse that
    /// leaves i64 range.
    #[must_use]
    pub fn recip(self) -> Option<Self> {
        if self.num == 0 {
            None
        } else {
            Self::from_wide(i128::from(self.den), i128::from(self.num))
        }
    }

    /// Raises to an integer power.
    ///
    /// `None` for negative exponents of zero and for results that leave
    /// i64 range.
    #[must_use]
    pub fn powi(self, exp: i64) -> Option<Self> {
        if exp < 0 {
            return self.recip()?.powi(exp.checked_neg()?);
        }
        if exp == 0 {
            return Some(Self::one());
        }
        // Stationary bases short-circuit; anything else grows, so the
        // overflow check bounds the loop.
        if self.is_zero() || self.is_one() {
            return Some(self);
        }
        if self.num == -1 && self.den == 1 {
            return Some(if exp % 2 == 0 { Self::one() } else { self });
        }
        let mut result = Self::one();
        for _ in 0..exp {
            result = result.checked_mul(self)?;
        }
        Some(result)
    }

    /// Exact square root, if this rational is a perfect square.
    #[must_use]
    pub fn sqrt(self) -> Option<Self> {
        if self.num < 0 {
            return None;
        }
        let sn = isqrt(self.num)?;
        let sd = isqrt(self.den)?;
        Some(Self { num: sn, den: sd })
    }

    /// Conversion to f64 for numeric display and evaluation.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn to_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

fn isqrt(n: i64) -> Option<i64> {
    if n < 0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    let mut r = (n as f64).sqrt() as i64;
    while r * r > n {
        r -= 1;
    }
    while (r + 1) * (r + 1) <= n {
        r += 1;
    }
    if r * r == n {
        Some(r)
    } else {
        None
    }
}

impl std::ops::Add for Q {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.num * rhs.den + rhs.num * self.den, self.den * rhs.den)
    }
}

impl std::ops::Sub for Q {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.num * rhs.den - rhs.num * self.den, self.den * rhs.den)
    }
}

impl std::ops::Mul for Q {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self::new(self.num * rhs.num, self.den * rhs.den)
    }
}

impl std::ops::Neg for Q {
    type Output = Self;

    fn neg(self) -> Self {
        Self {
            num: -self.num,
            den: self.den,
        }
    }
}

impl Zero for Q {
    fn zero() -> Self {
        Self::from_integer(0)
    }

    fn is_zero(&self) -> bool {
        self.num == 0
    }
}

impl One for Q {
    fn one() -> Self {
        Self::from_integer(1)
    }

    fn is_one(&self) -> bool {
        self.num == 1 && self.den == 1
    }
}

impl PartialOrd for Q {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Q {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = i128::from(self.num) * i128::from(other.den);
        let rhs = i128::from(other.num) * i128::from(self.den);
        lhs.cmp(&rhs)
    }
}

impl From<i64> for Q {
    fn from(value: i64) -> Self {
        Self::from_integer(value)
    }
}

impl fmt::Display for Q {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization() {
        assert_eq!(Q::new(2, 4), Q::new(1, 2));
        assert_eq!(Q::new(3, -6), Q::new(-1, 2));
        assert_eq!(Q::new(0, 5), Q::zero());
        assert!(Q::new(7, 1).is_integer());
    }

    #[test]
    fn arithmetic() {
        let a = Q::new(2, 3);
        let b = Q::new(3, 4);
        assert_eq!(a + b, Q::new(17, 12));
        assert_eq!(a * b, Q::new(1, 2));
        assert_eq!(a - b, Q::new(-1, 12));
        assert_eq!(-a, Q::new(-2, 3));
    }

    #[test]
    fn ordering_is_exact() {
        assert!(Q::new(1, 3) < Q::new(1, 2));
        assert!(Q::new(-1, 2) < Q::new(-1, 3));
        assert_eq!(Q::new(2, 6).cmp(&Q::new(1, 3)), Ordering::Equal);
    }

    #[test]
    fn recip_and_pow() {
        assert_eq!(Q::new(-2, 3).recip(), Some(Q::new(-3, 2)));
        assert_eq!(Q::zero().recip(), None);
        assert_eq!(Q::new(2, 3).powi(2), Some(Q::new(4, 9)));
        assert_eq!(Q::new(2, 1).powi(-2), Some(Q::new(1, 4)));
    }

    #[test]
    fn checked_arithmetic_reports_overflow() {
        let max = Q::from_integer(i64::MAX);
        assert_eq!(max.checked_add(Q::one()), None);
        assert_eq!(max.checked_mul(Q::from_integer(2)), None);
        assert_eq!(max.checked_sub(Q::from_integer(-1)), None);
        assert_eq!(Q::from_integer(i64::MIN).checked_neg(), None);

        assert_eq!(
            max.checked_add(Q::from_integer(-1)),
            Some(Q::from_integer(i64::MAX - 1))
        );
        assert_eq!(
            Q::new(1, 3).checked_mul(Q::from_integer(3)),
            Some(Q::one())
        );
    }

    #[test]
    fn powi_degrades_instead_of_overflowing() {
        assert_eq!(Q::from_integer(2).powi(62), Some(Q::from_integer(1 << 62)));
        assert_eq!(Q::from_integer(2).powi(100), None);
        assert_eq!(Q::new(1, 2).powi(100), None);

        // stationary bases must not spin on astronomical exponents
        assert_eq!(Q::one().powi(i64::MAX), Some(Q::one()));
        assert_eq!(Q::zero().powi(i64::MAX), Some(Q::zero()));
        assert_eq!(Q::from_integer(-1).powi(i64::MAX), Some(Q::from_integer(-1)));
        assert_eq!(Q::from_integer(-1).powi(i64::MAX - 1), Some(Q::one()));
    }

    #[test]
    fn exact_sqrt() {
        assert_eq!(Q::new(9, 4).sqrt(), Some(Q::new(3, 2)));
        assert_eq!(Q::new(2, 1).sqrt(), None);
        assert_eq!(Q::new(-4, 1).sqrt(), None);
        assert_eq!(Q::zero().sqrt(), Some(Q::zero()));
    }
}
