use std::cmp::Ordering;
use std::fmt;

use bigdecimal::BigDecimal;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};

use crate::error::VesperError;

/// Significant digits kept by inexact division and square roots, matching
/// IEEE decimal64 precision.
const REAL_PRECISION: u64 = 16;

/// A Scheme number: one of the three rungs of the tower.
///
/// Integers and rationals are exact; reals are inexact. Rationals are kept in
/// lowest terms with a positive denominator (`BigRational` maintains both),
/// and a rational whose denominator reduces to 1 is normalized down to an
/// integer so exactness-preserving division still prints naturally.
#[derive(Debug, Clone)]
pub enum Number {
    Integer(BigInt),
    Rational(BigRational),
    Real(BigDecimal),
}

/// A pair of numbers promoted to their most specific common type.
enum Promoted {
    Integers(BigInt, BigInt),
    Rationals(BigRational, BigRational),
    Reals(BigDecimal, BigDecimal),
}

fn promote2(a: &Number, b: &Number) -> Promoted {
    use Number::*;
    match (a, b) {
        (Integer(x), Integer(y)) => Promoted::Integers(x.clone(), y.clone()),
        (Integer(_) | Rational(_), Integer(_) | Rational(_)) => {
            Promoted::Rationals(a.to_rational(), b.to_rational())
        }
        _ => Promoted::Reals(a.to_real(), b.to_real()),
    }
}

/// Wrap a rational result, demoting denominator-1 values to integers.
fn rational(r: BigRational) -> Number {
    if r.is_integer() {
        Number::Integer(r.to_integer())
    } else {
        Number::Rational(r)
    }
}

impl Number {
    pub fn from_i64(n: i64) -> Number {
        Number::Integer(BigInt::from(n))
    }

    pub fn from_usize(n: usize) -> Number {
        Number::Integer(BigInt::from(n))
    }

    pub fn zero() -> Number {
        Number::Integer(BigInt::zero())
    }

    pub fn one() -> Number {
        Number::Integer(BigInt::one())
    }

    /// Parse a numeric literal. Only base 10 is supported; a literal with a
    /// decimal point is an inexact real, an exponent form without a point is
    /// demoted back to an exact integer when its value is integral.
    pub fn parse(text: &str, base: u32) -> Result<Number, VesperError> {
        if base != 10 {
            return Err(VesperError::eval(format!("unsupported base {base}")));
        }

        if !text.contains(['.', 'e', 'E']) {
            return text
                .parse::<BigInt>()
                .map(Number::Integer)
                .map_err(|_| VesperError::eval(format!("invalid number: {text}")));
        }

        // pad bare points so the decimal parser accepts ".5", "1.", "1.e3"
        let mut padded = text.to_string();
        if let Some(dot) = padded.find('.') {
            if !padded[dot + 1..].starts_with(|c: char| c.is_ascii_digit()) {
                padded.insert(dot + 1, '0');
            }
            if dot == 0 || !padded[..dot].ends_with(|c: char| c.is_ascii_digit()) {
                padded.insert(dot, '0');
            }
        }
        let dec = padded
            .parse::<BigDecimal>()
            .map_err(|_| VesperError::eval(format!("invalid number: {text}")))?;
        if !text.contains('.') && dec.is_integer() {
            return Ok(Number::Integer(bigdecimal_to_bigint(&dec)));
        }
        Ok(Number::Real(dec))
    }

    // -- promotion --

    fn to_rational(&self) -> BigRational {
        match self {
            Number::Integer(n) => BigRational::from_integer(n.clone()),
            Number::Rational(r) => r.clone(),
            Number::Real(_) => unreachable!("reals never promote to rationals"),
        }
    }

    pub fn to_real(&self) -> BigDecimal {
        match self {
            Number::Integer(n) => BigDecimal::from(n.clone()),
            Number::Rational(r) => {
                (BigDecimal::from(r.numer().clone()) / BigDecimal::from(r.denom().clone()))
                    .with_prec(REAL_PRECISION)
            }
            Number::Real(d) => d.clone(),
        }
    }

    // -- predicates --

    pub fn is_exact(&self) -> bool {
        !matches!(self, Number::Real(_))
    }

    pub fn is_integer(&self) -> bool {
        match self {
            Number::Integer(_) => true,
            Number::Rational(r) => r.is_integer(),
            Number::Real(d) => d.is_integer(),
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            Number::Integer(n) => n.is_zero(),
            Number::Rational(r) => r.is_zero(),
            Number::Real(d) => d.is_zero(),
        }
    }

    pub fn signum(&self) -> i32 {
        match self {
            Number::Integer(n) => match n.sign() {
                num_bigint::Sign::Minus => -1,
                num_bigint::Sign::NoSign => 0,
                num_bigint::Sign::Plus => 1,
            },
            Number::Rational(r) => {
                if r.is_zero() {
                    0
                } else if r.is_negative() {
                    -1
                } else {
                    1
                }
            }
            Number::Real(d) => {
                if d.is_zero() {
                    0
                } else if d < &BigDecimal::zero() {
                    -1
                } else {
                    1
                }
            }
        }
    }

    // -- conversions --

    /// The exact integer value, or an error when the number isn't one.
    pub fn to_exact_integer(&self) -> Result<BigInt, VesperError> {
        match self {
            Number::Integer(n) => Ok(n.clone()),
            Number::Rational(r) if r.is_integer() => Ok(r.to_integer()),
            Number::Real(d) if d.is_integer() => Ok(bigdecimal_to_bigint(d)),
            _ => Err(VesperError::eval("number can't be converted exactly")),
        }
    }

    pub fn to_i64(&self) -> Result<i64, VesperError> {
        self.to_exact_integer()?
            .to_i64()
            .ok_or_else(|| VesperError::eval("number too large for a machine integer"))
    }

    pub fn to_usize(&self) -> Result<usize, VesperError> {
        self.to_exact_integer()?
            .to_usize()
            .ok_or_else(|| VesperError::eval("expected a non-negative index"))
    }

    // -- arithmetic --

    pub fn add(&self, other: &Number) -> Number {
        match promote2(self, other) {
            Promoted::Integers(x, y) => Number::Integer(x + y),
            Promoted::Rationals(x, y) => rational(x + y),
            Promoted::Reals(x, y) => Number::Real(x + y),
        }
    }

    pub fn subtract(&self, other: &Number) -> Number {
        match promote2(self, other) {
            Promoted::Integers(x, y) => Number::Integer(x - y),
            Promoted::Rationals(x, y) => rational(x - y),
            Promoted::Reals(x, y) => Number::Real(x - y),
        }
    }

    pub fn multiply(&self, other: &Number) -> Number {
        match promote2(self, other) {
            Promoted::Integers(x, y) => Number::Integer(x * y),
            Promoted::Rationals(x, y) => rational(x * y),
            Promoted::Reals(x, y) => Number::Real(x * y),
        }
    }

    /// Division. Integer by integer yields a rational to preserve exactness.
    pub fn divide(&self, other: &Number) -> Result<Number, VesperError> {
        if other.is_zero() {
            return Err(VesperError::eval("division by zero"));
        }
        Ok(match promote2(self, other) {
            Promoted::Integers(x, y) => rational(BigRational::new(x, y)),
            Promoted::Rationals(x, y) => rational(x / y),
            Promoted::Reals(x, y) => Number::Real((x / y).with_prec(REAL_PRECISION)),
        })
    }

    pub fn negate(&self) -> Number {
        match self {
            Number::Integer(n) => Number::Integer(-n),
            Number::Rational(r) => Number::Rational(-r),
            Number::Real(d) => Number::Real(-d),
        }
    }

    pub fn reciprocal(&self) -> Result<Number, VesperError> {
        Number::one().divide(self)
    }

    pub fn abs(&self) -> Number {
        if self.signum() < 0 {
            self.negate()
        } else {
            self.clone()
        }
    }

    pub fn compare(&self, other: &Number) -> Ordering {
        match promote2(self, other) {
            Promoted::Integers(x, y) => x.cmp(&y),
            Promoted::Rationals(x, y) => x.cmp(&y),
            Promoted::Reals(x, y) => x.cmp(&y),
        }
    }

    /// Numeric equality in the promoted domain, regardless of exactness.
    pub fn num_eq(&self, other: &Number) -> bool {
        self.compare(other) == Ordering::Equal
    }

    /// Truncating division, returning quotient and remainder. The remainder
    /// carries the sign of the dividend.
    pub fn divide_to_integral(&self, other: &Number) -> Result<(Number, Number), VesperError> {
        if other.is_zero() {
            return Err(VesperError::eval("division by zero"));
        }
        Ok(match promote2(self, other) {
            Promoted::Integers(x, y) => {
                let q = &x / &y;
                let r = &x - &y * &q;
                (Number::Integer(q), Number::Integer(r))
            }
            Promoted::Rationals(x, y) => {
                let q = (&x / &y).trunc();
                let r = &x - &y * &q;
                (rational(q), rational(r))
            }
            Promoted::Reals(x, y) => {
                let q = (&x / &y).with_scale(0);
                let r = &x - &y * &q;
                (Number::Real(q), Number::Real(r))
            }
        })
    }

    pub fn quotient(&self, other: &Number) -> Result<Number, VesperError> {
        Ok(self.divide_to_integral(other)?.0)
    }

    pub fn remainder(&self, other: &Number) -> Result<Number, VesperError> {
        Ok(self.divide_to_integral(other)?.1)
    }

    /// Like `remainder`, but the result's sign matches the divisor.
    pub fn modulo(&self, other: &Number) -> Result<Number, VesperError> {
        let rem = self.remainder(other)?;
        if other.signum() < 0 {
            if rem.signum() <= 0 {
                Ok(rem)
            } else {
                Ok(rem.add(other))
            }
        } else if rem.signum() >= 0 {
            Ok(rem)
        } else {
            Ok(rem.add(other))
        }
    }

    /// Square root, always inexact. Domain error on negative input.
    pub fn sqrt(&self) -> Result<Number, VesperError> {
        if self.signum() < 0 {
            return Err(VesperError::eval("sqrt of negative number"));
        }
        let approx = self
            .to_real()
            .to_f64()
            .ok_or_else(|| VesperError::eval("sqrt argument out of range"))?;
        BigDecimal::try_from(approx.sqrt())
            .map(|d| Number::Real(d.with_prec(REAL_PRECISION)))
            .map_err(|_| VesperError::eval("sqrt argument out of range"))
    }

    // -- integer-only operations --

    pub fn gcd(&self, other: &Number) -> Result<Number, VesperError> {
        let a = self.to_exact_integer()?;
        let b = other.to_exact_integer()?;
        Ok(Number::Integer(gcd_bigint(a, b)))
    }

    pub fn lcm(&self, other: &Number) -> Result<Number, VesperError> {
        let a = self.to_exact_integer()?;
        let b = other.to_exact_integer()?;
        if a.is_zero() || b.is_zero() {
            return Ok(Number::zero());
        }
        let g = gcd_bigint(a.clone(), b.clone());
        Ok(Number::Integer(((a * b).abs()) / g))
    }

    /// The numerator of the value as a fraction in lowest terms.
    pub fn numerator(&self) -> Result<Number, VesperError> {
        match self {
            Number::Integer(n) => Ok(Number::Integer(n.clone())),
            Number::Rational(r) => Ok(Number::Integer(r.numer().clone())),
            Number::Real(_) => Err(VesperError::eval("numerator requires an exact number")),
        }
    }

    /// The denominator of the value as a fraction in lowest terms. The
    /// denominator of an integer is 1.
    pub fn denominator(&self) -> Result<Number, VesperError> {
        match self {
            Number::Integer(_) => Ok(Number::one()),
            Number::Rational(r) => Ok(Number::Integer(r.denom().clone())),
            Number::Real(_) => Err(VesperError::eval("denominator requires an exact number")),
        }
    }

    pub fn is_even(&self) -> Result<bool, VesperError> {
        Ok((self.to_exact_integer()? % BigInt::from(2)).is_zero())
    }
}

/// Integral part of a decimal known to have no fractional digits.
fn bigdecimal_to_bigint(d: &BigDecimal) -> BigInt {
    let (digits, exp) = d.normalized().into_bigint_and_exponent();
    // the exponent counts decimal places, so an integral value has exp <= 0
    let mut scale = BigInt::one();
    for _ in 0..(-exp).max(0) {
        scale *= 10;
    }
    digits * scale
}

fn gcd_bigint(a: BigInt, b: BigInt) -> BigInt {
    let mut a = a.abs();
    let mut b = b.abs();
    while !b.is_zero() {
        let r = &a % &b;
        a = b;
        b = r;
    }
    a
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Integer(n) => write!(f, "{n}"),
            Number::Rational(r) => write!(f, "{}/{}", r.numer(), r.denom()),
            Number::Real(d) => write!(f, "{d}"),
        }
    }
}
