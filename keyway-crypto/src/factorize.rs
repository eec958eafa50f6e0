//! Pollard-rho factorization of the server's `pq`.

use std::fmt;

use num_bigint::BigUint;
use num_traits::{One, Zero};

/// The rho walk met `n` itself, so no proper divisor was found.
#[derive(Clone, Debug, PartialEq)]
pub struct FactorizeError {
    pub n: BigUint,
}

impl fmt::Display for FactorizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pollard rho degenerated on {}", self.n)
    }
}

impl std::error::Error for FactorizeError {}

fn gcd(mut a: BigUint, mut b: BigUint) -> BigUint {
    while !b.is_zero() {
        let t = &a % &b;
        a = b;
        b = t;
    }
    a
}

/// Split `n` into `(p, q)` with `p < q` and `p * q == n`.
///
/// Walks `f(v) = v² + 1 mod n` from `x = y = 2`, advancing `y` twice per
/// step, until `gcd(|x − y|, n) ≠ 1`.
pub fn factorize(n: &BigUint) -> Result<(BigUint, BigUint), FactorizeError> {
    let degenerate = || FactorizeError { n: n.clone() };
    if n <= &BigUint::one() {
        return Err(degenerate());
    }

    let step = |v: &BigUint| (v * v + 1u32) % n;
    let mut x = BigUint::from(2u32);
    let mut y = x.clone();
    let mut d = BigUint::one();

    while d.is_one() {
        x = step(&x);
        y = step(&step(&y));
        let diff = if x > y { &x - &y } else { &y - &x };
        d = gcd(diff, n.clone());
    }

    if &d == n || d.is_zero() {
        return Err(degenerate());
    }

    let other = n / &d;
    Ok(if d < other { (d, other) } else { (other, d) })
}
