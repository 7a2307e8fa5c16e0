//! Modular arithmetic over arbitrary-width unsigned integers.
//!
//! Every function here is pure. The modulus is wrapped in [`Modulus`], which cannot be zero, so
//! only inversion and square roots can fail.

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::ArithmeticError;

/// A non-zero modulus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modulus(BigUint);

impl Modulus {
    /// Wrap a modulus. Fails with `ZeroModulus` if `m` is 0.
    pub fn new(m: BigUint) -> Result<Self, ArithmeticError> {
        if m.is_zero() {
            return Err(ArithmeticError::ZeroModulus);
        }
        Ok(Self(m))
    }

    /// The underlying integer
    pub fn value(&self) -> &BigUint {
        &self.0
    }

    /// Reduce `a` into `[0, m)`
    pub fn reduce(&self, a: &BigUint) -> BigUint {
        a % &self.0
    }

    /// True if `a` is already in `[0, m)`
    pub fn contains(&self, a: &BigUint) -> bool {
        a < &self.0
    }
}

/// `(a + b) mod m`
pub fn add_mod(a: &BigUint, b: &BigUint, m: &Modulus) -> BigUint {
    (a + b) % &m.0
}

/// `(a - b) mod m`
pub fn sub_mod(a: &BigUint, b: &BigUint, m: &Modulus) -> BigUint {
    let a = m.reduce(a);
    let b = m.reduce(b);
    if a >= b {
        a - b
    } else {
        &m.0 - (b - a)
    }
}

/// `-a mod m`
pub fn neg_mod(a: &BigUint, m: &Modulus) -> BigUint {
    sub_mod(&BigUint::zero(), a, m)
}

/// `(a * b) mod m`
pub fn mul_mod(a: &BigUint, b: &BigUint, m: &Modulus) -> BigUint {
    (a * b) % &m.0
}

/// `base ^ exp mod m`
pub fn pow_mod(base: &BigUint, exp: &BigUint, m: &Modulus) -> BigUint {
    base.modpow(exp, &m.0)
}

/// `a ^ -1 mod m`. Fails with `NoInverse` when `a ≡ 0` or `gcd(a, m) != 1`.
pub fn inverse_mod(a: &BigUint, m: &Modulus) -> Result<BigUint, ArithmeticError> {
    let a = m.reduce(a);
    if a.is_zero() {
        return Err(ArithmeticError::NoInverse);
    }
    a.modinv(&m.0).ok_or(ArithmeticError::NoInverse)
}

/// A square root of `a` mod a prime `m ≡ 3 mod 4`. Returns the root `r = a^((m+1)/4)`; the other
/// root is `m - r`.
pub fn sqrt_mod(a: &BigUint, m: &Modulus) -> Result<BigUint, ArithmeticError> {
    let four = BigUint::from(4u8);
    if &m.0 % &four != BigUint::from(3u8) {
        return Err(ArithmeticError::UnsupportedModulus);
    }
    let a = m.reduce(a);
    let exp = (&m.0 + BigUint::one()) / four;
    let root = pow_mod(&a, &exp, m);
    if mul_mod(&root, &root, m) != a {
        return Err(ArithmeticError::NoSquareRoot);
    }
    Ok(root)
}

/// Interpret big-endian bytes as an integer
pub fn from_be_bytes(buf: &[u8]) -> BigUint {
    BigUint::from_bytes_be(buf)
}

/// Serialize an integer below `2^256` as 32 big-endian bytes. Wider integers keep their low
/// 32 bytes.
pub fn to_be_bytes32(a: &BigUint) -> [u8; 32] {
    let bytes = a.to_bytes_be();
    let mut buf = [0u8; 32];
    if bytes.len() > 32 {
        buf.copy_from_slice(&bytes[bytes.len() - 32..]);
    } else {
        buf[32 - bytes.len()..].copy_from_slice(&bytes);
    }
    buf
}
