//! secp256k1 domain parameters.

use num_bigint::BigUint;
use num_traits::Zero;
use once_cell::sync::Lazy;

use crate::math::{add_mod, mul_mod, sqrt_mod, Modulus};

const P_HEX: &[u8] = b"FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFC2F";
const N_HEX: &[u8] = b"FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141";
const GX_HEX: &[u8] = b"79BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798";
const GY_HEX: &[u8] = b"483ADA7726A3C4655DA4FBFC0E1108A8FD17B448A68554199C47D08FFB10D4B8";

/// Domain parameters of a short Weierstrass curve `y^2 = x^3 + ax + b` over `F_p`.
#[derive(Debug, PartialEq, Eq)]
pub struct CurveParameters {
    /// The field prime
    pub p: Modulus,
    /// The `a` coefficient
    pub a: BigUint,
    /// The `b` coefficient
    pub b: BigUint,
    /// Generator x-coordinate
    pub gx: BigUint,
    /// Generator y-coordinate
    pub gy: BigUint,
    /// The order of the generator
    pub n: Modulus,
    /// The cofactor
    pub h: BigUint,
    half_n: BigUint,
}

fn parse_constant(hex: &[u8]) -> BigUint {
    BigUint::parse_bytes(hex, 16).expect("curve constants are valid hex")
}

static SECP256K1: Lazy<CurveParameters> = Lazy::new(|| {
    let n = parse_constant(N_HEX);
    let params = CurveParameters {
        p: Modulus::new(parse_constant(P_HEX)).expect("p is non-zero"),
        a: BigUint::zero(),
        b: BigUint::from(7u8),
        gx: parse_constant(GX_HEX),
        gy: parse_constant(GY_HEX),
        half_n: &n >> 1,
        n: Modulus::new(n).expect("n is non-zero"),
        h: BigUint::from(1u8),
    };
    assert!(
        params.is_on_curve(&params.gx, &params.gy),
        "secp256k1 generator must satisfy the curve equation"
    );
    tracing::trace!("secp256k1 parameters initialized");
    params
});

/// The secp256k1 parameters. Computed and validated on first call; every call returns the same
/// instance.
pub fn get_secp256k1_parameters() -> &'static CurveParameters {
    &SECP256K1
}

impl CurveParameters {
    /// `x^3 + ax + b mod p`
    pub fn curve_rhs(&self, x: &BigUint) -> BigUint {
        let x2 = mul_mod(x, x, &self.p);
        let x3 = mul_mod(&x2, x, &self.p);
        let ax = mul_mod(&self.a, x, &self.p);
        add_mod(&add_mod(&x3, &ax, &self.p), &self.b, &self.p)
    }

    /// True if `(x, y)` are field elements satisfying the curve equation
    pub fn is_on_curve(&self, x: &BigUint, y: &BigUint) -> bool {
        self.p.contains(x) && self.p.contains(y) && mul_mod(y, y, &self.p) == self.curve_rhs(x)
    }

    /// Find the point with x-coordinate `x` and the requested y parity, if one exists
    pub fn lift_x(&self, x: &BigUint, odd: bool) -> Option<(BigUint, BigUint)> {
        if !self.p.contains(x) {
            return None;
        }
        let y = sqrt_mod(&self.curve_rhs(x), &self.p).ok()?;
        let y = if y.bit(0) == odd || y.is_zero() {
            y
        } else {
            self.p.value() - &y
        };
        if y.bit(0) != odd {
            return None;
        }
        Some((x.clone(), y))
    }

    /// `floor(n / 2)`. Signatures with `s` above this are high-S.
    pub fn half_order(&self) -> &BigUint {
        &self.half_n
    }

    /// True if `k` is a valid private key: `0 < k < n`
    pub fn is_valid_private(&self, k: &BigUint) -> bool {
        !k.is_zero() && self.n.contains(k)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_returns_the_same_parameters() {
        let a = get_secp256k1_parameters();
        let b = get_secp256k1_parameters();
        assert!(std::ptr::eq(a, b));
        assert_eq!(a, b);
    }

    #[test]
    fn it_has_the_expected_shape() {
        let params = get_secp256k1_parameters();
        assert_eq!(params.p.value().bits(), 256);
        assert_eq!(params.n.value().bits(), 256);
        assert!(params.n.value() < params.p.value());
        assert!(params.is_on_curve(&params.gx, &params.gy));
        assert_eq!(params.half_order() * 2u8 + 1u8, *params.n.value());
    }

    #[test]
    fn it_lifts_the_generator() {
        let params = get_secp256k1_parameters();
        let odd = params.gy.bit(0);
        let (_, y) = params.lift_x(&params.gx, odd).unwrap();
        assert_eq!(y, params.gy);
        let (_, neg) = params.lift_x(&params.gx, !odd).unwrap();
        assert_eq!(neg, params.p.value() - &params.gy);
    }

    #[test]
    fn it_rejects_x_not_on_the_curve() {
        let params = get_secp256k1_parameters();
        // x = 5 gives 132, a non-residue mod p
        assert!(params.lift_x(&BigUint::from(5u8), false).is_none());
        assert!(params.lift_x(params.p.value(), false).is_none());
        assert!(!params.is_on_curve(&params.gx, &(&params.gy + 1u8)));
    }
}
