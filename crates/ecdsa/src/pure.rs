//! A secp256k1 backend built only from the arithmetic in [`crate::math`] and the curve
//! parameters. Slow, portable, and not constant-time.

use num_bigint::BigUint;
use num_traits::{One, Zero};

use crate::{
    math::{add_mod, inverse_mod, mul_mod, neg_mod, sub_mod, to_be_bytes32, from_be_bytes},
    model::{BackendKind, EcBackend, NoncePolicy},
    params::{get_secp256k1_parameters, CurveParameters},
    rfc6979::NonceGenerator,
    types::{check_public_key, Point, RecoverableSignature, RecoveryId, Scalar, Signature},
    ArithmeticError, EcError, EcResult,
};

/// A point in Jacobian coordinates `(X, Y, Z)`, representing affine `(X/Z^2, Y/Z^3)`.
/// `Z = 0` is the point at infinity.
#[derive(Debug, Clone)]
struct Jacobian {
    x: BigUint,
    y: BigUint,
    z: BigUint,
}

impl Jacobian {
    fn infinity() -> Self {
        Self {
            x: BigUint::one(),
            y: BigUint::one(),
            z: BigUint::zero(),
        }
    }

    fn from_affine(x: BigUint, y: BigUint) -> Self {
        Self {
            x,
            y,
            z: BigUint::one(),
        }
    }

    fn is_infinity(&self) -> bool {
        self.z.is_zero()
    }
}

/// A Secp256k1Backend struct using arbitrary-precision integer arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PureAdapter<'a> {
    params: &'a CurveParameters,
    nonce: NoncePolicy,
}

impl Default for PureAdapter<'static> {
    fn default() -> Self {
        Self::init()
    }
}

impl PureAdapter<'static> {
    /// Instantiate a backend over the process-wide secp256k1 parameters
    pub fn init() -> Self {
        Self::new(get_secp256k1_parameters())
    }
}

impl<'a> PureAdapter<'a> {
    /// Instantiate a backend from a parameter set
    pub fn new(params: &'a CurveParameters) -> Self {
        Self {
            params,
            nonce: NoncePolicy::default(),
        }
    }

    /// Set the signing nonce policy
    pub fn with_nonce_policy(mut self, nonce: NoncePolicy) -> Self {
        self.nonce = nonce;
        self
    }

    /// The curve parameters this backend operates over
    pub fn params(&self) -> &'a CurveParameters {
        self.params
    }

    /// The signing nonce policy
    pub fn nonce_policy(&self) -> NoncePolicy {
        self.nonce
    }

    fn double(&self, pt: &Jacobian) -> Jacobian {
        let p = &self.params.p;
        if pt.is_infinity() || pt.y.is_zero() {
            return Jacobian::infinity();
        }
        // dbl-2009-l, valid for a = 0
        let a = mul_mod(&pt.x, &pt.x, p);
        let b = mul_mod(&pt.y, &pt.y, p);
        let c = mul_mod(&b, &b, p);
        let xb = add_mod(&pt.x, &b, p);
        let d = sub_mod(&sub_mod(&mul_mod(&xb, &xb, p), &a, p), &c, p);
        let d = add_mod(&d, &d, p);
        let e = add_mod(&add_mod(&a, &a, p), &a, p);
        let f = mul_mod(&e, &e, p);
        let x3 = sub_mod(&f, &add_mod(&d, &d, p), p);
        let c8 = mul_mod(&c, &BigUint::from(8u8), p);
        let y3 = sub_mod(&mul_mod(&e, &sub_mod(&d, &x3, p), p), &c8, p);
        let yz = mul_mod(&pt.y, &pt.z, p);
        let z3 = add_mod(&yz, &yz, p);
        Jacobian {
            x: x3,
            y: y3,
            z: z3,
        }
    }

    fn add(&self, a: &Jacobian, b: &Jacobian) -> Jacobian {
        let p = &self.params.p;
        if a.is_infinity() {
            return b.clone();
        }
        if b.is_infinity() {
            return a.clone();
        }
        let z1z1 = mul_mod(&a.z, &a.z, p);
        let z2z2 = mul_mod(&b.z, &b.z, p);
        let u1 = mul_mod(&a.x, &z2z2, p);
        let u2 = mul_mod(&b.x, &z1z1, p);
        let s1 = mul_mod(&mul_mod(&a.y, &b.z, p), &z2z2, p);
        let s2 = mul_mod(&mul_mod(&b.y, &a.z, p), &z1z1, p);
        if u1 == u2 {
            if s1 == s2 {
                return self.double(a);
            }
            return Jacobian::infinity();
        }
        let h = sub_mod(&u2, &u1, p);
        let r = sub_mod(&s2, &s1, p);
        let h2 = mul_mod(&h, &h, p);
        let h3 = mul_mod(&h, &h2, p);
        let u1h2 = mul_mod(&u1, &h2, p);
        let x3 = sub_mod(
            &sub_mod(&mul_mod(&r, &r, p), &h3, p),
            &add_mod(&u1h2, &u1h2, p),
            p,
        );
        let y3 = sub_mod(
            &mul_mod(&r, &sub_mod(&u1h2, &x3, p), p),
            &mul_mod(&s1, &h3, p),
            p,
        );
        let z3 = mul_mod(&mul_mod(&h, &a.z, p), &b.z, p);
        Jacobian {
            x: x3,
            y: y3,
            z: z3,
        }
    }

    // Double-and-add, most significant bit first. Branches on the bits of `k`.
    fn mul(&self, pt: &Jacobian, k: &BigUint) -> Jacobian {
        let mut acc = Jacobian::infinity();
        for i in (0..k.bits()).rev() {
            acc = self.double(&acc);
            if k.bit(i) {
                acc = self.add(&acc, pt);
            }
        }
        acc
    }

    fn mul_generator(&self, k: &BigUint) -> Jacobian {
        let g = Jacobian::from_affine(self.params.gx.clone(), self.params.gy.clone());
        self.mul(&g, k)
    }

    fn to_affine(&self, pt: &Jacobian) -> Option<(BigUint, BigUint)> {
        if pt.is_infinity() {
            return None;
        }
        let p = &self.params.p;
        let zinv = inverse_mod(&pt.z, p).ok()?;
        let zinv2 = mul_mod(&zinv, &zinv, p);
        let zinv3 = mul_mod(&zinv2, &zinv, p);
        Some((mul_mod(&pt.x, &zinv2, p), mul_mod(&pt.y, &zinv3, p)))
    }

    fn to_point(&self, pt: &Jacobian) -> Point {
        match self.to_affine(pt) {
            Some((x, y)) => Point::from_biguints(&x, &y),
            None => Point::infinity(),
        }
    }

    fn from_point(&self, pt: &Point) -> Jacobian {
        match pt.to_biguints() {
            Some((x, y)) => Jacobian::from_affine(x, y),
            None => Jacobian::infinity(),
        }
    }

    fn private_key(&self, k: &Scalar) -> EcResult<BigUint> {
        let d = k.to_biguint();
        if !self.params.is_valid_private(&d) {
            return Err(EcError::InvalidPrivateKey);
        }
        Ok(d)
    }

    fn reduced_scalar(&self, k: &Scalar) -> EcResult<BigUint> {
        let t = k.to_biguint();
        if !self.params.n.contains(&t) {
            return Err(ArithmeticError::OutOfRange.into());
        }
        Ok(t)
    }

    fn digest_scalar(&self, digest: &[u8; 32]) -> BigUint {
        self.params.n.reduce(&from_be_bytes(digest))
    }

    fn sign_with_extra(
        &self,
        digest: &[u8; 32],
        k: &Scalar,
        extra: Option<&[u8; 32]>,
    ) -> EcResult<RecoverableSignature> {
        let n = &self.params.n;
        let d = self.private_key(k)?;
        let z = self.digest_scalar(digest);
        let mut nonces = NonceGenerator::new(&k.to_bytes(), &to_be_bytes32(&z), extra);

        loop {
            let nonce = from_be_bytes(&nonces.next_candidate());
            if !self.params.is_valid_private(&nonce) {
                continue;
            }
            let (rx, ry) = match self.to_affine(&self.mul_generator(&nonce)) {
                Some(point) => point,
                None => continue,
            };
            let r = n.reduce(&rx);
            if r.is_zero() {
                continue;
            }
            let nonce_inv = inverse_mod(&nonce, n)?;
            let s = mul_mod(&nonce_inv, &add_mod(&z, &mul_mod(&r, &d, n), n), n);
            if s.is_zero() {
                continue;
            }

            let mut y_odd = ry.bit(0);
            let x_reduced = rx != r;
            let s = if &s > self.params.half_order() {
                y_odd = !y_odd;
                n.value() - s
            } else {
                s
            };

            return Ok(RecoverableSignature {
                recovery_id: RecoveryId::from_parts(y_odd, x_reduced),
                sig: Signature::new(to_be_bytes32(&r), to_be_bytes32(&s)),
            });
        }
    }

    fn sign_inner(&self, digest: &[u8; 32], k: &Scalar) -> EcResult<RecoverableSignature> {
        match self.nonce {
            NoncePolicy::Deterministic => self.sign_with_extra(digest, k, None),
            NoncePolicy::Randomized => {
                let extra: [u8; 32] = rand::random();
                self.sign_with_extra(digest, k, Some(&extra))
            }
        }
    }

    /// Sign with caller-supplied extra nonce data, as in RFC 6979 section 3.6
    pub fn sign_with_noncedata(
        &self,
        digest: &[u8; 32],
        k: &Scalar,
        noncedata: &[u8; 32],
    ) -> EcResult<Signature> {
        Ok(self.sign_with_extra(digest, k, Some(noncedata))?.sig)
    }
}

impl EcBackend for PureAdapter<'_> {
    fn kind(&self) -> BackendKind {
        BackendKind::Pure
    }

    fn derive_public_key(&self, k: &Scalar) -> EcResult<Point> {
        let d = self.private_key(k)?;
        Ok(self.to_point(&self.mul_generator(&d)))
    }

    fn add_points(&self, a: &Point, b: &Point) -> EcResult<Point> {
        let sum = self.add(&self.from_point(a), &self.from_point(b));
        Ok(self.to_point(&sum))
    }

    fn mul_point(&self, p: &Point, k: &Scalar) -> EcResult<Point> {
        let t = self.reduced_scalar(k)?;
        Ok(self.to_point(&self.mul(&self.from_point(p), &t)))
    }

    fn tweak_private_key(&self, k: &Scalar, tweak: &Scalar) -> EcResult<Scalar> {
        let d = self.private_key(k)?;
        let t = self.reduced_scalar(tweak)?;
        let sum = add_mod(&d, &t, &self.params.n);
        if sum.is_zero() {
            return Err(EcError::InvalidPrivateKey);
        }
        Ok(Scalar::from_biguint(&sum))
    }

    fn tweak_public_key(&self, p: &Point, tweak: &Scalar) -> EcResult<Point> {
        let (x, y) = check_public_key(self.params, p)?;
        let t = self.reduced_scalar(tweak)?;
        let sum = self.add(&Jacobian::from_affine(x, y), &self.mul_generator(&t));
        if sum.is_infinity() {
            return Err(EcError::InvalidPublicKey);
        }
        Ok(self.to_point(&sum))
    }

    fn sign(&self, digest: &[u8; 32], k: &Scalar) -> EcResult<Signature> {
        Ok(self.sign_inner(digest, k)?.sig)
    }

    fn sign_recoverable(&self, digest: &[u8; 32], k: &Scalar) -> EcResult<RecoverableSignature> {
        self.sign_inner(digest, k)
    }

    fn verify(&self, digest: &[u8; 32], sig: &Signature, p: &Point) -> bool {
        if !sig.is_in_range() {
            return false;
        }
        let (qx, qy) = match p.to_biguints() {
            Some(q) => q,
            None => return false,
        };
        let n = &self.params.n;
        let r = from_be_bytes(&sig.r());
        let s = from_be_bytes(&sig.s());
        let w = match inverse_mod(&s, n) {
            Ok(w) => w,
            Err(_) => return false,
        };
        let u1 = mul_mod(&self.digest_scalar(digest), &w, n);
        let u2 = mul_mod(&r, &w, n);
        let sum = self.add(
            &self.mul_generator(&u1),
            &self.mul(&Jacobian::from_affine(qx, qy), &u2),
        );
        match self.to_affine(&sum) {
            Some((x, _)) => n.reduce(&x) == r,
            None => false,
        }
    }

    fn recover_public_key(
        &self,
        digest: &[u8; 32],
        sig: &Signature,
        recovery_id: RecoveryId,
    ) -> EcResult<Point> {
        if !sig.is_in_range() {
            return Err(EcError::Recovery);
        }
        let n = &self.params.n;
        let r = from_be_bytes(&sig.r());
        let s = from_be_bytes(&sig.s());

        let x = if recovery_id.is_x_reduced() {
            &r + n.value()
        } else {
            r.clone()
        };
        let (rx, ry) = self
            .params
            .lift_x(&x, recovery_id.is_y_odd())
            .ok_or(EcError::Recovery)?;

        let r_inv = inverse_mod(&r, n)?;
        let u1 = mul_mod(&neg_mod(&self.digest_scalar(digest), n), &r_inv, n);
        let u2 = mul_mod(&s, &r_inv, n);
        let q = self.add(
            &self.mul_generator(&u1),
            &self.mul(&Jacobian::from_affine(rx, ry), &u2),
        );
        if q.is_infinity() {
            return Err(EcError::Recovery);
        }
        Ok(self.to_point(&q))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn backend() -> PureAdapter<'static> {
        PureAdapter::init()
    }

    #[test]
    fn it_derives_known_public_keys() {
        let b = backend();
        assert_eq!(b.derive_public_key(&Scalar::from_u64(1)).unwrap(), Point::generator());
        // 2G
        assert_eq!(
            hex::encode(b.derive_public_key(&Scalar::from_u64(2)).unwrap().pubkey_array().unwrap()),
            "02c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5"
        );
        // 3G
        assert_eq!(
            hex::encode(b.derive_public_key(&Scalar::from_u64(3)).unwrap().pubkey_array().unwrap()),
            "02f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9"
        );
    }

    #[test]
    fn it_rejects_invalid_private_keys() {
        let b = backend();
        let n = Scalar::from_biguint(b.params().n.value());
        assert_eq!(b.derive_public_key(&Scalar::default()), Err(EcError::InvalidPrivateKey));
        assert_eq!(b.derive_public_key(&n), Err(EcError::InvalidPrivateKey));
        assert_eq!(b.sign(&[1u8; 32], &n), Err(EcError::InvalidPrivateKey));
    }

    #[test]
    fn it_adds_and_doubles() {
        let b = backend();
        let g = Point::generator();
        let two_g = b.add_points(&g, &g).unwrap();
        assert_eq!(two_g, b.derive_public_key(&Scalar::from_u64(2)).unwrap());
        let three_g = b.add_points(&two_g, &g).unwrap();
        assert_eq!(three_g, b.mul_point(&g, &Scalar::from_u64(3)).unwrap());
        assert_eq!(b.add_points(&g, &Point::infinity()).unwrap(), g);
    }

    #[test]
    fn it_reaches_infinity() {
        let b = backend();
        let g = Point::generator();
        let n_minus_1 = Scalar::from_biguint(&(b.params().n.value() - 1u8));
        let neg_g = b.mul_point(&g, &n_minus_1).unwrap();
        assert_eq!(neg_g.x(), g.x());
        assert_ne!(neg_g.y(), g.y());
        assert!(b.add_points(&g, &neg_g).unwrap().is_infinity());
        assert!(b.mul_point(&g, &Scalar::default()).unwrap().is_infinity());
        assert!(b.mul_point(&Point::infinity(), &Scalar::from_u64(5)).unwrap().is_infinity());
        assert_eq!(
            b.mul_point(&g, &Scalar::from_biguint(b.params().n.value())),
            Err(EcError::Arithmetic(ArithmeticError::OutOfRange))
        );
    }

    #[test]
    fn it_signs_and_verifies() {
        let b = backend();
        let k = Scalar::from_u64(0xdead_beef);
        let q = b.derive_public_key(&k).unwrap();
        let digest = [7u8; 32];
        let sig = b.sign(&digest, &k).unwrap();
        assert!(sig.is_in_range());
        assert!(sig.is_low_s());
        assert!(b.verify(&digest, &sig, &q));
        assert!(!b.verify(&[8u8; 32], &sig, &q));
        assert!(!b.verify(&digest, &sig, &Point::generator()));
        assert!(!b.verify(&digest, &sig, &Point::infinity()));
        assert_eq!(sig, b.sign(&digest, &k).unwrap());
    }

    #[test]
    fn it_accepts_high_s() {
        let b = backend();
        let k = Scalar::from_u64(42);
        let q = b.derive_public_key(&k).unwrap();
        let digest = [9u8; 32];
        let sig = b.sign(&digest, &k).unwrap();
        let n = b.params().n.value();
        let high = Signature::new(sig.r(), to_be_bytes32(&(n - from_be_bytes(&sig.s()))));
        assert!(!high.is_low_s());
        assert!(b.verify(&digest, &high, &q));
    }

    #[test]
    fn it_rejects_out_of_range_signatures() {
        let b = backend();
        let q = Point::generator();
        let n = to_be_bytes32(b.params().n.value());
        let digest = [1u8; 32];
        assert!(!b.verify(&digest, &Signature::new([0u8; 32], [1u8; 32]), &q));
        assert!(!b.verify(&digest, &Signature::new([1u8; 32], [0u8; 32]), &q));
        assert!(!b.verify(&digest, &Signature::new(n, [1u8; 32]), &q));
        assert!(!b.verify(&digest, &Signature::new([1u8; 32], n), &q));
    }

    #[test]
    fn it_recovers_public_keys() {
        let b = backend();
        let k = Scalar::from_u64(0x1234_5678);
        let q = b.derive_public_key(&k).unwrap();
        let digest = [3u8; 32];
        let rsig = b.sign_recoverable(&digest, &k).unwrap();
        assert_eq!(rsig.sig, b.sign(&digest, &k).unwrap());
        assert_eq!(b.recover(&digest, &rsig).unwrap(), q);

        let flipped = RecoveryId::new(rsig.recovery_id.to_u8() ^ 1).unwrap();
        let other = b.recover_public_key(&digest, &rsig.sig, flipped).unwrap();
        assert_ne!(other, q);
        assert!(b.verify(&digest, &rsig.sig, &other));
    }

    #[test]
    fn it_fails_recovery_without_a_point() {
        let b = backend();
        // x = 5 is not on the curve
        let sig = Signature::new(Scalar::from_u64(5).to_bytes(), Scalar::from_u64(1).to_bytes());
        assert_eq!(
            b.recover_public_key(&[1u8; 32], &sig, RecoveryId::new(0).unwrap()),
            Err(EcError::Recovery)
        );
        // r + n overflows p
        let sig = Signature::new(Scalar::from_u64(1).to_bytes(), Scalar::from_u64(1).to_bytes());
        let big_r = Signature::new(
            to_be_bytes32(&(b.params().n.value() - 1u8)),
            Scalar::from_u64(1).to_bytes(),
        );
        assert_eq!(
            b.recover_public_key(&[1u8; 32], &big_r, RecoveryId::new(2).unwrap()),
            Err(EcError::Recovery)
        );
        assert_eq!(
            b.recover_public_key(&[1u8; 32], &Signature::new([0u8; 32], sig.s()), RecoveryId::new(0).unwrap()),
            Err(EcError::Recovery)
        );
    }

    #[test]
    fn it_tweaks_keys_consistently() {
        let b = backend();
        let k = Scalar::from_u64(11);
        let tweak = Scalar::from_u64(31);
        let tweaked = b.tweak_private_key(&k, &tweak).unwrap();
        assert_eq!(tweaked, Scalar::from_u64(42));
        let q = b.derive_public_key(&k).unwrap();
        assert_eq!(
            b.tweak_public_key(&q, &tweak).unwrap(),
            b.derive_public_key(&tweaked).unwrap()
        );

        let neg_k = Scalar::from_biguint(&(b.params().n.value() - 11u8));
        assert_eq!(b.tweak_private_key(&k, &neg_k), Err(EcError::InvalidPrivateKey));
        assert_eq!(b.tweak_public_key(&q, &neg_k), Err(EcError::InvalidPublicKey));
        assert_eq!(
            b.tweak_public_key(&Point::infinity(), &tweak),
            Err(EcError::InvalidPublicKey)
        );
    }

    #[test]
    fn it_randomizes_nonces_when_asked() {
        let b = backend().with_nonce_policy(NoncePolicy::Randomized);
        let k = Scalar::from_u64(5);
        let q = b.derive_public_key(&k).unwrap();
        let digest = [4u8; 32];
        let first = b.sign(&digest, &k).unwrap();
        let second = b.sign(&digest, &k).unwrap();
        assert_ne!(first, second);
        assert!(b.verify(&digest, &first, &q));
        assert!(b.verify(&digest, &second, &q));

        let with_data = b.sign_with_noncedata(&digest, &k, &[1u8; 32]).unwrap();
        assert_eq!(with_data, b.sign_with_noncedata(&digest, &k, &[1u8; 32]).unwrap());
        assert_ne!(with_data, backend().sign(&digest, &k).unwrap());
    }
}
