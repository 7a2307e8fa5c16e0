//! Backend-independent value types. A `Point` or `Signature` produced by one backend can be
//! consumed by the other.

use num_bigint::BigUint;

use crate::{
    math::{from_be_bytes, to_be_bytes32},
    params::{get_secp256k1_parameters, CurveParameters},
    EcError, EcResult,
};

/// A 32-byte big-endian integer, used as a private key, nonce, or tweak. Backends reject scalars
/// that are not reduced modulo the group order.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
pub struct Scalar([u8; 32]);

impl std::fmt::Debug for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Scalar(..)")
    }
}

impl From<[u8; 32]> for Scalar {
    fn from(buf: [u8; 32]) -> Self {
        Self(buf)
    }
}

impl Scalar {
    /// Wrap 32 big-endian bytes. No range check is performed.
    pub const fn from_bytes(buf: [u8; 32]) -> Self {
        Self(buf)
    }

    /// A small scalar
    pub fn from_u64(v: u64) -> Self {
        let mut buf = [0u8; 32];
        buf[24..].copy_from_slice(&v.to_be_bytes());
        Self(buf)
    }

    /// Parse 64 hex characters
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        Ok(Self(hex::decode_to_array(s)?))
    }

    /// Format as 64 hex characters
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Reduce 32 bytes modulo the group order
    pub fn reduce(buf: [u8; 32]) -> Self {
        let n = &get_secp256k1_parameters().n;
        Self(to_be_bytes32(&n.reduce(&from_be_bytes(&buf))))
    }

    /// The big-endian bytes
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// True if all bytes are 0
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// True if `0 < k < n`
    pub fn is_valid_private_key(&self) -> bool {
        get_secp256k1_parameters().is_valid_private(&self.to_biguint())
    }

    /// True if `k < n`
    pub fn is_reduced(&self) -> bool {
        get_secp256k1_parameters().n.contains(&self.to_biguint())
    }

    pub(crate) fn to_biguint(&self) -> BigUint {
        from_be_bytes(&self.0)
    }

    pub(crate) fn from_biguint(k: &BigUint) -> Self {
        Self(to_be_bytes32(k))
    }
}

/// A point on secp256k1, or the point at infinity. Every non-infinity `Point` satisfies the curve
/// equation; there is no way to construct one that doesn't.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Point(Option<([u8; 32], [u8; 32])>);

impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            None => f.write_str("Point(infinity)"),
            Some((x, y)) => f
                .debug_struct("Point")
                .field("x", &hex::encode(x))
                .field("y", &hex::encode(y))
                .finish(),
        }
    }
}

impl Point {
    /// The point at infinity
    pub const fn infinity() -> Self {
        Self(None)
    }

    /// The secp256k1 generator
    pub fn generator() -> Self {
        let params = get_secp256k1_parameters();
        Self::from_biguints(&params.gx, &params.gy)
    }

    /// True if this is the point at infinity
    pub fn is_infinity(&self) -> bool {
        self.0.is_none()
    }

    /// Instantiate from affine coordinates. Fails with `InvalidPublicKey` if `(x, y)` is not on the
    /// curve.
    pub fn from_affine(x: [u8; 32], y: [u8; 32]) -> EcResult<Self> {
        let params = get_secp256k1_parameters();
        if !params.is_on_curve(&from_be_bytes(&x), &from_be_bytes(&y)) {
            return Err(EcError::InvalidPublicKey);
        }
        Ok(Self(Some((x, y))))
    }

    /// The affine x-coordinate, if not infinity
    pub fn x(&self) -> Option<[u8; 32]> {
        self.0.map(|(x, _)| x)
    }

    /// The affine y-coordinate, if not infinity
    pub fn y(&self) -> Option<[u8; 32]> {
        self.0.map(|(_, y)| y)
    }

    /// Serialize the pubkey in SEC1 compressed form. Fails for the point at infinity.
    pub fn pubkey_array(&self) -> EcResult<[u8; 33]> {
        let (x, y) = self.0.ok_or(EcError::InvalidPublicKey)?;
        let mut buf = [0u8; 33];
        buf[0] = 2 | (y[31] & 1);
        buf[1..].copy_from_slice(&x);
        Ok(buf)
    }

    /// Serialize the pubkey in SEC1 uncompressed form. Fails for the point at infinity.
    pub fn pubkey_array_uncompressed(&self) -> EcResult<[u8; 65]> {
        let (x, y) = self.0.ok_or(EcError::InvalidPublicKey)?;
        let mut buf = [4u8; 65];
        buf[1..33].copy_from_slice(&x);
        buf[33..].copy_from_slice(&y);
        Ok(buf)
    }

    /// Serialize the raw pubkey (useful for Ethereum)
    pub fn pubkey_array_raw(&self) -> EcResult<[u8; 64]> {
        let mut buf: [u8; 64] = [0u8; 64];
        buf.copy_from_slice(&self.pubkey_array_uncompressed()?[1..]);
        Ok(buf)
    }

    /// Instantiate from a 33-byte compressed pubkey
    pub fn from_pubkey_array(buf: [u8; 33]) -> EcResult<Self> {
        let odd = match buf[0] {
            2 => false,
            3 => true,
            _ => return Err(EcError::InvalidPublicKey),
        };
        let params = get_secp256k1_parameters();
        let (x, y) = params
            .lift_x(&from_be_bytes(&buf[1..]), odd)
            .ok_or(EcError::InvalidPublicKey)?;
        Ok(Self::from_biguints(&x, &y))
    }

    /// Instantiate from a 65-byte uncompressed pubkey
    pub fn from_pubkey_array_uncompressed(buf: [u8; 65]) -> EcResult<Self> {
        if buf[0] != 4 {
            return Err(EcError::InvalidPublicKey);
        }
        let mut x = [0u8; 32];
        let mut y = [0u8; 32];
        x.copy_from_slice(&buf[1..33]);
        y.copy_from_slice(&buf[33..]);
        Self::from_affine(x, y)
    }

    /// Instantiate from a 64-byte raw pubkey
    pub fn from_pubkey_array_raw(buf: [u8; 64]) -> EcResult<Self> {
        let mut raw = [4u8; 65];
        raw[1..].copy_from_slice(&buf);
        Self::from_pubkey_array_uncompressed(raw)
    }

    /// Instantiate from a SEC1 encoding of either length
    pub fn from_sec1(buf: &[u8]) -> EcResult<Self> {
        match buf.len() {
            33 => {
                let mut arr = [0u8; 33];
                arr.copy_from_slice(buf);
                Self::from_pubkey_array(arr)
            }
            65 => {
                let mut arr = [0u8; 65];
                arr.copy_from_slice(buf);
                Self::from_pubkey_array_uncompressed(arr)
            }
            _ => Err(EcError::InvalidPublicKey),
        }
    }

    /// Parse a hex SEC1 encoding
    pub fn from_hex(s: &str) -> EcResult<Self> {
        let buf = hex::decode(s).map_err(|_| EcError::InvalidPublicKey)?;
        Self::from_sec1(&buf)
    }

    pub(crate) fn from_biguints(x: &BigUint, y: &BigUint) -> Self {
        Self(Some((to_be_bytes32(x), to_be_bytes32(y))))
    }

    pub(crate) fn to_biguints(self) -> Option<(BigUint, BigUint)> {
        self.0.map(|(x, y)| (from_be_bytes(&x), from_be_bytes(&y)))
    }
}

/// An ECDSA signature `(r, s)`. Any pair of 32-byte integers can be held; out-of-range values
/// fail verification rather than construction.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct Signature {
    r: [u8; 32],
    s: [u8; 32],
}

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signature")
            .field("r", &hex::encode(self.r))
            .field("s", &hex::encode(self.s))
            .finish()
    }
}

impl Signature {
    /// Instantiate from `r` and `s`
    pub fn new(r: [u8; 32], s: [u8; 32]) -> Self {
        Self { r, s }
    }

    /// The `r` value
    pub fn r(&self) -> [u8; 32] {
        self.r
    }

    /// The `s` value
    pub fn s(&self) -> [u8; 32] {
        self.s
    }

    /// Deserialize from 64-byte `r || s`
    pub fn from_compact(buf: &[u8]) -> EcResult<Self> {
        if buf.len() != 64 {
            return Err(EcError::MalformedSignature);
        }
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&buf[..32]);
        s.copy_from_slice(&buf[32..]);
        Ok(Self { r, s })
    }

    /// Serialize to 64-byte `r || s`
    pub fn to_compact(&self) -> [u8; 64] {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(&self.r);
        buf[32..].copy_from_slice(&self.s);
        buf
    }

    /// True if `0 < r < n` and `0 < s < n`
    pub fn is_in_range(&self) -> bool {
        let params = get_secp256k1_parameters();
        params.is_valid_private(&from_be_bytes(&self.r))
            && params.is_valid_private(&from_be_bytes(&self.s))
    }

    /// True if `s <= n / 2`
    pub fn is_low_s(&self) -> bool {
        &from_be_bytes(&self.s) <= get_secp256k1_parameters().half_order()
    }

    /// Replace a high `s` with `n - s`. Both forms verify under the same key.
    pub fn normalize_s(&self) -> Self {
        if self.is_low_s() {
            return *self;
        }
        let n = get_secp256k1_parameters().n.value();
        let s = from_be_bytes(&self.s);
        if &s >= n {
            return *self;
        }
        Self {
            r: self.r,
            s: to_be_bytes32(&(n - s)),
        }
    }

    /// Serialize to strict DER
    pub fn to_der(&self) -> Vec<u8> {
        let r = der_integer(&self.r);
        let s = der_integer(&self.s);
        let mut buf = Vec::with_capacity(6 + r.len() + s.len());
        buf.push(0x30);
        buf.push((4 + r.len() + s.len()) as u8);
        buf.push(0x02);
        buf.push(r.len() as u8);
        buf.extend_from_slice(&r);
        buf.push(0x02);
        buf.push(s.len() as u8);
        buf.extend_from_slice(&s);
        buf
    }

    /// Deserialize from strict DER. Rejects non-minimal and negative integers, and trailing bytes.
    pub fn try_from_der(der: &[u8]) -> EcResult<Self> {
        if der.len() < 8 || der[0] != 0x30 || der[1] as usize != der.len() - 2 {
            return Err(EcError::MalformedSignature);
        }
        let (r, rest) = read_der_integer(&der[2..])?;
        let (s, rest) = read_der_integer(rest)?;
        if !rest.is_empty() {
            return Err(EcError::MalformedSignature);
        }
        Ok(Self { r, s })
    }
}

fn der_integer(value: &[u8; 32]) -> Vec<u8> {
    let start = value.iter().position(|b| *b != 0).unwrap_or(31);
    let mut out = Vec::with_capacity(33);
    if value[start] & 0x80 != 0 {
        out.push(0);
    }
    out.extend_from_slice(&value[start..]);
    out
}

fn read_der_integer(buf: &[u8]) -> EcResult<([u8; 32], &[u8])> {
    if buf.len() < 3 || buf[0] != 0x02 {
        return Err(EcError::MalformedSignature);
    }
    let len = buf[1] as usize;
    if len == 0 || len > 33 || buf.len() < 2 + len {
        return Err(EcError::MalformedSignature);
    }
    let body = &buf[2..2 + len];
    // negative
    if body[0] & 0x80 != 0 {
        return Err(EcError::MalformedSignature);
    }
    // non-minimal padding
    if len > 1 && body[0] == 0 && body[1] & 0x80 == 0 {
        return Err(EcError::MalformedSignature);
    }
    let body = if len == 33 {
        if body[0] != 0 {
            return Err(EcError::MalformedSignature);
        }
        &body[1..]
    } else {
        body
    };
    let mut value = [0u8; 32];
    value[32 - body.len()..].copy_from_slice(body);
    Ok((value, &buf[2 + len..]))
}

/// A recovery id. Bit 0 is the parity of `R.y`; bit 1 is set when `R.x` overflowed the group
/// order.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecoveryId(u8);

impl RecoveryId {
    /// Instantiate from `0..=3`
    pub fn new(id: u8) -> EcResult<Self> {
        if id > 3 {
            return Err(EcError::InvalidRecoveryId(id));
        }
        Ok(Self(id))
    }

    /// The id as a byte
    pub fn to_u8(self) -> u8 {
        self.0
    }

    /// True if `R.y` is odd
    pub fn is_y_odd(self) -> bool {
        self.0 & 1 == 1
    }

    /// True if `R.x` is `r + n`
    pub fn is_x_reduced(self) -> bool {
        self.0 & 2 == 2
    }

    pub(crate) fn from_parts(y_odd: bool, x_reduced: bool) -> Self {
        Self((y_odd as u8) | ((x_reduced as u8) << 1))
    }
}

/// A Signature with recovery information
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecoverableSignature {
    /// The recovery id, `V`. Will always be `0..=3`.
    pub recovery_id: RecoveryId,
    /// The non-recoverable `RS` signature
    pub sig: Signature,
}

impl RecoverableSignature {
    /// Serialize to VRS tuple
    pub fn serialize_vrs(&self) -> (u8, [u8; 32], [u8; 32]) {
        (self.recovery_id.to_u8(), self.sig.r(), self.sig.s())
    }

    /// Deserialize a recoverable signature from a VRS tuple
    pub fn deserialize_vrs(vrs: (u8, [u8; 32], [u8; 32])) -> EcResult<Self> {
        Ok(Self {
            recovery_id: RecoveryId::new(vrs.0)?,
            sig: Signature::new(vrs.1, vrs.2),
        })
    }

    /// Copy out the standard signature
    pub fn without_recovery(&self) -> Signature {
        self.sig
    }
}

/// Verify a point is usable as a public key on `params`
pub(crate) fn check_public_key(params: &CurveParameters, p: &Point) -> EcResult<(BigUint, BigUint)> {
    let (x, y) = p.to_biguints().ok_or(EcError::InvalidPublicKey)?;
    debug_assert!(params.is_on_curve(&x, &y));
    Ok((x, y))
}
