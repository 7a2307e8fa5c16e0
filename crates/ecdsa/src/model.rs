//! The backend model: the capability set every secp256k1 backend implements, and the
//! configuration enums that describe backends.

use coins_core::hashes::hash256;
use serde::{Deserialize, Serialize};

use crate::{
    types::{Point, RecoverableSignature, RecoveryId, Scalar, Signature},
    EcError, EcResult,
};

/// A simple hash function type signature
pub type HashFunc = dyn Fn(&[u8]) -> [u8; 32];

/// The available backend implementations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// libsecp256k1 bindings
    Native,
    /// Arbitrary-precision arithmetic in Rust
    Pure,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Native => f.write_str("native"),
            BackendKind::Pure => f.write_str("pure"),
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = EcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "native" => Ok(BackendKind::Native),
            "pure" => Ok(BackendKind::Pure),
            _ => Err(EcError::UnknownBackend(s.to_owned())),
        }
    }
}

/// The operations a native context was built to support
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextCapability {
    /// Signing and key derivation only
    SignOnly,
    /// Verification and recovery only
    VerifyOnly,
    /// Everything
    #[default]
    All,
}

impl ContextCapability {
    /// True if the context can sign and derive keys
    pub fn can_sign(self) -> bool {
        matches!(self, ContextCapability::SignOnly | ContextCapability::All)
    }

    /// True if the context can verify, recover, and multiply arbitrary points
    pub fn can_verify(self) -> bool {
        matches!(self, ContextCapability::VerifyOnly | ContextCapability::All)
    }
}

/// How signing nonces are generated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoncePolicy {
    /// RFC 6979. Signatures are reproducible, and identical across backends.
    #[default]
    Deterministic,
    /// RFC 6979 with 32 bytes of fresh randomness mixed in as extra data.
    Randomized,
}

/// The secp256k1 capability set. Both backends implement it identically: public keys are equal
/// for equal private keys, and every signature verifies under either backend.
pub trait EcBackend {
    /// Which implementation this is
    fn kind(&self) -> BackendKind;

    /// Derive the public key `k·G`. Fails with `InvalidPrivateKey` if `k` is `0` or `>= n`.
    fn derive_public_key(&self, k: &Scalar) -> EcResult<Point>;

    /// Point addition. Either operand may be infinity.
    fn add_points(&self, a: &Point, b: &Point) -> EcResult<Point>;

    /// Scalar multiplication `k·P`. Returns infinity for `k = 0` or `P = infinity`.
    fn mul_point(&self, p: &Point, k: &Scalar) -> EcResult<Point>;

    /// Add a scalar tweak to a private key. Returns a new key
    fn tweak_private_key(&self, k: &Scalar, tweak: &Scalar) -> EcResult<Scalar>;

    /// Add `tweak·G` to a public key. Returns a new key
    fn tweak_public_key(&self, p: &Point, tweak: &Scalar) -> EcResult<Point>;

    /// Sign a 32-byte digest. Produces a low-S signature.
    fn sign(&self, digest: &[u8; 32], k: &Scalar) -> EcResult<Signature>;

    /// Sign a digest, and produce a recovery ID
    fn sign_recoverable(&self, digest: &[u8; 32], k: &Scalar) -> EcResult<RecoverableSignature>;

    /// Verify a signature on a digest. Never fails: malformed or out-of-range signatures, and the
    /// point at infinity, all produce `false`. High-S signatures are accepted.
    fn verify(&self, digest: &[u8; 32], sig: &Signature, p: &Point) -> bool;

    /// Recover the public key that produced `sig` over `digest`
    fn recover_public_key(
        &self,
        digest: &[u8; 32],
        sig: &Signature,
        recovery_id: RecoveryId,
    ) -> EcResult<Point>;

    /// Recover the public key from a recoverable signature
    fn recover(&self, digest: &[u8; 32], sig: &RecoverableSignature) -> EcResult<Point> {
        self.recover_public_key(digest, &sig.sig, sig.recovery_id)
    }

    /// Sign a message
    fn sign_with_hash(&self, message: &[u8], hash: &HashFunc, k: &Scalar) -> EcResult<Signature> {
        self.sign(&hash(message), k)
    }

    /// Verify a signature on a message
    fn verify_with_hash(&self, message: &[u8], hash: &HashFunc, sig: &Signature, p: &Point) -> bool {
        self.verify(&hash(message), sig, p)
    }

    /// Produce a signature on `sha2(sha2(message))`
    fn sign_message(&self, message: &[u8], k: &Scalar) -> EcResult<Signature> {
        self.sign_with_hash(message, &hash256, k)
    }

    /// Verify a signature on `sha2(sha2(message))`
    fn verify_message(&self, message: &[u8], sig: &Signature, p: &Point) -> bool {
        self.verify_with_hash(message, &hash256, sig, p)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_parses_backend_names() {
        assert_eq!("native".parse::<BackendKind>().unwrap(), BackendKind::Native);
        assert_eq!(" Pure ".parse::<BackendKind>().unwrap(), BackendKind::Pure);
        assert_eq!(
            "gmp".parse::<BackendKind>(),
            Err(EcError::UnknownBackend("gmp".to_owned()))
        );
        assert_eq!(BackendKind::Native.to_string(), "native");
    }

    #[test]
    fn it_describes_capabilities() {
        assert!(ContextCapability::All.can_sign() && ContextCapability::All.can_verify());
        assert!(!ContextCapability::VerifyOnly.can_sign());
        assert!(!ContextCapability::SignOnly.can_verify());
    }

    #[test]
    fn it_deserializes_lowercase_names() {
        let kind: BackendKind = serde_json::from_str("\"native\"").unwrap();
        assert_eq!(kind, BackendKind::Native);
        let cap: ContextCapability = serde_json::from_str("\"verify_only\"").unwrap();
        assert_eq!(cap, ContextCapability::VerifyOnly);
    }
}
