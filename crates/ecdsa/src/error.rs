use thiserror::Error;

use crate::{BackendKind, ContextCapability};

/// Errors from the modular arithmetic layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ArithmeticError {
    /// The operand has no inverse modulo the modulus
    #[error("No modular inverse exists")]
    NoInverse,

    /// The operand is not a quadratic residue modulo the modulus
    #[error("No modular square root exists")]
    NoSquareRoot,

    /// Square roots are only supported for moduli congruent to 3 mod 4
    #[error("Square roots require a modulus congruent to 3 mod 4")]
    UnsupportedModulus,

    /// Arithmetic modulo 0 is undefined
    #[error("Modulus must be non-zero")]
    ZeroModulus,

    /// A scalar operand was not reduced modulo the group order
    #[error("Scalar operand is not less than the group order")]
    OutOfRange,
}

/// Errors for this library
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcError {
    /// Error bubbled up from the arithmetic layer
    #[error(transparent)]
    Arithmetic(#[from] ArithmeticError),

    /// Private key was 0 or not less than the group order
    #[error("Private key is zero or not less than the group order")]
    InvalidPrivateKey,

    /// Point is not on the curve, is the point at infinity where a public key is required, or
    /// failed to decode
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Operation requires a context capability the backend was not provisioned with
    #[error("Operation `{operation}` needs a {required:?} context. Got a {provided:?} context")]
    Capability {
        /// The operation attempted
        operation: &'static str,
        /// The capability the operation needs
        required: ContextCapability,
        /// The capability the context actually has
        provided: ContextCapability,
    },

    /// No public key satisfies the recovery equation for this signature and recovery id
    #[error("Public key recovery failed")]
    Recovery,

    /// Recovery ids are always `0..=3`
    #[error("Recovery id must be 0, 1, 2, or 3. Got {0}")]
    InvalidRecoveryId(u8),

    /// Signature bytes did not decode
    #[error("Malformed signature encoding")]
    MalformedSignature,

    /// A backend was requested that cannot be constructed in this runtime
    #[error("Backend `{kind}` is unavailable: {reason}")]
    BackendUnavailable {
        /// The requested backend
        kind: BackendKind,
        /// Why it could not be provided
        reason: String,
    },

    /// Backend name did not parse
    #[error("Unknown backend `{0}`. Expected `native` or `pure`")]
    UnknownBackend(String),
}

/// Type alias for results in this crate
pub type EcResult<T> = Result<T, EcError>;
