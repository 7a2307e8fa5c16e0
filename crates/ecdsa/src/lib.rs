//! Interchangeable secp256k1 ECDSA backends.
//!
//! Two backends implement [`EcBackend`]: [`NativeAdapter`] wraps libsecp256k1 and borrows a
//! shared [`CryptoContext`], and [`PureAdapter`] does the curve arithmetic itself over
//! arbitrary-precision integers. Both derive the same public keys, and each verifies the other's
//! signatures. With the default deterministic nonces they produce byte-identical signatures.
//!
//! Most callers get a backend from a [`BackendSelector`], which picks native when it can, falls
//! back to pure when it can't, and builds the native context once:
//!
//! ```
//! use coins_ecdsa::{BackendSelector, EcBackend, Scalar};
//!
//! let backend = BackendSelector::global().get_adapter(None).unwrap();
//! let k = Scalar::from_u64(31337);
//! let pubkey = backend.derive_public_key(&k).unwrap();
//! let sig = backend.sign_message(b"hello", &k).unwrap();
//! assert!(backend.verify_message(b"hello", &sig, &pubkey));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// The runtime-dispatched backend enum
pub mod adapter;
/// Errors
pub mod error;
/// Modular arithmetic
pub mod math;
/// The backend trait and configuration enums
pub mod model;
/// secp256k1 domain parameters
pub mod params;
/// The pure-Rust backend
pub mod pure;
/// Backend selection and the shared native context
pub mod selector;
/// Keys, points, and signatures
pub mod types;

/// The libsecp256k1 backend
#[cfg(feature = "native")]
pub mod native;

mod rfc6979;

pub use adapter::EcAdapter;
pub use error::{ArithmeticError, EcError, EcResult};
pub use model::{BackendKind, ContextCapability, EcBackend, HashFunc, NoncePolicy};
pub use params::{get_secp256k1_parameters, CurveParameters};
pub use pure::PureAdapter;
pub use selector::{native_compiled, BackendSelector, SelectorConfig, SelectorState};
pub use types::{Point, RecoverableSignature, RecoveryId, Scalar, Signature};

#[cfg(feature = "native")]
pub use native::{CryptoContext, NativeAdapter};
