use crate::{
    model::{BackendKind, EcBackend, NoncePolicy},
    params::CurveParameters,
    pure::PureAdapter,
    types::{Point, RecoverableSignature, RecoveryId, Scalar, Signature},
    EcResult,
};

#[cfg(feature = "native")]
use crate::native::{CryptoContext, NativeAdapter};

/// A backend chosen at runtime. Every variant implements the same operations with the same
/// results, so callers can treat it as opaque.
#[derive(Debug, Clone, Copy)]
pub enum EcAdapter<'a> {
    /// libsecp256k1, bound to a shared context
    #[cfg(feature = "native")]
    Native(NativeAdapter<'a>),
    /// Arbitrary-precision arithmetic
    Pure(PureAdapter<'a>),
}

macro_rules! dispatch {
    ($self:ident, $b:ident => $body:expr) => {
        match $self {
            #[cfg(feature = "native")]
            EcAdapter::Native($b) => $body,
            EcAdapter::Pure($b) => $body,
        }
    };
}

impl<'a> EcAdapter<'a> {
    /// The curve parameters the backend is bound to
    pub fn params(&self) -> &'a CurveParameters {
        dispatch!(self, b => b.params())
    }

    /// The shared native context, if this is a native backend
    #[cfg(feature = "native")]
    pub fn native_context(&self) -> Option<&'a CryptoContext> {
        match self {
            EcAdapter::Native(b) => Some(b.context()),
            EcAdapter::Pure(_) => None,
        }
    }

    /// The signing nonce policy
    pub fn nonce_policy(&self) -> NoncePolicy {
        dispatch!(self, b => b.nonce_policy())
    }

    /// Sign with caller-supplied extra nonce data
    pub fn sign_with_noncedata(
        &self,
        digest: &[u8; 32],
        k: &Scalar,
        noncedata: &[u8; 32],
    ) -> EcResult<Signature> {
        dispatch!(self, b => b.sign_with_noncedata(digest, k, noncedata))
    }
}

impl<'a> From<PureAdapter<'a>> for EcAdapter<'a> {
    fn from(b: PureAdapter<'a>) -> Self {
        EcAdapter::Pure(b)
    }
}

#[cfg(feature = "native")]
impl<'a> From<NativeAdapter<'a>> for EcAdapter<'a> {
    fn from(b: NativeAdapter<'a>) -> Self {
        EcAdapter::Native(b)
    }
}

impl EcBackend for EcAdapter<'_> {
    fn kind(&self) -> BackendKind {
        dispatch!(self, b => b.kind())
    }

    fn derive_public_key(&self, k: &Scalar) -> EcResult<Point> {
        dispatch!(self, b => b.derive_public_key(k))
    }

    fn add_points(&self, a: &Point, p: &Point) -> EcResult<Point> {
        dispatch!(self, b => b.add_points(a, p))
    }

    fn mul_point(&self, p: &Point, k: &Scalar) -> EcResult<Point> {
        dispatch!(self, b => b.mul_point(p, k))
    }

    fn tweak_private_key(&self, k: &Scalar, tweak: &Scalar) -> EcResult<Scalar> {
        dispatch!(self, b => b.tweak_private_key(k, tweak))
    }

    fn tweak_public_key(&self, p: &Point, tweak: &Scalar) -> EcResult<Point> {
        dispatch!(self, b => b.tweak_public_key(p, tweak))
    }

    fn sign(&self, digest: &[u8; 32], k: &Scalar) -> EcResult<Signature> {
        dispatch!(self, b => b.sign(digest, k))
    }

    fn sign_recoverable(&self, digest: &[u8; 32], k: &Scalar) -> EcResult<RecoverableSignature> {
        dispatch!(self, b => b.sign_recoverable(digest, k))
    }

    fn verify(&self, digest: &[u8; 32], sig: &Signature, p: &Point) -> bool {
        dispatch!(self, b => b.verify(digest, sig, p))
    }

    fn recover_public_key(
        &self,
        digest: &[u8; 32],
        sig: &Signature,
        recovery_id: RecoveryId,
    ) -> EcResult<Point> {
        dispatch!(self, b => b.recover_public_key(digest, sig, recovery_id))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_dispatches_to_the_pure_backend() {
        let adapter: EcAdapter = PureAdapter::init().into();
        assert_eq!(adapter.kind(), BackendKind::Pure);
        assert!(std::ptr::eq(
            adapter.params(),
            crate::params::get_secp256k1_parameters()
        ));
        let k = Scalar::from_u64(77);
        let q = adapter.derive_public_key(&k).unwrap();
        let sig = adapter.sign_message(b"hello", &k).unwrap();
        assert!(adapter.verify_message(b"hello", &sig, &q));
        assert!(!adapter.verify_message(b"goodbye", &sig, &q));
    }

    #[cfg(feature = "native")]
    #[test]
    fn it_exposes_the_native_context() {
        use crate::model::ContextCapability;

        let context = CryptoContext::new(ContextCapability::All);
        let adapter: EcAdapter = NativeAdapter::from_context(&context).into();
        assert_eq!(adapter.kind(), BackendKind::Native);
        assert!(std::ptr::eq(adapter.native_context().unwrap(), &context));
        assert!(EcAdapter::from(PureAdapter::init()).native_context().is_none());
    }
}
