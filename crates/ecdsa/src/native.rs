// Wuille's secp
use secp256k1::{
    ecdsa::{RecoverableSignature as NativeRecoverable, RecoveryId as NativeRecoveryId},
    All, Message, PublicKey, SecretKey, Secp256k1, SignOnly, VerifyOnly,
};

use crate::{
    model::{BackendKind, ContextCapability, EcBackend, NoncePolicy},
    params::{get_secp256k1_parameters, CurveParameters},
    types::{Point, RecoverableSignature, RecoveryId, Scalar, Signature},
    ArithmeticError, EcError, EcResult,
};

#[derive(Debug)]
enum NativeContext {
    All(Secp256k1<All>),
    SignOnly(Secp256k1<SignOnly>),
    VerifyOnly(Secp256k1<VerifyOnly>),
}

/// A libsecp256k1 context. Building one precomputes tables and is expensive, so a process should
/// build one per capability and share it by reference. Once built it is immutable and may be used
/// from many threads at once.
#[derive(Debug)]
pub struct CryptoContext {
    inner: NativeContext,
    capability: ContextCapability,
}

impl CryptoContext {
    /// Build a context supporting the given operations
    pub fn new(capability: ContextCapability) -> Self {
        let inner = match capability {
            ContextCapability::All => NativeContext::All(Secp256k1::new()),
            ContextCapability::SignOnly => NativeContext::SignOnly(Secp256k1::signing_only()),
            ContextCapability::VerifyOnly => {
                NativeContext::VerifyOnly(Secp256k1::verification_only())
            }
        };
        Self { inner, capability }
    }

    /// The operations this context was built for
    pub fn capability(&self) -> ContextCapability {
        self.capability
    }
}

// Evaluates `$body` with `$secp` bound to a context that can sign, or returns a capability error
macro_rules! signing {
    ($ctx:expr, $op:literal, |$secp:ident| $body:expr) => {
        match &$ctx.inner {
            NativeContext::All($secp) => $body,
            NativeContext::SignOnly($secp) => $body,
            NativeContext::VerifyOnly(_) => {
                return Err(EcError::Capability {
                    operation: $op,
                    required: ContextCapability::SignOnly,
                    provided: $ctx.capability,
                })
            }
        }
    };
}

// Evaluates `$body` with `$secp` bound to a context that can verify, or returns a capability error
macro_rules! verifying {
    ($ctx:expr, $op:literal, |$secp:ident| $body:expr) => {
        match &$ctx.inner {
            NativeContext::All($secp) => $body,
            NativeContext::VerifyOnly($secp) => $body,
            NativeContext::SignOnly(_) => {
                return Err(EcError::Capability {
                    operation: $op,
                    required: ContextCapability::VerifyOnly,
                    provided: $ctx.capability,
                })
            }
        }
    };
}

/// A Secp256k1Backend struct using Sipa's C implementation of Secp256k1.
#[derive(Debug, Clone, Copy)]
pub struct NativeAdapter<'a> {
    context: &'a CryptoContext,
    params: &'a CurveParameters,
    nonce: NoncePolicy,
}

impl<'a> NativeAdapter<'a> {
    /// Instantiate a backend from a context. Useful for managing your own backend lifespan
    pub fn from_context(context: &'a CryptoContext) -> Self {
        Self {
            context,
            params: get_secp256k1_parameters(),
            nonce: NoncePolicy::default(),
        }
    }

    /// Set the signing nonce policy
    pub fn with_nonce_policy(mut self, nonce: NoncePolicy) -> Self {
        self.nonce = nonce;
        self
    }

    /// The shared context this backend borrows
    pub fn context(&self) -> &'a CryptoContext {
        self.context
    }

    /// The curve parameters this backend operates over
    pub fn params(&self) -> &'a CurveParameters {
        self.params
    }

    /// The signing nonce policy
    pub fn nonce_policy(&self) -> NoncePolicy {
        self.nonce
    }

    /// Sign with caller-supplied extra nonce data, as in RFC 6979 section 3.6
    pub fn sign_with_noncedata(
        &self,
        digest: &[u8; 32],
        k: &Scalar,
        noncedata: &[u8; 32],
    ) -> EcResult<Signature> {
        let sk = secret_key(k)?;
        let msg = Message::from_digest(*digest);
        let sig = signing!(self.context, "sign", |secp| secp
            .sign_ecdsa_with_noncedata(&msg, &sk, noncedata));
        Signature::from_compact(&sig.serialize_compact())
    }

    fn tweak_scalar(&self, tweak: &Scalar) -> EcResult<secp256k1::Scalar> {
        secp256k1::Scalar::from_be_bytes(tweak.to_bytes())
            .map_err(|_| ArithmeticError::OutOfRange.into())
    }
}

fn secret_key(k: &Scalar) -> EcResult<SecretKey> {
    SecretKey::from_slice(&k.to_bytes()).map_err(|_| EcError::InvalidPrivateKey)
}

fn public_key(p: &Point) -> EcResult<PublicKey> {
    PublicKey::from_slice(&p.pubkey_array_uncompressed()?).map_err(|_| EcError::InvalidPublicKey)
}

fn to_point(pk: &PublicKey) -> EcResult<Point> {
    Point::from_pubkey_array_uncompressed(pk.serialize_uncompressed())
}

fn from_native_recoverable(sig: &NativeRecoverable) -> EcResult<RecoverableSignature> {
    let (id, compact) = sig.serialize_compact();
    Ok(RecoverableSignature {
        recovery_id: RecoveryId::new(id.to_i32() as u8)?,
        sig: Signature::from_compact(&compact)?,
    })
}

impl EcBackend for NativeAdapter<'_> {
    fn kind(&self) -> BackendKind {
        BackendKind::Native
    }

    fn derive_public_key(&self, k: &Scalar) -> EcResult<Point> {
        let sk = secret_key(k)?;
        let pk = signing!(self.context, "derive_public_key", |secp| {
            PublicKey::from_secret_key(secp, &sk)
        });
        to_point(&pk)
    }

    fn add_points(&self, a: &Point, b: &Point) -> EcResult<Point> {
        if a.is_infinity() {
            return Ok(*b);
        }
        if b.is_infinity() {
            return Ok(*a);
        }
        match public_key(a)?.combine(&public_key(b)?) {
            Ok(sum) => to_point(&sum),
            Err(secp256k1::Error::InvalidPublicKeySum) => Ok(Point::infinity()),
            Err(_) => Err(EcError::InvalidPublicKey),
        }
    }

    fn mul_point(&self, p: &Point, k: &Scalar) -> EcResult<Point> {
        let tweak = self.tweak_scalar(k)?;
        let product = verifying!(self.context, "mul_point", |secp| {
            if p.is_infinity() || k.is_zero() {
                return Ok(Point::infinity());
            }
            public_key(p)?
                .mul_tweak(secp, &tweak)
                .map_err(|_| EcError::InvalidPublicKey)?
        });
        to_point(&product)
    }

    fn tweak_private_key(&self, k: &Scalar, tweak: &Scalar) -> EcResult<Scalar> {
        let sk = secret_key(k)?;
        let tweak = self.tweak_scalar(tweak)?;
        let tweaked = sk
            .add_tweak(&tweak)
            .map_err(|_| EcError::InvalidPrivateKey)?;
        Ok(Scalar::from_bytes(tweaked.secret_bytes()))
    }

    fn tweak_public_key(&self, p: &Point, tweak: &Scalar) -> EcResult<Point> {
        let pk = public_key(p)?;
        let tweak = self.tweak_scalar(tweak)?;
        let tweaked = verifying!(self.context, "tweak_public_key", |secp| pk
            .add_exp_tweak(secp, &tweak)
            .map_err(|_| EcError::InvalidPublicKey)?);
        to_point(&tweaked)
    }

    fn sign(&self, digest: &[u8; 32], k: &Scalar) -> EcResult<Signature> {
        let sk = secret_key(k)?;
        let msg = Message::from_digest(*digest);
        let sig = signing!(self.context, "sign", |secp| match self.nonce {
            NoncePolicy::Deterministic => secp.sign_ecdsa(&msg, &sk),
            NoncePolicy::Randomized => {
                secp.sign_ecdsa_with_noncedata(&msg, &sk, &rand::random::<[u8; 32]>())
            }
        });
        Signature::from_compact(&sig.serialize_compact())
    }

    fn sign_recoverable(&self, digest: &[u8; 32], k: &Scalar) -> EcResult<RecoverableSignature> {
        let sk = secret_key(k)?;
        let msg = Message::from_digest(*digest);
        let sig = signing!(self.context, "sign_recoverable", |secp| match self.nonce {
            NoncePolicy::Deterministic => secp.sign_ecdsa_recoverable(&msg, &sk),
            NoncePolicy::Randomized => secp.sign_ecdsa_recoverable_with_noncedata(
                &msg,
                &sk,
                &rand::random::<[u8; 32]>()
            ),
        });
        from_native_recoverable(&sig)
    }

    fn verify(&self, digest: &[u8; 32], sig: &Signature, p: &Point) -> bool {
        let mut native_sig = match secp256k1::ecdsa::Signature::from_compact(&sig.to_compact()) {
            Ok(sig) => sig,
            Err(_) => return false,
        };
        // libsecp256k1 rejects high-S outright
        native_sig.normalize_s();
        let pk = match public_key(p) {
            Ok(pk) => pk,
            Err(_) => return false,
        };
        let msg = Message::from_digest(*digest);
        match &self.context.inner {
            NativeContext::All(secp) => secp.verify_ecdsa(&msg, &native_sig, &pk).is_ok(),
            NativeContext::VerifyOnly(secp) => secp.verify_ecdsa(&msg, &native_sig, &pk).is_ok(),
            NativeContext::SignOnly(_) => {
                tracing::error!(
                    capability = ?self.context.capability,
                    "verify called on a context that cannot verify"
                );
                false
            }
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
        let id = NativeRecoveryId::from_i32(recovery_id.to_u8() as i32)
            .map_err(|_| EcError::InvalidRecoveryId(recovery_id.to_u8()))?;
        let native_sig = NativeRecoverable::from_compact(&sig.to_compact(), id)
            .map_err(|_| EcError::Recovery)?;
        let msg = Message::from_digest(*digest);
        let pk = verifying!(self.context, "recover_public_key", |secp| secp
            .recover_ecdsa(&msg, &native_sig)
            .map_err(|_| EcError::Recovery)?);
        to_point(&pk)
    }
}
