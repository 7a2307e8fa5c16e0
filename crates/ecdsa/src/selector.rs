//! Runtime backend selection.
//!
//! A [`BackendSelector`] owns the expensive native context, builds it at most once, and hands out
//! cheap [`EcAdapter`]s that borrow it. Selection policy, in order:
//!
//! 1. a backend forced by the caller, or by the selector's config
//! 2. the native backend, if it is available
//! 3. the pure backend
//!
//! A forced native backend that is unavailable is an error. It is never downgraded to pure.

use std::sync::atomic::{AtomicBool, Ordering};

use once_cell::sync::Lazy;
#[cfg(feature = "native")]
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::{
    adapter::EcAdapter,
    model::{BackendKind, ContextCapability, NoncePolicy},
    params::get_secp256k1_parameters,
    pure::PureAdapter,
    EcError, EcResult,
};

#[cfg(feature = "native")]
use crate::native::{CryptoContext, NativeAdapter};

/// True if this build links libsecp256k1
pub const fn native_compiled() -> bool {
    cfg!(feature = "native")
}

/// Selector configuration. Read once, when the selector is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Always use this backend, if set
    pub forced: Option<BackendKind>,
    /// Whether the native backend may be used. Defaults to whether it is compiled in.
    pub native_available: bool,
    /// The operations the native context is built to support
    pub native_capability: ContextCapability,
    /// How both backends generate signing nonces
    pub nonce: NoncePolicy,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            forced: None,
            native_available: native_compiled(),
            native_capability: ContextCapability::default(),
            nonce: NoncePolicy::default(),
        }
    }
}

impl SelectorConfig {
    /// Force a backend
    pub fn with_forced(mut self, forced: Option<BackendKind>) -> Self {
        self.forced = forced;
        self
    }

    fn native_unavailable_reason(&self) -> Option<&'static str> {
        if !native_compiled() {
            Some("compiled without the `native` feature")
        } else if !self.native_available {
            Some("disabled by configuration")
        } else {
            None
        }
    }
}

/// Where a selector is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorState {
    /// Nothing has been built or handed out
    Uninitialized,
    /// The native context exists, but no adapter has been handed out
    ContextReady,
    /// At least one adapter has been handed out
    BackendChosen,
}

/// Chooses a backend and owns the shared native context
#[derive(Debug)]
pub struct BackendSelector {
    config: SelectorConfig,
    #[cfg(feature = "native")]
    context: OnceCell<CryptoContext>,
    chosen: AtomicBool,
}

static GLOBAL: Lazy<BackendSelector> = Lazy::new(|| BackendSelector::new(SelectorConfig::default()));

impl Default for BackendSelector {
    fn default() -> Self {
        Self::new(SelectorConfig::default())
    }
}

impl BackendSelector {
    /// Instantiate a selector. Builds nothing until an adapter is requested.
    pub fn new(config: SelectorConfig) -> Self {
        Self {
            config,
            #[cfg(feature = "native")]
            context: OnceCell::new(),
            chosen: AtomicBool::new(false),
        }
    }

    /// A process-wide selector with the default config
    pub fn global() -> &'static BackendSelector {
        &GLOBAL
    }

    /// The config this selector was built with
    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// The lifecycle state
    pub fn state(&self) -> SelectorState {
        if self.chosen.load(Ordering::Acquire) {
            SelectorState::BackendChosen
        } else if self.context_built() {
            SelectorState::ContextReady
        } else {
            SelectorState::Uninitialized
        }
    }

    #[cfg(feature = "native")]
    fn context_built(&self) -> bool {
        self.context.get().is_some()
    }

    #[cfg(not(feature = "native"))]
    fn context_built(&self) -> bool {
        false
    }

    /// The shared native context. Built on the first call; concurrent first calls block until
    /// one of them has built it.
    #[cfg(feature = "native")]
    pub fn context(&self) -> &CryptoContext {
        self.context.get_or_init(|| {
            let capability = self.config.native_capability;
            tracing::info!(?capability, "building libsecp256k1 context");
            CryptoContext::new(capability)
        })
    }

    /// Decide which backend a request gets, without building anything
    pub fn resolve(&self, force: Option<BackendKind>) -> EcResult<BackendKind> {
        match force.or(self.config.forced) {
            Some(BackendKind::Native) => match self.config.native_unavailable_reason() {
                Some(reason) => Err(EcError::BackendUnavailable {
                    kind: BackendKind::Native,
                    reason: reason.to_owned(),
                }),
                None => Ok(BackendKind::Native),
            },
            Some(BackendKind::Pure) => Ok(BackendKind::Pure),
            None => match self.config.native_unavailable_reason() {
                Some(reason) => {
                    tracing::warn!(reason, "native backend unavailable, falling back to pure");
                    Ok(BackendKind::Pure)
                }
                None => Ok(BackendKind::Native),
            },
        }
    }

    /// Get a backend. `force` overrides the configured choice.
    #[tracing::instrument(skip_all, fields(force = ?force), err)]
    pub fn get_adapter(&self, force: Option<BackendKind>) -> EcResult<EcAdapter<'_>> {
        let kind = self.resolve(force)?;
        let adapter = self.build(kind)?;
        self.chosen.store(true, Ordering::Release);
        tracing::debug!(%kind, "selected EC backend");
        Ok(adapter)
    }

    fn build(&self, kind: BackendKind) -> EcResult<EcAdapter<'_>> {
        match kind {
            BackendKind::Pure => Ok(PureAdapter::new(get_secp256k1_parameters())
                .with_nonce_policy(self.config.nonce)
                .into()),
            #[cfg(feature = "native")]
            BackendKind::Native => Ok(NativeAdapter::from_context(self.context())
                .with_nonce_policy(self.config.nonce)
                .into()),
            #[cfg(not(feature = "native"))]
            BackendKind::Native => Err(EcError::BackendUnavailable {
                kind,
                reason: "compiled without the `native` feature".to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::model::EcBackend;

    fn no_native() -> SelectorConfig {
        SelectorConfig {
            native_available: false,
            ..Default::default()
        }
    }

    #[test]
    fn it_refuses_to_downgrade_forced_native() {
        let selector = BackendSelector::new(no_native());
        match selector.get_adapter(Some(BackendKind::Native)) {
            Err(EcError::BackendUnavailable { kind, .. }) => assert_eq!(kind, BackendKind::Native),
            other => panic!("expected BackendUnavailable, got {:?}", other.map(|a| a.kind())),
        }
        assert_eq!(selector.state(), SelectorState::Uninitialized);

        let forced = BackendSelector::new(no_native().with_forced(Some(BackendKind::Native)));
        assert!(forced.get_adapter(None).is_err());
    }

    #[test]
    fn it_falls_back_to_pure() {
        let selector = BackendSelector::new(no_native());
        let adapter = selector.get_adapter(None).unwrap();
        assert_eq!(adapter.kind(), BackendKind::Pure);
        assert_eq!(selector.state(), SelectorState::BackendChosen);
    }

    #[test]
    fn it_lets_the_caller_override_config() {
        let selector = BackendSelector::new(no_native().with_forced(Some(BackendKind::Pure)));
        assert_eq!(selector.resolve(None).unwrap(), BackendKind::Pure);
        assert!(selector.resolve(Some(BackendKind::Native)).is_err());
    }

    #[test]
    fn it_returns_one_global_selector() {
        assert!(std::ptr::eq(BackendSelector::global(), BackendSelector::global()));
        assert_eq!(BackendSelector::global().config(), &SelectorConfig::default());
    }

    #[test]
    fn it_deserializes_config() {
        let config: SelectorConfig =
            serde_json::from_str(r#"{"forced":"pure","nonce":"randomized"}"#).unwrap();
        assert_eq!(config.forced, Some(BackendKind::Pure));
        assert_eq!(config.nonce, NoncePolicy::Randomized);
        assert_eq!(config.native_available, native_compiled());
        assert_eq!(config.native_capability, ContextCapability::All);

        let config: SelectorConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, SelectorConfig::default());
    }

    #[test]
    fn it_passes_the_nonce_policy_through() {
        let config = SelectorConfig {
            nonce: NoncePolicy::Randomized,
            ..no_native()
        };
        let selector = BackendSelector::new(config);
        let adapter = selector.get_adapter(None).unwrap();
        assert_eq!(adapter.nonce_policy(), NoncePolicy::Randomized);
    }

    #[cfg(feature = "native")]
    #[test]
    fn it_prefers_native() {
        let selector = BackendSelector::default();
        assert_eq!(selector.state(), SelectorState::Uninitialized);
        let adapter = selector.get_adapter(None).unwrap();
        assert_eq!(adapter.kind(), BackendKind::Native);
        assert_eq!(selector.state(), SelectorState::BackendChosen);

        let fresh = BackendSelector::default();
        fresh.context();
        assert_eq!(fresh.state(), SelectorState::ContextReady);
    }

    #[cfg(feature = "native")]
    #[test]
    fn it_shares_one_context_across_threads() {
        let selector = &BackendSelector::default();
        let addresses: Vec<usize> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    s.spawn(move || {
                        let adapter = selector.get_adapter(Some(BackendKind::Native)).unwrap();
                        adapter.native_context().unwrap() as *const CryptoContext as usize
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        let expected = selector.context() as *const CryptoContext as usize;
        assert!(addresses.iter().all(|a| *a == expected));
    }

    #[cfg(feature = "native")]
    #[test]
    fn it_builds_contexts_with_the_configured_capability() {
        use crate::types::Scalar;

        let selector = BackendSelector::new(SelectorConfig {
            native_capability: ContextCapability::VerifyOnly,
            ..Default::default()
        });
        let adapter = selector.get_adapter(Some(BackendKind::Native)).unwrap();
        assert!(matches!(
            adapter.sign(&[1u8; 32], &Scalar::from_u64(3)),
            Err(EcError::Capability { .. })
        ));
        let pure = selector.get_adapter(Some(BackendKind::Pure)).unwrap();
        let q = pure.derive_public_key(&Scalar::from_u64(3)).unwrap();
        let sig = pure.sign(&[1u8; 32], &Scalar::from_u64(3)).unwrap();
        assert!(adapter.verify(&[1u8; 32], &sig, &q));
    }
}
