//! Backend selection for test runs.
//!
//! The environment variable [`BACKEND_ENV_VAR`] pins the backend a suite exercises. Unset or
//! empty, the suite runs against whatever the selector prefers.

use coins_ecdsa::{BackendKind, BackendSelector, EcAdapter, EcError, EcResult, SelectorConfig};
use once_cell::sync::OnceCell;

use crate::FixtureResult;

/// Names the backend a test run should exercise: `native` or `pure`
pub const BACKEND_ENV_VAR: &str = "COINS_EC_BACKEND";

static ENV_SELECTOR: OnceCell<BackendSelector> = OnceCell::new();

/// Build a selector config from the value of [`BACKEND_ENV_VAR`]
pub fn config_from_value(value: Option<&str>) -> EcResult<SelectorConfig> {
    let forced = match value.map(str::trim) {
        None | Some("") => None,
        Some(name) => Some(name.parse::<BackendKind>()?),
    };
    Ok(SelectorConfig::default().with_forced(forced))
}

/// Build a selector config from the environment
pub fn config_from_env() -> EcResult<SelectorConfig> {
    let value = std::env::var(BACKEND_ENV_VAR).ok();
    config_from_value(value.as_deref())
}

/// A process-wide selector configured from the environment. The environment is read once.
pub fn env_selector() -> FixtureResult<&'static BackendSelector> {
    Ok(ENV_SELECTOR.get_or_try_init(|| {
        let config = config_from_env()?;
        tracing::debug!(?config, "configured EC backend selection from the environment");
        Ok::<_, EcError>(BackendSelector::new(config))
    })?)
}

/// The adapters a test run should exercise. A forced backend that is unavailable is an error,
/// not a skipped test.
pub fn ec_adapters() -> FixtureResult<Vec<EcAdapter<'static>>> {
    Ok(vec![env_selector()?.get_adapter(None)?])
}

/// Native if it is available, else pure. Ignores the environment.
pub fn safe_ec_adapter() -> FixtureResult<EcAdapter<'static>> {
    Ok(BackendSelector::global().get_adapter(None)?)
}
