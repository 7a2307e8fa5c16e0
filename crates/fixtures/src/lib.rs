//! Test support for the coins crates: block fixtures on disk, and the EC backends a test run
//! should exercise.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Choosing EC backends for tests
pub mod adapters;
/// Errors
pub mod error;
/// Fixture files
pub mod fixtures;

pub use adapters::{
    config_from_env, config_from_value, ec_adapters, env_selector, safe_ec_adapter,
    BACKEND_ENV_VAR,
};
pub use error::{FixtureError, FixtureResult};
pub use fixtures::{block_from_hex, fixture_lines, Fixtures, BLOCKS_FILE};
