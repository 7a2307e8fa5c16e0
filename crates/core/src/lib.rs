//! # Coins Core
//!
//! `coins-core` contains the hashing and wire-format utilities used by the
//! `coins-ecdsa` and `coins-fixtures` crates.
//!
//! ## Crate Layout
//!
//! ### Hashes
//!
//! The hashes module provides Bitcoin's double-sha2 (`hash256`) and marked
//! newtypes for its outputs. `TXID` and `BlockHash` wrap the same 32-byte
//! digest but cannot be confused with each other.
//!
//! ### ByteFormat trait
//!
//! The `ByteFormat` trait is a simple serialization API using
//! `std::io::{Read, Write}`. Implementers define the binary serialization
//! format of the type. Transactions and blocks implement it, so txids and
//! block hashes can be computed from their serialization.
//!
//! ### Block
//!
//! Just enough of the Bitcoin block format to load fixture blocks from hex:
//! headers, legacy and witness transactions, and merkle roots.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(unused_extern_crates)]

#[macro_use]
pub mod macros;

pub mod block;
pub mod hashes;
pub mod ser;

pub use block::*;
pub use hashes::*;
pub use ser::*;
