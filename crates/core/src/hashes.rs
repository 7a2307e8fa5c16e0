//! Holds utilites for working with Bitcoin's double-sha2 digest, and disambiguating digests via
//! marker traits.
//!
//! We want to wrap hashes in marked newtypes in order to prevent type-confusion between TXIDs,
//! block hashes, and other digests with the same length.

use sha2::{Digest, Sha256};
use std::io::{Result as IOResult, Write};

/// A 32-byte digest, in the byte order produced by the hash function.
pub type Hash256Digest = [u8; 32];

/// A marked `Hash256Digest`.
pub trait MarkedDigest: Copy + Default {
    /// Wrap a digest.
    fn new(digest: Hash256Digest) -> Self;

    /// Return a copy of the underlying digest.
    fn internal(&self) -> Hash256Digest;

    /// Return the digest in block-explorer (big-endian) byte order.
    fn to_be_hex(&self) -> String {
        let mut buf = self.internal();
        buf.reverse();
        hex::encode(buf)
    }

    /// Instantiate from a block-explorer (big-endian) hex string.
    fn from_be_hex(be: &str) -> Result<Self, hex::FromHexError> {
        let mut buf: Hash256Digest = hex::decode_to_array(be)?;
        buf.reverse();
        Ok(Self::new(buf))
    }
}

/// A struct that exposes a Bitcoin-style Hash256 `Write` interface by wrapping an internal SHA2
/// instance.
///
/// ```
/// use std::io::Write;
/// use coins_core::hashes::Hash256Writer;
///
/// let mut w = Hash256Writer::default();
/// w.write_all(&[0u8; 32]).unwrap();
/// let digest = w.finish();
/// assert_eq!(digest.len(), 32);
/// ```
#[derive(Default)]
pub struct Hash256Writer {
    internal: Sha256,
}

impl Hash256Writer {
    /// Consume the writer and produce the digest.
    pub fn finish(self) -> Hash256Digest {
        let first = self.internal.finalize();
        let second = Sha256::digest(first);
        let mut digest = Hash256Digest::default();
        digest.copy_from_slice(&second[..]);
        digest
    }

    /// Consume the writer and produce a marked digest.
    pub fn finish_marked<M: MarkedDigest>(self) -> M {
        M::new(self.finish())
    }
}

impl Write for Hash256Writer {
    fn write(&mut self, buf: &[u8]) -> IOResult<usize> {
        self.internal.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> IOResult<()> {
        Ok(())
    }
}

/// Bitcoin's double-sha2 of a byte slice.
pub fn hash256(data: &[u8]) -> Hash256Digest {
    let mut w = Hash256Writer::default();
    w.internal.update(data);
    w.finish()
}

mark_hash256!(
    /// A marked Hash256Digest representing transaction IDs
    TXID
);

mark_hash256!(
    /// A marked Hash256Digest representing a block header hash
    BlockHash
);

mark_hash256!(
    /// A marked Hash256Digest representing a merkle tree node
    MerkleRoot
);
