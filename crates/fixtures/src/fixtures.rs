use std::path::{Path, PathBuf};

use coins_core::{block::Block, ser::ByteFormat};

use crate::{FixtureError, FixtureResult};

/// The file holding the block fixtures, one hex block per line
pub const BLOCKS_FILE: &str = "blocks";

/// A directory of fixture files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixtures {
    dir: PathBuf,
}

impl Default for Fixtures {
    /// The fixtures shipped with this crate
    fn default() -> Self {
        Self::new(concat!(env!("CARGO_MANIFEST_DIR"), "/data"))
    }
}

/// Split fixture contents into its non-empty lines, in order. Surrounding whitespace is
/// stripped from each line.
pub fn fixture_lines(contents: &str) -> Vec<String> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Parse a hex-encoded block
pub fn block_from_hex(hex: &str) -> FixtureResult<Block> {
    Ok(Block::deserialize_hex(hex.trim())?)
}

impl Fixtures {
    /// Read fixtures from `dir`
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    /// The fixture directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read a fixture file to a string
    pub fn data_file(&self, name: &str) -> FixtureResult<String> {
        let path = self.dir.join(name);
        tracing::debug!(path = %path.display(), "reading fixture");
        std::fs::read_to_string(&path).map_err(|source| FixtureError::Io { path, source })
    }

    /// The non-empty lines of a fixture file, in order
    pub fn load_fixture_lines(&self, name: &str) -> FixtureResult<Vec<String>> {
        Ok(fixture_lines(&self.data_file(name)?))
    }

    /// The hex-encoded blocks. Line `i` is the block at height `i`.
    pub fn blocks(&self) -> FixtureResult<Vec<String>> {
        self.load_fixture_lines(BLOCKS_FILE)
    }

    /// The block at height `i`
    pub fn block(&self, i: usize) -> FixtureResult<Block> {
        let blocks = self.blocks()?;
        let hex = blocks.get(i).ok_or(FixtureError::MissingBlock {
            index: i,
            available: blocks.len(),
        })?;
        block_from_hex(hex)
    }

    /// Height 0
    pub fn genesis_block(&self) -> FixtureResult<Block> {
        self.block(0)
    }
}
