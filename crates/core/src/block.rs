//! Bitcoin blocks and the transactions they contain. This covers the wire format only, with no
//! script or consensus validation.

use std::io::{Read, Write};

use crate::{
    hashes::{hash256, BlockHash, Hash256Digest, Hash256Writer, MarkedDigest, MerkleRoot, TXID},
    ser::{prefix_byte_len, ByteFormat, SerError, SerResult},
};

/// The mainnet genesis block hash, in block-explorer (big-endian) order.
pub const GENESIS_BLOCK_HASH_BE: &str =
    "000000000019d6689c085ae165831e934ff763ae46a2a6c172b3f1b60a8ce26f";

/// An Outpoint. This is a unique identifier for a UTXO, and is composed of a transaction ID (in
/// Bitcoin-style LE format), and the index of the output being spent within that transactions
/// output vector (vout).
///
/// `Outpoint::null()` and `Outpoint::default()` return the null Outpoint, which references a txid
/// of all 0, and a index 0xffff_ffff. This null outpoint is used in every coinbase transaction.
#[derive(serde::Serialize, serde::Deserialize, Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct Outpoint {
    /// The txid that created the UTXO being pointed to.
    pub txid: TXID,
    /// The index of that UTXO in the transaction's output vector.
    pub idx: u32,
}

impl Outpoint {
    /// Returns the `null` Outpoint. This is used in the coinbase input.
    pub fn null() -> Self {
        Outpoint {
            txid: TXID::default(),
            idx: 0xffff_ffff,
        }
    }

    /// True if this is the coinbase outpoint.
    pub fn is_null(&self) -> bool {
        *self == Self::null()
    }
}

impl Default for Outpoint {
    fn default() -> Self {
        Outpoint::null()
    }
}

impl ByteFormat for Outpoint {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        36
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
    {
        Ok(Outpoint {
            txid: TXID::read_from(reader, 0)?,
            idx: Self::read_u32_le(reader)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let mut len = self.txid.write_to(writer)?;
        len += Self::write_u32_le(writer, self.idx)?;
        Ok(len)
    }
}

/// A transaction input: the outpoint being spent, its `script_sig`, and a sequence number.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, Eq, PartialEq, Default)]
pub struct TxIn {
    /// The outpoint identifying the UTXO being spent.
    pub outpoint: Outpoint,
    /// The raw `script_sig` bytes. Empty for native witness spends.
    pub script_sig: Vec<u8>,
    /// The sequence number.
    pub sequence: u32,
}

impl ByteFormat for TxIn {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        36 + prefix_byte_len(self.script_sig.len() as u64) as usize + self.script_sig.len() + 4
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
    {
        Ok(TxIn {
            outpoint: Outpoint::read_from(reader, 0)?,
            script_sig: Self::read_prefix_vec(reader)?,
            sequence: Self::read_u32_le(reader)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let mut len = self.outpoint.write_to(writer)?;
        len += Self::write_prefix_vec(writer, &self.script_sig)?;
        len += Self::write_u32_le(writer, self.sequence)?;
        Ok(len)
    }
}

/// A transaction output: a value in satoshis and a locking script.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, Eq, PartialEq, Default)]
pub struct TxOut {
    /// The value of the output in satoshis.
    pub value: u64,
    /// The raw `script_pubkey` bytes.
    pub script_pubkey: Vec<u8>,
}

impl ByteFormat for TxOut {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        8 + prefix_byte_len(self.script_pubkey.len() as u64) as usize + self.script_pubkey.len()
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
    {
        Ok(TxOut {
            value: Self::read_u64_le(reader)?,
            script_pubkey: Self::read_prefix_vec(reader)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let mut len = Self::write_u64_le(writer, self.value)?;
        len += Self::write_prefix_vec(writer, &self.script_pubkey)?;
        Ok(len)
    }
}

/// A witness stack: one for each input of a witness transaction.
pub type Witness = Vec<Vec<u8>>;

/// A Bitcoin transaction, in either legacy or witness format. A transaction is serialized in
/// witness format iff any of its witnesses is non-empty.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, Eq, PartialEq, Default)]
pub struct Tx {
    /// The version number.
    pub version: u32,
    /// The inputs.
    pub vin: Vec<TxIn>,
    /// The outputs.
    pub vout: Vec<TxOut>,
    /// The witnesses. Either empty, or one per input.
    pub witnesses: Vec<Witness>,
    /// The locktime.
    pub locktime: u32,
}

impl Tx {
    /// True if the transaction carries witness data.
    pub fn is_witness(&self) -> bool {
        self.witnesses.iter().any(|w| !w.is_empty())
    }

    /// True if the transaction has a single input spending the null outpoint.
    pub fn is_coinbase(&self) -> bool {
        self.vin.len() == 1 && self.vin[0].outpoint.is_null()
    }

    fn write_legacy_body<W: Write>(&self, writer: &mut W) -> SerResult<usize> {
        let mut len = Self::write_compact_int(writer, self.vin.len() as u64)?;
        for input in self.vin.iter() {
            len += input.write_to(writer)?;
        }
        len += Self::write_compact_int(writer, self.vout.len() as u64)?;
        for output in self.vout.iter() {
            len += output.write_to(writer)?;
        }
        Ok(len)
    }

    fn write_legacy<W: Write>(&self, writer: &mut W) -> SerResult<usize> {
        let mut len = Self::write_u32_le(writer, self.version)?;
        len += self.write_legacy_body(writer)?;
        len += Self::write_u32_le(writer, self.locktime)?;
        Ok(len)
    }

    /// The transaction ID: the hash256 of the legacy (witness-stripped) serialization.
    pub fn txid(&self) -> TXID {
        let mut w = Hash256Writer::default();
        self.write_legacy(&mut w).expect("No error on hasher write");
        w.finish_marked()
    }

    /// The witness transaction ID: the hash256 of the full serialization.
    pub fn wtxid(&self) -> TXID {
        let mut w = Hash256Writer::default();
        self.write_to(&mut w).expect("No error on hasher write");
        w.finish_marked()
    }
}

impl ByteFormat for Tx {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        let mut len = 4;
        len += prefix_byte_len(self.vin.len() as u64) as usize;
        len += self.vin.iter().map(TxIn::serialized_length).sum::<usize>();
        len += prefix_byte_len(self.vout.len() as u64) as usize;
        len += self.vout.iter().map(TxOut::serialized_length).sum::<usize>();
        if self.is_witness() {
            len += 2;
            for witness in self.witnesses.iter() {
                len += prefix_byte_len(witness.len() as u64) as usize;
                for item in witness.iter() {
                    len += prefix_byte_len(item.len() as u64) as usize + item.len();
                }
            }
        }
        len + 4
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
    {
        let version = Self::read_u32_le(reader)?;

        let mut vin_len = Self::read_compact_int(reader)?;
        let witness = vin_len == 0;
        if witness {
            let mut flag = [0u8; 1];
            reader.read_exact(&mut flag)?;
            if flag[0] != 1 {
                return Err(SerError::BadWitnessFlag([0, flag[0]]));
            }
            vin_len = Self::read_compact_int(reader)?;
        }

        let mut vin = vec![];
        for _ in 0..vin_len {
            vin.push(TxIn::read_from(reader, 0)?);
        }

        let vout_len = Self::read_compact_int(reader)?;
        let mut vout = vec![];
        for _ in 0..vout_len {
            vout.push(TxOut::read_from(reader, 0)?);
        }

        let mut witnesses = vec![];
        if witness {
            for _ in 0..vin.len() {
                let items = Self::read_compact_int(reader)?;
                let mut stack = vec![];
                for _ in 0..items {
                    stack.push(Self::read_prefix_vec(reader)?);
                }
                witnesses.push(stack);
            }
        }

        Ok(Tx {
            version,
            vin,
            vout,
            witnesses,
            locktime: Self::read_u32_le(reader)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        if !self.is_witness() {
            return self.write_legacy(writer);
        }
        let mut len = Self::write_u32_le(writer, self.version)?;
        writer.write_all(&[0u8, 1u8])?;
        len += 2;
        len += self.write_legacy_body(writer)?;
        for witness in self.witnesses.iter() {
            len += Self::write_compact_int(writer, witness.len() as u64)?;
            for item in witness.iter() {
                len += Self::write_prefix_vec(writer, item)?;
            }
        }
        len += Self::write_u32_le(writer, self.locktime)?;
        Ok(len)
    }
}

/// An 80-byte Bitcoin block header.
#[derive(serde::Serialize, serde::Deserialize, Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct BlockHeader {
    /// The block version.
    pub version: u32,
    /// The hash of the previous block header.
    pub prev_hash: BlockHash,
    /// The merkle root of the block's transactions.
    pub merkle_root: MerkleRoot,
    /// The block timestamp.
    pub timestamp: u32,
    /// The compact difficulty target.
    pub bits: u32,
    /// The nonce.
    pub nonce: u32,
}

impl BlockHeader {
    /// The block hash: hash256 of the serialized header.
    pub fn hash(&self) -> BlockHash {
        let mut w = Hash256Writer::default();
        self.write_to(&mut w).expect("No error on hasher write");
        w.finish_marked()
    }
}

impl ByteFormat for BlockHeader {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        80
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
    {
        Ok(BlockHeader {
            version: Self::read_u32_le(reader)?,
            prev_hash: BlockHash::read_from(reader, 0)?,
            merkle_root: MerkleRoot::read_from(reader, 0)?,
            timestamp: Self::read_u32_le(reader)?,
            bits: Self::read_u32_le(reader)?,
            nonce: Self::read_u32_le(reader)?,
        })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let mut len = Self::write_u32_le(writer, self.version)?;
        len += self.prev_hash.write_to(writer)?;
        len += self.merkle_root.write_to(writer)?;
        len += Self::write_u32_le(writer, self.timestamp)?;
        len += Self::write_u32_le(writer, self.bits)?;
        len += Self::write_u32_le(writer, self.nonce)?;
        Ok(len)
    }
}

/// A block: a header and its transactions.
#[derive(serde::Serialize, serde::Deserialize, Clone, Debug, Eq, PartialEq, Default)]
pub struct Block {
    /// The block header.
    pub header: BlockHeader,
    /// The transactions, coinbase first.
    pub txns: Vec<Tx>,
}

impl Block {
    /// The block hash.
    pub fn hash(&self) -> BlockHash {
        self.header.hash()
    }

    /// True if this block's hash is the mainnet genesis block hash.
    pub fn is_genesis(&self) -> bool {
        self.header.prev_hash == BlockHash::default()
            && self.hash().to_be_hex() == GENESIS_BLOCK_HASH_BE
    }

    /// Compute the merkle root of the block's txids. Odd layers duplicate their last node.
    pub fn compute_merkle_root(&self) -> MerkleRoot {
        let mut layer: Vec<Hash256Digest> = self.txns.iter().map(|tx| tx.txid().internal()).collect();
        if layer.is_empty() {
            return MerkleRoot::default();
        }
        while layer.len() > 1 {
            if layer.len() % 2 == 1 {
                let last = layer[layer.len() - 1];
                layer.push(last);
            }
            layer = layer
                .chunks(2)
                .map(|pair| {
                    let mut buf = [0u8; 64];
                    buf[..32].copy_from_slice(&pair[0]);
                    buf[32..].copy_from_slice(&pair[1]);
                    hash256(&buf)
                })
                .collect();
        }
        MerkleRoot::new(layer[0])
    }

    /// True if the header commits to the block's transactions.
    pub fn has_valid_merkle_root(&self) -> bool {
        self.compute_merkle_root() == self.header.merkle_root
    }
}

impl ByteFormat for Block {
    type Error = SerError;

    fn serialized_length(&self) -> usize {
        80 + prefix_byte_len(self.txns.len() as u64) as usize
            + self.txns.iter().map(Tx::serialized_length).sum::<usize>()
    }

    fn read_from<R>(reader: &mut R, _limit: usize) -> SerResult<Self>
    where
        R: Read,
    {
        let header = BlockHeader::read_from(reader, 0)?;
        let count = Self::read_compact_int(reader)?;
        let mut txns = vec![];
        for _ in 0..count {
            txns.push(Tx::read_from(reader, 0)?);
        }
        Ok(Block { header, txns })
    }

    fn write_to<W>(&self, writer: &mut W) -> SerResult<usize>
    where
        W: Write,
    {
        let mut len = self.header.write_to(writer)?;
        len += Self::write_compact_int(writer, self.txns.len() as u64)?;
        for tx in self.txns.iter() {
            len += tx.write_to(writer)?;
        }
        Ok(len)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    static GENESIS_HEX: &str = "0100000000000000000000000000000000000000000000000000000000000000000000003ba3edfd7a7b12b27ac72c3e67768f617fc81bc3888a51323a9fb8aa4b1e5e4a29ab5f49ffff001d1dac2b7c0101000000010000000000000000000000000000000000000000000000000000000000000000ffffffff4d04ffff001d0104455468652054696d65732030332f4a616e2f32303039204368616e63656c6c6f72206f6e206272696e6b206f66207365636f6e64206261696c6f757420666f722062616e6b73ffffffff0100f2052a01000000434104678afdb0fe5548271967f1a67130b7105cd6a828e03909a67962e0ea1f61deb649f6bc3f4cef38c4f35504e51ec112de5c384df7ba0b8d578a4c702b6bf11d5fac00000000";

    // version 2, one witness input with a two-item stack, one output
    static WITNESS_TX_HEX: &str = "0200000000010111111111111111111111111111111111111111111111111111111111111111110000000000fdffffff01e8030000000000001600140000000000000000000000000000000000000000020201ab010000000000";

    #[test]
    fn it_parses_the_genesis_block() {
        let block = Block::deserialize_hex(GENESIS_HEX).unwrap();
        assert!(block.is_genesis());
        assert_eq!(block.hash().to_be_hex(), GENESIS_BLOCK_HASH_BE);
        assert_eq!(block.txns.len(), 1);
        assert!(block.txns[0].is_coinbase());
        assert_eq!(block.txns[0].vout[0].value, 50 * 100_000_000);
        assert_eq!(block.serialized_length(), GENESIS_HEX.len() / 2);
        assert_eq!(block.serialize_hex(), GENESIS_HEX);
    }

    #[test]
    fn it_computes_the_genesis_merkle_root() {
        let block = Block::deserialize_hex(GENESIS_HEX).unwrap();
        assert!(block.has_valid_merkle_root());
        assert_eq!(
            block.txns[0].txid().to_be_hex(),
            "4a5e1e4baab89f3a32518a88c31bc87f618f76673e2cc77ab2127b7afdeda33b"
        );
    }

    #[test]
    fn it_parses_witness_transactions() {
        let tx = Tx::deserialize_hex(WITNESS_TX_HEX).unwrap();
        assert!(tx.is_witness());
        assert!(!tx.is_coinbase());
        assert_eq!(tx.version, 2);
        assert_eq!(tx.witnesses, vec![vec![vec![0x01, 0xab], vec![0x00]]]);
        assert_eq!(tx.vout[0].value, 1000);
        assert_eq!(tx.serialized_length(), WITNESS_TX_HEX.len() / 2);
        assert_eq!(tx.serialize_hex(), WITNESS_TX_HEX);
        assert_ne!(tx.txid(), tx.wtxid());
    }

    #[test]
    fn it_rejects_bad_witness_flags() {
        let bad = WITNESS_TX_HEX.replacen("00010111", "00020111", 1);
        match Tx::deserialize_hex(&bad) {
            Err(SerError::BadWitnessFlag([0, 2])) => {}
            other => panic!("expected BadWitnessFlag, got {:?}", other),
        }
    }

    #[test]
    fn it_rejects_truncated_blocks() {
        assert!(Block::deserialize_hex(&GENESIS_HEX[..GENESIS_HEX.len() - 2]).is_err());
    }

    #[test]
    fn it_duplicates_odd_merkle_layers() {
        let tx = Tx::deserialize_hex(WITNESS_TX_HEX).unwrap();
        let block = Block {
            header: BlockHeader::default(),
            txns: vec![tx.clone(), tx.clone(), tx.clone()],
        };
        let id = tx.txid().internal();
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(&id);
        buf[32..].copy_from_slice(&id);
        let pair = hash256(&buf);
        buf[..32].copy_from_slice(&pair);
        buf[32..].copy_from_slice(&pair);
        assert_eq!(block.compute_merkle_root(), MerkleRoot::new(hash256(&buf)));
    }
}
