//! A simple trait for binary (de)Serialization using std `Read` and `Write` traits.

use std::io::{Cursor, Error as IOError, Read, Write};

use thiserror::Error;

/// Erros related to serialization of types.
#[derive(Debug, Error)]
pub enum SerError {
    /// A VarInt was not minimally encoded.
    #[error("Non-minimal VarInt. Got {:?} bytes for value {:?}.", .len, .value)]
    NonMinimalVarInt {
        /// The encoded length, including the flag byte
        len: u8,
        /// The decoded value
        value: u64,
    },

    /// IOError bubbled up from a `Write` passed to a `ByteFormat::write_to` implementation.
    #[error(transparent)]
    IOError(#[from] IOError),

    /// Got an unknown flag where we expected a witness flag. May indicate a non-witness
    /// transaction.
    #[error("Witness flag not as expected. Got {:?}. Expected {:?}.", .0, [0u8, 1u8])]
    BadWitnessFlag([u8; 2]),

    /// `deserialize_hex` encountered an error on its input.
    #[error(transparent)]
    FromHexError(#[from] hex::FromHexError),

    /// Bytes were left over after deserializing from a hex string.
    #[error("{0} trailing bytes after deserialization")]
    TrailingBytes(usize),
}

/// Type alias for serialization errors
pub type SerResult<T> = Result<T, SerError>;

/// Calculates the minimum prefix length for a VarInt encoding `number`
pub fn prefix_byte_len(number: u64) -> u8 {
    match number {
        0..=0xfc => 1,
        0xfd..=0xffff => 3,
        0x10000..=0xffff_ffff => 5,
        _ => 9,
    }
}

/// Matches the length of the VarInt to the 1-byte flag
pub fn first_byte_from_len(number: u8) -> Option<u8> {
    match number {
        3 => Some(0xfd),
        5 => Some(0xfe),
        9 => Some(0xff),
        _ => None,
    }
}

/// Matches the VarInt prefix flag to the serialized length
pub fn prefix_len_from_first_byte(number: u8) -> u8 {
    match number {
        0..=0xfc => 1,
        0xfd => 3,
        0xfe => 5,
        0xff => 9,
    }
}

/// A simple trait for deserializing from `std::io::Read` and serializing to `std::io::Write`.
///
/// `ByteFormat` is used for txid and block hash calculation, and to read fixture blocks.
pub trait ByteFormat {
    /// An associated error type
    type Error: From<SerError> + From<IOError> + From<hex::FromHexError> + std::error::Error;

    /// Returns the byte-length of the serialized data structure.
    fn serialized_length(&self) -> usize;

    /// Deserializes an instance of `Self` from a `std::io::Read`.
    /// The `limit` argument is used only when deserializing collections, and specifies a maximum
    /// number of instances of the underlying type to read.
    fn read_from<R>(reader: &mut R, limit: usize) -> Result<Self, Self::Error>
    where
        R: Read,
        Self: std::marker::Sized;

    /// Serializes `self` to a `std::io::Write`. Following `Write` trait conventions, its `Ok`
    /// type is a `usize` denoting the number of bytes written.
    fn write_to<W>(&self, writer: &mut W) -> Result<usize, Self::Error>
    where
        W: Write;

    /// Convenience function for reading a LE u32
    fn read_u32_le<R>(reader: &mut R) -> SerResult<u32>
    where
        R: Read,
    {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    /// Convenience function for reading a LE u64
    fn read_u64_le<R>(reader: &mut R) -> SerResult<u64>
    where
        R: Read,
    {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    /// Convenience function for writing a LE u32
    fn write_u32_le<W>(writer: &mut W, number: u32) -> SerResult<usize>
    where
        W: Write,
    {
        writer.write_all(&number.to_le_bytes())?;
        Ok(4)
    }

    /// Convenience function for writing a LE u64
    fn write_u64_le<W>(writer: &mut W, number: u64) -> SerResult<usize>
    where
        W: Write,
    {
        writer.write_all(&number.to_le_bytes())?;
        Ok(8)
    }

    /// Read a Bitcoin CompactSize VarInt. Rejects non-minimal encodings.
    fn read_compact_int<R>(reader: &mut R) -> SerResult<u64>
    where
        R: Read,
    {
        let mut prefix = [0u8; 1];
        reader.read_exact(&mut prefix)?;
        let len = prefix_len_from_first_byte(prefix[0]);
        if len == 1 {
            return Ok(prefix[0] as u64);
        }
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf[..len as usize - 1])?;
        let value = u64::from_le_bytes(buf);
        if prefix_byte_len(value) != len {
            return Err(SerError::NonMinimalVarInt { len, value });
        }
        Ok(value)
    }

    /// Write a Bitcoin CompactSize VarInt, using the minimal encoding.
    fn write_compact_int<W>(writer: &mut W, number: u64) -> SerResult<usize>
    where
        W: Write,
    {
        let len = prefix_byte_len(number);
        match first_byte_from_len(len) {
            None => {
                writer.write_all(&[number as u8])?;
            }
            Some(prefix) => {
                writer.write_all(&[prefix])?;
                writer.write_all(&number.to_le_bytes()[..len as usize - 1])?;
            }
        }
        Ok(len as usize)
    }

    /// Read a VarInt-prefixed byte vector
    fn read_prefix_vec<R>(reader: &mut R) -> SerResult<Vec<u8>>
    where
        R: Read,
    {
        let len = Self::read_compact_int(reader)?;
        let mut buf = vec![];
        reader.by_ref().take(len).read_to_end(&mut buf)?;
        if (buf.len() as u64) < len {
            return Err(IOError::from(std::io::ErrorKind::UnexpectedEof).into());
        }
        Ok(buf)
    }

    /// Write a VarInt-prefixed byte vector
    fn write_prefix_vec<W>(writer: &mut W, items: &[u8]) -> SerResult<usize>
    where
        W: Write,
    {
        let mut written = Self::write_compact_int(writer, items.len() as u64)?;
        writer.write_all(items)?;
        written += items.len();
        Ok(written)
    }

    /// Decodes a hex string to a `Vec<u8>`, deserializes an instance of `Self` from that vector.
    /// Fails if any bytes remain after deserialization.
    fn deserialize_hex(s: &str) -> Result<Self, Self::Error>
    where
        Self: std::marker::Sized,
    {
        let v: Vec<u8> = hex::decode(s.trim())?;
        let mut cursor = Cursor::new(&v[..]);
        let result = Self::read_from(&mut cursor, 0)?;
        let remaining = v.len() - cursor.position() as usize;
        if remaining != 0 {
            return Err(SerError::TrailingBytes(remaining).into());
        }
        Ok(result)
    }

    /// Serializes `self` to a vector, returns the hex-encoded vector
    fn serialize_hex(&self) -> String {
        let mut v: Vec<u8> = vec![];
        self.write_to(&mut v).expect("No error on heap write");
        hex::encode(v)
    }
}
