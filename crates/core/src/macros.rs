//! Useful macros for marking digests and passing serde through to hex

#[macro_export]
/// Implement `serde::Serialize` and `serde::Deserialize` by passing through to the hex
macro_rules! impl_hex_serde {
    ($item:ty) => {
        impl serde::Serialize for $item {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                let s = $crate::ser::ByteFormat::serialize_hex(self);
                serializer.serialize_str(&s)
            }
        }

        impl<'de> serde::Deserialize<'de> for $item {
            fn deserialize<D>(deserializer: D) -> Result<$item, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s: &str = serde::Deserialize::deserialize(deserializer)?;
                <$item as $crate::ser::ByteFormat>::deserialize_hex(s)
                    .map_err(|e| serde::de::Error::custom(e.to_string()))
            }
        }
    };
}

#[macro_export]
/// Wrap a `Hash256Digest` in a marked newtype. Marked digests serialize in Bitcoin's internal
/// (little-endian) byte order, and display in block-explorer (big-endian) order.
macro_rules! mark_hash256 {
    (
        $(#[$outer:meta])*
        $marked_name:ident
    ) => {
        $(#[$outer])*
        #[derive(Copy, Clone, Default, Debug, Eq, PartialEq, Hash)]
        pub struct $marked_name(pub $crate::hashes::Hash256Digest);

        impl $crate::hashes::MarkedDigest for $marked_name {
            fn new(digest: $crate::hashes::Hash256Digest) -> Self {
                Self(digest)
            }

            fn internal(&self) -> $crate::hashes::Hash256Digest {
                self.0
            }
        }

        impl $crate::ser::ByteFormat for $marked_name {
            type Error = $crate::ser::SerError;

            fn serialized_length(&self) -> usize {
                32
            }

            fn read_from<R>(reader: &mut R, _limit: usize) -> Result<Self, Self::Error>
            where
                R: std::io::Read,
            {
                let mut buf = $crate::hashes::Hash256Digest::default();
                reader.read_exact(&mut buf)?;
                Ok(Self(buf))
            }

            fn write_to<W>(&self, writer: &mut W) -> Result<usize, Self::Error>
            where
                W: std::io::Write,
            {
                Ok(writer.write(&self.0)?)
            }
        }

        $crate::impl_hex_serde!($marked_name);

        impl std::fmt::Display for $marked_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&$crate::hashes::MarkedDigest::to_be_hex(self))
            }
        }
    };
}
