//! Fixed-width big-endian byte strings

/// Shared surface of [`Address`](crate::Address) and [`H256`](crate::H256).
///
/// Both are plain byte arrays that the interpreter moves to and from 256-bit
/// stack words; only the width and the word mapping differ.
macro_rules! fixed_bytes {
    ($(#[$attr:meta])* $name:ident, $width:expr) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        pub struct $name([u8; $width]);

        impl $name {
            /// Width in bytes
            pub const LEN: usize = $width;

            /// All-zero value
            pub const ZERO: $name = $name([0u8; $width]);

            /// Wrap an owned array
            pub const fn from_bytes(bytes: [u8; $width]) -> Self {
                $name(bytes)
            }

            /// Copy from a slice of exactly [`Self::LEN`] bytes
            pub fn from_slice(slice: &[u8]) -> Result<Self, $crate::PrimitiveError> {
                <[u8; $width]>::try_from(slice)
                    .map($name)
                    .map_err(|_| $crate::PrimitiveError::InvalidLength {
                        kind: stringify!($name),
                        expected: $width,
                        got: slice.len(),
                    })
            }

            /// Parse hex, `0x` prefix optional
            pub fn from_hex(text: &str) -> Result<Self, $crate::PrimitiveError> {
                let digits = text.strip_prefix("0x").unwrap_or(text);
                let raw = hex::decode(digits).map_err(|err| $crate::PrimitiveError::InvalidHex {
                    kind: stringify!($name),
                    reason: err.to_string(),
                })?;
                Self::from_slice(&raw)
            }

            /// Borrow the underlying array
            pub fn as_bytes(&self) -> &[u8; $width] {
                &self.0
            }

            /// True when every byte is zero
            pub fn is_zero(&self) -> bool {
                self.0.iter().all(|&b| b == 0)
            }

            /// Lowercase `0x`-prefixed hex
            pub fn to_hex(&self) -> String {
                let mut out = String::with_capacity(2 + 2 * $width);
                out.push_str("0x");
                out.push_str(&hex::encode(self.0));
                out
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl std::fmt::Debug for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}({})", stringify!($name), self)
            }
        }

        impl From<[u8; $width]> for $name {
            fn from(bytes: [u8; $width]) -> Self {
                $name(bytes)
            }
        }

        impl AsRef<[u8]> for $name {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }
    };
}

pub(crate) use fixed_bytes;
