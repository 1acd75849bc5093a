use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

/// A 32-byte content hash: a block hash, the tracker's `pointer`, `indicator` or `cursor`.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Hash32([u8; 32]);

impl Hash32 {
    pub const fn zero() -> Self {
        Self([0u8; 32])
    }

    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(self) -> String {
        hex::encode(self.0)
    }

    pub fn from_hex(s: &str) -> Result<Self, Hash32ParseError> {
        let bytes = hex::decode(s.trim_start_matches("0x"))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| Hash32ParseError::WrongLength(v.len()))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for Hash32 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Hash32({})", self.to_hex())
    }
}

impl Display for Hash32 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Hash32 {
    type Err = Hash32ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; 32]> for Hash32 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Hash32 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Hash32 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Hash32::from_hex(&s).map_err(D::Error::custom)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Hash32ParseError {
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
    #[error("expected 32 bytes, got {0}")]
    WrongLength(usize),
}

/// A block height. Ordinary newtype wrapper, in the style of the rest of the workspace's
/// small numeric types (`NodeHeight`, `Epoch`): cheap to copy, `Display`s as a bare number.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockHeight(pub u64);

impl BlockHeight {
    pub const fn zero() -> Self {
        Self(0)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Number of steps between `self` and an earlier height, or `None` if `self` is strictly
    /// less (a non-monotonic tip). A competing tip at the *same* height (a same-height fork) is
    /// allowed — `index` is simply `0` — since only a strictly decreasing height can never
    /// represent a legitimate new tip.
    pub fn steps_since(self, earlier: BlockHeight) -> Option<u64> {
        self.0.checked_sub(earlier.0)
    }
}

impl From<u64> for BlockHeight {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl Display for BlockHeight {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
