//! Strong type definitions for the roadmap engine.
//!
//! All identifiers are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// A 16-byte feature identifier.
///
/// Ids are drawn at random when a feature is created, so an id minted after a
/// flush never collides with one handed out before it even though the creation
/// counter restarts.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct FeatureId(pub [u8; 16]);

impl FeatureId {
    /// Draw a fresh random id.
    pub fn generate() -> Self {
        Self(rand::random())
    }

    /// Create a new FeatureId from raw bytes.
    pub const fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(bytes)
    }

    /// Get the raw bytes.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Convert to hex string.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse from hex string.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        if bytes.len() != 16 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 16];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FeatureId({})", self.to_hex())
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::str::FromStr for FeatureId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s.trim()).map_err(|e| ValidationError::MalformedId(format!("{s}: {e}")))
    }
}

impl From<FeatureId> for String {
    fn from(id: FeatureId) -> Self {
        id.to_hex()
    }
}

impl TryFrom<String> for FeatureId {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<&[u8]> for FeatureId {
    type Error = std::array::TryFromSliceError;

    fn try_from(slice: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; 16] = slice.try_into()?;
        Ok(Self(arr))
    }
}

/// Position of a feature in the creation sequence.
///
/// Only the relative order is meaningful. Storage backends allocate values
/// from a counter that only ever grows until a full flush resets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CreatedOrder(u64);

impl CreatedOrder {
    /// The first value handed out by an empty store.
    pub const FIRST: Self = Self(1);

    /// Rebuild from a persisted counter value. For storage backends.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// The persisted counter value. For storage backends.
    pub const fn as_raw(&self) -> u64 {
        self.0
    }

    /// The value allocated after this one.
    pub const fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}
