//! Fixed-width content address for tasks, task groups and cache records

use crate::constants::WORK_DIR_SHARD_LEN;
use crate::errors::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A 128-bit content hash rendered as 32 lowercase hex characters
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; Fingerprint::LEN]);

impl Fingerprint {
    /// Width of a fingerprint in bytes
    pub const LEN: usize = 16;

    /// Wrap raw bytes
    pub const fn from_bytes(bytes: [u8; Self::LEN]) -> Self {
        Self(bytes)
    }

    /// Raw bytes of the fingerprint
    pub fn as_bytes(&self) -> &[u8; Self::LEN] {
        &self.0
    }

    /// Lowercase hex rendering
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a 32 character hex string
    pub fn from_hex(value: &str) -> Result<Self> {
        let mut bytes = [0u8; Self::LEN];
        hex::decode_to_slice(value.trim(), &mut bytes)
            .map_err(|e| Error::invalid_fingerprint(value, e.to_string()))?;
        Ok(Self(bytes))
    }

    /// Split the hex rendering into the shard prefix and the leaf name
    pub fn shard(&self) -> (String, String) {
        let hex = self.to_hex();
        let (prefix, leaf) = hex.split_at(WORK_DIR_SHARD_LEN);
        (prefix.to_string(), leaf.to_string())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl FromStr for Fingerprint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_hex(s)
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::from_hex(&value).map_err(serde::de::Error::custom)
    }
}
