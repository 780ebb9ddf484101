//! Identifiers used throughout EstateMesh.
//!
//! Participants share one opaque [`Identity`] type; roles are never encoded
//! in the identifier and live in the access control registry instead.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{MarketError, Result};

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// Opaque participant identity (seller, buyer, agent, appraiser, owner).
/// Uses UUIDv7 so identities created later sort later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Identity(pub Uuid);

#[allow(clippy::new_without_default)]
impl Identity {
    /// A fresh, unique identity.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// First eight hex characters, for compact log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0.as_bytes()[..4])
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// PropertyId
// ---------------------------------------------------------------------------

/// Dense, sequential property identifier. Also the ownership token id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PropertyId(pub u64);

impl PropertyId {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Position in a dense registry vector.
    #[must_use]
    pub fn index(self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "property:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// DocumentHash
// ---------------------------------------------------------------------------

/// SHA-256 content hash of a document attached to a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct DocumentHash(pub [u8; 32]);

impl DocumentHash {
    /// Hash raw document bytes.
    #[must_use]
    pub fn of(content: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"estatemesh:document:v1:");
        hasher.update(content);
        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Parse a 64-character hex digest.
    ///
    /// # Errors
    /// Returns `InvalidArgument` if the input is not 32 bytes of hex.
    pub fn from_hex(digest: &str) -> Result<Self> {
        let bytes = hex::decode(digest).map_err(|e| MarketError::InvalidArgument {
            reason: format!("document hash is not hex: {e}"),
        })?;
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| MarketError::InvalidArgument {
                reason: "document hash must be 32 bytes".to_string(),
            })?;
        Ok(Self(array))
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for DocumentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use rand::RngCore;

    use super::*;

    #[test]
    fn identity_uniqueness() {
        let a = Identity::new();
        let b = Identity::new();
        assert_ne!(a, b);
    }

    #[test]
    fn identity_short_is_eight_hex_chars() {
        let id = Identity::from_bytes([0xab; 16]);
        assert_eq!(id.short(), "abababab");
    }

    #[test]
    fn property_id_sequence() {
        assert_eq!(PropertyId(0).next(), PropertyId(1));
        assert_eq!(PropertyId(7).index(), 7);
        assert_eq!(PropertyId(3).to_string(), "property:3");
    }

    #[test]
    fn document_hash_is_deterministic() {
        let mut content = [0u8; 512];
        rand::thread_rng().fill_bytes(&mut content);
        assert_eq!(DocumentHash::of(&content), DocumentHash::of(&content));
        assert_ne!(DocumentHash::of(&content), DocumentHash::of(b"deed"));
    }

    #[test]
    fn document_hash_hex_parse() {
        let hash = DocumentHash::of(b"survey.pdf");
        let parsed = DocumentHash::from_hex(&hash.to_hex()).unwrap();
        assert_eq!(hash, parsed);

        assert!(DocumentHash::from_hex("zz").is_err());
        assert!(DocumentHash::from_hex("abcd").is_err());
    }

    #[test]
    fn identity_serde_roundtrip() {
        let id = Identity::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: Identity = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
