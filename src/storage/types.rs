//! core identifier types for the storage layer.

use std::fmt;

use crate::storage::error::{StoreError, StoreResult};

/// a 20-byte SHA-1 object id, rendered as 40 lowercase hex characters.
///
/// ids are always derived by hashing a framed object; the only other
/// legitimate source is parsing a user-supplied full hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 20]);

impl ObjectId {
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// parse a full 40-character hex id. Case-insensitive on input,
    /// always lowercase on output.
    pub fn from_hex(hex_str: &str) -> StoreResult<Self> {
        if hex_str.len() != 40 {
            return Err(StoreError::Format(format!(
                "object id must be 40 hex characters, got {}",
                hex_str.len()
            )));
        }
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(hex_str, &mut bytes)
            .map_err(|_| StoreError::Format(format!("invalid object id: {hex_str}")))?;
        Ok(Self(bytes))
    }

    /// raw digest bytes, as embedded in tree entries.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// short form of the id for display.
    pub fn short(&self) -> String {
        self.to_hex()[..7].to_string()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        let id = ObjectId::from_bytes([0xde; 20]);
        let reparsed = ObjectId::from_hex(&id.to_hex()).unwrap();
        assert_eq!(id, reparsed);
    }

    #[test]
    fn test_uppercase_input_renders_lowercase() {
        let id = ObjectId::from_hex(&"AB".repeat(20)).unwrap();
        assert_eq!(id.to_hex(), "ab".repeat(20));
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        assert!(ObjectId::from_hex("abc123").is_err());
        assert!(ObjectId::from_hex("").is_err());
        assert!(ObjectId::from_hex(&"a".repeat(41)).is_err());
    }

    #[test]
    fn test_non_hex_is_rejected() {
        assert!(ObjectId::from_hex(&"g".repeat(40)).is_err());
    }

    #[test]
    fn test_short_form() {
        let id = ObjectId::from_hex("ce013625030ba8dba906f756967f9e9ca394464a").unwrap();
        assert_eq!(id.short(), "ce01362");
    }
}
