use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::AddressError;

/// 32-byte digest (leaf and root hashes)
pub type Hash = [u8; 32];

/// Opaque participant identifier — an account address on the target chain.
///
/// Kept as a string rather than raw bytes so the core stays agnostic to the
/// external chain's address format. Ordering is plain byte-lexicographic,
/// which is the canonical iteration order for index assignment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    /// Create an address, rejecting empty input.
    pub fn new(s: impl Into<String>) -> Result<Self, AddressError> {
        let s = s.into();
        if s.is_empty() {
            return Err(AddressError::Empty);
        }
        Ok(Self(s))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Raw bytes used in leaf-hash preimages.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_rejects_empty() {
        assert_eq!(Address::new(""), Err(AddressError::Empty));
    }

    #[test]
    fn test_address_ordering_is_lexicographic() {
        let a = Address::new("0xaa").unwrap();
        let b = Address::new("0xbb").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_address_display_roundtrip() {
        let a: Address = "0x1234".parse().unwrap();
        assert_eq!(a.to_string(), "0x1234");
        assert_eq!(a.as_str(), "0x1234");
    }

    #[test]
    fn test_address_serde_transparent() {
        let a = Address::new("0xabc").unwrap();
        let json = serde_json::to_string(&a).unwrap();
        assert_eq!(json, "\"0xabc\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, a);
    }
}
