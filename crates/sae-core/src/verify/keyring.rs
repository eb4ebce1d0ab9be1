//! Verification key material per key type.

use std::collections::BTreeMap;

use ed25519_dalek::PUBLIC_KEY_LENGTH;
use ed25519_dalek::VerifyingKey;

use crate::ArchiveError;
use crate::Result;

use super::KeyType;

/// Maps each key type to exactly one Ed25519 public key.
///
/// A key type with no entry cannot be used to open archives; there is no
/// default key to fall back on.
///
/// # Examples
///
/// ```
/// use sae_core::verify::{KeyRing, KeyType};
///
/// let mut keyring = KeyRing::new();
/// keyring.insert_hex(
///     KeyType::System,
///     "d75a980182b10ab7d54bfed3c964073a0ee172f3daa62325af021a68f707511a",
/// )?;
/// assert!(keyring.contains(KeyType::System));
/// assert!(keyring.verifying_key(KeyType::Spk).is_err());
/// # Ok::<(), sae_core::ArchiveError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyRing {
    keys: BTreeMap<KeyType, [u8; PUBLIC_KEY_LENGTH]>,
}

impl KeyRing {
    /// Creates an empty key ring.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key, returning the key it replaced.
    pub fn insert(
        &mut self,
        key_type: KeyType,
        key: [u8; PUBLIC_KEY_LENGTH],
    ) -> Option<[u8; PUBLIC_KEY_LENGTH]> {
        self.keys.insert(key_type, key)
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with_key(mut self, key_type: KeyType, key: [u8; PUBLIC_KEY_LENGTH]) -> Self {
        self.insert(key_type, key);
        self
    }

    /// Adds a key given as 64 hex characters.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::CreateEntryKey`] if the string is not valid hex
    /// or not 32 bytes long.
    pub fn insert_hex(&mut self, key_type: KeyType, hex_key: &str) -> Result<()> {
        let bytes = hex::decode(hex_key.trim()).map_err(|e| ArchiveError::CreateEntryKey {
            key_type,
            reason: format!("invalid hex: {e}"),
        })?;
        let key: [u8; PUBLIC_KEY_LENGTH] =
            bytes
                .try_into()
                .map_err(|bytes: Vec<u8>| ArchiveError::CreateEntryKey {
                    key_type,
                    reason: format!("expected {PUBLIC_KEY_LENGTH} bytes, got {}", bytes.len()),
                })?;
        self.insert(key_type, key);
        Ok(())
    }

    /// Removes the key for `key_type`.
    pub fn remove(&mut self, key_type: KeyType) -> Option<[u8; PUBLIC_KEY_LENGTH]> {
        self.keys.remove(&key_type)
    }

    /// Returns `true` if a key is configured for `key_type`.
    #[must_use]
    pub fn contains(&self, key_type: KeyType) -> bool {
        self.keys.contains_key(&key_type)
    }

    /// Returns the raw key bytes for `key_type`.
    #[must_use]
    pub fn get(&self, key_type: KeyType) -> Option<&[u8; PUBLIC_KEY_LENGTH]> {
        self.keys.get(&key_type)
    }

    /// Key types with a configured key, in code order.
    pub fn key_types(&self) -> impl Iterator<Item = KeyType> + '_ {
        self.keys.keys().copied()
    }

    /// Number of configured keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if no keys are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Resolves the verification key for `key_type`.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::MissingKey`] if no key is configured
    /// - [`ArchiveError::CreateEntryKey`] if the bytes are not a valid curve
    ///   point or are a weak (small-order) key
    pub fn verifying_key(&self, key_type: KeyType) -> Result<VerifyingKey> {
        let bytes = self
            .get(key_type)
            .ok_or(ArchiveError::MissingKey(key_type))?;
        let key = VerifyingKey::from_bytes(bytes).map_err(|_| ArchiveError::CreateEntryKey {
            key_type,
            reason: "not a valid Ed25519 point".to_string(),
        })?;
        if key.is_weak() {
            return Err(ArchiveError::CreateEntryKey {
                key_type,
                reason: "weak/small-order Ed25519 key rejected".to_string(),
            });
        }
        Ok(key)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ErrorCode;
    use crate::test_utils;

    #[test]
    fn test_insert_and_resolve() {
        let keyring = KeyRing::new().with_key(KeyType::System, test_utils::test_public_key());
        assert_eq!(keyring.len(), 1);
        assert!(keyring.verifying_key(KeyType::System).is_ok());
        assert_eq!(keyring.key_types().collect::<Vec<_>>(), vec![KeyType::System]);
    }

    #[test]
    fn test_missing_key_is_unknown_key_type() {
        let keyring = KeyRing::new();
        assert!(keyring.is_empty());
        let err = keyring.verifying_key(KeyType::Nano).unwrap_err();
        assert!(matches!(err, ArchiveError::MissingKey(KeyType::Nano)));
        assert_eq!(err.code(), ErrorCode::UnknownKeyType);
    }

    #[test]
    fn test_no_fallback_between_key_types() {
        let keyring = KeyRing::new().with_key(KeyType::System, test_utils::test_public_key());
        assert!(keyring.verifying_key(KeyType::Spk).is_err());
    }

    #[test]
    fn test_weak_key_rejected() {
        let mut weak = [0u8; 32];
        weak[0] = 0x01;
        let keyring = KeyRing::new().with_key(KeyType::System, weak);
        let err = keyring.verifying_key(KeyType::System).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CreateEntryKeyFailed);
    }

    #[test]
    fn test_insert_hex() {
        let mut keyring = KeyRing::new();
        let hex_key = hex::encode(test_utils::test_public_key());
        keyring.insert_hex(KeyType::Spk, &hex_key).unwrap();
        assert_eq!(keyring.get(KeyType::Spk), Some(&test_utils::test_public_key()));
    }

    #[test]
    fn test_insert_hex_rejects_bad_input() {
        let mut keyring = KeyRing::new();
        let err = keyring.insert_hex(KeyType::Spk, "zz").unwrap_err();
        assert_eq!(err.code(), ErrorCode::CreateEntryKeyFailed);

        let err = keyring.insert_hex(KeyType::Spk, "abcd").unwrap_err();
        assert!(err.to_string().contains("expected 32 bytes"));
        assert!(keyring.is_empty());
    }

    #[test]
    fn test_insert_replaces_and_remove() {
        let mut keyring = KeyRing::new();
        assert!(keyring.insert(KeyType::Dev, [1u8; 32]).is_none());
        assert_eq!(keyring.insert(KeyType::Dev, [2u8; 32]), Some([1u8; 32]));
        assert_eq!(keyring.remove(KeyType::Dev), Some([2u8; 32]));
        assert!(!keyring.contains(KeyType::Dev));
    }
}
