//! Ed25519 verification of the signed header region.

use ed25519_dalek::Signature;
use ed25519_dalek::VerifyingKey;

use crate::ArchiveError;
use crate::Result;

use super::KeyType;

/// Length of the trailing header signature.
pub const SIGNATURE_LEN: usize = ed25519_dalek::SIGNATURE_LENGTH;

/// Verifies `signature` over `message` with strict Ed25519 rules.
///
/// Strict verification rejects non-canonical signatures and small-order
/// components, so a signature cannot be malleated into a second valid one.
///
/// # Errors
///
/// Returns [`ArchiveError::InvalidSignature`] if the signature does not
/// verify under `key`.
pub fn verify_signature(
    message: &[u8],
    signature: &[u8; SIGNATURE_LEN],
    key_type: KeyType,
    key: &VerifyingKey,
) -> Result<()> {
    let signature = Signature::from_bytes(signature);
    key.verify_strict(message, &signature).map_err(|_| {
        tracing::debug!(%key_type, "header signature rejected");
        ArchiveError::InvalidSignature { key_type }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::test_utils;
    use ed25519_dalek::Signer;

    #[test]
    fn test_valid_signature() {
        let signing = test_utils::test_signing_key();
        let message = b"signed header region";
        let signature = signing.sign(message).to_bytes();
        verify_signature(message, &signature, KeyType::System, &signing.verifying_key()).unwrap();
    }

    #[test]
    fn test_modified_message_rejected() {
        let signing = test_utils::test_signing_key();
        let signature = signing.sign(b"original").to_bytes();
        let err = verify_signature(
            b"0riginal",
            &signature,
            KeyType::Spk,
            &signing.verifying_key(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::InvalidSignature {
                key_type: KeyType::Spk
            }
        ));
    }

    #[test]
    fn test_wrong_key_rejected() {
        let signing = test_utils::test_signing_key();
        let other = test_utils::other_signing_key();
        let signature = signing.sign(b"message").to_bytes();
        assert!(
            verify_signature(b"message", &signature, KeyType::Nano, &other.verifying_key())
                .is_err()
        );
    }

    #[test]
    fn test_garbage_signature_rejected() {
        let signing = test_utils::test_signing_key();
        let garbage = [0xFFu8; SIGNATURE_LEN];
        assert!(
            verify_signature(b"message", &garbage, KeyType::System, &signing.verifying_key())
                .is_err()
        );
    }
}
