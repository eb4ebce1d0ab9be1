//! Key selection, header signature verification and validity policy.
//!
//! Verification runs on the raw header bytes before they are decoded, so no
//! structure derived from an unauthenticated header ever reaches the catalog
//! or the extractor.

pub mod key_type;
pub mod keyring;
pub mod policy;
pub mod signature;

pub use key_type::KeyType;
pub use keyring::KeyRing;
pub use policy::check_validity;
pub use signature::SIGNATURE_LEN;
pub use signature::verify_signature;
