//! Writing verified entries to disk.
//!
//! Files are staged in a temporary file next to their destination, checked
//! against the signed digest while being copied, given their metadata and
//! only then renamed into place. Directory metadata is applied after the
//! whole batch so that creating children does not disturb restored times.

pub mod atomic;
pub mod collision;
pub mod engine;
pub mod metadata;
pub mod stream;

pub use collision::Collision;
pub use engine::Extractor;
