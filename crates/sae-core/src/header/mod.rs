//! Archive framing and header decoding.
//!
//! Reading a header is two-phase. [`read_frame`] extracts the signed region
//! and the trailing signature without interpreting the header bytes; only
//! after the signature verifies does [`HeaderDescriptor::decode`] parse them.

pub mod descriptor;
pub mod entry;
mod fields;
pub mod frame;

pub use descriptor::HeaderDescriptor;
pub use entry::EntryDescriptor;
pub use entry::EntryKind;
pub use entry::EntryMetadata;
pub use frame::RawHeader;
pub use frame::read_frame;
