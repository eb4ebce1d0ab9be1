//! Validated wrappers used by the extractor.
//!
//! Destination roots and entry paths can only be constructed through
//! validation, so the extractor never handles a raw, unchecked path.

pub mod dest_dir;
pub mod flags;
pub mod safe_path;

pub use dest_dir::DestDir;
pub use flags::ExtractFlags;
pub use safe_path::SafePath;
