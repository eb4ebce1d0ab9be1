//! Byte-level I/O for archive parsing and extraction.
//!
//! - [`ByteSource`]: random-access, read-only view of the archive bytes
//! - [`ByteReader`]: bounded sequential cursor with checked fixed-width and
//!   length-prefixed reads
//! - [`EntryReader`]: `Read` adapter over one entry's content window
//! - [`HashingWriter`]: write adapter that counts and digests output

pub mod copy;
pub mod counting;
pub mod reader;
pub mod source;

// Re-export main types for convenience
pub use copy::CopyBuffer;
pub use copy::CopyError;
pub use copy::copy_with_buffer;
pub use counting::HashingWriter;
pub use reader::ByteReader;
pub use reader::EntryReader;
pub use reader::ReadError;
pub use source::ByteSource;
pub use source::FileSource;
