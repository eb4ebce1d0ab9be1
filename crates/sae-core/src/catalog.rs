//! Path-indexed view of the entries in a verified header.
//!
//! The catalog answers two questions for the extractor: which entries exist
//! (`list_all`) and what a requested path refers to (`find`). Entries whose
//! content window does not lie inside the content area are kept out of both
//! answers, so a header can never direct the extractor to read signature or
//! header bytes as content.

use std::collections::HashMap;

use crate::ArchiveError;
use crate::Result;
use crate::header::EntryDescriptor;
use crate::header::HeaderDescriptor;

/// Normalizes an archive path for lookup.
///
/// Empty and `.` components are dropped, so `./a//b` and `a/b` name the same
/// entry. Absolute paths and `..` are kept verbatim; rejecting them is the
/// extractor's job.
///
/// # Examples
///
/// ```
/// use sae_core::catalog::normalize_path;
///
/// assert_eq!(normalize_path("./etc/./hosts"), "etc/hosts");
/// assert_eq!(normalize_path("a//b/"), "a/b");
/// assert_eq!(normalize_path("../x"), "../x");
/// assert_eq!(normalize_path("/etc/hosts"), "/etc/hosts");
/// ```
#[must_use]
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        return path.to_string();
    }
    path.split('/')
        .filter(|component| !component.is_empty() && *component != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Entries of one archive, deduplicated and indexed by normalized path.
///
/// When a path appears more than once, the last occurrence wins and takes
/// the position of that last occurrence in iteration order.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<EntryDescriptor>,
    index: HashMap<String, usize>,
    content_len: u64,
    superseded: usize,
}

impl Catalog {
    /// Builds a catalog over `header`'s entries and a content area of
    /// `content_len` bytes.
    #[must_use]
    pub fn from_header(header: &HeaderDescriptor, content_len: u64) -> Self {
        Self::new(&header.entries, content_len)
    }

    /// Builds a catalog from entries in header order.
    #[must_use]
    pub fn new(entries: &[EntryDescriptor], content_len: u64) -> Self {
        let names: Vec<String> = entries.iter().map(|e| normalize_path(&e.path)).collect();

        let mut last = HashMap::with_capacity(names.len());
        for (position, name) in names.iter().enumerate() {
            last.insert(name.as_str(), position);
        }

        let mut kept = Vec::with_capacity(last.len());
        let mut index = HashMap::with_capacity(last.len());
        for (position, (entry, name)) in entries.iter().zip(&names).enumerate() {
            if last.get(name.as_str()) == Some(&position) {
                index.insert(name.clone(), kept.len());
                kept.push(entry.clone());
            }
        }

        let superseded = entries.len() - kept.len();
        if superseded > 0 {
            tracing::debug!(superseded, "duplicate entry paths resolved, last wins");
        }

        Self {
            entries: kept,
            index,
            content_len,
            superseded,
        }
    }

    fn in_bounds(&self, entry: &EntryDescriptor) -> bool {
        entry
            .content_end()
            .is_some_and(|end| end <= self.content_len)
    }

    /// Every extractable entry, in header order.
    pub fn list_all(&self) -> impl Iterator<Item = &EntryDescriptor> + '_ {
        self.entries.iter().filter(|e| self.in_bounds(e))
    }

    /// Every entry path after deduplication, including entries whose content
    /// lies out of bounds.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.iter().map(|e| e.path.as_str())
    }

    /// Looks up an entry by path.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::FileNotFound`] if no entry has this path or
    /// its content window lies outside the content area.
    pub fn find(&self, path: &str) -> Result<&EntryDescriptor> {
        self.index
            .get(&normalize_path(path))
            .map(|&position| &self.entries[position])
            .filter(|entry| self.in_bounds(entry))
            .ok_or_else(|| ArchiveError::FileNotFound {
                path: path.to_string(),
            })
    }

    /// Returns `true` if `find(path)` would succeed.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.find(path).is_ok()
    }

    /// Number of entries after deduplication.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the archive has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of header entries replaced by a later entry with the same path.
    #[must_use]
    pub fn superseded(&self) -> usize {
        self.superseded
    }

    /// Size of the content area in bytes.
    #[must_use]
    pub fn content_len(&self) -> u64 {
        self.content_len
    }
}
