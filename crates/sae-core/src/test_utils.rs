//! Test utilities for building signed archives in memory.
//!
//! Only external crates are used here so integration tests can include this
//! file directly.
//!
//! # Panics
//!
//! All functions in this module may panic on encoding errors since they are
//! designed for test use only where panics are acceptable.

#![allow(dead_code, clippy::unwrap_used, clippy::missing_panics_doc)]

use ed25519_dalek::Signer;
use ed25519_dalek::SigningKey;
use rmpv::Value;

/// Archive magic.
pub const TEST_MAGIC: [u8; 3] = [0xBF, 0xBA, 0xAD];

/// Deterministic key used to sign fixtures.
#[must_use]
pub fn test_signing_key() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
}

/// A second key that never verifies fixtures signed by [`test_signing_key`].
#[must_use]
pub fn other_signing_key() -> SigningKey {
    SigningKey::from_bytes(&[9u8; 32])
}

/// Public half of [`test_signing_key`].
#[must_use]
pub fn test_public_key() -> [u8; 32] {
    test_signing_key().verifying_key().to_bytes()
}

/// Encodes a MessagePack value.
#[must_use]
pub fn encode_value(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    rmpv::encode::write_value(&mut out, value).unwrap();
    out
}

/// Frames `header` and `content` as a version 3 archive signed with
/// [`test_signing_key`].
#[must_use]
pub fn sign_header_bytes(header: &[u8], content: &[u8]) -> Vec<u8> {
    sign_with(&test_signing_key(), 3, header, content)
}

/// Frames and signs an archive with an explicit key and version byte.
#[must_use]
pub fn sign_with(key: &SigningKey, version: u8, header: &[u8], content: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(8 + header.len() + content.len() + 64);
    data.extend_from_slice(&TEST_MAGIC);
    data.push(version);
    data.extend_from_slice(&u32::try_from(header.len()).unwrap().to_le_bytes());
    data.extend_from_slice(header);
    let signature = key.sign(&data).to_bytes();
    data.extend_from_slice(content);
    data.extend_from_slice(&signature);
    data
}

/// One entry of a [`FixtureBuilder`] archive.
#[derive(Debug, Clone)]
pub struct FixtureEntry {
    path: String,
    dir: bool,
    content: Vec<u8>,
    size: Option<u64>,
    offset: Option<u64>,
    hash: Option<Vec<u8>>,
    fields: Vec<(String, Value)>,
}

impl FixtureEntry {
    /// A file entry with `content`.
    #[must_use]
    pub fn file(path: &str, content: &[u8]) -> Self {
        Self {
            path: path.to_string(),
            dir: false,
            content: content.to_vec(),
            size: None,
            offset: None,
            hash: None,
            fields: Vec::new(),
        }
    }

    /// A directory entry.
    #[must_use]
    pub fn dir(path: &str) -> Self {
        Self {
            dir: true,
            ..Self::file(path, b"")
        }
    }

    /// Sets `mode`.
    #[must_use]
    pub fn mode(self, mode: u32) -> Self {
        self.field("mode", Value::from(mode))
    }

    /// Sets `uid`.
    #[must_use]
    pub fn uid(self, uid: u32) -> Self {
        self.field("uid", Value::from(uid))
    }

    /// Sets `gid`.
    #[must_use]
    pub fn gid(self, gid: u32) -> Self {
        self.field("gid", Value::from(gid))
    }

    /// Sets `mtime`.
    #[must_use]
    pub fn mtime(self, mtime: i64) -> Self {
        self.field("mtime", Value::from(mtime))
    }

    /// Sets a single extended attribute.
    #[must_use]
    pub fn xattr(self, name: &str, value: &[u8]) -> Self {
        self.field(
            "xattrs",
            Value::Map(vec![(Value::from(name), Value::Binary(value.to_vec()))]),
        )
    }

    /// Declares a size other than the content length.
    #[must_use]
    pub fn size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Declares an offset other than the content position.
    #[must_use]
    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Declares a digest other than the content's.
    #[must_use]
    pub fn hash(mut self, hash: &[u8]) -> Self {
        self.hash = Some(hash.to_vec());
        self
    }

    /// Adds or replaces a raw field.
    #[must_use]
    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.fields.retain(|(k, _)| k != key);
        self.fields.push((key.to_string(), value));
        self
    }

    fn to_value(&self, position: u64) -> Value {
        let mut pairs = vec![(Value::from("path"), Value::from(self.path.as_str()))];
        if self.dir {
            pairs.push((Value::from("kind"), Value::from("dir")));
            if let Some(size) = self.size {
                pairs.push((Value::from("size"), Value::from(size)));
            }
        } else {
            let size = self.size.unwrap_or(self.content.len() as u64);
            let offset = self.offset.unwrap_or(position);
            let hash = self
                .hash
                .clone()
                .unwrap_or_else(|| blake3::hash(&self.content).as_bytes().to_vec());
            pairs.push((Value::from("size"), Value::from(size)));
            pairs.push((Value::from("offset"), Value::from(offset)));
            pairs.push((Value::from("hash"), Value::Binary(hash)));
        }
        for (key, value) in &self.fields {
            pairs.push((Value::from(key.as_str()), value.clone()));
        }
        Value::Map(pairs)
    }
}

/// Builds signed archives with files laid out back to back in the content
/// area.
///
/// # Examples
///
/// ```ignore
/// let data = FixtureBuilder::new("system")
///     .file("a.txt", b"hello")
///     .dir("etc")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct FixtureBuilder {
    object_type: String,
    uuid: Value,
    created: Option<u64>,
    expire: Option<u64>,
    serial: Option<String>,
    entries: Vec<FixtureEntry>,
    fields: Vec<(String, Value)>,
    version: u8,
    key: SigningKey,
    corrupt: Option<usize>,
}

impl FixtureBuilder {
    /// An empty archive of `object_type`.
    #[must_use]
    pub fn new(object_type: &str) -> Self {
        Self {
            object_type: object_type.to_string(),
            uuid: Value::Binary((0u8..16).collect()),
            created: Some(1_700_000_000),
            expire: None,
            serial: None,
            entries: Vec::new(),
            fields: Vec::new(),
            version: 3,
            key: test_signing_key(),
            corrupt: None,
        }
    }

    /// Adds a file.
    #[must_use]
    pub fn file(self, path: &str, content: &[u8]) -> Self {
        self.entry(FixtureEntry::file(path, content))
    }

    /// Adds a directory.
    #[must_use]
    pub fn dir(self, path: &str) -> Self {
        self.entry(FixtureEntry::dir(path))
    }

    /// Adds a customised entry.
    #[must_use]
    pub fn entry(mut self, entry: FixtureEntry) -> Self {
        self.entries.push(entry);
        self
    }

    /// Sets the expiry time.
    #[must_use]
    pub fn expire(mut self, expire: u64) -> Self {
        self.expire = Some(expire);
        self
    }

    /// Binds the archive to a device serial.
    #[must_use]
    pub fn serial(mut self, serial: &str) -> Self {
        self.serial = Some(serial.to_string());
        self
    }

    /// Replaces the UUID value.
    #[must_use]
    pub fn uuid(mut self, uuid: Value) -> Self {
        self.uuid = uuid;
        self
    }

    /// Adds an extra top-level field.
    #[must_use]
    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.fields.push((key.to_string(), value));
        self
    }

    /// Sets the preamble version byte.
    #[must_use]
    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    /// Signs with `key` instead of [`test_signing_key`].
    #[must_use]
    pub fn signing_key(mut self, key: SigningKey) -> Self {
        self.key = key;
        self
    }

    /// Flips a content byte after signing. Content is not covered by the
    /// signature, so only the entry digest catches this.
    #[must_use]
    pub fn corrupt_content(mut self, index: usize) -> Self {
        self.corrupt = Some(index);
        self
    }

    fn layout(&self) -> (Value, Vec<u8>) {
        let mut content = Vec::new();
        let mut entries = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            entries.push(entry.to_value(content.len() as u64));
            if !entry.dir {
                content.extend_from_slice(&entry.content);
            }
        }

        let mut pairs = vec![
            (Value::from("type"), Value::from(self.object_type.as_str())),
            (Value::from("uuid"), self.uuid.clone()),
        ];
        if let Some(created) = self.created {
            pairs.push((Value::from("created"), Value::from(created)));
        }
        if let Some(expire) = self.expire {
            pairs.push((Value::from("expire"), Value::from(expire)));
        }
        if let Some(serial) = &self.serial {
            pairs.push((Value::from("serial"), Value::from(serial.as_str())));
        }
        pairs.push((Value::from("entries"), Value::Array(entries)));
        for (key, value) in &self.fields {
            pairs.push((Value::from(key.as_str()), value.clone()));
        }
        (Value::Map(pairs), content)
    }

    /// The header map as it will be encoded.
    #[must_use]
    pub fn header_value(&self) -> Value {
        self.layout().0
    }

    /// Encodes, frames and signs the archive.
    #[must_use]
    pub fn build(&self) -> Vec<u8> {
        let (header, content) = self.layout();
        let header = encode_value(&header);
        let mut data = sign_with(&self.key, self.version, &header, &content);
        if let Some(index) = self.corrupt {
            data[8 + header.len() + index] ^= 0x01;
        }
        data
    }
}
