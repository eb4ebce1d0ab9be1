//! Decoded archive header.

use rmpv::Value;

use crate::ArchiveConfig;
use crate::ArchiveError;
use crate::Result;
use crate::verify::KeyType;

use super::RawHeader;
use super::entry::EntryDescriptor;
use super::fields::Fields;
use super::fields::type_name;

/// Maximum number of top-level header fields.
pub const MAX_HEADER_FIELDS: usize = 64;

/// Length of the archive UUID.
pub const UUID_LEN: usize = 16;

/// The authenticated header of an archive.
///
/// Only ever constructed from a [`RawHeader`] whose signature has already
/// been verified.
#[derive(Debug, Clone)]
pub struct HeaderDescriptor {
    /// Key type the header was verified with.
    pub key_type: KeyType,
    /// Format version.
    pub version: u8,
    /// Declared object type.
    pub object_type: String,
    /// Archive UUID.
    pub uuid: [u8; UUID_LEN],
    /// Creation time, unix seconds.
    pub created: Option<u64>,
    /// End of the validity window, unix seconds.
    pub expire: Option<u64>,
    /// Device serial the archive is bound to.
    pub serial: Option<String>,
    /// Entries in header order, duplicates included.
    pub entries: Vec<EntryDescriptor>,
    /// The decoded header map.
    pub raw: Value,
}

impl HeaderDescriptor {
    /// Decodes a verified raw header.
    ///
    /// # Errors
    ///
    /// - [`ArchiveError::InvalidHeaderDecode`] if the bytes are not exactly one
    ///   MessagePack value
    /// - [`ArchiveError::InvalidHeader`] on structural problems or exceeded
    ///   bounds
    /// - [`ArchiveError::InvalidObjectType`] if the object type does not match
    ///   `key_type`
    /// - [`ArchiveError::InvalidUuidType`] / [`ArchiveError::InvalidUuidSize`]
    ///   on a malformed UUID
    pub fn decode(raw: &RawHeader, key_type: KeyType, config: &ArchiveConfig) -> Result<Self> {
        let mut cursor = raw.header_bytes();
        let value = rmpv::decode::read_value(&mut cursor)
            .map_err(|e| ArchiveError::InvalidHeaderDecode(e.to_string()))?;
        if !cursor.is_empty() {
            return Err(ArchiveError::InvalidHeaderDecode(format!(
                "{} trailing bytes after header map",
                cursor.len()
            )));
        }

        let fields = Fields::new(&value, "header", MAX_HEADER_FIELDS)?;

        let object_type = fields.str("type")?;
        if object_type != key_type.object_type() {
            return Err(ArchiveError::InvalidObjectType {
                expected: key_type.object_type(),
                found: object_type.to_string(),
            });
        }

        let uuid = match fields.get("uuid") {
            None => {
                return Err(ArchiveError::InvalidHeader(
                    "header: missing field `uuid`".to_string(),
                ));
            }
            Some(Value::Binary(bytes)) => {
                <[u8; UUID_LEN]>::try_from(bytes.as_slice()).map_err(|_| {
                    ArchiveError::InvalidUuidSize {
                        size: bytes.len(),
                        expected: UUID_LEN,
                    }
                })?
            }
            Some(other) => {
                return Err(ArchiveError::InvalidUuidType {
                    found: type_name(other),
                });
            }
        };

        let created = fields.opt_u64("created")?;
        let expire = fields.opt_u64("expire")?;
        let serial = fields.opt_str("serial")?.map(str::to_string);

        let listed = fields.array("entries")?;
        if listed.len() > config.max_entries {
            return Err(ArchiveError::InvalidHeader(format!(
                "header: {} entries exceeds limit of {}",
                listed.len(),
                config.max_entries
            )));
        }
        let entries = listed
            .iter()
            .enumerate()
            .map(|(index, entry)| EntryDescriptor::decode(index, entry))
            .collect::<Result<Vec<_>>>()?;

        let object_type = object_type.to_string();
        tracing::debug!(
            %key_type,
            object_type = object_type.as_str(),
            uuid = %hex::encode(uuid),
            entries = entries.len(),
            "header decoded"
        );

        Ok(Self {
            key_type,
            version: raw.version,
            object_type,
            uuid,
            created,
            expire,
            serial,
            entries,
            raw: value,
        })
    }

    /// UUID as lower-case hex.
    #[must_use]
    pub fn uuid_hex(&self) -> String {
        hex::encode(self.uuid)
    }
}
