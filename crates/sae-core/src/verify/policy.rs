//! Validity checks applied to an authenticated header.

use crate::ArchiveConfig;
use crate::ArchiveError;
use crate::Result;
use crate::header::HeaderDescriptor;

/// Checks expiry and device binding.
///
/// Runs after signature verification, so the error distinguishes authentic
/// archives that do not apply here from tampered ones.
///
/// An archive is expired once the reference time reaches its `expire` value.
/// A header naming a serial must match the configured device serial, and a
/// device-bound key type requires the header to name one.
///
/// # Errors
///
/// - [`ArchiveError::Expired`] past the validity window
/// - [`ArchiveError::SerialNumMismatch`] on a serial mismatch or a missing
///   device serial
/// - [`ArchiveError::InvalidHeader`] if a device-bound header has no serial
pub fn check_validity(header: &HeaderDescriptor, config: &ArchiveConfig) -> Result<()> {
    if let Some(expire) = header.expire {
        let now = config.reference_unix_time();
        if now >= expire {
            tracing::warn!(expire, now, "archive validity window has ended");
            return Err(ArchiveError::Expired {
                expired_at: expire,
                now,
            });
        }
    }

    match header.serial.as_deref() {
        Some(expected) => {
            let actual = config.device_serial.as_deref();
            if actual != Some(expected) {
                tracing::warn!(expected, ?actual, "archive is bound to another device");
                return Err(ArchiveError::SerialNumMismatch {
                    expected: expected.to_string(),
                    actual: actual.map(str::to_string),
                });
            }
        }
        None if header.key_type.is_device_bound() => {
            return Err(ArchiveError::InvalidHeader(format!(
                "header: key type {} requires a `serial` field",
                header.key_type
            )));
        }
        None => {}
    }

    Ok(())
}
