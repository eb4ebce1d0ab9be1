//! Restoration of ownership, mode, times, xattrs, ACLs and file flags.
//!
//! Each function applies one attribute to one path and reports the raw I/O
//! error; the engine decides which attributes are requested and attaches
//! the entry path. Attributes the platform cannot express fail with
//! `ErrorKind::Unsupported`.

use std::io;
use std::path::Path;

use filetime::FileTime;

/// Extended attribute holding the POSIX access ACL on Linux.
#[cfg(target_os = "linux")]
const POSIX_ACL_ACCESS: &str = "system.posix_acl_access";

#[cfg(not(target_os = "linux"))]
fn unsupported(attribute: &str) -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        format!("{attribute} restoration is not supported on this platform"),
    )
}

#[cfg(unix)]
fn c_string(value: &[u8]) -> io::Result<std::ffi::CString> {
    std::ffi::CString::new(value)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "value contains NUL byte"))
}

#[cfg(unix)]
fn c_path(path: &Path) -> io::Result<std::ffi::CString> {
    use std::os::unix::ffi::OsStrExt;
    c_string(path.as_os_str().as_bytes())
}

/// Sets owner and group without following a final symlink.
pub fn restore_owner(path: &Path, uid: Option<u32>, gid: Option<u32>) -> io::Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::lchown(path, uid, gid)
    }
    #[cfg(not(unix))]
    {
        let _ = (path, uid, gid);
        Err(unsupported("ownership"))
    }
}

/// Sets permission bits, including setuid, setgid and sticky.
pub fn restore_mode(path: &Path, mode: u32) -> io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode & 0o7777))
    }
    #[cfg(not(unix))]
    {
        let mut permissions = std::fs::metadata(path)?.permissions();
        permissions.set_readonly(mode & 0o222 == 0);
        std::fs::set_permissions(path, permissions)
    }
}

/// Sets access and modification time to `mtime` (unix seconds).
pub fn restore_mtime(path: &Path, mtime: i64) -> io::Result<()> {
    let time = FileTime::from_unix_time(mtime, 0);
    filetime::set_file_times(path, time, time)
}

/// Sets one extended attribute without following a final symlink.
pub fn restore_xattr(path: &Path, name: &str, value: &[u8]) -> io::Result<()> {
    #[cfg(target_os = "linux")]
    {
        let c_path = c_path(path)?;
        let c_name = c_string(name.as_bytes())?;
        // SAFETY: both strings are NUL-terminated and outlive the call, and
        // `value` is valid for `value.len()` bytes; lsetxattr only reads them.
        #[allow(unsafe_code)]
        let result = unsafe {
            libc::lsetxattr(
                c_path.as_ptr(),
                c_name.as_ptr(),
                value.as_ptr().cast(),
                value.len(),
                0,
            )
        };
        if result == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }
    #[cfg(target_os = "macos")]
    {
        let c_path = c_path(path)?;
        let c_name = c_string(name.as_bytes())?;
        // SAFETY: both strings are NUL-terminated and outlive the call, and
        // `value` is valid for `value.len()` bytes; setxattr only reads them.
        #[allow(unsafe_code)]
        let result = unsafe {
            libc::setxattr(
                c_path.as_ptr(),
                c_name.as_ptr(),
                value.as_ptr().cast(),
                value.len(),
                0,
                libc::XATTR_NOFOLLOW,
            )
        };
        if result == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        let _ = (path, name, value);
        Err(unsupported("xattr"))
    }
}

/// Sets the access ACL from its kernel xattr encoding.
pub fn restore_acl(path: &Path, acl: &[u8]) -> io::Result<()> {
    #[cfg(target_os = "linux")]
    {
        restore_xattr(path, POSIX_ACL_ACCESS, acl)
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = (path, acl);
        Err(unsupported("ACL"))
    }
}

/// `_IOW('f', 2, long)`
#[cfg(all(target_os = "linux", target_pointer_width = "64"))]
const FS_IOC_SETFLAGS: u64 = 0x4008_6602;
#[cfg(all(target_os = "linux", target_pointer_width = "32"))]
const FS_IOC_SETFLAGS: u64 = 0x4004_6602;

/// Sets file flags (`chattr` attributes on Linux, `chflags` on BSDs).
///
/// Applied after the file is in place, since flags such as immutable would
/// block the final rename.
pub fn restore_fflags(path: &Path, flags: u32) -> io::Result<()> {
    #[cfg(target_os = "linux")]
    {
        use std::os::fd::AsRawFd;

        let file = std::fs::File::open(path)?;
        let value = libc::c_int::from_ne_bytes(flags.to_ne_bytes());
        // SAFETY: `file` keeps the descriptor open for the duration of the
        // call and FS_IOC_SETFLAGS reads one int through the pointer, which
        // points at a live local.
        #[allow(unsafe_code, clippy::cast_possible_truncation)]
        let result = unsafe {
            libc::ioctl(
                file.as_raw_fd(),
                FS_IOC_SETFLAGS as _,
                &raw const value,
            )
        };
        if result == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }
    #[cfg(any(
        target_os = "macos",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd",
        target_os = "dragonfly"
    ))]
    {
        let c_path = c_path(path)?;
        // SAFETY: `c_path` is NUL-terminated and outlives the call.
        #[allow(unsafe_code)]
        let result = unsafe { libc::chflags(c_path.as_ptr(), flags as _) };
        if result == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }
    #[cfg(not(any(
        target_os = "linux",
        target_os = "macos",
        target_os = "freebsd",
        target_os = "netbsd",
        target_os = "openbsd",
        target_os = "dragonfly"
    )))]
    {
        let _ = (path, flags);
        Err(unsupported("file flags"))
    }
}
