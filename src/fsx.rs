//! Cross-platform filesystem wrapper.
//!
//! Re-exports `std::fs` and adds the two permission helpers the bundle code
//! needs: reading the Unix mode of a file when packing, and restoring it when
//! unpacking. On Windows both are no-ops, so call-sites stay identical across OSes.

use std::io;
use std::path::Path;

pub use std::fs::*;

/// Permission bits of `meta`, if the platform has them.
#[cfg(unix)]
pub fn unix_mode(meta: &Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(meta.permissions().mode() & 0o7777)
}

#[cfg(not(unix))]
pub fn unix_mode(_meta: &Metadata) -> Option<u32> {
    None
}

/// Set POSIX permission bits on Unix.
#[cfg(unix)]
pub fn set_unix_permissions(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, Permissions::from_mode(mode))
}

/// No-op on Windows: POSIX permission bits are not preserved.
#[cfg(not(unix))]
pub fn set_unix_permissions(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}
