//! Output file handling.
//!
//! Writes PEM text to disk. Both writers create or truncate their target;
//! the key writer restricts the file to its owner on Unix.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

/// Permission bits for private key files.
#[cfg(unix)]
pub const PRIVATE_KEY_MODE: u32 = 0o600;

/// Create or truncate `path` and write `contents` to it.
pub fn write_public_file(path: &Path, contents: &str) -> io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents.as_bytes())?;
    file.flush()
}

/// Create or truncate `path` with owner-only permissions and write
/// `contents` to it.
///
/// The mode only applies when the file is created; an existing file keeps
/// its permissions.
pub fn write_private_file(path: &Path, contents: &str) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(PRIVATE_KEY_MODE);
    }

    let mut file = options.open(path)?;
    file.write_all(contents.as_bytes())?;
    file.flush()
}
