use std::path::{Path, PathBuf};

use crate::textio::TextEncoding;

/// The primary error type for all operations in the `rfshuttle` crate.
#[derive(Debug, thiserror::Error)]
pub enum ShuttleError {
    /// An I/O error occurred, typically while reading or writing a file.
    /// Includes the path where the error happened.
    #[error("I/O error on path '{}': {source}", .path.display())]
    Io { source: std::io::Error, path: PathBuf },

    /// A directory was required but the path names something else (or nothing).
    #[error("'{}' is not a directory", .0.display())]
    NotADirectory(PathBuf),

    /// Text could not be decoded from, or encoded into, the requested encoding.
    #[error("cannot {reason} '{}' as {encoding}", .path.display())]
    Encoding {
        encoding: TextEncoding,
        path: PathBuf,
        reason: &'static str,
    },

    /// The encoding name is not one we know how to handle.
    #[error("unknown text encoding '{0}'")]
    UnknownEncoding(String),

    /// The transport text is not valid base64.
    #[error("invalid transport payload: {0}")]
    Transport(#[from] base64::DecodeError),

    /// The payload is not a readable zip archive, or the archive could not be written.
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// An archive member would land outside the extraction directory.
    #[error("refusing to extract '{0}': path escapes the destination")]
    UnsafeEntry(String),

    /// A suite id that does not belong to the tree it was looked up in.
    #[error("no suite with id {0}")]
    UnknownSuite(usize),
}

pub type Result<T, E = ShuttleError> = std::result::Result<T, E>;

impl From<walkdir::Error> for ShuttleError {
    fn from(err: walkdir::Error) -> Self {
        let path = err.path().map(Path::to_path_buf).unwrap_or_default();
        let source = err
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop detected"));
        ShuttleError::Io { source, path }
    }
}

/// Attaches the offending path to a bare `io::Error`.
pub(crate) trait IoResultExt<T> {
    fn at(self, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn at(self, path: &Path) -> Result<T> {
        self.map_err(|source| ShuttleError::Io {
            source,
            path: path.to_path_buf(),
        })
    }
}
