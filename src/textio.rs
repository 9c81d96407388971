//! # Text File I/O
//!
//! Reads and writes whole text files in an explicit encoding. Suite sources and
//! resource files are shipped to the remote side as text, so both ends must agree
//! on the encoding; UTF-8 is the default everywhere.

use std::fmt;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use tracing::debug;

use crate::error::{IoResultExt, Result, ShuttleError};
use crate::fsx as fs;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];
const UTF16_BOM: u16 = 0xFEFF;

/// Character encodings supported for text files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Utf16Le,
    Utf16Be,
    /// ISO-8859-1: every byte maps to the code point of the same value.
    Latin1,
}

impl TextEncoding {
    pub fn name(self) -> &'static str {
        match self {
            TextEncoding::Utf8 => "utf-8",
            TextEncoding::Utf16Le => "utf-16le",
            TextEncoding::Utf16Be => "utf-16be",
            TextEncoding::Latin1 => "latin-1",
        }
    }

    /// Decodes raw file bytes. A leading byte-order mark for this encoding is dropped.
    fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            TextEncoding::Utf8 => {
                let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
                String::from_utf8(body.to_vec()).ok()
            }
            TextEncoding::Utf16Le | TextEncoding::Utf16Be => {
                if bytes.len() % 2 != 0 {
                    return None;
                }
                let mut units: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|pair| {
                        let pair = [pair[0], pair[1]];
                        if self == TextEncoding::Utf16Le {
                            u16::from_le_bytes(pair)
                        } else {
                            u16::from_be_bytes(pair)
                        }
                    })
                    .collect();
                if units.first() == Some(&UTF16_BOM) {
                    units.remove(0);
                }
                String::from_utf16(&units).ok()
            }
            TextEncoding::Latin1 => Some(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }

    fn encode(self, text: &str) -> Option<Vec<u8>> {
        match self {
            TextEncoding::Utf8 => Some(text.as_bytes().to_vec()),
            TextEncoding::Utf16Le => Some(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
            TextEncoding::Utf16Be => Some(text.encode_utf16().flat_map(u16::to_be_bytes).collect()),
            TextEncoding::Latin1 => text.chars().map(|c| u8::try_from(u32::from(c)).ok()).collect(),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextEncoding {
    type Err = ShuttleError;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase().replace('_', "-");
        match key.as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "utf-16le" | "utf16le" | "utf-16-le" => Ok(TextEncoding::Utf16Le),
            "utf-16be" | "utf16be" | "utf-16-be" => Ok(TextEncoding::Utf16Be),
            "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" => Ok(TextEncoding::Latin1),
            _ => Err(ShuttleError::UnknownEncoding(s.to_string())),
        }
    }
}

/// Reads the whole file at `path` and decodes it as `encoding`.
///
/// Line endings are returned as stored: `\r\n` is not translated to `\n`,
/// unlike a reader that opens files in newline-translating text mode.
pub fn read_text(path: &Path, encoding: TextEncoding) -> Result<String> {
    debug!(path = %path.display(), %encoding, "read_text");
    let bytes = fs::read(path).at(path)?;
    encoding.decode(&bytes).ok_or_else(|| ShuttleError::Encoding {
        encoding,
        path: path.to_path_buf(),
        reason: "decode",
    })
}

/// Line mode for [`read_text`]. Each line keeps its terminator as stored
/// (`\r\n` stays `\r\n`), so `lines.concat()` equals the full text.
pub fn read_text_lines(path: &Path, encoding: TextEncoding) -> Result<Vec<String>> {
    let text = read_text(path, encoding)?;
    Ok(text.split_inclusive('\n').map(str::to_owned).collect())
}

/// Creates or truncates `path` and writes `content` encoded as `encoding`.
///
/// The content is encoded before the file is touched, so an unencodable string
/// leaves an existing file intact.
pub fn write_text(path: &Path, content: &str, encoding: TextEncoding) -> Result<()> {
    debug!(path = %path.display(), %encoding, bytes = content.len(), "write_text");
    let bytes = encoding.encode(content).ok_or_else(|| ShuttleError::Encoding {
        encoding,
        path: path.to_path_buf(),
        reason: "encode",
    })?;
    let mut file = fs::File::create(path).at(path)?;
    file.write_all(&bytes).at(path)?;
    file.flush().at(path)
}
