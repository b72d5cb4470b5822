//! File-system access through system commands.
//!
//! Every reply starts with the status byte. Listings arrive in chunks: the
//! first reply carries the total listing size and a handle that later
//! continue-requests use to fetch the rest.

use std::fmt;
use std::str::FromStr;

use brickwire_codec::{validate_range, CommandComponent, Result, ValidationError, WireType};
use serde::Serialize;

use crate::bytecodes::system;

/// Largest chunk a single listing request may ask for.
pub const MAX_CHUNK: u16 = 1012;

/// Create a directory. Fails with `FILE_EXISTS` if it is already there.
pub fn create_dir(path: &str) -> CommandComponent {
    CommandComponent::detached(system::CREATE_DIR, None)
        .add_parameter(WireType::String, path)
        .add_reply(WireType::UByte, None, 0)
}

/// Delete a file or an empty directory.
pub fn delete_file(path: &str) -> CommandComponent {
    CommandComponent::detached(system::DELETE_FILE, None)
        .add_parameter(WireType::String, path)
        .add_reply(WireType::UByte, None, 0)
}

/// First chunk of a directory listing.
///
/// Replies: status, total listing size, handle, then up to `max` bytes of
/// listing text.
pub fn list_files(path: &str, max: u16) -> Result<CommandComponent> {
    let max = validate_range(max, "chunk size", 1..=MAX_CHUNK)?;
    Ok(CommandComponent::detached(system::LIST_FILES, None)
        .add_parameter(WireType::UShort, max)
        .add_parameter(WireType::String, path)
        .add_reply(WireType::UByte, None, 0)
        .add_reply(WireType::UInt, None, 0)
        .add_reply(WireType::UByte, None, 0)
        .add_trailing_reply(WireType::UByte, None, usize::from(max)))
}

/// Next chunk of a listing started with [`list_files`].
///
/// Replies: status, handle, then up to `max` bytes of listing text.
pub fn continue_list_files(handle: u8, max: u16) -> Result<CommandComponent> {
    let max = validate_range(max, "chunk size", 1..=MAX_CHUNK)?;
    Ok(CommandComponent::detached(system::CONTINUE_LIST_FILES, None)
        .add_parameter(WireType::UByte, handle)
        .add_parameter(WireType::UShort, max)
        .add_reply(WireType::UByte, None, 0)
        .add_reply(WireType::UByte, None, 0)
        .add_trailing_reply(WireType::UByte, None, usize::from(max)))
}

/// One line of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileEntry {
    Directory {
        name: String,
    },
    File {
        name: String,
        size: u32,
        /// Hex MD5 digest as reported by the brick.
        md5: String,
    },
}

impl FileEntry {
    pub fn name(&self) -> &str {
        match self {
            FileEntry::Directory { name } | FileEntry::File { name, .. } => name,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, FileEntry::Directory { .. })
    }
}

impl fmt::Display for FileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileEntry::Directory { name } => write!(f, "{name}/"),
            FileEntry::File { name, size, .. } => write!(f, "{name} ({size} bytes)"),
        }
    }
}

impl FromStr for FileEntry {
    type Err = ValidationError;

    /// Directories are listed as `name/`, files as `MD5 SIZE name` with the
    /// size in hex.
    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        if let Some(name) = line.strip_suffix('/') {
            return Ok(FileEntry::Directory {
                name: name.to_string(),
            });
        }

        let invalid = || ValidationError::Invocation(format!("unrecognized listing line {line:?}"));
        let mut parts = line.splitn(3, ' ');
        let md5 = parts.next().filter(|p| !p.is_empty()).ok_or_else(invalid)?;
        let size = parts
            .next()
            .and_then(|p| u32::from_str_radix(p, 16).ok())
            .ok_or_else(invalid)?;
        let name = parts.next().filter(|p| !p.is_empty()).ok_or_else(invalid)?;

        Ok(FileEntry::File {
            name: name.to_string(),
            size,
            md5: md5.to_string(),
        })
    }
}

/// Parse a complete listing. Blank lines are skipped; `.` and `..` are kept
/// out of the result.
pub fn parse_listing(raw: &[u8]) -> std::result::Result<Vec<FileEntry>, ValidationError> {
    let text = String::from_utf8_lossy(raw);
    text.split(['\n', '\0'])
        .map(str::trim_end)
        .filter(|line| !line.is_empty() && *line != "./" && *line != "../")
        .map(str::parse)
        .collect()
}
