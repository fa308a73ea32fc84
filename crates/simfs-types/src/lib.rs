#![forbid(unsafe_code)]
//! Shared vocabulary for SimFS: block/node identifiers, the file
//! category table, permission strings, and allocation strategy names.
//!
//! This crate is dependency-light on purpose: every other SimFS crate
//! pulls it in, so it carries no filesystem logic, only validated
//! value types and their parse errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Fixed simulated block size in bytes.
pub const BLOCK_SIZE: u64 = 4096;

/// Default simulated disk capacity in bytes (100 MB).
pub const DEFAULT_CAPACITY: u64 = 100_000_000;

/// Permission string every new node starts with.
pub const DEFAULT_PERMISSIONS: &str = "rwxr-xr-x";

/// Owner string every new node starts with.
pub const DEFAULT_OWNER: &str = "user";

// ── Identifiers ─────────────────────────────────────────────────────────────

/// Index of a 4 KiB block inside the simulated pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BlockIndex(pub u64);

impl fmt::Display for BlockIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Stable arena index of a node in the namespace tree.
///
/// A `NodeId` is a lookup key, never an ownership edge: the arena owns
/// every node, and parent references stored as `NodeId` cannot form
/// reference cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Number of blocks needed to back `bytes` of payload.
///
/// Zero-size files still occupy one block.
#[must_use]
pub fn blocks_needed(bytes: u64) -> u64 {
    bytes.div_ceil(BLOCK_SIZE).max(1)
}

// ── Node kind ───────────────────────────────────────────────────────────────

/// Whether a namespace node is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    File,
    Directory,
}

impl NodeKind {
    #[must_use]
    pub fn is_directory(self) -> bool {
        matches!(self, Self::Directory)
    }

    /// Single-character tag used by `ls`-style listings.
    #[must_use]
    pub fn type_char(self) -> char {
        match self {
            Self::File => '-',
            Self::Directory => 'd',
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => f.write_str("file"),
            Self::Directory => f.write_str("directory"),
        }
    }
}

// ── Parse errors ────────────────────────────────────────────────────────────

/// Validation failures for the value types in this crate.
///
/// Higher layers convert these into their own error vocabulary at the
/// crate boundary; this type stays independent of `simfs-error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Permission mode is neither 3 octal digits nor 9 chars over `rwx-`.
    #[error("invalid mode: '{mode}'")]
    InvalidMode { mode: String },

    /// Allocation strategy name is not one of the three known schemes.
    #[error("unknown allocation strategy: '{name}'")]
    UnknownStrategy { name: String },
}

// ── Allocation strategy ─────────────────────────────────────────────────────

/// Block placement scheme used when a file is created.
///
/// The strategy is recorded per file at allocation time and never
/// changed retroactively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationStrategy {
    /// One uninterrupted run of blocks, chosen best-fit.
    Contiguous,
    /// Individually chosen blocks in random order (simulated pointer chain).
    Linked,
    /// Lowest-numbered available blocks (simulated index block).
    Indexed,
}

impl AllocationStrategy {
    pub const ALL: [Self; 3] = [Self::Contiguous, Self::Linked, Self::Indexed];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contiguous => "contiguous",
            Self::Linked => "linked",
            Self::Indexed => "indexed",
        }
    }
}

impl fmt::Display for AllocationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AllocationStrategy {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contiguous" => Ok(Self::Contiguous),
            "linked" => Ok(Self::Linked),
            "indexed" => Ok(Self::Indexed),
            other => Err(ParseError::UnknownStrategy {
                name: other.to_owned(),
            }),
        }
    }
}

// ── File category ───────────────────────────────────────────────────────────

/// Coarse file classification inferred from the filename extension.
///
/// Drives synthetic default sizes and `cat` rendering; it carries no
/// enforcement semantics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Text,
    Image,
    Video,
    Audio,
    Document,
    Archive,
    Executable,
    Binary,
}

impl FileCategory {
    /// Classify a filename by its extension.
    ///
    /// No extension classifies as text; an unknown extension as binary.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let Some((_, ext)) = name.rsplit_once('.') else {
            return Self::Text;
        };
        match ext.to_ascii_lowercase().as_str() {
            "txt" | "md" | "py" | "js" | "html" | "css" | "json" | "xml" | "csv" => Self::Text,
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "svg" | "webp" => Self::Image,
            "mp4" | "avi" | "mkv" | "mov" | "wmv" | "flv" | "webm" => Self::Video,
            "mp3" | "wav" | "flac" | "aac" | "ogg" | "m4a" => Self::Audio,
            "pdf" | "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" => Self::Document,
            "zip" | "rar" | "7z" | "tar" | "gz" => Self::Archive,
            "exe" | "msi" | "deb" | "rpm" | "dmg" => Self::Executable,
            _ => Self::Binary,
        }
    }

    /// Inclusive byte range used when no explicit size or content is given.
    #[must_use]
    pub fn default_size_range(self) -> (u64, u64) {
        match self {
            Self::Text => (100, 5_000),
            Self::Image => (50_000, 2_000_000),
            Self::Video => (5_000_000, 50_000_000),
            Self::Audio => (1_000_000, 10_000_000),
            Self::Document => (10_000, 500_000),
            Self::Archive => (100_000, 10_000_000),
            Self::Executable => (1_000_000, 100_000_000),
            Self::Binary => (1_000, 50_000),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Document => "document",
            Self::Archive => "archive",
            Self::Executable => "executable",
            Self::Binary => "binary",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Permissions ─────────────────────────────────────────────────────────────

/// Canonical 9-character `rwx` permission string (owner/group/other).
///
/// Permissions are cosmetic metadata in the simulation; nothing
/// enforces them. They remain validated so listings stay well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permissions(String);

impl Permissions {
    /// Parse either a 3-digit octal mode or a literal 9-character
    /// `rwx-` string.
    ///
    /// Octal digits map bit-wise: 4 → `r`, 2 → `w`, 1 → `x`.
    pub fn parse(mode: &str) -> Result<Self, ParseError> {
        if mode.len() == 3 && mode.bytes().all(|b| b.is_ascii_digit()) {
            let mut rwx = String::with_capacity(9);
            for digit in mode.bytes() {
                let value = digit - b'0';
                if value > 7 {
                    return Err(ParseError::InvalidMode {
                        mode: mode.to_owned(),
                    });
                }
                rwx.push(if value & 4 != 0 { 'r' } else { '-' });
                rwx.push(if value & 2 != 0 { 'w' } else { '-' });
                rwx.push(if value & 1 != 0 { 'x' } else { '-' });
            }
            return Ok(Self(rwx));
        }

        if mode.len() == 9 && mode.chars().all(|c| matches!(c, 'r' | 'w' | 'x' | '-')) {
            return Ok(Self(mode.to_owned()));
        }

        Err(ParseError::InvalidMode {
            mode: mode.to_owned(),
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Permissions {
    fn default() -> Self {
        Self(DEFAULT_PERMISSIONS.to_owned())
    }
}

impl fmt::Display for Permissions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Permissions {
    type Error = ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Permissions> for String {
    fn from(value: Permissions) -> Self {
        value.0
    }
}

// ── Size formatting ─────────────────────────────────────────────────────────

/// Render a byte count as `B` / `KB` / `MB` / `GB` with one decimal
/// above the byte range (1024 base).
#[must_use]
#[expect(clippy::cast_precision_loss)]
pub fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    const GB: u64 = 1024 * 1024 * 1024;
    if size < KB {
        format!("{size}B")
    } else if size < MB {
        format!("{:.1}KB", size as f64 / KB as f64)
    } else if size < GB {
        format!("{:.1}MB", size as f64 / MB as f64)
    } else {
        format!("{:.1}GB", size as f64 / GB as f64)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocks_needed_rounds_up_with_floor_of_one() {
        assert_eq!(blocks_needed(0), 1);
        assert_eq!(blocks_needed(1), 1);
        assert_eq!(blocks_needed(BLOCK_SIZE), 1);
        assert_eq!(blocks_needed(BLOCK_SIZE + 1), 2);
        assert_eq!(blocks_needed(10 * BLOCK_SIZE), 10);
    }

    #[test]
    fn category_from_extension_table() {
        assert_eq!(FileCategory::from_name("readme.txt"), FileCategory::Text);
        assert_eq!(FileCategory::from_name("notes.md"), FileCategory::Text);
        assert_eq!(FileCategory::from_name("photo.JPG"), FileCategory::Image);
        assert_eq!(FileCategory::from_name("video.mp4"), FileCategory::Video);
        assert_eq!(FileCategory::from_name("music.flac"), FileCategory::Audio);
        assert_eq!(
            FileCategory::from_name("report.docx"),
            FileCategory::Document
        );
        assert_eq!(FileCategory::from_name("dump.tar"), FileCategory::Archive);
        assert_eq!(
            FileCategory::from_name("setup.exe"),
            FileCategory::Executable
        );
        assert_eq!(FileCategory::from_name("core.dat"), FileCategory::Binary);
    }

    #[test]
    fn category_without_extension_is_text() {
        assert_eq!(FileCategory::from_name("Makefile"), FileCategory::Text);
    }

    #[test]
    fn permissions_parse_octal() {
        assert_eq!(Permissions::parse("755").unwrap().as_str(), "rwxr-xr-x");
        assert_eq!(Permissions::parse("644").unwrap().as_str(), "rw-r--r--");
        assert_eq!(Permissions::parse("000").unwrap().as_str(), "---------");
        assert_eq!(Permissions::parse("777").unwrap().as_str(), "rwxrwxrwx");
    }

    #[test]
    fn permissions_parse_literal() {
        assert_eq!(Permissions::parse("rw-rw-r--").unwrap().as_str(), "rw-rw-r--");
    }

    #[test]
    fn permissions_reject_bad_modes() {
        for mode in ["75", "7555", "rwx", "rwxrwxrwxr", "rwzr-xr-x", "789", "abc"] {
            assert!(
                Permissions::parse(mode).is_err(),
                "mode {mode:?} should be rejected"
            );
        }
    }

    #[test]
    fn permissions_serde_round_trip() {
        let perms = Permissions::parse("640").unwrap();
        let json = serde_json::to_string(&perms).unwrap();
        assert_eq!(json, "\"rw-r-----\"");
        let back: Permissions = serde_json::from_str(&json).unwrap();
        assert_eq!(back, perms);
    }

    #[test]
    fn strategy_round_trips_through_str() {
        for strategy in AllocationStrategy::ALL {
            assert_eq!(
                strategy.as_str().parse::<AllocationStrategy>().unwrap(),
                strategy
            );
        }
        assert!("best-fit".parse::<AllocationStrategy>().is_err());
    }

    #[test]
    fn format_size_units() {
        assert_eq!(format_size(512), "512B");
        assert_eq!(format_size(2048), "2.0KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0GB");
    }
}
