//! Resource id to file path mapping
//!
//! Every entry lives directly under the cache root. File names are the
//! percent-encoded resource id, with a few extra rules:
//!
//! - a leading `.` is escaped as `%2E`, so names never start with a dot
//!   (dot-names are temp files, and `.`/`..` are not valid entries);
//! - a leading `~` is escaped as `%7E`, because `~` starts hashed names;
//! - ASCII uppercase letters are escaped (`A` becomes `%41`), so names stay
//!   distinct on case-insensitive filesystems;
//! - a trailing `.` is escaped, and so is the first letter of a Windows
//!   device name (`con`, `nul.json`, `com1`), which Windows would otherwise
//!   strip or reserve.
//!
//! Encodings longer than [`MAX_ENCODED_LEN`] are replaced by `~` followed by
//! the SHA-256 of the id, keeping names under common filesystem limits
//! without truncating.

use super::resource::ResourceId;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Longest percent-encoded file name kept verbatim
pub const MAX_ENCODED_LEN: usize = 200;

/// Prefix of hashed file names
pub const HASHED_PREFIX: char = '~';

/// Prefix of in-flight temp files
pub const TEMP_PREFIX: char = '.';

/// Maps resource ids to entry paths under one cache root
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
}

impl PathResolver {
    /// Create a resolver rooted at `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The cache root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute entry path for a resource
    pub fn path_for(&self, id: &ResourceId) -> PathBuf {
        self.root.join(Self::file_name(id))
    }

    /// Entry file name for a resource
    pub fn file_name(id: &ResourceId) -> String {
        encode_name(id.as_str())
    }

    /// Temp file used while atomically replacing `entry`
    pub fn temp_path_for(entry: &Path) -> PathBuf {
        let name = entry
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        entry.with_file_name(format!("{}{}.tmp", TEMP_PREFIX, name))
    }

    /// Recover the resource id string behind an entry file name
    ///
    /// Returns `None` for hashed names, temp files and anything this resolver
    /// would not have produced.
    pub fn resource_for(file_name: &str) -> Option<String> {
        if file_name.starts_with(HASHED_PREFIX) || file_name.starts_with(TEMP_PREFIX) {
            return None;
        }
        let decoded = urlencoding::decode(file_name).ok()?.into_owned();
        (encode_name(&decoded) == file_name).then_some(decoded)
    }

    /// Whether a file name is an in-flight temp file
    pub fn is_temp_name(file_name: &str) -> bool {
        file_name.starts_with(TEMP_PREFIX)
    }
}

fn encode_name(id: &str) -> String {
    let mut name = escape_uppercase(&urlencoding::encode(id));

    if let Some(first) = name.chars().next() {
        if first == '.' || first == HASHED_PREFIX || is_device_name(&name) {
            name = format!("{}{}", percent(first), &name[first.len_utf8()..]);
        }
    }
    if name.ends_with('.') {
        name.pop();
        name.push_str("%2E");
    }

    if name.len() > MAX_ENCODED_LEN {
        format!("{}{}", HASHED_PREFIX, hex::encode(Sha256::digest(id.as_bytes())))
    } else {
        name
    }
}

/// Escape ASCII uppercase letters outside existing `%XX` sequences
fn escape_uppercase(encoded: &str) -> String {
    let mut out = String::with_capacity(encoded.len());
    let mut pending_hex = 0;
    for c in encoded.chars() {
        if pending_hex > 0 {
            pending_hex -= 1;
            out.push(c);
        } else if c == '%' {
            pending_hex = 2;
            out.push(c);
        } else if c.is_ascii_uppercase() {
            out.push_str(&percent(c));
        } else {
            out.push(c);
        }
    }
    out
}

/// Whether the part before the first `.` is a reserved Windows device name
fn is_device_name(name: &str) -> bool {
    const DEVICES: &[&str] = &["con", "prn", "aux", "nul"];
    let stem = name.split('.').next().unwrap_or_default();
    if DEVICES.contains(&stem) {
        return true;
    }
    match stem.strip_prefix("com").or_else(|| stem.strip_prefix("lpt")) {
        Some(digit) => matches!(digit.as_bytes(), [b'0'..=b'9']),
        None => false,
    }
}

fn percent(c: char) -> String {
    // Only called with ASCII characters
    format!("%{:02X}", c as u32)
}
