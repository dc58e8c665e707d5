//! Random-access indexes over tar archive entry tables.
//!
//! A [`TarIndex`] maps entry paths inside an uncompressed tar archive to
//! byte ranges within the archive, so individual files can be served
//! straight out of the stored blob without extracting it. Construction
//! walks entry headers only; file contents are never read.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

/// Byte range of a file entry within its archive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntrySpan {
    /// Offset of the entry's data from the start of the archive.
    pub offset: u64,
    /// Size of the entry's data in bytes.
    pub size: u64,
}

/// Result of resolving a logical path against a [`TarIndex`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryLocation {
    /// The path names a file entry at the given byte range.
    File(EntrySpan),
    /// The path names a directory (including the implicit root).
    Directory,
}

/// An entry-table index over a tar archive.
///
/// Documentation tarballs conventionally wrap everything in a single
/// top-level directory (`mylib-1.0-docs/...`). When every entry shares one
/// top-level directory, construction strips that component and resolves
/// logical paths relative to the content root; the stripped name is kept
/// for display. Archives without a unique top-level directory are indexed
/// as-is.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TarIndex {
    files: BTreeMap<String, EntrySpan>,
    dirs: BTreeSet<String>,
    stripped_root: Option<String>,
    total_file_bytes: u64,
}

impl TarIndex {
    /// Build an index by scanning tar headers from a reader.
    ///
    /// Fails with [`Error::ArchiveParse`](crate::Error::ArchiveParse) on
    /// malformed headers (bad magic, checksum mismatch, truncation).
    pub fn from_reader<R: Read>(reader: R) -> crate::Result<Self> {
        let mut archive = tar::Archive::new(reader);
        let mut files: BTreeMap<String, EntrySpan> = BTreeMap::new();
        let mut dirs: BTreeSet<String> = BTreeSet::new();

        let entries = archive.entries().map_err(parse_error)?;
        for entry in entries {
            let entry = entry.map_err(parse_error)?;
            let Some(path) = normalize_entry_path(&entry.path_bytes())? else {
                continue;
            };

            let entry_type = entry.header().entry_type();
            if entry_type.is_dir() {
                dirs.insert(path);
            } else if entry_type.is_file() {
                let span = EntrySpan {
                    offset: entry.raw_file_position(),
                    size: entry.size(),
                };
                files.insert(path, span);
            }
            // Links, fifos and device nodes carry no servable bytes.
        }

        // Every ancestor of an entry is a directory, whether or not the
        // archive carries an explicit entry for it.
        for path in files.keys().cloned().chain(dirs.iter().cloned()).collect::<Vec<_>>() {
            let mut idx = 0;
            while let Some(pos) = path[idx..].find('/') {
                idx += pos;
                dirs.insert(path[..idx].to_string());
                idx += 1;
            }
        }

        let (files, dirs, stripped_root) = strip_sole_root(files, dirs);
        let total_file_bytes = files.values().map(|span| span.size).sum();

        Ok(Self {
            files,
            dirs,
            stripped_root,
            total_file_bytes,
        })
    }

    /// Build an index from an in-memory archive.
    pub fn from_bytes(bytes: &[u8]) -> crate::Result<Self> {
        Self::from_reader(bytes)
    }

    /// Build an index from an archive persisted on disk.
    ///
    /// Produces the identical index as [`from_bytes`](Self::from_bytes)
    /// for the same byte content.
    pub fn from_path(path: &Path) -> crate::Result<Self> {
        let file = std::fs::File::open(path).map_err(parse_error)?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Resolve a slash-separated logical path.
    ///
    /// The empty path (or any run of slashes) is the root directory.
    pub fn lookup(&self, path: &str) -> Option<EntryLocation> {
        let path = path.trim_matches('/');
        if path.is_empty() {
            return Some(EntryLocation::Directory);
        }
        if let Some(span) = self.files.get(path) {
            return Some(EntryLocation::File(*span));
        }
        if self.dirs.contains(path) {
            return Some(EntryLocation::Directory);
        }
        None
    }

    /// Iterate over all indexed file paths.
    pub fn file_paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Number of file entries in the index.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Sum of all file entry sizes, for accounting.
    pub fn total_file_bytes(&self) -> u64 {
        self.total_file_bytes
    }

    /// The top-level directory stripped at construction, if any.
    pub fn stripped_root(&self) -> Option<&str> {
        self.stripped_root.as_deref()
    }
}

fn parse_error(e: std::io::Error) -> crate::Error {
    crate::Error::ArchiveParse(e.to_string())
}

/// Normalize an entry path: forward slashes only, no `.` or empty
/// components, `..` rejected. Returns `None` for the archive root (`./`).
fn normalize_entry_path(bytes: &[u8]) -> crate::Result<Option<String>> {
    let raw = std::str::from_utf8(bytes)
        .map_err(|_| crate::Error::ArchiveParse("entry path is not valid UTF-8".to_string()))?;

    let mut parts = Vec::new();
    for component in raw.split('/') {
        match component {
            "" | "." => continue,
            ".." => {
                return Err(crate::Error::ArchiveParse(format!(
                    "entry path escapes archive root: {raw}"
                )));
            }
            c => parts.push(c),
        }
    }

    if parts.is_empty() {
        Ok(None)
    } else {
        Ok(Some(parts.join("/")))
    }
}

/// If every entry lives under a single top-level directory, strip it so
/// logical paths resolve relative to the content root.
fn strip_sole_root(
    files: BTreeMap<String, EntrySpan>,
    dirs: BTreeSet<String>,
) -> (BTreeMap<String, EntrySpan>, BTreeSet<String>, Option<String>) {
    let tops: BTreeSet<&str> = files
        .keys()
        .chain(dirs.iter())
        .map(|p| p.split('/').next().unwrap_or(""))
        .collect();

    if tops.len() != 1 {
        return (files, dirs, None);
    }
    let root = tops.into_iter().next().unwrap().to_string();
    if files.contains_key(&root) {
        // Sole top-level entry is a file; nothing to strip.
        return (files, dirs, None);
    }

    let prefix = format!("{root}/");
    let files = files
        .into_iter()
        .map(|(path, span)| (path[prefix.len()..].to_string(), span))
        .collect();
    let dirs = dirs
        .into_iter()
        .filter(|d| *d != root)
        .map(|d| d[prefix.len()..].to_string())
        .collect();
    (files, dirs, Some(root))
}
