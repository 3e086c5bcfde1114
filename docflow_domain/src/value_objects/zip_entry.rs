// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The data shape emitted per ZIP entry by the streaming processor (§4.5).

use super::content_hash::ContentHash;
use std::path::PathBuf;

/// One admissible entry extracted from a ZIP stream.
///
/// Directories, `__MACOSX`/`.DS_Store`/`Thumbs.db` noise, AppleDouble
/// (`._*`) files, and zero-byte entries never reach this type — the
/// processor filters and deletes their temp files before emitting.
#[derive(Debug)]
pub struct ExtractedEntry {
    /// Path inside the archive, normalized to forward slashes.
    pub normalized_path: String,
    /// Temp file holding the entry's bytes.
    pub temp_file: PathBuf,
    /// SHA-256 of the entry's bytes, computed inline while streaming.
    pub sha256: ContentHash,
    /// Byte size of the entry.
    pub size: u64,
}

impl ExtractedEntry {
    /// The basename, e.g. `"report.pdf"` for `"2024/report.pdf"`.
    pub fn file_name(&self) -> &str {
        self.normalized_path.rsplit('/').next().unwrap_or(&self.normalized_path)
    }

    /// The extension, lowercased, without the leading dot.
    pub fn extension(&self) -> Option<String> {
        self.file_name().rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())
    }

    /// First path segment, used to resolve the per-tenant bucket name for
    /// bulk uploads. `None` for a root-level entry (no `/` in the path) —
    /// a bulk ZIP requires every entry to live under a bucket directory.
    pub fn first_path_segment(&self) -> Option<&str> {
        let (segment, _) = self.normalized_path.split_once('/')?;
        if segment.is_empty() {
            None
        } else {
            Some(segment)
        }
    }

    /// Whether this entry's name marks it as a nested archive to recurse
    /// into.
    pub fn is_nested_zip(&self) -> bool {
        self.extension().as_deref() == Some("zip")
    }
}

/// Names the normalizer must treat as noise regardless of path depth.
pub const IGNORED_BASENAMES: &[&str] = &["__MACOSX", ".DS_Store", "Thumbs.db"];

/// Normalize a raw archive path: backslashes to slashes, and report whether
/// the entry should be skipped per §4.5's filter rules.
pub fn normalize_and_filter(raw_path: &str, is_directory: bool) -> Option<String> {
    let normalized = raw_path.replace('\\', "/");
    if is_directory || normalized.ends_with('/') {
        return None;
    }
    let basename = normalized.rsplit('/').next().unwrap_or(&normalized);
    if basename.starts_with("._") {
        return None;
    }
    if IGNORED_BASENAMES.iter().any(|ignored| normalized.split('/').any(|seg| seg == *ignored)) {
        return None;
    }
    Some(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_backslashes() {
        assert_eq!(normalize_and_filter("a\\b\\c.pdf", false).unwrap(), "a/b/c.pdf");
    }

    #[test]
    fn filters_directories_and_macosx_noise() {
        assert!(normalize_and_filter("dir/", true).is_none());
        assert!(normalize_and_filter("__MACOSX/a.pdf", false).is_none());
        assert!(normalize_and_filter("dir/._a.pdf", false).is_none());
        assert!(normalize_and_filter("dir/.DS_Store", false).is_none());
    }

    #[test]
    fn keeps_ordinary_files() {
        assert_eq!(normalize_and_filter("docs/a.pdf", false).unwrap(), "docs/a.pdf");
    }
}
