// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline RS
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Single-pass ZIP extraction over a non-seeking `AsyncRead` (§4.5).
//!
//! Built on `async_zip`'s streaming reader rather than the more common
//! seekable `zip` crate, since the source is a download stream from object
//! storage, not a local file with random access.

use async_zip::base::read::stream::ZipFileReader;
use docflow_domain::error::{DocFlowError, DocFlowResult};
use docflow_domain::value_objects::content_hash::ContentHash;
use docflow_domain::value_objects::object_key::ObjectKey;
use docflow_domain::value_objects::zip_entry::{normalize_and_filter, ExtractedEntry};
use sha2::{Digest, Sha256};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};

fn zip_err(context: &str, err: impl std::fmt::Display) -> DocFlowError {
    DocFlowError::TerminalZip(format!("{context}: {err}"))
}

pub struct ZipStreamProcessor {
    temp_dir: std::path::PathBuf,
}

impl ZipStreamProcessor {
    pub fn new(temp_dir: impl Into<std::path::PathBuf>) -> Self {
        Self { temp_dir: temp_dir.into() }
    }

    /// Extracts every admissible entry from `reader` into a temp file under
    /// `temp_dir`, computing its SHA-256 inline. Directories and the
    /// `__MACOSX`/dotfile noise `normalize_and_filter` rejects are skipped
    /// without ever touching disk. Does not recurse into nested `.zip`
    /// entries; callers re-invoke [`extract`](Self::extract) against each
    /// [`ExtractedEntry::is_nested_zip`] hit, reopened as a
    /// `tokio::fs::File`.
    pub async fn extract<R>(&self, reader: R) -> DocFlowResult<Vec<ExtractedEntry>>
    where
        R: AsyncRead + Unpin,
    {
        let mut zip = ZipFileReader::new(reader);
        let mut entries = Vec::new();
        let mut sequence: u64 = 0;

        while let Some(mut entry_reader) =
            zip.next_with_entry().await.map_err(|e| zip_err("read next zip entry", e))?
        {
            let reader_entry = entry_reader.reader();
            let raw_path = reader_entry.entry().filename().as_str().map_err(|e| zip_err("decode entry name", e))?.to_string();
            let is_dir = reader_entry.entry().dir().map_err(|e| zip_err("check entry type", e))?;

            sequence += 1;
            let normalized = normalize_and_filter(&raw_path, is_dir);

            zip = if let Some(normalized_path) = normalized {
                let temp_file = self.temp_path(sequence, &normalized_path);
                let size = self.drain_to_file(entry_reader.reader_mut(), &temp_file).await?;
                let next = entry_reader.done().await.map_err(|e| zip_err("finish zip entry", e))?;

                if size == 0 {
                    let _ = tokio::fs::remove_file(&temp_file).await;
                } else {
                    let sha256 = sha256_of_file(&temp_file).await?;
                    entries.push(ExtractedEntry { normalized_path, temp_file, sha256, size });
                }
                next
            } else {
                entry_reader.done().await.map_err(|e| zip_err("skip zip entry", e))?
            };
        }

        Ok(entries)
    }

    fn temp_path(&self, sequence: u64, normalized_path: &str) -> std::path::PathBuf {
        let file_name = normalized_path.rsplit('/').next().unwrap_or(normalized_path);
        let stamp = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or(0);
        self.temp_dir.join(format!("{stamp:x}-{sequence}-{}", ObjectKey::safe(file_name)))
    }

    async fn drain_to_file<R>(&self, mut entry_body: R, temp_file: &std::path::Path) -> DocFlowResult<u64>
    where
        R: AsyncRead + Unpin,
    {
        let mut out = File::create(temp_file).await.map_err(|e| zip_err("create temp file", e))?;
        let mut buf = vec![0u8; 64 * 1024];
        let mut total = 0u64;
        loop {
            let n = entry_body.read(&mut buf).await.map_err(|e| zip_err("read zip entry body", e))?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n]).await.map_err(|e| zip_err("write temp file", e))?;
            total += n as u64;
        }
        out.flush().await.map_err(|e| zip_err("flush temp file", e))?;
        Ok(total)
    }
}

async fn sha256_of_file(path: &std::path::Path) -> DocFlowResult<ContentHash> {
    let mut file = File::open(path).await.map_err(|e| zip_err("reopen temp file for hashing", e))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = file.read(&mut buf).await.map_err(|e| zip_err("read temp file for hashing", e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(ContentHash::of_bytes(&hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temp_file_names_are_sanitized() {
        assert_eq!(ObjectKey::safe("report (final).pdf"), "report__final_.pdf");
    }
}
