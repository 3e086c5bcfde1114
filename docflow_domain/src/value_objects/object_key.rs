// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Deterministic object storage key construction (§4.1).

use super::ids::{GxBucketId, JobId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An object storage key, constructed deterministically from a job/bucket
/// and a sanitized file name so tests can assert on it directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Sentinel used when a `FileMaster` has no location yet (e.g. ignored
    /// entries).
    pub const NOT_APPLICABLE: &'static str = "N/A";

    /// Replace every character outside `[A-Za-z0-9._-]` with `_`.
    pub fn safe(name: &str) -> String {
        name.chars()
            .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
            .collect()
    }

    /// `"{bucket}/source/{job}/{safe}"`, or `"bulk/source/{job}/{safe}"` when
    /// the job has no bucket.
    pub fn source(bucket: Option<GxBucketId>, job: JobId, file_name: &str) -> Self {
        Self(Self::build("source", bucket, job, file_name))
    }

    /// `"{bucket}/files/{job}/{safe}"`, or `"bulk/files/{job}/{safe}"`.
    pub fn files(bucket: Option<GxBucketId>, job: JobId, file_name: &str) -> Self {
        Self(Self::build("files", bucket, job, file_name))
    }

    fn build(segment: &str, bucket: Option<GxBucketId>, job: JobId, file_name: &str) -> String {
        let prefix = bucket.map(|b| b.to_string()).unwrap_or_else(|| "bulk".to_string());
        format!("{prefix}/{segment}/{job}/{}", Self::safe(file_name))
    }

    pub fn not_applicable() -> Self {
        Self(Self::NOT_APPLICABLE.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for ObjectKey {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_replaces_disallowed_characters() {
        assert_eq!(ObjectKey::safe("report (final).pdf"), "report__final_.pdf");
    }

    #[test]
    fn single_bucket_keys_use_bucket_prefix() {
        let key = ObjectKey::source(Some(GxBucketId::new(42)), JobId::new(1), "a.pdf");
        assert_eq!(key.as_str(), "42/source/1/a.pdf");
    }

    #[test]
    fn bulk_keys_use_bulk_prefix() {
        let key = ObjectKey::files(None, JobId::new(1), "a.pdf");
        assert_eq!(key.as_str(), "bulk/files/1/a.pdf");
    }

    #[test]
    fn is_deterministic_across_calls() {
        let a = ObjectKey::source(Some(GxBucketId::new(7)), JobId::new(3), "x.pdf");
        let b = ObjectKey::source(Some(GxBucketId::new(7)), JobId::new(3), "x.pdf");
        assert_eq!(a, b);
    }
}
