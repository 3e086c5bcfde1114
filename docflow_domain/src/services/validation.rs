// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Validation (C3)
//!
//! Name/size/type admissibility rules. Pure and synchronous: no I/O, so it
//! runs identically inside the zip ingestion service (C6) and the document
//! pipeline (C7) direct-upload path.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Default supported extensions (§4.3); deployments may extend this set via
/// `ValidationConfig` without a code change.
pub const DEFAULT_SUPPORTED_EXTENSIONS: &[&str] =
    &["pdf", "docx", "xlsx", "pptx", "doc", "xls", "ppt", "msg", "txt", "rtf", "html"];

static DEFAULT_SUPPORTED_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| DEFAULT_SUPPORTED_EXTENSIONS.iter().copied().collect());

#[derive(Debug, Clone, thiserror::Error)]
pub enum ValidationError {
    #[error("file is empty")]
    EmptyFile,
    #[error("file name is blank")]
    BlankName,
    #[error("file name is only dots")]
    DotOnlyName,
    #[error("hidden files are not supported: {0}")]
    HiddenFile(String),
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),
}

pub struct FileValidator {
    supported_extensions: HashSet<String>,
}

impl FileValidator {
    pub fn new(supported_extensions: impl IntoIterator<Item = String>) -> Self {
        Self { supported_extensions: supported_extensions.into_iter().map(|e| e.to_ascii_lowercase()).collect() }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_SUPPORTED_SET.iter().map(|s| s.to_string()))
    }

    /// `validate(name, size)` (§4.3): fails on zero size, blank/dot-only
    /// basename, or a leading dot (hidden file).
    pub fn validate_name_and_size(&self, name: &str, size: u64) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::BlankName);
        }
        if trimmed.chars().all(|c| c == '.') {
            return Err(ValidationError::DotOnlyName);
        }
        if trimmed.starts_with('.') {
            return Err(ValidationError::HiddenFile(trimmed.to_string()));
        }
        Ok(())
    }

    pub fn is_supported(&self, extension: &str) -> bool {
        self.supported_extensions.contains(&extension.to_ascii_lowercase())
    }

    /// `validateFully`: the conjunction of name/size rules and the
    /// supported-type check.
    pub fn validate_fully(&self, name: &str, size: u64, extension: Option<&str>) -> Result<(), ValidationError> {
        self.validate_name_and_size(name, size)?;
        match extension {
            Some(extension) if self.is_supported(extension) => Ok(()),
            other => Err(ValidationError::UnsupportedType(other.unwrap_or("").to_string())),
        }
    }
}

impl Default for FileValidator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_byte_files() {
        let validator = FileValidator::with_defaults();
        assert!(matches!(validator.validate_name_and_size("a.pdf", 0), Err(ValidationError::EmptyFile)));
    }

    #[test]
    fn rejects_blank_and_dot_only_names() {
        let validator = FileValidator::with_defaults();
        assert!(matches!(validator.validate_name_and_size("   ", 10), Err(ValidationError::BlankName)));
        assert!(matches!(validator.validate_name_and_size("...", 10), Err(ValidationError::DotOnlyName)));
    }

    #[test]
    fn rejects_hidden_files() {
        let validator = FileValidator::with_defaults();
        assert!(matches!(validator.validate_name_and_size(".hidden", 10), Err(ValidationError::HiddenFile(_))));
    }

    #[test]
    fn accepts_well_formed_supported_file() {
        let validator = FileValidator::with_defaults();
        assert!(validator.validate_fully("report.pdf", 2048, Some("pdf")).is_ok());
    }

    #[test]
    fn rejects_unsupported_extension() {
        let validator = FileValidator::with_defaults();
        assert!(validator.validate_fully("archive.rar", 2048, Some("rar")).is_err());
    }

    #[test]
    fn custom_extension_set_overrides_defaults() {
        let validator = FileValidator::new(["zzz".to_string()]);
        assert!(validator.is_supported("zzz"));
        assert!(!validator.is_supported("pdf"));
    }
}
