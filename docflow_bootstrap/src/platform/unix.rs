// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Unix Platform Implementation
//!
//! POSIX implementation covering Linux and macOS via `libc`.
//!
//! ## Unix APIs Used
//!
//! - `sysconf(_SC_PAGESIZE)` / `sysconf(_SC_NPROCESSORS_ONLN)` - system limits
//! - `/proc/meminfo` on Linux for memory totals (falls back to `sysconf` elsewhere)
//! - `geteuid` - privilege checking
//! - File permission bits via `std::os::unix::fs::PermissionsExt`

use super::{Platform, PlatformError};
use async_trait::async_trait;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

/// Unix platform implementation (Linux, macOS)
pub struct UnixPlatform;

impl UnixPlatform {
    /// Create a new Unix platform instance
    pub fn new() -> Self {
        Self
    }

    fn page_size_impl() -> usize {
        let result = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
        if result > 0 {
            result as usize
        } else {
            4096
        }
    }

    fn cpu_count_impl() -> usize {
        let result = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
        if result > 0 {
            result as usize
        } else {
            1
        }
    }

    fn memory_info_impl() -> Result<(u64, u64), PlatformError> {
        #[cfg(target_os = "linux")]
        {
            Self::memory_info_from_proc()
        }
        #[cfg(not(target_os = "linux"))]
        {
            let page_size = Self::page_size_impl() as u64;
            let pages = unsafe { libc::sysconf(libc::_SC_PHYS_PAGES) };
            if pages > 0 {
                let total = pages as u64 * page_size;
                Ok((total, total))
            } else {
                Err(PlatformError::Other("unable to query physical memory".to_string()))
            }
        }
    }

    #[cfg(target_os = "linux")]
    fn memory_info_from_proc() -> Result<(u64, u64), PlatformError> {
        let contents = std::fs::read_to_string("/proc/meminfo")?;
        let mut total_kb = None;
        let mut available_kb = None;

        for line in contents.lines() {
            if let Some(value) = line.strip_prefix("MemTotal:") {
                total_kb = parse_meminfo_kb(value);
            } else if let Some(value) = line.strip_prefix("MemAvailable:") {
                available_kb = parse_meminfo_kb(value);
            }
        }

        match (total_kb, available_kb) {
            (Some(total), Some(available)) => Ok((total * 1024, available * 1024)),
            _ => Err(PlatformError::Other("MemTotal/MemAvailable not found in /proc/meminfo".to_string())),
        }
    }
}

#[cfg(target_os = "linux")]
fn parse_meminfo_kb(value: &str) -> Option<u64> {
    value.trim().trim_end_matches(" kB").trim().parse().ok()
}

impl Default for UnixPlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Platform for UnixPlatform {
    fn page_size(&self) -> usize {
        Self::page_size_impl()
    }

    fn cpu_count(&self) -> usize {
        Self::cpu_count_impl()
    }

    fn total_memory(&self) -> Result<u64, PlatformError> {
        Self::memory_info_impl().map(|(total, _)| total)
    }

    fn available_memory(&self) -> Result<u64, PlatformError> {
        Self::memory_info_impl().map(|(_, available)| available)
    }

    fn line_separator(&self) -> &'static str {
        "\n"
    }

    fn path_separator(&self) -> char {
        ':'
    }

    fn platform_name(&self) -> &'static str {
        if cfg!(target_os = "macos") {
            "macos"
        } else {
            "linux"
        }
    }

    fn temp_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }

    fn is_elevated(&self) -> bool {
        unsafe { libc::geteuid() == 0 }
    }

    fn set_permissions(&self, path: &Path, mode: u32) -> Result<(), PlatformError> {
        let permissions = std::fs::Permissions::from_mode(mode);
        std::fs::set_permissions(path, permissions)?;
        Ok(())
    }

    fn is_executable(&self, path: &Path) -> bool {
        match std::fs::metadata(path) {
            Ok(metadata) => metadata.permissions().mode() & 0o111 != 0,
            Err(_) => false,
        }
    }

    async fn sync_file(&self, file: &tokio::fs::File) -> Result<(), PlatformError> {
        file.sync_all().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unix_platform_basics() {
        let platform = UnixPlatform::new();
        assert!(platform.cpu_count() >= 1);
        let page_size = platform.page_size();
        assert!(page_size >= 512);
        assert!(page_size <= 65536);
    }

    #[test]
    fn test_unix_platform_constants() {
        let platform = UnixPlatform::new();
        assert_eq!(platform.line_separator(), "\n");
        assert_eq!(platform.path_separator(), ':');
    }

    #[test]
    fn test_temp_dir() {
        let platform = UnixPlatform::new();
        assert!(!platform.temp_dir().as_os_str().is_empty());
    }

    #[test]
    fn test_is_executable_nonexistent() {
        let platform = UnixPlatform::new();
        assert!(!platform.is_executable(Path::new("/nonexistent/path/to/file")));
    }
}
