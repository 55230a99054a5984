//! Utility functions and helpers for the import pipeline.
//!
//! This module provides common utility functions used throughout the
//! pipeline: file system helpers, namespace validation, and byte-size
//! formatting for progress/log output.

use std::path::{Path, PathBuf};

use crate::error::Result;

/// File system utilities
pub mod fs {
    use super::*;

    /// Ensure directory exists, create if not
    pub fn ensure_dir_exists<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            std::fs::create_dir_all(path)?;
        }
        Ok(())
    }

    /// Check if path is a valid, readable file
    pub fn is_valid_file<P: AsRef<Path>>(path: P) -> bool {
        let path = path.as_ref();
        path.exists() && path.is_file()
    }

    /// Normalize a path the same way regardless of host platform: strip a
    /// leading `~/` and resolve it relative to the user's home directory.
    pub fn to_universal_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/")
            && let Some(home) = dirs::home_dir()
        {
            return home.join(rest);
        }
        PathBuf::from(path)
    }
}

/// Namespace validation utilities.
pub mod validate {
    /// Validate MongoDB database name.
    pub fn is_valid_database_name(name: &str) -> bool {
        if name.is_empty() || name.len() > 64 {
            return false;
        }

        let invalid_chars = ['/', '\\', '.', ' ', '"', '$', '*', '<', '>', ':', '|', '?'];
        !name.chars().any(|c| invalid_chars.contains(&c))
    }

    /// Validate MongoDB collection name.
    pub fn is_valid_collection_name(name: &str) -> bool {
        if name.is_empty() || name.len() > 120 {
            return false;
        }

        if name.starts_with("system.") {
            return false;
        }

        let invalid_chars = ['$', '\0'];
        !name.chars().any(|c| invalid_chars.contains(&c))
    }

    /// Validate MongoDB connection URI.
    pub fn is_valid_connection_uri(uri: &str) -> bool {
        uri.starts_with("mongodb://") || uri.starts_with("mongodb+srv://")
    }
}

/// Conversion utilities.
pub mod convert {
    /// Format bytes as human-readable size (e.g. "1.5 MB"), used in progress
    /// reporting and log lines.
    pub fn format_bytes(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_database_name() {
        assert!(validate::is_valid_database_name("mydb"));
        assert!(validate::is_valid_database_name("test123"));
        assert!(!validate::is_valid_database_name("my/db"));
        assert!(!validate::is_valid_database_name(""));
    }

    #[test]
    fn test_valid_collection_name() {
        assert!(validate::is_valid_collection_name("users"));
        assert!(validate::is_valid_collection_name("my_collection"));
        assert!(!validate::is_valid_collection_name("system.users"));
        assert!(!validate::is_valid_collection_name("invalid$name"));
    }

    #[test]
    fn test_valid_connection_uri() {
        assert!(validate::is_valid_connection_uri(
            "mongodb://localhost:27017"
        ));
        assert!(validate::is_valid_connection_uri(
            "mongodb+srv://cluster.example.com"
        ));
        assert!(!validate::is_valid_connection_uri("http://localhost"));
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(convert::format_bytes(500), "500 B");
        assert_eq!(convert::format_bytes(1024), "1.00 KB");
        assert_eq!(convert::format_bytes(1024 * 1024), "1.00 MB");
    }

    #[test]
    fn test_to_universal_path() {
        assert_eq!(fs::to_universal_path("/tmp/x.csv"), PathBuf::from("/tmp/x.csv"));
    }
}
