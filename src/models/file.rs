// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User file metadata model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Folder a file is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Reportes,
    Certificados,
    Facturas,
    Guias,
    Imagenes,
}

impl FileCategory {
    pub const ALL: [FileCategory; 5] = [
        FileCategory::Reportes,
        FileCategory::Certificados,
        FileCategory::Facturas,
        FileCategory::Guias,
        FileCategory::Imagenes,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Reportes => "reportes",
            FileCategory::Certificados => "certificados",
            FileCategory::Facturas => "facturas",
            FileCategory::Guias => "guias",
            FileCategory::Imagenes => "imagenes",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FileCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FileCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown file category: {s}"))
    }
}

/// Metadata for one uploaded file. The blob lives at [`object_path`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct FileRecord {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "number"))]
    pub size_bytes: u64,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub uploaded_at: DateTime<Utc>,
    pub category: FileCategory,
    /// URL captured at upload time. May have expired; downloads re-resolve it.
    pub download_url: String,
}

/// Metadata fields written to the store, before an id is assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct FileMetadata {
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub uploaded_at: DateTime<Utc>,
    pub category: FileCategory,
    pub download_url: String,
}

impl FileMetadata {
    pub fn with_id(self, id: String) -> FileRecord {
        FileRecord {
            id,
            name: self.name,
            mime_type: self.mime_type,
            size_bytes: self.size_bytes,
            uploaded_at: self.uploaded_at,
            category: self.category,
            download_url: self.download_url,
        }
    }
}

/// A file received for upload.
#[derive(Debug, Clone)]
pub struct FileUpload {
    pub name: String,
    /// Declared content type; guessed from the name when absent
    pub mime_type: Option<String>,
    pub data: Vec<u8>,
}

/// Object store path for a user's file: `users/{uid}/{category}/{name}`.
pub fn object_path(user_id: &str, category: FileCategory, name: &str) -> String {
    format!("users/{}/{}/{}", user_id, category, name)
}

/// Human-readable size using 1024-based units, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let exponent = ((bytes as f64).ln() / 1024f64.ln()).floor() as usize;
    let exponent = exponent.min(UNITS.len() - 1);
    let value = bytes as f64 / 1024f64.powi(exponent as i32);

    // Two decimals, trailing zeros dropped.
    let rounded = format!("{:.2}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", trimmed, UNITS[exponent])
}

/// List filter for the files page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileFilter {
    pub category: Option<FileCategory>,
    pub search: Option<String>,
}

impl FileFilter {
    pub fn apply(&self, files: Vec<FileRecord>) -> Vec<FileRecord> {
        let term = self
            .search
            .as_deref()
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        files
            .into_iter()
            .filter(|f| self.category.map_or(true, |c| f.category == c))
            .filter(|f| {
                term.as_deref()
                    .map_or(true, |t| f.name.to_lowercase().contains(t))
            })
            .collect()
    }
}

/// Number of files per category, every category present.
pub fn count_by_category(files: &[FileRecord]) -> BTreeMap<FileCategory, usize> {
    let mut counts: BTreeMap<FileCategory, usize> =
        FileCategory::ALL.into_iter().map(|c| (c, 0)).collect();
    for file in files {
        *counts.entry(file.category).or_insert(0) += 1;
    }
    counts
}
