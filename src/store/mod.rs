// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-BlueprintStudio-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Blueprint Studio and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! On-disk storage for blueprints and their uploaded assets.
//!
//! A workspace directory holds `records/<record-id>.json` files and an asset tree laid out as
//! `<namespace>/<blueprint-id>/<file>`. Every write goes through a temp file that is renamed
//! into place, so readers never observe a partially written file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::model::IdError;
use crate::persist::PersistError;

mod folder_assets;
mod folder_store;

pub use folder_assets::{sanitize_file_name, FolderAssets};
pub use folder_store::{FolderStore, StoredRecord};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("json error at {path:?}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid {field} '{value}': {source}")]
    InvalidId {
        field: &'static str,
        value: String,
        #[source]
        source: IdError,
    },
    #[error("{field} '{value}' is not a safe path segment")]
    UnsafeSegment { field: &'static str, value: String },
    #[error("refusing to write through symlink at {path:?}")]
    SymlinkRefused { path: PathBuf },
}

impl StoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io { path: path.to_path_buf(), source }
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::PermissionDenied)
    }
}

impl From<StoreError> for PersistError {
    fn from(err: StoreError) -> Self {
        if err.is_permission_denied() {
            Self::Unauthorized { message: err.to_string() }
        } else {
            Self::Failed { message: err.to_string() }
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum WriteDurability {
    /// Writes a temp file and renames it into place. No fsync.
    #[default]
    BestEffort,

    /// Also syncs the file and its directory before returning.
    /// Exact guarantees are platform/filesystem-dependent.
    Durable,
}

impl WriteDurability {
    pub fn from_flag(durable: bool) -> Self {
        if durable {
            Self::Durable
        } else {
            Self::BestEffort
        }
    }
}

/// Rejects ids that would escape their directory once used as a file or directory name.
fn safe_segment<'a>(field: &'static str, value: &'a str) -> Result<&'a str, StoreError> {
    let unsafe_segment = value.is_empty()
        || value.starts_with('.')
        || value.chars().any(|c| matches!(c, '/' | '\\' | ':') || c.is_control());
    if unsafe_segment {
        return Err(StoreError::UnsafeSegment { field, value: value.to_owned() });
    }
    Ok(value)
}

fn rename_overwrite(from: &Path, to: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        match fs::rename(from, to) {
            Ok(()) => Ok(()),
            Err(err)
                if matches!(
                    err.kind(),
                    io::ErrorKind::AlreadyExists | io::ErrorKind::PermissionDenied
                ) =>
            {
                let _ = fs::remove_file(to);
                fs::rename(from, to)
            }
            Err(err) => Err(err),
        }
    }

    #[cfg(not(windows))]
    {
        fs::rename(from, to)
    }
}

/// Writes `contents` to `path` through a sibling temp file, creating parent directories.
fn write_atomic(path: &Path, contents: &[u8], durability: WriteDurability) -> Result<(), StoreError> {
    let Some(parent) = path.parent() else {
        return Err(StoreError::io(path, io::Error::other("path has no parent")));
    };
    let Some(file_name) = path.file_name() else {
        return Err(StoreError::io(path, io::Error::other("path has no file name")));
    };
    fs::create_dir_all(parent).map_err(|source| StoreError::io(parent, source))?;

    match fs::symlink_metadata(path) {
        Ok(md) if md.file_type().is_symlink() => {
            return Err(StoreError::SymlinkRefused { path: path.to_path_buf() });
        }
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(source) => return Err(StoreError::io(path, source)),
    }

    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_nanos();
    let tmp_path =
        parent.join(format!(".blueprint.tmp.{}.{}", file_name.to_string_lossy(), nanos));

    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&tmp_path)
        .map_err(|source| StoreError::io(&tmp_path, source))?;
    file.write_all(contents).map_err(|source| StoreError::io(&tmp_path, source))?;
    if durability == WriteDurability::Durable {
        file.sync_all().map_err(|source| StoreError::io(&tmp_path, source))?;
    }
    drop(file);

    if let Err(source) = rename_overwrite(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StoreError::io(path, source));
    }

    if durability == WriteDurability::Durable {
        #[cfg(unix)]
        {
            let dir = fs::File::open(parent).map_err(|source| StoreError::io(parent, source))?;
            dir.sync_all().map_err(|source| StoreError::io(parent, source))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests;
