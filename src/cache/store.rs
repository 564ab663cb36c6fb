//! Raw entry file I/O
//!
//! These functions know nothing about ordering; callers run them inside the
//! execution context of the key they touch.

use super::path::PathResolver;
use crate::error::{RescacheError, RescacheResult};
use serde::Serialize;
use std::io::ErrorKind;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// How entry bytes reach the disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Write a sibling temp file, then rename it over the entry
    #[default]
    Atomic,
    /// Truncate and write the entry in place
    Direct,
}

/// One entry file found under the cache root
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntryInfo {
    /// File name inside the cache root
    pub file_name: String,

    /// Resource id, when the file name is reversible
    pub resource: Option<String>,

    /// Size in bytes
    pub size: u64,
}

/// Read an entry; `Ok(None)` when it does not exist
pub async fn read_entry(path: &Path) -> RescacheResult<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(RescacheError::io(
            format!("reading cache entry {}", path.display()),
            e,
        )),
    }
}

/// Write an entry, creating the cache root first if needed
pub async fn write_entry(path: &Path, bytes: &[u8], mode: WriteMode) -> RescacheResult<()> {
    ensure_parent(path).await;

    match mode {
        WriteMode::Direct => fs::write(path, bytes).await.map_err(|e| {
            RescacheError::io(format!("writing cache entry {}", path.display()), e)
        }),
        WriteMode::Atomic => write_atomic(path, bytes).await,
    }
}

/// Remove an entry; returns whether a file was removed
pub async fn remove_entry(path: &Path) -> RescacheResult<bool> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(RescacheError::io(
            format!("removing cache entry {}", path.display()),
            e,
        )),
    }
}

/// Remove the whole cache root; returns whether anything was removed
pub async fn remove_root(root: &Path) -> std::io::Result<bool> {
    match fs::remove_dir_all(root).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// List entry files under the cache root, sorted by file name
///
/// Temp files and subdirectories are skipped. A missing root is empty.
pub async fn list_entries(root: &Path) -> RescacheResult<Vec<CacheEntryInfo>> {
    let mut entries = match fs::read_dir(root).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(vec![]),
        Err(e) => {
            return Err(RescacheError::io(
                format!("reading cache directory {}", root.display()),
                e,
            ))
        }
    };

    let mut found = vec![];
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| RescacheError::io("reading cache directory entry", e))?
    {
        let file_name = entry.file_name().to_string_lossy().into_owned();
        if PathResolver::is_temp_name(&file_name) {
            continue;
        }

        // Entries can vanish between read_dir and metadata under concurrent deletes
        let Ok(metadata) = entry.metadata().await else {
            continue;
        };
        if !metadata.is_file() {
            continue;
        }

        found.push(CacheEntryInfo {
            resource: PathResolver::resource_for(&file_name),
            file_name,
            size: metadata.len(),
        });
    }

    found.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(found)
}

async fn ensure_parent(path: &Path) {
    let Some(parent) = path.parent() else {
        return;
    };
    if fs::metadata(parent).await.is_ok() {
        return;
    }
    // Another writer may be creating the same directory; only existence matters
    if let Err(e) = fs::create_dir_all(parent).await {
        debug!("Ignoring cache directory creation error for {}: {}", parent.display(), e);
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> RescacheResult<()> {
    let temp = PathResolver::temp_path_for(path);

    if let Err(e) = write_synced(&temp, bytes).await {
        let _ = fs::remove_file(&temp).await;
        return Err(RescacheError::io(
            format!("writing temp file {}", temp.display()),
            e,
        ));
    }

    if let Err(e) = fs::rename(&temp, path).await {
        let _ = fs::remove_file(&temp).await;
        return Err(RescacheError::io(
            format!("renaming {} into place", temp.display()),
            e,
        ));
    }

    Ok(())
}

async fn write_synced(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}
