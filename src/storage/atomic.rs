//! JSON file helpers with write-then-rename semantics

use crate::storage::traits::StorageResult;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Sibling path a file is staged at before being renamed into place
pub fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("state"));
    name.push(".tmp");
    path.with_file_name(name)
}

/// Serializes `value` as pretty JSON and atomically replaces `path` with it
///
/// The data is written and synced to a sibling `.tmp` file first, so a crash
/// leaves either the old content or the new content, never a torn file.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> StorageResult<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let staged = staging_path(path);
    let result = write_and_sync(&staged, value)
        .and_then(|()| fs::rename(&staged, path).map_err(Into::into));

    if result.is_err() {
        let _ = fs::remove_file(&staged);
    }

    result
}

fn write_and_sync<T: Serialize + ?Sized>(path: &Path, value: &T) -> StorageResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}

/// Reads a JSON document, returning `Ok(None)` if the file does not exist
pub fn read_json<T: DeserializeOwned>(path: &Path) -> StorageResult<Option<T>> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let value = serde_json::from_reader(BufReader::new(file))?;
    Ok(Some(value))
}

/// Removes a file, treating a missing file as already removed
pub fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
