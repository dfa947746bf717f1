use crate::errors::RetrainError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub fn items_to_strings(items: Vec<&str>) -> String {
    let mut s = String::new();
    for i in items {
        s.push_str(i);
        s.push_str(&String::from(", "));
    }
    s
}

/// Sibling path used while a file is being written.
pub fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Serialize `value` as json into the temporary sibling of `path`, creating
/// the parent directory when needed. Returns the temporary path.
pub fn write_json_tmp<T: Serialize>(value: &T, path: &Path) -> Result<PathBuf, RetrainError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| RetrainError::UnableToWrite(e.to_string()))?;
    }
    let json = serde_json::to_string(value).map_err(|e| RetrainError::UnableToWrite(e.to_string()))?;
    let tmp = temporary_path(path);
    fs::write(&tmp, json).map_err(|e| RetrainError::UnableToWrite(format!("{}: {}", tmp.display(), e)))?;
    Ok(tmp)
}

/// Serialize `value` as json and move it into `path` in a single rename,
/// so readers see either the previous file or the complete new one.
pub fn write_json_atomic<T: Serialize, P: AsRef<Path>>(value: &T, path: P) -> Result<(), RetrainError> {
    let path = path.as_ref();
    let tmp = write_json_tmp(value, path)?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        RetrainError::UnableToWrite(format!("{}: {}", path.display(), e))
    })
}

/// Load a json document written by [`write_json_atomic`].
pub fn read_json<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> Result<T, RetrainError> {
    let path = path.as_ref();
    let json_str =
        fs::read_to_string(path).map_err(|e| RetrainError::UnableToRead(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str::<T>(&json_str).map_err(|e| RetrainError::UnableToRead(format!("{}: {}", path.display(), e)))
}
