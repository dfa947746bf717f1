//! Registry
//!
//! Holds the single production model and the archive of the models it replaced.
use crate::constants::ARCHIVE_TIMESTAMP_FORMAT;
use crate::data::FeatureSchema;
use crate::errors::RetrainError;
use crate::utils::{read_json, write_json_tmp};
use chrono::{DateTime, Local, Utc};
use hashbrown::HashMap;
use log::{info, warn};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

/// A trained model together with the feature schema it expects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact<M> {
    pub schema: FeatureSchema,
    pub trained_at: DateTime<Utc>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
    pub model: M,
}

impl<M> ModelArtifact<M> {
    pub fn new(model: M, schema: FeatureSchema) -> Self {
        ModelArtifact {
            schema,
            trained_at: Utc::now(),
            metadata: BTreeMap::new(),
            model,
        }
    }

    pub fn insert_metadata(&mut self, key: &str, value: String) {
        self.metadata.insert(key.to_string(), value);
    }
}

/// A superseded model in the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    pub sequence: u64,
    pub path: PathBuf,
}

/// What a promotion changed on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionRecord {
    pub current: PathBuf,
    pub archived: Option<ArchiveEntry>,
}

// Archive names are `model_<YYYYMMDD>_<HHMMSS>_<sequence>.json`, the sequence has at least six digits.
fn parse_sequence(file_name: &str) -> Option<u64> {
    let stem = file_name.strip_prefix("model_")?.strip_suffix(".json")?;
    let parts: Vec<&str> = stem.split('_').collect();
    match parts.as_slice() {
        [date, time, seq]
            if date.len() == 8
                && time.len() == 6
                && seq.len() >= 6
                && parts.iter().all(|p| p.bytes().all(|b| b.is_ascii_digit())) =>
        {
            seq.parse().ok()
        }
        _ => None,
    }
}

/// Canonical location of the current slot, used to share one lock between
/// every registry of the process pointing at the same file.
fn slot_key(current: &Path) -> Result<PathBuf, RetrainError> {
    let parent = current
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| RetrainError::UnableToWrite(e.to_string()))?;
    let dir = fs::canonicalize(parent).map_err(|e| RetrainError::UnableToWrite(e.to_string()))?;
    Ok(match current.file_name() {
        Some(name) => dir.join(name),
        None => dir,
    })
}

fn slot_lock(key: PathBuf) -> Arc<Mutex<()>> {
    static LOCKS: OnceLock<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>> = OnceLock::new();
    let mut locks = LOCKS
        .get_or_init(|| Mutex::new(HashMap::new()))
        .lock()
        .unwrap_or_else(|e| e.into_inner());
    let lock = locks.entry(key).or_default().clone();
    lock
}

// Link `src` to `dst`, copying when linking is unsupported. Never replaces an existing `dst`.
fn link_or_copy(src: &Path, dst: &Path) -> io::Result<()> {
    match fs::hard_link(src, dst) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(e),
        Err(_) => {
            warn!("Unable to link {} into the archive, copying it.", src.display());
            let mut reader = File::open(src)?;
            let mut writer = OpenOptions::new().write(true).create_new(true).open(dst)?;
            io::copy(&mut reader, &mut writer).map(|_| ()).map_err(|e| {
                let _ = fs::remove_file(dst);
                e
            })
        }
    }
}

/// The production slot and its archive directory.
///
/// Promotions to the same slot are serialized across every registry of the process.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    current: PathBuf,
    archive_dir: PathBuf,
}

impl ModelRegistry {
    pub fn new<P: AsRef<Path>, Q: AsRef<Path>>(current: P, archive_dir: Q) -> Self {
        ModelRegistry {
            current: current.as_ref().to_path_buf(),
            archive_dir: archive_dir.as_ref().to_path_buf(),
        }
    }

    pub fn current_path(&self) -> &Path {
        &self.current
    }

    pub fn has_current(&self) -> bool {
        self.current.exists()
    }

    /// Load the production model, `None` when nothing was promoted yet.
    pub fn current<M: DeserializeOwned>(&self) -> Result<Option<ModelArtifact<M>>, RetrainError> {
        if !self.has_current() {
            return Ok(None);
        }
        read_json(&self.current).map(Some)
    }

    /// Archived models, oldest first.
    pub fn archive(&self) -> Result<Vec<ArchiveEntry>, RetrainError> {
        if !self.archive_dir.exists() {
            return Ok(Vec::new());
        }
        let dir = fs::read_dir(&self.archive_dir).map_err(|e| RetrainError::UnableToRead(e.to_string()))?;
        let mut entries = Vec::new();
        for entry in dir {
            let entry = entry.map_err(|e| RetrainError::UnableToRead(e.to_string()))?;
            let name = entry.file_name();
            if let Some(sequence) = name.to_str().and_then(parse_sequence) {
                entries.push(ArchiveEntry {
                    sequence,
                    path: entry.path(),
                });
            }
        }
        entries.sort_by_key(|e| e.sequence);
        Ok(entries)
    }

    /// Make `artifact` the production model.
    ///
    /// The new model is written next to the current slot first. The previous model
    /// is then linked into the archive and the new file renamed over the slot, so a
    /// reader always finds a complete current model.
    pub fn promote<M: Serialize>(&self, artifact: &ModelArtifact<M>) -> Result<PromotionRecord, RetrainError> {
        let lock = slot_lock(slot_key(&self.current)?);
        let _guard = lock
            .lock()
            .map_err(|_| RetrainError::UnableToWrite("registry lock poisoned".to_string()))?;

        let tmp = write_json_tmp(artifact, &self.current)?;

        let archived = if self.has_current() {
            match self.archive_current() {
                Ok(entry) => Some(entry),
                Err(e) => {
                    let _ = fs::remove_file(&tmp);
                    return Err(e);
                }
            }
        } else {
            None
        };

        if let Err(e) = fs::rename(&tmp, &self.current) {
            let _ = fs::remove_file(&tmp);
            if let Some(entry) = archived.as_ref() {
                let _ = fs::remove_file(&entry.path);
            }
            return Err(RetrainError::UnableToWrite(format!("{}: {}", self.current.display(), e)));
        }

        if let Some(entry) = archived.as_ref() {
            info!("  Previous model archived: {}", entry.path.display());
        }
        info!("Production model updated: {}", self.current.display());
        Ok(PromotionRecord {
            current: self.current.clone(),
            archived,
        })
    }

    /// Leave the registry untouched, the production model stays in place.
    pub fn reject(&self) {
        info!("Production model kept: {}", self.current.display());
    }

    fn archive_current(&self) -> Result<ArchiveEntry, RetrainError> {
        fs::create_dir_all(&self.archive_dir).map_err(|e| RetrainError::UnableToWrite(e.to_string()))?;
        let mut sequence = self.archive()?.last().map_or(1, |e| e.sequence + 1);
        let timestamp = Local::now().format(ARCHIVE_TIMESTAMP_FORMAT).to_string();
        loop {
            let path = self.archive_dir.join(format!("model_{}_{:06}.json", timestamp, sequence));
            match link_or_copy(&self.current, &path) {
                Ok(()) => return Ok(ArchiveEntry { sequence, path }),
                // Taken by another process since the listing, try the next number.
                Err(e) if e.kind() == ErrorKind::AlreadyExists => sequence += 1,
                Err(e) => return Err(RetrainError::UnableToWrite(format!("{}: {}", path.display(), e))),
            }
        }
    }
}
