// src/cache.rs

use crate::clip::VoiceClip;
use crate::error::{ClipError, DecodeError};
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

struct Entry {
    modified: SystemTime,
    clip: Arc<VoiceClip>,
}

/// Decoded clips keyed by path and modification time.
///
/// Pointing an annotation at a file is checked often and cheaply
/// ([`ClipCache::exists`]); decoding happens once per file version.
pub struct ClipCache {
    resolution: usize,
    entries: Mutex<HashMap<PathBuf, Entry>>,
}

impl ClipCache {
    pub fn new(resolution: usize) -> Self {
        Self {
            resolution,
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<PathBuf, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn exists(path: &Path) -> bool {
        path.is_file()
    }

    pub fn get_or_load(&self, path: &Path) -> Result<Arc<VoiceClip>, ClipError> {
        let modified = fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => DecodeError::NotFound(path.to_path_buf()),
                _ => DecodeError::Io {
                    path: path.to_path_buf(),
                    source: e,
                },
            })?;

        if let Some(entry) = self.entries().get(path) {
            if entry.modified == modified {
                return Ok(entry.clip.clone());
            }
            debug!("{} changed on disk, reloading", path.display());
        }

        // Decode without holding the lock.
        let clip = Arc::new(VoiceClip::load(path, self.resolution)?);
        self.entries().insert(
            path.to_path_buf(),
            Entry {
                modified: clip.modified,
                clip: clip.clone(),
            },
        );
        Ok(clip)
    }

    pub fn invalidate(&self, path: &Path) {
        self.entries().remove(path);
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
