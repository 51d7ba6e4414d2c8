// src/annotation.rs

use std::path::{Path, PathBuf};

pub const MARKER: &str = "voice:";

/// A `voice:<path>` reference found in a source comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceAnnotation {
    /// Path as written, relative to the project root.
    pub relative: String,
}

impl VoiceAnnotation {
    /// Extracts the path after the first marker, up to the end of the line.
    pub fn parse(comment: &str) -> Option<Self> {
        let start = comment.find(MARKER)? + MARKER.len();
        let rest = &comment[start..];
        let line = rest.split('\n').next().unwrap_or(rest).trim();
        if line.is_empty() {
            return None;
        }
        Some(Self {
            relative: line.to_string(),
        })
    }

    /// Annotation for a file on disk, written relative to `project_root`.
    /// `None` when an absolute `path` lies outside the root.
    pub fn relative_to(path: &Path, project_root: &Path) -> Option<Self> {
        let relative = if path.is_absolute() {
            path.strip_prefix(project_root).ok()?
        } else {
            path
        };
        Some(Self {
            relative: relative.to_string_lossy().into_owned(),
        })
    }

    pub fn resolve(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.relative)
    }

    /// Cheap check run on every edit; decoding is left to the cache.
    pub fn exists(&self, project_root: &Path) -> bool {
        self.resolve(project_root).is_file()
    }

    /// Line comment to insert for a new recording.
    pub fn comment(&self) -> String {
        format!("// {MARKER}{}", self.relative)
    }
}
