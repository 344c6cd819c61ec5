use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use jobwatch_core::JobPosting;
use tempfile::NamedTempFile;
use thiserror::Error;
use watch_logging::{watch_info, watch_warn};

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("state directory missing or not writable: {0}")]
    StateDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Where the seen-job map lives between restarts.
pub trait SeenBacking: Send {
    /// Called once at start. Unreadable state yields an empty map.
    fn load_all(&self) -> HashMap<String, JobPosting>;

    /// Called after every insertion and every eviction that removed something.
    fn save_all(&self, entries: &HashMap<String, JobPosting>) -> Result<(), PersistError>;
}

/// Nothing survives a restart.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryBacking;

impl SeenBacking for MemoryBacking {
    fn load_all(&self) -> HashMap<String, JobPosting> {
        HashMap::new()
    }

    fn save_all(&self, _entries: &HashMap<String, JobPosting>) -> Result<(), PersistError> {
        Ok(())
    }
}

/// JSON object keyed by fingerprint, rewritten atomically on every save.
#[derive(Debug, Clone)]
pub struct JsonFileBacking {
    path: PathBuf,
}

impl JsonFileBacking {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn split_path(&self) -> (PathBuf, String) {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "seen_jobs.json".to_string());
        (dir, name)
    }
}

impl SeenBacking for JsonFileBacking {
    fn load_all(&self) -> HashMap<String, JobPosting> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return HashMap::new(),
            Err(err) => {
                watch_warn!("Failed to read seen jobs from {:?}: {}", self.path, err);
                return HashMap::new();
            }
        };

        let raw = match serde_json::from_str::<HashMap<String, serde_json::Value>>(&content) {
            Ok(raw) => raw,
            Err(err) => {
                watch_warn!("Failed to parse seen jobs from {:?}: {}", self.path, err);
                return HashMap::new();
            }
        };

        // One damaged entry must not cost the others.
        let mut entries = HashMap::with_capacity(raw.len());
        for (id, value) in raw {
            match serde_json::from_value::<JobPosting>(value) {
                Ok(posting) => {
                    entries.insert(id, posting);
                }
                Err(err) => watch_warn!("Skipping seen job {} in {:?}: {}", id, self.path, err),
            }
        }
        watch_info!("Loaded {} seen jobs from {:?}", entries.len(), self.path);
        entries
    }

    fn save_all(&self, entries: &HashMap<String, JobPosting>) -> Result<(), PersistError> {
        let content = serde_json::to_string(entries)?;
        let (dir, name) = self.split_path();
        AtomicFileWriter::new(dir).write(&name, &content)?;
        Ok(())
    }
}

/// Ensure the state directory exists; create if missing.
pub fn ensure_state_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::StateDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::StateDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::StateDir(e.to_string()))?;
    }
    Ok(())
}

/// Atomically write content to `{dir}/{filename}` by writing a temp file then renaming.
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn write(&self, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
        ensure_state_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}
