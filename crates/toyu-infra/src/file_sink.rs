//! Artifact sink writing into a directory

use std::fs;
use std::path::PathBuf;

use tracing::info;

use toyu_domain::collaborator::ArtifactSink;
use toyu_types::Result;

/// Writes each artifact as a file under `dir`, creating the directory on demand.
///
/// The bytes go to a temporary name first and are renamed into place, so a
/// failed write never leaves a truncated artifact behind.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl ArtifactSink for DirectorySink {
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        let partial = self.dir.join(format!(".{}.partial", file_name));

        if let Err(e) = fs::write(&partial, bytes) {
            let _ = fs::remove_file(&partial);
            return Err(e.into());
        }
        fs::rename(&partial, &path)?;

        info!(path = %path.display(), bytes = bytes.len(), "artifact written");
        Ok(path)
    }
}
