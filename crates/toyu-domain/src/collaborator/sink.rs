use std::path::PathBuf;

use toyu_types::Result;

/// Destination for produced artifacts (sales CSV, backups)
pub trait ArtifactSink {
    /// Persist `bytes` under the suggested file name and return where it went
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Sink that keeps artifacts in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    pub saved: Vec<(String, Vec<u8>)>,
}

impl ArtifactSink for MemorySink {
    fn save(&mut self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        self.saved.push((file_name.to_string(), bytes.to_vec()));
        Ok(PathBuf::from(file_name))
    }
}
