use std::path::{Path, PathBuf};

use crate::{
    error::Result,
    types::{AnalysisReport, TrackUri},
};

pub const ANALYSIS_FILE: &str = "analysis.json";
pub const URIS_FILE: &str = "uris.txt";
pub const TRACK_DIR: &str = "tracks";

/// Writes run results into the data directory.
pub struct ExportManager {
    data_dir: PathBuf,
}

impl ExportManager {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn analysis_path(&self) -> PathBuf {
        self.data_dir.join(ANALYSIS_FILE)
    }

    pub fn uris_path(&self) -> PathBuf {
        self.data_dir.join(URIS_FILE)
    }

    pub fn track_dir(&self) -> PathBuf {
        self.data_dir.join(TRACK_DIR)
    }

    pub async fn export_analyses(&self, analyses: &[AnalysisReport]) -> Result<PathBuf> {
        let json = serde_json::to_string(analyses)?;
        self.write(self.analysis_path(), json).await
    }

    pub async fn export_uris(&self, uris: &[TrackUri]) -> Result<PathBuf> {
        let content = uris
            .iter()
            .map(TrackUri::as_str)
            .collect::<Vec<_>>()
            .join("\n");
        self.write(self.uris_path(), content).await
    }

    /// Number of entries in the tracks directory; `0` when it does not exist.
    pub async fn count_recorded_tracks(&self) -> Result<usize> {
        use futures::StreamExt;

        let mut entries = match async_fs::read_dir(self.track_dir()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut count = 0;
        while let Some(entry) = entries.next().await {
            entry?;
            count += 1;
        }
        Ok(count)
    }

    async fn write(&self, path: PathBuf, content: String) -> Result<PathBuf> {
        if let Some(parent) = path.parent() {
            async_fs::create_dir_all(parent).await?;
        }
        async_fs::write(&path, content).await?;
        Ok(path)
    }
}
