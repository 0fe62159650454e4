use std::path::PathBuf;

use crate::services::delivery::{AnswerFile, DeliveryError};

/// Saves answer files to a directory on the learner's machine.
#[derive(Debug, Clone)]
pub(crate) struct LocalExporter {
    dir: PathBuf,
}

impl LocalExporter {
    pub(crate) fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub(crate) async fn save(&self, file: &AnswerFile) -> Result<PathBuf, DeliveryError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|err| {
            DeliveryError::Export(format!("cannot create {}: {err}", self.dir.display()))
        })?;

        let path = self.dir.join(&file.filename);
        tokio::fs::write(&path, &file.bytes)
            .await
            .map_err(|err| DeliveryError::Export(format!("cannot write {}: {err}", path.display())))?;

        tracing::info!(path = %path.display(), bytes = file.bytes.len(), "Answers saved locally");
        Ok(path)
    }
}
