use std::path::{Path, PathBuf};

use crate::{
    error::{Error, Result},
    types::ClientSecret,
};

/// Reads the client id and secret from the protected local store.
pub struct SecretManager {
    path: PathBuf,
}

impl SecretManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<ClientSecret> {
        let content = async_fs::read_to_string(&self.path).await.map_err(|e| {
            Error::Configuration(format!(
                "Failed to read spotify secrets from {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let secret: ClientSecret = serde_json::from_str(&content).map_err(|e| {
            Error::Configuration(format!(
                "Malformed spotify secrets in {}: {}",
                self.path.display(),
                e
            ))
        })?;

        if secret.id.trim().is_empty() || secret.secret.trim().is_empty() {
            return Err(Error::Configuration(format!(
                "Spotify secrets in {} must contain a non-empty id and secret",
                self.path.display()
            )));
        }

        Ok(secret)
    }
}
