//! Uploaded audio bytes kept on disk under the configured upload directory.

use std::{
    io,
    path::{Component, Path, PathBuf},
};

use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::dao::storage::{StorageError, StorageResult};

/// Audio MIME types accepted for upload, with the extension used on disk.
pub const ACCEPTED_AUDIO_TYPES: [(&str, &str); 4] = [
    ("audio/mpeg", "mp3"),
    ("audio/wav", "wav"),
    ("audio/webm", "webm"),
    ("audio/ogg", "ogg"),
];

/// File extension for an accepted MIME type, ignoring any parameters (`;codecs=...`).
pub fn extension_for(mime: &str) -> Option<&'static str> {
    let essence = mime.split(';').next().unwrap_or_default().trim();
    ACCEPTED_AUDIO_TYPES
        .iter()
        .find(|(accepted, _)| accepted.eq_ignore_ascii_case(essence))
        .map(|(_, ext)| *ext)
}

/// Directory-backed store for recording audio.
#[derive(Debug, Clone)]
pub struct AudioVault {
    root: PathBuf,
}

impl AudioVault {
    /// Vault rooted at `root`. The directory is created on first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory holding every stored file.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write `bytes` to `{debate}/{recording}.{ext}` and return that relative path.
    pub async fn save(
        &self,
        debate_id: Uuid,
        recording_id: Uuid,
        extension: &str,
        bytes: &[u8],
    ) -> StorageResult<String> {
        let relative = format!("{debate_id}/{recording_id}.{extension}");
        let dir = self.root.join(debate_id.to_string());
        fs::create_dir_all(&dir)
            .await
            .map_err(|err| io_error("failed to create upload directory", err))?;
        fs::write(self.root.join(&relative), bytes)
            .await
            .map_err(|err| io_error("failed to write audio file", err))?;
        debug!(path = %relative, size = bytes.len(), "audio file stored");
        Ok(relative)
    }

    /// Read a previously stored file. `None` when it no longer exists.
    pub async fn read(&self, relative: &str) -> StorageResult<Option<Vec<u8>>> {
        let Some(path) = self.resolve(relative) else {
            return Ok(None);
        };
        match fs::read(path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(io_error("failed to read audio file", err)),
        }
    }

    /// Delete a stored file. A file that is already gone is not an error.
    pub async fn remove(&self, relative: &str) -> StorageResult<()> {
        let Some(path) = self.resolve(relative) else {
            return Ok(());
        };
        match fs::remove_file(path).await {
            Ok(()) => {
                debug!(path = %relative, "audio file removed");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error("failed to remove audio file", err)),
        }
    }

    /// Join `relative` onto the root, refusing paths that escape it.
    fn resolve(&self, relative: &str) -> Option<PathBuf> {
        let candidate = Path::new(relative);
        if candidate
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
        {
            Some(self.root.join(candidate))
        } else {
            None
        }
    }
}

fn io_error(message: &str, err: io::Error) -> StorageError {
    StorageError::unavailable(message.to_owned(), err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root() -> PathBuf {
        std::env::temp_dir().join(format!("ciceron-vault-{}", Uuid::new_v4()))
    }

    #[test]
    fn extension_lookup_ignores_parameters() {
        assert_eq!(extension_for("audio/webm;codecs=opus"), Some("webm"));
        assert_eq!(extension_for("audio/mpeg"), Some("mp3"));
        assert_eq!(extension_for("video/mp4"), None);
    }

    #[tokio::test]
    async fn save_then_read() {
        let root = temp_root();
        let vault = AudioVault::new(&root);
        let debate = Uuid::new_v4();
        let recording = Uuid::new_v4();

        let path = vault.save(debate, recording, "ogg", b"OggS").await.unwrap();
        assert_eq!(path, format!("{debate}/{recording}.ogg"));
        assert_eq!(vault.read(&path).await.unwrap(), Some(b"OggS".to_vec()));
        assert_eq!(vault.read("missing/file.ogg").await.unwrap(), None);

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn remove_tolerates_missing_files() {
        let root = temp_root();
        let vault = AudioVault::new(&root);
        let path = vault
            .save(Uuid::new_v4(), Uuid::new_v4(), "wav", b"RIFF")
            .await
            .unwrap();

        vault.remove(&path).await.unwrap();
        assert_eq!(vault.read(&path).await.unwrap(), None);
        vault.remove(&path).await.unwrap();
        vault.remove("../outside.wav").await.unwrap();

        let _ = std::fs::remove_dir_all(root);
    }

    #[tokio::test]
    async fn traversal_is_rejected() {
        let vault = AudioVault::new(temp_root());
        assert_eq!(vault.read("../etc/passwd").await.unwrap(), None);
        assert_eq!(vault.read("/etc/passwd").await.unwrap(), None);
    }
}
