use super::*;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// Stores each file under its original name inside `storage_path`.
pub struct LocalFileStorage {
    storage_path: PathBuf,
}

impl LocalFileStorage {
    pub fn new(storage_path: PathBuf) -> io::Result<Self> {
        if !storage_path.exists() {
            std::fs::create_dir_all(&storage_path)?;
        }
        Ok(Self { storage_path })
    }

    pub fn path(&self) -> &Path {
        &self.storage_path
    }
}

#[async_trait]
impl Storage for LocalFileStorage {
    async fn save(&self, file_data: FileData) -> Result<(), UploadError> {
        let file_path = self.storage_path.join(&file_data.name);
        let temp_path = self
            .storage_path
            .join(format!("{TEMP_PREFIX}{}", Uuid::new_v4()));

        let write_failed = |source| UploadError::StorageWriteFailed {
            file_name: file_data.name.clone(),
            source,
        };

        // Write then rename, so concurrent uploads of one name never interleave
        // and the last rename wins.
        let staged = async {
            fs::write(&temp_path, &file_data.bytes).await?;
            fs::rename(&temp_path, &file_path).await
        };
        if let Err(err) = staged.await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(write_failed(err));
        }

        tracing::debug!(
            name = %file_data.name,
            size = file_data.bytes.len(),
            path = %file_path.display(),
            "stored file"
        );
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<(Bytes, Option<Mime>), ApiError> {
        if !is_valid_file_name(name) {
            return Err(ApiError::NotFound);
        }

        let bytes = fs::read(self.storage_path.join(name))
            .await
            .map_err(|_| ApiError::NotFound)?;

        Ok((Bytes::from(bytes), guess_content_type(name)))
    }

    async fn list(&self) -> Result<Vec<String>, ApiError> {
        let mut entries = fs::read_dir(&self.storage_path)
            .await
            .map_err(|_| ApiError::Internal)?;

        let mut files = Vec::new();

        while let Some(entry) = entries.next_entry().await.map_err(|_| ApiError::Internal)? {
            let is_file = entry
                .file_type()
                .await
                .map(|t| t.is_file())
                .unwrap_or(false);
            let file_name = entry.file_name().to_string_lossy().into_owned();

            if is_file && !file_name.starts_with(TEMP_PREFIX) {
                files.push(file_name);
            }
        }

        files.sort();
        Ok(files)
    }
}
