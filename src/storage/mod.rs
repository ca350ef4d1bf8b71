mod in_memory;
mod local_fs;

pub use in_memory::InMemoryStorage;
pub use local_fs::LocalFileStorage;

use crate::errors::{ApiError, UploadError};
use async_trait::async_trait;
use bytes::Bytes;
use mime::Mime;

/// An accepted upload, keyed by its original file name.
#[derive(Debug, Clone)]
pub struct FileData {
    pub name: String,
    pub bytes: Bytes,
    pub content_type: Option<Mime>,
}

/// Flat name-keyed store. Saving an existing name replaces it.
#[async_trait]
pub trait Storage: Send + Sync + 'static {
    async fn save(&self, file_data: FileData) -> Result<(), UploadError>;
    async fn get(&self, name: &str) -> Result<(Bytes, Option<Mime>), ApiError>;
    /// Stored names, sorted.
    async fn list(&self) -> Result<Vec<String>, ApiError>;
}

/// Prefix of in-flight writes. Never a valid stored name.
pub(crate) const TEMP_PREFIX: &str = ".imgdrop-upload-";

/// A name must be usable as a single path component of the upload directory
/// and must not collide with in-flight temp files.
pub fn is_valid_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.starts_with(TEMP_PREFIX)
        && !name.contains(['/', '\\', '\0'])
}

/// Content type served for a stored name.
pub fn guess_content_type(name: &str) -> Option<Mime> {
    mime_guess::from_path(name).first()
}
