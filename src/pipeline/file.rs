use super::*;
use crate::config::DEFAULT_MAX_PART_SIZE;
use crate::storage::{FileData, Storage, is_valid_file_name};

type Filter = Arc<dyn Fn(&Part) -> bool + Send + Sync>;

/// Declared content type is an `image/*` type.
pub fn is_image(part: &Part) -> bool {
    part.content_type
        .as_ref()
        .is_some_and(|m| m.type_() == mime::IMAGE)
}

/// Persists file parts that pass the filter under their original name.
///
/// Parts without a file name are passed through untouched. Name clashes are
/// not avoided: a later upload replaces the stored file.
#[derive(Clone)]
pub struct FileUploadHandler {
    storage: Arc<dyn Storage>,
    max_part_size: usize,
    filter: Filter,
}

impl FileUploadHandler {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            max_part_size: DEFAULT_MAX_PART_SIZE,
            filter: Arc::new(is_image),
        }
    }

    pub fn max_part_size(mut self, limit: usize) -> Self {
        self.max_part_size = limit;
        self
    }

    pub fn filter(mut self, filter: impl Fn(&Part) -> bool + Send + Sync + 'static) -> Self {
        self.filter = Arc::new(filter);
        self
    }
}

#[async_trait]
impl PartHandler for FileUploadHandler {
    fn max_part_size(&self) -> usize {
        self.max_part_size
    }

    async fn try_handle(&self, part: Part) -> Result<Handled, UploadError> {
        let Some(file_name) = part.file_name.clone() else {
            return Ok(Handled::Passthrough(part));
        };

        if !(self.filter)(&part) {
            return Err(UploadError::InvalidContentType {
                file_name,
                content_type: part.content_type.map(|m| m.to_string()),
            });
        }
        if !is_valid_file_name(&file_name) {
            return Err(UploadError::InvalidFileName(file_name));
        }
        if part.size > self.max_part_size {
            return Err(UploadError::PartTooLarge {
                file_name,
                limit: self.max_part_size,
            });
        }

        self.storage
            .save(FileData {
                name: file_name.clone(),
                bytes: part.data,
                content_type: part.content_type,
            })
            .await?;

        tracing::info!(name = %file_name, size = part.size, "accepted upload");
        let entry = FormEntry::File(UploadedFile::stored(file_name));
        Ok(Handled::Claimed(entry))
    }
}
