use super::*;

const DEFAULT_MEMORY_PART_SIZE: usize = 3 * 1024 * 1024;

/// Fallback handler: keeps whatever reaches it in memory.
#[derive(Debug, Clone)]
pub struct MemoryUploadHandler {
    max_part_size: usize,
}

impl MemoryUploadHandler {
    pub fn new(max_part_size: usize) -> Self {
        Self { max_part_size }
    }
}

impl Default for MemoryUploadHandler {
    fn default() -> Self {
        Self::new(DEFAULT_MEMORY_PART_SIZE)
    }
}

#[async_trait]
impl PartHandler for MemoryUploadHandler {
    fn max_part_size(&self) -> usize {
        self.max_part_size
    }

    async fn try_handle(&self, part: Part) -> Result<Handled, UploadError> {
        if part.size > self.max_part_size {
            return Err(UploadError::PartTooLarge {
                file_name: part.display_name().to_string(),
                limit: self.max_part_size,
            });
        }

        Ok(Handled::Claimed(FormEntry::Value {
            file_name: part.file_name,
            content_type: part.content_type,
            data: part.data,
        }))
    }
}
