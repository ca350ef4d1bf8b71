//! Multipart part handling.
//!
//! Each part of a submission is buffered into a [`Part`] and offered to an
//! ordered list of [`PartHandler`]s. The first handler to claim it decides the
//! resulting [`FormEntry`]; unclaimed parts land in the in-memory fallback.

mod file;
mod memory;

pub use file::{FileUploadHandler, is_image};
pub use memory::MemoryUploadHandler;

use crate::errors::{ApiError, UploadError};
use crate::types::UploadedFile;
use async_trait::async_trait;
use axum::extract::{Multipart, multipart::Field};
use bytes::{Bytes, BytesMut};
use mime::Mime;
use std::sync::Arc;

/// One buffered multipart field.
#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<Mime>,
    pub data: Bytes,
    /// Bytes seen on the wire. Larger than `data.len()` when reading was cut
    /// short at the read limit.
    pub size: usize,
}

impl Part {
    /// Buffers `field`, giving up on the body once it grows past `limit`.
    pub async fn read(mut field: Field<'_>, limit: usize) -> Result<Self, ApiError> {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(|s| s.to_string());
        let content_type = field.content_type().and_then(|m| m.parse().ok());

        let mut data = BytesMut::new();
        let mut size = 0usize;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Failed to read part `{name}`: {e}")))?
        {
            size += chunk.len();
            if size > limit {
                tracing::debug!(
                    part = %name,
                    size,
                    limit,
                    "part exceeds read limit, skipping rest"
                );
                data.clear();
                break;
            }
            data.extend_from_slice(&chunk);
        }

        Ok(Self {
            name,
            file_name,
            content_type,
            data: data.freeze(),
            size,
        })
    }

    /// Name used in logs and errors.
    pub fn display_name(&self) -> &str {
        self.file_name.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormEntry {
    /// Claimed and persisted by a storage-backed handler.
    File(UploadedFile),
    /// Kept in memory.
    Value {
        file_name: Option<String>,
        content_type: Option<Mime>,
        data: Bytes,
    },
}

pub enum Handled {
    Claimed(FormEntry),
    Passthrough(Part),
}

#[async_trait]
pub trait PartHandler: Send + Sync {
    /// Largest part body this handler will look at.
    fn max_part_size(&self) -> usize;

    async fn try_handle(&self, part: Part) -> Result<Handled, UploadError>;
}

/// Parsed form: field name to entry, in submission order.
#[derive(Debug, Default)]
pub struct FormData {
    entries: Vec<(String, FormEntry)>,
}

impl FormData {
    pub fn push(&mut self, name: String, entry: FormEntry) {
        self.entries.push((name, entry));
    }

    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FormEntry> + 'a {
        self.entries
            .iter()
            .filter(move |(field, _)| field == name)
            .map(|(_, entry)| entry)
    }

    /// Stored files under `name`; in-memory values are skipped.
    pub fn files(&self, name: &str) -> Vec<UploadedFile> {
        self.get_all(name)
            .filter_map(|entry| match entry {
                FormEntry::File(file) => Some(file.clone()),
                FormEntry::Value { .. } => None,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Clone)]
pub struct UploadPipeline {
    handlers: Vec<Arc<dyn PartHandler>>,
    fallback: Arc<MemoryUploadHandler>,
}

impl UploadPipeline {
    pub fn new(fallback: MemoryUploadHandler) -> Self {
        Self {
            handlers: Vec::new(),
            fallback: Arc::new(fallback),
        }
    }

    /// Appends a handler; earlier handlers get the first chance to claim.
    pub fn with_handler(mut self, handler: impl PartHandler + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Bytes buffered per part before it is considered oversized by everyone.
    pub fn read_limit(&self) -> usize {
        self.handlers
            .iter()
            .map(|h| h.max_part_size())
            .chain(std::iter::once(self.fallback.max_part_size()))
            .max()
            .unwrap_or_default()
    }

    /// Offers `part` to each handler in turn.
    pub async fn handle(&self, part: Part) -> Result<FormEntry, UploadError> {
        let mut part = part;
        for handler in &self.handlers {
            match handler.try_handle(part).await? {
                Handled::Claimed(entry) => return Ok(entry),
                Handled::Passthrough(unclaimed) => part = unclaimed,
            }
        }

        match self.fallback.try_handle(part).await? {
            Handled::Claimed(entry) => Ok(entry),
            Handled::Passthrough(part) => Err(UploadError::PartTooLarge {
                file_name: part.display_name().to_string(),
                limit: self.fallback.max_part_size(),
            }),
        }
    }

    /// Drains `multipart`. Rejected parts are logged and left out; storage
    /// failures abort.
    pub async fn parse(&self, multipart: &mut Multipart) -> Result<FormData, ApiError> {
        let limit = self.read_limit();
        let mut form = FormData::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(e.to_string()))?
        {
            let part = Part::read(field, limit).await?;
            let name = part.name.clone();

            match self.handle(part).await {
                Ok(entry) => form.push(name, entry),
                Err(err) if err.is_part_rejection() => {
                    tracing::warn!(field = %name, error = %err, "dropping rejected part");
                }
                Err(err) => {
                    tracing::error!(field = %name, error = %err, "failed to store part");
                    return Err(err.into());
                }
            }
        }

        Ok(form)
    }
}
