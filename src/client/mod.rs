//! Optimistic uploader.
//!
//! Selected files are previewed from session-local `blob:` urls while the
//! submission is in flight. Once the server answers, its descriptors replace
//! the previews and the preview urls are released.

mod gallery;
mod temp_url;
mod transport;

pub use gallery::Gallery;
pub use temp_url::{TEMP_URL_SCHEME, TempUrl, TempUrlRegistry, is_temporary};
pub use transport::{FILE_FIELD, HttpTransport, UploadTransport};

use bytes::Bytes;
use mime::Mime;
use std::path::Path;

use crate::errors::ClientError;
use crate::types::UploadedFile;
use crate::view::{self, ImageView};

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub name: String,
    pub content_type: Option<Mime>,
    pub bytes: Bytes,
}

impl LocalFile {
    pub fn new(
        name: impl Into<String>,
        content_type: Option<Mime>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            content_type,
            bytes: bytes.into(),
        }
    }

    /// Reads `path`, guessing the content type from its extension.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            content_type: mime_guess::from_path(path).first(),
            name,
            bytes: Bytes::from(bytes),
        })
    }
}

/// Local stand-in for a file that has not been confirmed yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingPreview {
    pub name: String,
    pub url: TempUrl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Confirmed(String),
    Temporary(TempUrl),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayImage {
    pub name: String,
    pub src: ImageSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Submitting,
}

/// Payload of a started submission, to be handed back to
/// [`OptimisticUploader::resolve`].
#[derive(Debug)]
#[must_use = "a submission stays in flight until it is resolved"]
pub struct Submission {
    files: Vec<LocalFile>,
}

impl Submission {
    pub fn files(&self) -> &[LocalFile] {
        &self.files
    }
}

pub struct OptimisticUploader<T> {
    transport: T,
    registry: TempUrlRegistry,
    state: SubmissionState,
    confirmed: Vec<UploadedFile>,
    pending: Vec<PendingPreview>,
}

impl<T: UploadTransport> OptimisticUploader<T> {
    pub fn new(transport: T) -> Self {
        Self::with_registry(transport, TempUrlRegistry::new())
    }

    pub fn with_registry(transport: T, registry: TempUrlRegistry) -> Self {
        Self {
            transport,
            registry,
            state: SubmissionState::Idle,
            confirmed: Vec::new(),
            pending: Vec::new(),
        }
    }

    /// Starts a submission: previews are available right away and the
    /// uploader reports itself as uploading. Returns `None` for no files.
    pub fn submit(&mut self, files: Vec<LocalFile>) -> Option<Submission> {
        if files.is_empty() {
            return None;
        }

        self.pending = files
            .iter()
            .map(|file| PendingPreview {
                name: file.name.clone(),
                url: self
                    .registry
                    .create(file.bytes.clone(), file.content_type.clone()),
            })
            .collect();
        self.state = SubmissionState::Submitting;

        tracing::debug!(files = files.len(), "submission started");
        Some(Submission { files })
    }

    /// Sends the submission and reconciles with the server's answer.
    ///
    /// On failure the previous confirmed list is kept.
    pub async fn resolve(
        &mut self,
        submission: Submission,
    ) -> Result<&[UploadedFile], ClientError> {
        let result = self.transport.upload(submission.files).await;

        self.state = SubmissionState::Idle;
        self.pending.clear();

        match result {
            Ok(response) => {
                self.confirmed = response.files;
                Ok(&self.confirmed)
            }
            Err(err) => {
                tracing::warn!(error = %err, "submission failed");
                Err(err)
            }
        }
    }

    /// `submit` followed by `resolve`; no-op for an empty selection.
    pub async fn upload(&mut self, files: Vec<LocalFile>) -> Result<&[UploadedFile], ClientError> {
        match self.submit(files) {
            Some(submission) => self.resolve(submission).await,
            None => Ok(&self.confirmed),
        }
    }

    pub fn is_uploading(&self) -> bool {
        self.state != SubmissionState::Idle
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    pub fn confirmed(&self) -> &[UploadedFile] {
        &self.confirmed
    }

    pub fn pending(&self) -> &[PendingPreview] {
        &self.pending
    }

    /// Confirmed files followed by in-flight previews.
    pub fn images(&self) -> Vec<DisplayImage> {
        self.confirmed
            .iter()
            .map(|file| DisplayImage {
                name: file.name.clone(),
                src: ImageSource::Confirmed(file.url.clone()),
            })
            .chain(self.pending.iter().map(|preview| DisplayImage {
                name: preview.name.clone(),
                src: ImageSource::Temporary(preview.url.clone()),
            }))
            .collect()
    }

    pub fn registry(&self) -> &TempUrlRegistry {
        &self.registry
    }

    /// Runs one render cycle through `gallery`.
    pub fn render(&self, gallery: &mut Gallery) -> Vec<ImageView> {
        gallery.render(&self.images())
    }

    /// Full page markup for the current state.
    pub fn render_page(&self, gallery: &mut Gallery) -> Result<String, askama::Error> {
        let images = self.render(gallery);
        view::render_page(self.is_uploading(), &images)
    }
}
