use async_trait::async_trait;
use reqwest::multipart::{Form, Part};

use super::LocalFile;
use crate::errors::ClientError;
use crate::types::UploadResponse;

/// Form field every selected file is submitted under.
pub const FILE_FIELD: &str = "file";

#[async_trait]
pub trait UploadTransport: Send + Sync {
    /// Posts `files` as one multipart submission.
    async fn upload(&self, files: Vec<LocalFile>) -> Result<UploadResponse, ClientError>;
}

/// Posts to a running server over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:8080`.
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/upload", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn form_for(files: Vec<LocalFile>) -> Result<Form, ClientError> {
    let mut form = Form::new();
    for file in files {
        let mut part = Part::bytes(file.bytes.to_vec()).file_name(file.name);
        if let Some(content_type) = file.content_type {
            part = part.mime_str(content_type.as_ref())?;
        }
        form = form.part(FILE_FIELD, part);
    }
    Ok(form)
}

#[async_trait]
impl UploadTransport for HttpTransport {
    async fn upload(&self, files: Vec<LocalFile>) -> Result<UploadResponse, ClientError> {
        let count = files.len();
        let response = self
            .client
            .post(&self.endpoint)
            .multipart(form_for(files)?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(endpoint = %self.endpoint, %status, "upload rejected");
            return Err(ClientError::Status(status));
        }

        let body: UploadResponse = response
            .json()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))?;

        tracing::debug!(
            endpoint = %self.endpoint,
            sent = count,
            accepted = body.files.len(),
            "upload finished"
        );
        Ok(body)
    }
}
