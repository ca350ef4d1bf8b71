use serde::{Deserialize, Serialize};

/// URL path under which stored images are exposed.
pub const PUBLIC_IMG_PREFIX: &str = "/img";

/// Descriptor of a stored file, as returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    pub url: String,
}

impl UploadedFile {
    pub fn stored(name: impl Into<String>) -> Self {
        let name = name.into();
        let url = format!("{PUBLIC_IMG_PREFIX}/{name}");
        Self { name, url }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub files: Vec<UploadedFile>,
}
