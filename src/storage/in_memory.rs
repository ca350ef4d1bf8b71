use super::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryStorage {
    files: Arc<RwLock<HashMap<String, (Bytes, Option<Mime>)>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn save(&self, file_data: FileData) -> Result<(), UploadError> {
        self.files
            .write()
            .await
            .insert(file_data.name, (file_data.bytes, file_data.content_type));
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<(Bytes, Option<Mime>), ApiError> {
        self.files
            .read()
            .await
            .get(name)
            .map(|(bytes, content_type)| {
                let content_type = content_type.clone().or_else(|| guess_content_type(name));
                (bytes.clone(), content_type)
            })
            .ok_or(ApiError::NotFound)
    }

    async fn list(&self) -> Result<Vec<String>, ApiError> {
        let mut names: Vec<String> = self.files.read().await.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(name: &str, bytes: &'static [u8]) -> FileData {
        FileData {
            name: name.to_string(),
            bytes: Bytes::from_static(bytes),
            content_type: Some(mime::IMAGE_PNG),
        }
    }

    #[tokio::test]
    async fn same_name_overwrites() {
        let storage = InMemoryStorage::new();
        storage.save(png("a.png", b"first")).await.unwrap();
        storage.save(png("a.png", b"second")).await.unwrap();

        let (bytes, content_type) = storage.get("a.png").await.unwrap();
        assert_eq!(&bytes[..], b"second");
        assert_eq!(content_type, Some(mime::IMAGE_PNG));
        assert_eq!(storage.list().await.unwrap(), vec!["a.png".to_string()]);
    }

    #[tokio::test]
    async fn missing_name_is_not_found() {
        let storage = InMemoryStorage::new();
        assert!(matches!(
            storage.get("nope.png").await,
            Err(ApiError::NotFound)
        ));
    }
}
