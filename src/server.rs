use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Extension, Multipart, Path},
    response::{Html, IntoResponse},
    routing::{get, post},
};
use headers::{ContentType, HeaderMapExt};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::client::FILE_FIELD;
use crate::config::{AppConfig, StorageType};
use crate::errors::ApiError;
use crate::pipeline::{FileUploadHandler, MemoryUploadHandler, UploadPipeline};
use crate::storage::{InMemoryStorage, LocalFileStorage, Storage};
use crate::types::{UploadResponse, UploadedFile};
use crate::view::{self, ImageView};

pub fn build_storage(config: &AppConfig) -> std::io::Result<Arc<dyn Storage>> {
    Ok(match config.storage_type {
        StorageType::Memory => Arc::new(InMemoryStorage::new()),
        StorageType::Local => Arc::new(LocalFileStorage::new(config.upload_dir.clone())?),
    })
}

pub fn router(storage: Arc<dyn Storage>, config: &AppConfig) -> Router {
    let pipeline = UploadPipeline::new(MemoryUploadHandler::default()).with_handler(
        FileUploadHandler::new(storage.clone()).max_part_size(config.max_part_size),
    );

    Router::new()
        .route("/", get(index).post(upload))
        .route("/upload", post(upload))
        .route("/img/{name}", get(get_image))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::max(config.max_body_size))
                .layer(Extension(storage))
                .layer(Extension(pipeline)),
        )
}

async fn health() -> &'static str {
    "OK"
}

async fn upload(
    Extension(pipeline): Extension<UploadPipeline>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let form = pipeline.parse(&mut multipart).await?;
    let files = form.files(FILE_FIELD);

    tracing::info!(parts = form.len(), accepted = files.len(), "handled upload");
    Ok(Json(UploadResponse { files }))
}

async fn get_image(
    Path(name): Path<String>,
    Extension(storage): Extension<Arc<dyn Storage>>,
) -> Result<impl IntoResponse, ApiError> {
    let (bytes, content_type) = storage.get(&name).await?;

    let mut response = bytes.into_response();
    if let Some(content_type) = content_type {
        response
            .headers_mut()
            .typed_insert(ContentType::from(content_type));
    }

    Ok(response)
}

async fn index(
    Extension(storage): Extension<Arc<dyn Storage>>,
) -> Result<Html<String>, ApiError> {
    let images: Vec<ImageView> = storage
        .list()
        .await?
        .into_iter()
        .map(|name| ImageView::from(&UploadedFile::stored(name)))
        .collect();

    let page = view::render_page(false, &images).map_err(|e| {
        tracing::error!(error = %e, "failed to render upload page");
        ApiError::Internal
    })?;
    Ok(Html(page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum_test::TestServer;
    use axum_test::multipart::{MultipartForm, Part};

    const MIB: usize = 1024 * 1024;

    fn config() -> AppConfig {
        AppConfig {
            storage_type: StorageType::Memory,
            ..AppConfig::default()
        }
    }

    fn server_with(storage: Arc<dyn Storage>) -> TestServer {
        TestServer::new(router(storage, &config())).unwrap()
    }

    fn image(bytes: Vec<u8>, name: &str, mime: &str) -> Part {
        Part::bytes(bytes).file_name(name).mime_type(mime)
    }

    fn single(part: Part) -> MultipartForm {
        MultipartForm::new().add_part("file", part)
    }

    #[tokio::test]
    async fn single_image_is_echoed_by_name() {
        let storage = Arc::new(InMemoryStorage::new());
        let server = server_with(storage.clone());

        let response = server
            .post("/upload")
            .multipart(single(image(vec![7; 2048], "cat.png", "image/png")))
            .await;

        response.assert_status_ok();
        response.assert_json(&serde_json::json!({
            "files": [{ "name": "cat.png", "url": "/img/cat.png" }]
        }));
        assert_eq!(storage.list().await.unwrap(), vec!["cat.png".to_string()]);
    }

    #[tokio::test]
    async fn non_images_are_left_out_in_order() {
        let server = server_with(Arc::new(InMemoryStorage::new()));

        let response = server
            .post("/upload")
            .multipart(
                MultipartForm::new()
                    .add_part("file", image(b"b".to_vec(), "b.png", "image/png"))
                    .add_part("file", image(b"notes".to_vec(), "notes.txt", "text/plain"))
                    .add_text("caption", "holiday")
                    .add_part("file", image(b"a".to_vec(), "a.jpg", "image/jpeg")),
            )
            .await;

        let body: UploadResponse = response.json();
        assert_eq!(
            body.files,
            vec![UploadedFile::stored("b.png"), UploadedFile::stored("a.jpg")]
        );
    }

    #[tokio::test]
    async fn empty_submission_returns_empty_list() {
        let server = server_with(Arc::new(InMemoryStorage::new()));

        let response = server
            .post("/upload")
            .multipart(MultipartForm::new().add_text("caption", "nothing"))
            .await;

        response.assert_status_ok();
        response.assert_json(&serde_json::json!({ "files": [] }));
    }

    #[tokio::test]
    async fn second_upload_overwrites_the_first() {
        let storage = Arc::new(InMemoryStorage::new());
        let server = server_with(storage.clone());

        for content in [b"first".to_vec(), b"second".to_vec()] {
            server
                .post("/upload")
                .multipart(single(image(content, "a.png", "image/png")))
                .await
                .assert_status_ok();
        }

        assert_eq!(storage.list().await.unwrap(), vec!["a.png".to_string()]);
        let response = server.get("/img/a.png").await;
        response.assert_status_ok();
        assert_eq!(response.as_bytes().as_ref(), b"second");
    }

    #[tokio::test]
    async fn size_limit_boundary() {
        let storage = Arc::new(InMemoryStorage::new());
        let server = server_with(storage.clone());

        let exact = image(vec![0; 10 * MIB], "exact.png", "image/png");
        let over = image(vec![0; 10 * MIB + 1], "over.png", "image/png");
        let after = image(b"tiny".to_vec(), "after.png", "image/png");
        let form = MultipartForm::new()
            .add_part("file", exact)
            .add_part("file", over)
            .add_part("file", after);

        let response = server.post("/upload").multipart(form).await;

        let body: UploadResponse = response.json();
        assert_eq!(
            body.files,
            vec![UploadedFile::stored("exact.png"), UploadedFile::stored("after.png")]
        );
        assert!(matches!(
            storage.get("over.png").await,
            Err(ApiError::NotFound)
        ));
    }

    #[tokio::test]
    async fn root_accepts_form_posts() {
        let server = server_with(Arc::new(InMemoryStorage::new()));

        let response = server
            .post("/")
            .multipart(single(image(b"x".to_vec(), "x.gif", "image/gif")))
            .await;

        let body: UploadResponse = response.json();
        assert_eq!(body.files, vec![UploadedFile::stored("x.gif")]);
    }

    #[tokio::test]
    async fn stored_images_are_served_with_content_type() {
        let server = server_with(Arc::new(InMemoryStorage::new()));
        server
            .post("/upload")
            .multipart(single(image(b"png".to_vec(), "cat.png", "image/png")))
            .await;

        let response = server.get("/img/cat.png").await;
        response.assert_status_ok();
        assert_eq!(response.header("content-type"), "image/png");

        server.get("/img/missing.png").await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn local_storage_writes_to_upload_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            upload_dir: dir.path().join("public").join("img"),
            ..AppConfig::default()
        };
        let storage = build_storage(&config).unwrap();
        let server = TestServer::new(router(storage, &config)).unwrap();

        server
            .post("/upload")
            .multipart(single(image(b"png".to_vec(), "cat.png", "image/png")))
            .await
            .assert_status_ok();

        let written = std::fs::read(dir.path().join("public/img/cat.png")).unwrap();
        assert_eq!(written, b"png");
    }

    #[tokio::test]
    async fn every_reported_file_is_served() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            upload_dir: dir.path().to_path_buf(),
            ..AppConfig::default()
        };
        let storage = build_storage(&config).unwrap();
        let server = TestServer::new(router(storage, &config)).unwrap();

        let temp_like = image(b"x".to_vec(), ".imgdrop-upload-x.png", "image/png");
        let hidden = image(b"h".to_vec(), ".hidden.png", "image/png");
        let form = MultipartForm::new()
            .add_part("file", temp_like)
            .add_part("file", hidden);

        let body: UploadResponse = server.post("/upload").multipart(form).await.json();
        assert_eq!(body.files, vec![UploadedFile::stored(".hidden.png")]);

        for file in &body.files {
            server.get(&file.url).await.assert_status_ok();
        }
        let page = server.get("/").await.text();
        assert!(page.contains(r#"alt=".hidden.png""#));
        assert!(!dir.path().join(".imgdrop-upload-x.png").exists());
    }

    #[tokio::test]
    async fn index_lists_stored_images() {
        let server = server_with(Arc::new(InMemoryStorage::new()));
        server
            .post("/upload")
            .multipart(single(image(b"png".to_vec(), "cat.png", "image/png")))
            .await;

        let response = server.get("/").await;
        response.assert_status_ok();
        let page = response.text();
        assert!(page.contains("Select an image"));
        assert!(page.contains(r#"alt="cat.png""#));
        assert!(!page.contains("blur(4px)"));
    }

    #[tokio::test]
    async fn malformed_body_is_a_bad_request() {
        let server = server_with(Arc::new(InMemoryStorage::new()));

        let body = "--XYZ\r\nContent-Disposition: form-data; name=\"file\"\r\n\r\nunterminated";
        let response = server
            .post("/upload")
            .content_type("multipart/form-data; boundary=XYZ")
            .bytes(body.into())
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_check() {
        let server = server_with(Arc::new(InMemoryStorage::new()));
        assert_eq!(server.get("/health").await.text(), "OK");
    }
}
