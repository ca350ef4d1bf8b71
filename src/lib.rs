//! Image uploads with optimistic previews.
//!
//! The server side stores `image/*` parts of a multipart submission under
//! their original names and answers with `{ files: [{ name, url }] }`. The
//! client side previews selected files from `blob:` urls until the server
//! confirms them.

pub mod client;
pub mod config;
pub mod errors;
pub mod pipeline;
pub mod server;
pub mod storage;
pub mod types;
pub mod view;

pub use config::AppConfig;
pub use errors::{ApiError, ClientError, ConfigError, UploadError};
pub use types::{UploadResponse, UploadedFile};

/// Installs the `tracing` subscriber used by both binaries.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imgdrop=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
