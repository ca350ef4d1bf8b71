use imgdrop::{AppConfig, server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    imgdrop::init_tracing();

    let config = AppConfig::from_env()?;
    let storage = server::build_storage(&config)?;
    let app = server::router(storage, &config);

    let addr = config.socket_addr()?;
    tracing::info!(
        %addr,
        storage = ?config.storage_type,
        upload_dir = %config.upload_dir.display(),
        max_part_size = config.max_part_size,
        "Server running"
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
