use clap::Parser;
use imgdrop::client::{Gallery, HttpTransport, LocalFile, OptimisticUploader};
use std::path::PathBuf;

/// Upload images to an imgdrop server, printing the page before and after
/// the server confirms them.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Server root url
    #[arg(long, env = "IMGDROP_SERVER", default_value = "http://127.0.0.1:8080")]
    server: String,

    /// Files to upload
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    imgdrop::init_tracing();
    let args = Args::parse();

    let mut files = Vec::with_capacity(args.files.len());
    for path in &args.files {
        files.push(LocalFile::from_path(path).await?);
    }

    let mut uploader = OptimisticUploader::new(HttpTransport::new(&args.server));
    let mut gallery = Gallery::new();

    let Some(submission) = uploader.submit(files) else {
        tracing::warn!("no files given, nothing to upload");
        return Ok(());
    };
    println!("{}", uploader.render_page(&mut gallery)?);

    let confirmed = uploader.resolve(submission).await?;
    for file in confirmed {
        tracing::info!(name = %file.name, url = %file.url, "confirmed");
    }
    println!("{}", uploader.render_page(&mut gallery)?);

    Ok(())
}
