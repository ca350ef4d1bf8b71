use askama::Template;

use crate::types::UploadedFile;

pub const IMAGE_WIDTH: u32 = 320;
pub const IMAGE_HEIGHT: u32 = 240;

pub const IDLE_PROMPT: &str = "Select an image";
pub const UPLOADING_PROMPT: &str = "Uploading image...";

/// One rendered `<img>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageView {
    pub name: String,
    pub src: String,
    pub width: u32,
    pub height: u32,
    /// Set while `src` is a local preview.
    pub blurred: bool,
}

impl ImageView {
    pub fn pending(name: &str, src: &str) -> Self {
        Self::new(name, src, true)
    }

    pub fn confirmed(name: &str, src: &str) -> Self {
        Self::new(name, src, false)
    }

    fn new(name: &str, src: &str, blurred: bool) -> Self {
        Self {
            name: name.to_string(),
            src: src.to_string(),
            width: IMAGE_WIDTH,
            height: IMAGE_HEIGHT,
            blurred,
        }
    }

    pub fn style(&self) -> String {
        let filter = if self.blurred { "blur(4px)" } else { "blur(0)" };
        format!("transition: filter 300ms ease; filter: {filter}")
    }

    pub fn to_html(&self) -> Result<String, askama::Error> {
        ImageTemplate { image: self }.render()
    }
}

impl From<&UploadedFile> for ImageView {
    fn from(file: &UploadedFile) -> Self {
        ImageView::confirmed(&file.name, &file.url)
    }
}

#[derive(Template)]
#[template(path = "image.html")]
struct ImageTemplate<'a> {
    image: &'a ImageView,
}

#[derive(Template)]
#[template(path = "index.html")]
struct UploadPage<'a> {
    prompt: &'static str,
    images: &'a [ImageView],
}

pub fn render_page(uploading: bool, images: &[ImageView]) -> Result<String, askama::Error> {
    let prompt = if uploading { UPLOADING_PROMPT } else { IDLE_PROMPT };
    UploadPage { prompt, images }.render()
}
