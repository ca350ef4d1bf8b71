use std::collections::{HashMap, HashSet};

use super::{DisplayImage, ImageSource, TempUrl};
use crate::view::ImageView;

/// Render cycle state of the image list, keyed by image name.
///
/// Each name keeps the temporary url it was first rendered with. That url is
/// given up when the name shows up with a confirmed url, or when the name
/// leaves the list.
#[derive(Debug, Default)]
pub struct Gallery {
    held: HashMap<String, TempUrl>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, images: &[DisplayImage]) -> Vec<ImageView> {
        let mut seen = HashSet::with_capacity(images.len());

        let views = images
            .iter()
            .map(|image| {
                seen.insert(image.name.as_str());
                match &image.src {
                    ImageSource::Temporary(url) => {
                        self.held
                            .entry(image.name.clone())
                            .or_insert_with(|| url.clone());
                        ImageView::pending(&image.name, url.as_str())
                    }
                    ImageSource::Confirmed(url) => {
                        if let Some(released) = self.held.remove(&image.name) {
                            tracing::debug!(
                                name = %image.name,
                                temp_url = released.as_str(),
                                "preview superseded by stored file"
                            );
                        }
                        ImageView::confirmed(&image.name, url)
                    }
                }
            })
            .collect();

        self.held.retain(|name, _| seen.contains(name.as_str()));
        views
    }

    /// Names still holding a temporary url.
    pub fn pending_names(&self) -> impl Iterator<Item = &str> {
        self.held.keys().map(String::as_str)
    }
}
