//! Image catalog entries

use serde::Serialize;

/// A single image the trainer can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Image {
    /// Stable identifier
    pub name: &'static str,
    /// Optional caption rendered with the image
    pub display: &'static str,
    /// Asset path for the renderer
    pub url: &'static str,
}

impl Image {
    const fn pattern(name: &'static str, url: &'static str) -> Self {
        Self {
            name,
            display: "",
            url,
        }
    }
}

/// The eight pattern images, in catalog order
pub static IMAGES: [Image; 8] = [
    Image::pattern("pattern-1", "/assets/pattern-1.jpg"),
    Image::pattern("pattern-2", "/assets/pattern-2.jpg"),
    Image::pattern("pattern-3", "/assets/pattern-3.jpg"),
    Image::pattern("pattern-4", "/assets/pattern-4.jpg"),
    Image::pattern("pattern-5", "/assets/pattern-5.jpg"),
    Image::pattern("pattern-6", "/assets/pattern-6.jpg"),
    Image::pattern("pattern-7", "/assets/pattern-7.jpg"),
    Image::pattern("pattern-8", "/assets/pattern-8.jpg"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_urls_follow_pattern() {
        for (i, image) in IMAGES.iter().enumerate() {
            assert_eq!(image.name, format!("pattern-{}", i + 1));
            assert_eq!(image.url, format!("/assets/pattern-{}.jpg", i + 1));
            assert!(image.display.is_empty());
        }
    }

    #[test]
    fn test_image_serialization() {
        let json = serde_json::to_string(&IMAGES[2]).unwrap();
        assert!(json.contains("\"name\":\"pattern-3\""));
        assert!(json.contains("/assets/pattern-3.jpg"));
    }
}
