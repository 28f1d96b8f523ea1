use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use log::{debug, warn};
use serde_json::{json, Value};

use crate::enumerate::ObjectWorkItem;
use crate::generate::error::GenerationError;
use crate::generate::prompt;

/// Assembles the multimodal message content for one object: the filled
/// prompt followed by one data-URL image part per usable photo.
pub struct PayloadBuilder {
    prompt_template: String,
    resize_max_side: Option<u32>,
}

impl PayloadBuilder {
    pub fn new(prompt_template: Option<String>, resize_max_side: Option<u32>) -> Self {
        Self {
            prompt_template: prompt_template
                .unwrap_or_else(|| prompt::DEFAULT_PROMPT_TEMPLATE.to_string()),
            resize_max_side,
        }
    }

    /// Builds the `content` array of the chat message. Unreadable images
    /// are skipped with a warning; an object with no usable image at all
    /// is a payload error, not a transport failure.
    pub fn build(&self, item: &ObjectWorkItem) -> Result<Vec<Value>, GenerationError> {
        let mut content = vec![json!({
            "type": "text",
            "text": prompt::fill_template(&self.prompt_template, &item.metadata),
        })];

        let mut usable = 0usize;
        for path in &item.image_paths {
            match self.encode_image(path) {
                Some(data_url) => {
                    usable += 1;
                    content.push(json!({
                        "type": "image_url",
                        "image_url": { "url": data_url },
                    }));
                }
                None => {
                    warn!(
                        "Object {}: skipping unusable image {}",
                        item.object_id,
                        path.display()
                    );
                }
            }
        }

        if usable == 0 {
            return Err(GenerationError::Payload(format!(
                "no usable images among {} candidates",
                item.image_paths.len()
            )));
        }

        debug!(
            "Object {}: payload carries {} of {} images",
            item.object_id,
            usable,
            item.image_paths.len()
        );

        Ok(content)
    }

    /// Reads, bounds and re-encodes one photo as a JPEG data URL. Files
    /// the image decoder rejects are passed through as raw bytes with a
    /// mime type guessed from the extension; archive exports occasionally
    /// contain formats the decoder build does not cover.
    fn encode_image(&self, path: &Path) -> Option<String> {
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read image {}: {}", path.display(), e);
                return None;
            }
        };

        let img = match image::load_from_memory(&bytes) {
            Ok(img) => img,
            Err(e) => {
                debug!(
                    "Image {} not decodable ({}), sending raw bytes",
                    path.display(),
                    e
                );
                return Some(format!(
                    "data:{};base64,{}",
                    mime_for_extension(path),
                    BASE64.encode(&bytes)
                ));
            }
        };

        let img = match self.resize_max_side {
            Some(max) if img.width().max(img.height()) > max => {
                img.resize(max, max, FilterType::Lanczos3)
            }
            _ => img,
        };

        // JPEG has no alpha channel.
        let rgb = img.to_rgb8();
        let mut buf = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, 80);
        if let Err(e) = encoder.encode_image(&rgb) {
            warn!("Failed to encode image {}: {}", path.display(), e);
            return None;
        }

        Some(format!("data:image/jpeg;base64,{}", BASE64.encode(&buf)))
    }
}

fn mime_for_extension(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("bmp") => "image/bmp",
        Some("tif" | "tiff") => "image/tiff",
        _ => "image/jpeg",
    }
}
