//! Base64 data URLs for attached images.

use base64::Engine;
use domains::ImageFile;

/// Encodes an image as `data:<mime>;base64,<payload>`.
///
/// The reported content type wins; otherwise the type is guessed from the
/// file extension, falling back to `application/octet-stream`.
pub fn encode(image: &ImageFile) -> String {
    let mime = image
        .content_type
        .as_deref()
        .map(str::trim)
        .filter(|ct| !ct.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| {
            mime_guess::from_path(&image.file_name)
                .first()
                .unwrap_or(mime::APPLICATION_OCTET_STREAM)
                .essence_str()
                .to_owned()
        });
    let payload = base64::engine::general_purpose::STANDARD.encode(&image.bytes);
    format!("data:{mime};base64,{payload}")
}
