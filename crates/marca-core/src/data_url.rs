//! Base64 data URLs for images sent inline to the backend.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use marca_types::backend::InlineImage;
use marca_types::image::ImageAttachment;

/// Encode `data` as `data:{mime};base64,{payload}`.
pub fn encode(mime_type: &str, data: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(data))
}

/// The wire form of an attachment.
pub fn inline_image(attachment: &ImageAttachment) -> InlineImage {
    InlineImage {
        data: encode(&attachment.mime_type, &attachment.data),
        name: attachment.name.clone(),
        mime_type: attachment.mime_type.clone(),
    }
}
