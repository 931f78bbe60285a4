use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use image::ImageFormat;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{GenerateRequest, ProductInfo};

pub const DEFAULT_STYLE_PROMPT: &str = "极简现代, 高级灰调, 优雅";
pub const MAX_IMAGE_BYTES: usize = 3 * 1024 * 1024;

#[derive(Debug, Error, PartialEq)]
pub enum IntakeError {
    #[error("产品标题不能为空")]
    EmptyTitle,
    #[error("请上传产品图片")]
    MissingImage,
    #[error("图片编码无效: {0}")]
    InvalidEncoding(String),
    #[error("图片过大: {0} 字节 (上限 3MB)")]
    ImageTooLarge(usize),
    #[error("不支持的图片格式, 请上传 JPG/PNG/WebP")]
    UnsupportedFormat,
}

/// Turns the browser's form submission into an immutable [`ProductInfo`].
pub fn product_from_request(req: GenerateRequest) -> Result<ProductInfo, IntakeError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(IntakeError::EmptyTitle);
    }

    let style_prompt = match req.style_prompt.trim() {
        "" => DEFAULT_STYLE_PROMPT.to_string(),
        s => s.to_string(),
    };

    let bytes = decode_image_payload(&req.image_base64)?;
    let format = image::guess_format(&bytes).map_err(|_| IntakeError::UnsupportedFormat)?;
    let mime = match format {
        ImageFormat::Png | ImageFormat::Jpeg | ImageFormat::WebP => format.to_mime_type(),
        _ => return Err(IntakeError::UnsupportedFormat),
    };

    if let Some(claimed) = req.image_mime_type.as_deref() {
        if !claimed.eq_ignore_ascii_case(mime) {
            warn!("Client claimed {} but image bytes look like {}", claimed, mime);
        }
    }

    info!("📷 Accepted product image: {} ({} bytes)", mime, bytes.len());

    Ok(ProductInfo {
        title: title.to_string(),
        style_prompt,
        image_base64: STANDARD.encode(&bytes),
        image_mime_type: mime.to_string(),
        inspiration_style: req.inspiration_style.unwrap_or_default(),
    })
}

/// Accepts either bare base64 or a `data:<mime>;base64,<payload>` URL.
pub fn decode_image_payload(payload: &str) -> Result<Bytes, IntakeError> {
    let raw = match payload.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => payload,
    };
    let cleaned: String = raw.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(IntakeError::MissingImage);
    }

    let decoded = STANDARD
        .decode(cleaned.as_bytes())
        .map_err(|e| IntakeError::InvalidEncoding(e.to_string()))?;
    if decoded.is_empty() {
        return Err(IntakeError::MissingImage);
    }
    if decoded.len() > MAX_IMAGE_BYTES {
        return Err(IntakeError::ImageTooLarge(decoded.len()));
    }
    Ok(Bytes::from(decoded))
}

#[cfg(test)]
pub(crate) fn tiny_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(2, 2, image::Rgb([212, 175, 55]));
    let mut buf = std::io::Cursor::new(Vec::new());
    img.write_to(&mut buf, ImageFormat::Png).unwrap();
    buf.into_inner()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use crate::models::InspirationStyle;

    fn request(title: &str, image_base64: String) -> GenerateRequest {
        GenerateRequest {
            title: title.to_string(),
            style_prompt: String::new(),
            image_base64,
            image_mime_type: None,
            inspiration_style: None,
        }
    }

    #[test]
    fn accepts_data_url_and_detects_png() {
        let png = STANDARD.encode(tiny_png());
        let mut req = request("  足金和田玉吊坠  ", format!("data:image/jpeg;base64,{png}"));
        req.image_mime_type = Some("image/jpeg".into());
        req.inspiration_style = Some(InspirationStyle::Manga);

        let product = product_from_request(req).unwrap();
        assert_eq!(product.title, "足金和田玉吊坠");
        assert_eq!(product.style_prompt, DEFAULT_STYLE_PROMPT);
        assert_eq!(product.image_mime_type, "image/png");
        assert_eq!(product.image_base64, png);
        assert_eq!(product.inspiration_style, InspirationStyle::Manga);
    }

    #[test]
    fn rejects_blank_title() {
        let png = STANDARD.encode(tiny_png());
        assert_eq!(product_from_request(request("   ", png)), Err(IntakeError::EmptyTitle));
    }

    #[test]
    fn rejects_missing_and_garbled_images() {
        assert_eq!(product_from_request(request("吊坠", String::new())), Err(IntakeError::MissingImage));
        assert!(matches!(
            product_from_request(request("吊坠", "%%%not base64%%%".into())),
            Err(IntakeError::InvalidEncoding(_))
        ));
        let text = STANDARD.encode(b"just some text, not an image");
        assert_eq!(product_from_request(request("吊坠", text)), Err(IntakeError::UnsupportedFormat));
    }

    #[test]
    fn rejects_oversized_payloads() {
        let mut big = tiny_png();
        big.resize(MAX_IMAGE_BYTES + 1, 0);
        let err = decode_image_payload(&STANDARD.encode(&big)).unwrap_err();
        assert_eq!(err, IntakeError::ImageTooLarge(MAX_IMAGE_BYTES + 1));
    }
}
