use crate::models::{GeneratedAssets, ProductInfo};
use crate::render::SECTIONS;
use crate::theme::select_theme;
use printpdf::*;
use std::io::BufWriter;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PdfExportError {
    #[error("font error: {0}")]
    Font(String),
    #[error("pdf error: {0}")]
    Pdf(String),
}

/// Text-only export of a completed run: copy on the first page, one page per layout section.
/// Images stay in the HTML preview. Builtin Helvetica has no CJK glyphs, so pass a TTF for Chinese copy.
pub fn generate_pdf(
    product: &ProductInfo,
    assets: &GeneratedAssets,
    font_path: Option<&Path>,
) -> Result<Vec<u8>, PdfExportError> {
    let (doc, page, layer) = PdfDocument::new(
        format!("Detail page: {}", truncate(&product.title, 48)),
        Mm(210.0),
        Mm(297.0),
        "Layer 1",
    );
    let embedded = font_path.is_some();
    let text = |s: String| if embedded { s } else { builtin_safe(&s) };
    let font = match font_path {
        Some(path) => {
            let file = std::fs::File::open(path).map_err(|e| PdfExportError::Font(format!("{}: {}", path.display(), e)))?;
            doc.add_external_font(file).map_err(|e| PdfExportError::Font(e.to_string()))?
        }
        None => doc.add_builtin_font(BuiltinFont::Helvetica).map_err(|e| PdfExportError::Font(e.to_string()))?,
    };

    let summary = doc.get_page(page).get_layer(layer);
    summary.use_text(text(truncate(&product.title, 60)), 20.0, Mm(15.0), Mm(275.0), &font);
    summary.use_text(text(truncate(&assets.subtitle, 60)), 14.0, Mm(15.0), Mm(262.0), &font);
    let mut y = 245.0;
    for line in &assets.inspiration_text {
        summary.use_text(text(truncate(line, 80)), 12.0, Mm(20.0), Mm(y), &font);
        y -= 10.0;
    }
    summary.use_text(text(format!("Style: {}", truncate(&product.style_prompt, 120))), 9.0, Mm(15.0), Mm(y - 6.0), &font);
    summary.use_text(
        format!("Theme: {:?}", select_theme(&product.title).name),
        9.0,
        Mm(15.0),
        Mm(y - 14.0),
        &font,
    );
    summary.use_text("(Images are not embedded; see the HTML preview)", 8.0, Mm(15.0), Mm(y - 22.0), &font);

    let images = assets.images();
    for (index, (section, height)) in SECTIONS.iter().enumerate() {
        let (page, layer) = doc.add_page(Mm(210.0), Mm(297.0), *section);
        let layer_ref = doc.get_page(page).get_layer(layer);
        layer_ref.use_text(format!("{}. {}", index + 1, section), 16.0, Mm(15.0), Mm(275.0), &font);
        layer_ref.use_text(format!("Layout height: {}px", height), 9.0, Mm(15.0), Mm(265.0), &font);

        let mut y = 252.0;
        for (field, data) in images.iter().filter(|(field, _)| section_owns(section, field)) {
            let state = if data.is_empty() { "missing".to_string() } else { format!("{} base64 chars", data.len()) };
            layer_ref.use_text(format!("{}: {}", field, state), 9.0, Mm(15.0), Mm(y), &font);
            y -= 8.0;
        }
    }

    let mut buf: Vec<u8> = Vec::new();
    {
        let mut writer = BufWriter::new(&mut buf);
        doc.save(&mut writer).map_err(|e| PdfExportError::Pdf(e.to_string()))?;
    }
    Ok(buf)
}

fn section_owns(section: &str, field: &str) -> bool {
    matches!(
        (section, field),
        ("hero", "hero_image")
            | ("inspiration", "model_inspiration_image")
            | ("scene", "scene_wide_image")
            | ("models", "model_wear_image")
            | ("details", "detail_image1" | "detail_image2")
            | ("multi-angle", "multi_angle_image")
    )
}

/// Builtin fonts only cover ASCII reliably; anything else becomes `?`.
fn builtin_safe(s: &str) -> String {
    s.chars().map(|c| if c.is_ascii() { c } else { '?' }).collect()
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}…", s.chars().take(max).collect::<String>())
    }
}
