//! Fixed-layout detail page: seven stacked sections, 790px wide, printable.

use crate::ark::sniff_image_kind;
use crate::models::{GeneratedAssets, ProductInfo};
use crate::theme::{select_theme, Theme};

pub const PAGE_WIDTH: u32 = 790;
/// (id, height in px) in page order.
pub const SECTIONS: [(&str, u32); 7] = [
    ("hero", 1400),
    ("inspiration", 1100),
    ("scene", 1400),
    ("models", 1400),
    ("details", 1400),
    ("multi-angle", 1500),
    ("parameters", 1400),
];

const PRIMARY_RED: &str = "#E02D2D";
const SUB_GRAY: &str = "#666666";
const TITLE_PLACEHOLDER: &str = "产品标题";
const SUBTITLE_PLACEHOLDER: &str = "副标题";
const INSPIRATION_PLACEHOLDER: &str = "设计灵感内容加载中...";

const PARAMETERS: [(&str, &str); 4] = [
    ("【品牌】", "中国黄金"),
    ("【材质】", "足金"),
    ("【克重】", "以实际下单为准"),
    ("【尺寸】", "以下单页面为准"),
];

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn media_type(data: &str) -> &'static str {
    match sniff_image_kind(data) {
        "PNG" => "image/png",
        "WEBP" => "image/webp",
        "SVG" => "image/svg+xml",
        _ => "image/jpeg",
    }
}

fn data_url(data: &str) -> String {
    format!("data:{};base64,{}", media_type(data), data)
}

/// `<img>` for a present payload, an empty placeholder block otherwise.
fn image_slot(data: &str, alt: &str, style: &str) -> String {
    if data.trim().is_empty() {
        format!(r#"<div class="image-slot empty" data-slot="{alt}" style="{style}"></div>"#)
    } else {
        format!(
            r#"<img class="image-slot" src="{}" alt="{alt}" style="{style}">"#,
            escape_html(&data_url(data))
        )
    }
}

fn corner(theme: &Theme, position: &str) -> String {
    let side = |name: &str, width: u8, color: &str| {
        if position.contains(name) {
            format!("border-{name}:{width}px solid {color};")
        } else {
            String::new()
        }
    };
    format!(
        r#"<div class="corner {position}"><div style="{}{}{}{}"></div><div style="{}{}{}{}"></div></div>"#,
        side("top", 3, theme.primary),
        side("bottom", 3, theme.primary),
        side("left", 3, theme.primary),
        side("right", 3, theme.primary),
        side("top", 1, theme.accent),
        side("bottom", 1, theme.accent),
        side("left", 1, theme.accent),
        side("right", 1, theme.accent),
    )
}

fn divider(theme: &Theme) -> String {
    format!(
        r#"<div class="divider" style="background:linear-gradient(to right, transparent, {}, transparent)"></div>"#,
        theme.primary
    )
}

fn badge(theme: &Theme, number: usize) -> String {
    format!(
        r#"<div class="badge" style="border-color:{};color:{};box-shadow:0 2px 5px {}">{number}</div>"#,
        theme.primary,
        theme.secondary,
        theme.primary_rgba(0.3)
    )
}

fn heading(theme: &Theme, zh: &str, en: &str, zh_color: &str, pattern_index: usize) -> String {
    format!(
        r#"<div class="heading"><h2 style="color:{zh_color}">{zh}</h2><p class="en" style="color:{PRIMARY_RED}">{en}</p>{}{}</div>"#,
        divider(theme),
        theme.patterns[pattern_index % theme.patterns.len()].svg(theme)
    )
}

fn section(id: &str, height: u32, number: usize, theme: &Theme, extra_style: &str, body: &str) -> String {
    format!(
        r#"<section class="section" id="{id}" style="height:{height}px;{extra_style}">{}{body}</section>"#,
        badge(theme, number)
    )
}

fn stylesheet(theme: &Theme) -> String {
    format!(
        r#"* {{ box-sizing: border-box; margin: 0; padding: 0; }}
body {{ background: #f3f4f6; }}
.page {{ width: {PAGE_WIDTH}px; margin: 0 auto; background-color: #fff; background-size: cover;
  font-family: "SimSun", "Songti SC", "STSong", "华文宋体", "宋体", serif; overflow: hidden; }}
.section {{ position: relative; width: {PAGE_WIDTH}px; display: flex; flex-direction: column; align-items: center; overflow: hidden; }}
.badge {{ position: absolute; top: 24px; left: 24px; width: 40px; height: 40px; border: 2px solid; border-radius: 50%;
  background: #fff; display: flex; align-items: center; justify-content: center; font-size: 20px; font-weight: bold; z-index: 20; }}
.heading {{ text-align: center; margin-bottom: 64px; width: 420px; }}
.heading h2 {{ font-size: 48px; font-weight: bold; }}
.heading .en {{ font-size: 32px; font-weight: bold; margin-top: 12px; letter-spacing: 0.1em; }}
.divider {{ width: 80px; height: 4px; margin: 16px auto 8px; }}
.corner {{ position: absolute; width: 40px; height: 40px; }}
.corner > div {{ position: absolute; inset: 0; }}
.corner.top-left {{ top: 8px; left: 8px; }} .corner.top-right {{ top: 8px; right: 8px; }}
.corner.bottom-left {{ bottom: 8px; left: 8px; }} .corner.bottom-right {{ bottom: 8px; right: 8px; }}
.image-slot {{ display: block; object-fit: cover; }}
.image-slot.empty {{ background: transparent; }}
.frame {{ overflow: hidden; box-shadow: 0 10px 25px rgba(0,0,0,0.15); background: #fff; }}
.oval {{ border-radius: 9999px; }} .rounded {{ border-radius: 40px; }}
.cover {{ position: absolute; inset: 0; width: 100%; height: 100%; }}
.title-card {{ position: relative; z-index: 10; background: rgba(255,255,255,0.8); padding: 32px; border-radius: 12px;
  text-align: center; max-width: 600px; border: 1px solid {}; box-shadow: 0 0 10px {}; }}
.title-card h1 {{ font-size: 48px; letter-spacing: 0.1em; color: #111827; margin-bottom: 24px; }}
.title-card .subtitle {{ font-size: 32px; letter-spacing: 0.4em; color: {SUB_GRAY}; }}
.poem p {{ font-size: 24px; color: #1f2937; letter-spacing: 0.05em; line-height: 1.6; margin-top: 40px; text-align: center; }}
.params {{ width: 65%; font-size: 24px; color: #374151; background: {}; padding: 48px; border-radius: 12px; }}
.params .row {{ display: flex; padding-bottom: 24px; margin-bottom: 24px; border-bottom: 1px solid #e5e7eb; }}
.params .row:last-child {{ border-bottom: none; margin-bottom: 0; }}
.params .key {{ width: 144px; font-weight: bold; color: #111827; }}
.params .val {{ flex: 1; overflow: hidden; text-overflow: ellipsis; white-space: nowrap; }}
.disclaimer {{ margin-top: auto; padding-bottom: 96px; color: #9ca3af; font-size: 20px; }}
@media print {{ body {{ background: #fff; }} .page {{ box-shadow: none; }} .section {{ break-inside: avoid; }} }}"#,
        theme.primary_rgba(0.3),
        theme.primary_rgba(0.3),
        theme.background,
    )
}

fn hero_section(theme: &Theme, title: &str, subtitle: &str, hero: &str) -> String {
    let body = format!(
        r#"<div class="cover">{}</div><div style="flex:1"></div><div class="title-card">{}{}{}{}<h1>{}</h1><div class="subtitle">{}</div></div><div style="height:200px"></div>"#,
        image_slot(hero, "Hero", "width:100%;height:100%"),
        corner(theme, "top-left"),
        corner(theme, "top-right"),
        corner(theme, "bottom-left"),
        corner(theme, "bottom-right"),
        escape_html(title),
        escape_html(subtitle),
    );
    section("hero", SECTIONS[0].1, 1, theme, "", &body)
}

fn inspiration_section(theme: &Theme, model: &str, lines: &[String]) -> String {
    let poem: String = lines.iter().map(|l| format!("<p>{}</p>", escape_html(l))).collect();
    let body = format!(
        r#"<div style="height:96px"></div>{}<div class="frame oval" style="width:420px;height:420px;border:4px solid #fff;margin-bottom:64px">{}</div><div class="poem" style="max-width:720px;padding:0 40px">{}</div>"#,
        heading(theme, "灵感设计感", "INSPIRATION", PRIMARY_RED, 0),
        image_slot(model, "Inspiration Model", "width:100%;height:100%"),
        poem,
    );
    section("inspiration", SECTIONS[1].1, 2, theme, "", &body)
}

fn scene_section(theme: &Theme, scene: &str) -> String {
    let body = format!(
        r#"<div class="cover" style="opacity:0.3;mix-blend-mode:multiply">{}</div><div style="flex:1"></div><div class="frame rounded" style="position:relative;z-index:10;width:70%;height:70%">{}<div class="cover" style="background:linear-gradient(to top right, rgba(0,0,0,0.2), transparent, rgba(255,255,255,0.3))"></div></div><div style="flex:1"></div>"#,
        image_slot(scene, "Background", "width:100%;height:100%"),
        image_slot(scene, "Scene Product", "width:100%;height:100%;transform:scale(1.1)"),
    );
    section("scene", SECTIONS[2].1, 3, theme, "", &body)
}

fn models_section(theme: &Theme, wear: &str) -> String {
    let body = format!(
        r#"<div style="height:96px"></div>{}<div class="frame" style="width:75%;height:1000px;background:#f9fafb">{}</div>"#,
        heading(theme, "模特展示", "MODELS DISPLAY", "#111827", 1),
        image_slot(wear, "Model Wear", "width:100%;height:100%"),
    );
    section("models", SECTIONS[3].1, 4, theme, "", &body)
}

fn details_section(theme: &Theme, detail1: &str, detail2: &str) -> String {
    let body = format!(
        r#"<div style="height:80px"></div>{}<div style="position:relative;width:100%;flex:1">
<div class="frame oval" style="position:absolute;top:0;right:48px;width:360px;height:520px;border:2px solid #fff">{}</div>
<div style="position:absolute;top:96px;left:48px;width:320px;text-align:right"><h3 style="font-size:36px;color:#1f2937">精致细节</h3><p style="font-size:24px;color:#4b5563;margin-top:24px;line-height:1.6">展现亮丽质感<br>不放过每个细节</p></div>
<div class="frame rounded" style="position:absolute;top:620px;left:48px;width:360px;height:520px;border:2px solid #fff">{}</div>
<div style="position:absolute;top:720px;right:48px;width:320px;text-align:left"><h3 style="font-size:36px;color:#1f2937">匠心工艺</h3><p style="font-size:24px;color:#4b5563;margin-top:24px;line-height:1.6">细致打造造型<br>呈现动人光彩</p></div>
</div>"#,
        heading(theme, "产品细节", "PRODUCT DETAILS", "#111827", 2),
        image_slot(detail1, "Detail 1", "width:100%;height:100%"),
        image_slot(detail2, "Detail 2", "width:100%;height:100%"),
    );
    section("details", SECTIONS[4].1, 5, theme, "", &body)
}

fn multi_angle_section(theme: &Theme, multi: &str) -> String {
    let body = format!(
        r#"<div style="flex:1"></div><div style="position:relative;width:720px;height:1350px"><div style="position:absolute;top:12px;left:12px;width:100%;height:100%;background:rgba(0,0,0,0.5);filter:blur(4px);border-radius:8px"></div><div style="position:relative;width:100%;height:100%;background:#fff;border-radius:8px;overflow:hidden;border:1px solid #e5e7eb">{}</div></div><div style="flex:1"></div>"#,
        image_slot(multi, "Multi Angle", "width:100%;height:100%"),
    );
    section("multi-angle", SECTIONS[5].1, 6, theme, "background:rgba(249,250,251,0.5);", &body)
}

fn parameters_section(theme: &Theme, product: &ProductInfo, title: &str) -> String {
    let mut rows: Vec<(&str, String)> = PARAMETERS.iter().map(|(k, v)| (*k, v.to_string())).collect();
    rows.insert(2, ("【品名】", title.to_string()));
    let rows: String = rows
        .iter()
        .map(|(k, v)| format!(r#"<div class="row"><span class="key">{k}</span><span class="val">{}</span></div>"#, escape_html(v)))
        .collect();

    let original = if product.image_base64.trim().is_empty() {
        image_slot("", "Original Product", "width:100%;height:100%")
    } else {
        format!(
            r#"<img class="image-slot" src="{}" alt="Original Product" style="width:100%;height:100%;object-fit:contain">"#,
            escape_html(&product.image_data_url())
        )
    };

    let body = format!(
        r#"<div style="height:96px"></div>{}<div style="width:35%;aspect-ratio:1/1;margin-bottom:64px">{}</div><div class="params">{}</div><div class="disclaimer">页面展示仅供参考，具体以实物为准</div>"#,
        heading(theme, "产品信息", "PRODUCT PARAMETERS", "#111827", 0),
        original,
        rows,
    );
    section("parameters", SECTIONS[6].1, 7, theme, "background:#fff;", &body)
}

/// Lays out a completed run as a standalone HTML document.
///
/// Never fails: empty image fields leave their region blank and absent copy
/// falls back to placeholder text.
pub fn render_detail_page(product: &ProductInfo, assets: &GeneratedAssets) -> String {
    let theme = select_theme(&product.title);

    let title = if product.title.trim().is_empty() { TITLE_PLACEHOLDER } else { product.title.as_str() };
    let subtitle = if assets.subtitle.trim().is_empty() { SUBTITLE_PLACEHOLDER } else { assets.subtitle.as_str() };
    let inspiration: Vec<String> = if assets.inspiration_text.is_empty() {
        vec![INSPIRATION_PLACEHOLDER.to_string(); 4]
    } else {
        assets.inspiration_text.clone()
    };

    let background = if assets.background_texture.trim().is_empty() {
        String::new()
    } else {
        format!("background-image:url({});", data_url(&assets.background_texture))
    };

    let sections = [
        hero_section(theme, title, subtitle, &assets.hero_image),
        inspiration_section(theme, &assets.model_inspiration_image, &inspiration),
        scene_section(theme, &assets.scene_wide_image),
        models_section(theme, &assets.model_wear_image),
        details_section(theme, &assets.detail_image1, &assets.detail_image2),
        multi_angle_section(theme, &assets.multi_angle_image),
        parameters_section(theme, product, title),
    ]
    .concat();

    format!(
        r#"<!DOCTYPE html>
<html lang="zh-CN">
<head>
<meta charset="utf-8">
<title>{} - 详情页</title>
<style>
{}
</style>
</head>
<body>
<main class="page" data-theme="{:?}" style="{}">
{}
</main>
</body>
</html>
"#,
        escape_html(title),
        stylesheet(theme),
        theme.name,
        escape_html(&background),
        sections,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::InspirationStyle;

    fn product(title: &str) -> ProductInfo {
        ProductInfo {
            title: title.into(),
            style_prompt: "中国风".into(),
            image_base64: "iVBORw0KGgoAAAANSUhEUg".into(),
            image_mime_type: "image/png".into(),
            inspiration_style: InspirationStyle::Traditional,
        }
    }

    fn full_assets() -> GeneratedAssets {
        GeneratedAssets {
            subtitle: "温润典雅臻品之选".into(),
            inspiration_text: vec!["祥云入梦".into(), "金玉良缘".into(), "温润如玉".into(), "福泽绵长".into()],
            hero_image: "/9j/hero".into(),
            model_inspiration_image: "/9j/model".into(),
            scene_wide_image: "/9j/scene".into(),
            model_wear_image: "/9j/wear".into(),
            detail_image1: "/9j/d1".into(),
            detail_image2: "/9j/d2".into(),
            multi_angle_image: "/9j/multi".into(),
            background_texture: "iVBORw0KGgo-texture".into(),
        }
    }

    #[test]
    fn renders_seven_sections_with_all_images() {
        let html = render_detail_page(&product("足金和田玉吊坠"), &full_assets());
        assert_eq!(html.matches(r#"<section class="section""#).count(), 7);
        for (id, height) in SECTIONS {
            assert!(html.contains(&format!(r#"id="{id}" style="height:{height}px;"#)), "section {id}");
        }
        assert!(html.contains(r#"alt="Multi Angle""#));
        assert!(html.contains("data:image/jpeg;base64,/9j/hero"));
        assert!(html.contains("background-image:url(data:image/png;base64,iVBORw0KGgo-texture)"));
        assert!(!html.contains("image-slot empty"));
    }

    #[test]
    fn missing_image_renders_blank_region() {
        let mut assets = full_assets();
        assets.multi_angle_image.clear();

        let html = render_detail_page(&product("足金和田玉吊坠"), &assets);
        assert!(!html.contains(r#"alt="Multi Angle""#));
        assert!(html.contains(r#"data-slot="Multi Angle""#));
        assert_eq!(html.matches(r#"<section class="section""#).count(), 7);
    }

    #[test]
    fn empty_assets_use_placeholders() {
        let html = render_detail_page(&product(""), &GeneratedAssets::default());
        assert!(html.contains("<h1>产品标题</h1>"));
        assert!(html.contains(r#"<div class="subtitle">副标题</div>"#));
        assert_eq!(html.matches("<p>设计灵感内容加载中...</p>").count(), 4);
        assert_eq!(html.matches("image-slot empty").count(), 8);
    }

    #[test]
    fn text_is_escaped_and_theme_applied() {
        let html = render_detail_page(&product("<script>婚戒</script>"), &full_assets());
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;婚戒&lt;/script&gt;"));
        assert!(html.contains(r#"data-theme="Red""#));
        assert!(html.contains("#DC143C"));
    }
}
