//! Prompt templates for the copy step and the seven image steps.

use crate::models::{InspirationStyle, ProductInfo};

/// Copy instruction. The model is asked for bare JSON; fences still happen and are stripped later.
pub fn copy_prompt(title: &str) -> String {
    format!(
        r#"为珠宝产品"{title}"生成营销文案。严格按照以下JSON格式输出，不要添加任何额外解释或文本：

{{
  "subtitle": "[这里填入恰好8个中文字符的产品优雅总结]",
  "inspirationText": [
    "[第一句富有诗意的灵感文案，不超过15个字符]",
    "[第二句富有诗意的灵感文案，不超过15个字符]",
    "[第三句富有诗意的灵感文案，不超过15个字符]",
    "[第四句富有诗意的灵感文案，不超过15个字符]"
  ]
}}

重要规则：
1. subtitle字段必须恰好是8个中文字符
2. inspirationText数组必须包含4个字符串元素
3. 每个灵感文案字符串不得超过15个字符
4. 所有内容必须是中文
5. 不要包含任何Markdown标记或额外说明
6. 直接输出JSON，不要添加任何前缀或后缀"#
    )
}

pub fn background_texture_prompt(p: &ProductInfo) -> String {
    format!("纹理背景图案，{}风格，细腻优雅，低对比度，适合叠加文字，底纹和主题一致协调。", p.style_prompt)
}

pub fn hero_prompt(p: &ProductInfo) -> String {
    format!(
        "珠宝产品摄影，{}，{}，构图简洁，最多3个背景元素，产品占画面40%，专业灯光,3:4。",
        p.title, p.style_prompt
    )
}

pub fn inspiration_prompt(p: &ProductInfo) -> String {
    match p.inspiration_style {
        InspirationStyle::Manga => format!(
            "基于\"{}\"珠宝的设计元素，创建一幅漫画风格插图。采用行星海城动漫的视觉美学，日系动漫风格，梦幻色彩，精致线条艺术，\
             将珠宝元素融入富有想象力的场景中，艺术插画风格，高分辨率细节，{}，聚焦关键设计元素，富有创意和艺术感。",
            p.title, p.style_prompt
        ),
        InspirationStyle::PaperCut => format!(
            "基于\"{}\"珠宝的设计元素，创建一幅中国传统剪纸艺术风格插图。红色调为主，精细的剪纸镂空纹理，将珠宝形状转化为剪纸图案，\
             融入中国传统纹样元素（如云纹、回纹、花卉等），平面化构图，对称美学，节日装饰艺术风格，{}，体现传统文化与现代设计的结合。",
            p.title, p.style_prompt
        ),
        InspirationStyle::Traditional => format!(
            "佩戴珠宝的时尚模特，{}风格，聚焦面部和珠宝，艺术感，高雅时尚，背景简洁。",
            p.style_prompt
        ),
    }
}

pub fn scene_wide_prompt(p: &ProductInfo) -> String {
    format!("珠宝的广角产品拍摄，{}，极简场景，45度侧光，强阴影，3D渲染风格，产品占画面70%。", p.style_prompt)
}

pub fn model_wear_prompt(p: &ProductInfo) -> String {
    format!(
        "模特佩戴珠宝，聚焦身体部位（颈部/手部/耳部），取决于物品类型，{}，肌肤质感干净，逼真优雅，产品占画面70%。",
        p.style_prompt
    )
}

pub fn detail_macro_prompt(p: &ProductInfo) -> String {
    format!(
        "珠宝细节的极限微距拍摄，{}，闪闪发光，高质量纹理。不能改变产品的材质和光泽和结构和形状",
        p.style_prompt
    )
}

pub fn detail_artistic_prompt(p: &ProductInfo) -> String {
    format!("珠宝的艺术角度，{}，背景虚化，突出工艺品质。", p.style_prompt)
}

pub fn multi_angle_prompt(p: &ProductInfo) -> String {
    format!("珠宝产品的拼贴风格或悬浮构图，{}，轻微阴影，白色或浅色中性背景。", p.style_prompt)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(style: InspirationStyle) -> ProductInfo {
        ProductInfo {
            title: "祥云如意金镶玉".into(),
            style_prompt: "中国风".into(),
            image_base64: String::new(),
            image_mime_type: "image/png".into(),
            inspiration_style: style,
        }
    }

    #[test]
    fn inspiration_prompt_follows_selected_style() {
        let traditional = inspiration_prompt(&product(InspirationStyle::Traditional));
        let manga = inspiration_prompt(&product(InspirationStyle::Manga));
        let paper_cut = inspiration_prompt(&product(InspirationStyle::PaperCut));

        assert!(traditional.starts_with("佩戴珠宝的时尚模特，中国风风格"));
        assert!(manga.contains("漫画风格插图") && manga.contains("祥云如意金镶玉"));
        assert!(paper_cut.contains("剪纸艺术") && paper_cut.contains("中国风"));
    }

    #[test]
    fn copy_prompt_embeds_title() {
        let prompt = copy_prompt("翡翠手镯");
        assert!(prompt.contains("\"翡翠手镯\""));
        assert!(prompt.contains("\"inspirationText\": ["));
    }
}
