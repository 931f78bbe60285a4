//! Sequential asset generation: one copy call, seven image steps (eight image calls).

use thiserror::Error;
use tracing::{error, info};

use crate::ark::{ArkError, GenerationBackend};
use crate::copy::copy_or_fallback;
use crate::models::{GeneratedAssets, GenerationStatus, ProductInfo};
use crate::prompts;

pub const STEP_COPY: (&str, u8) = ("正在生成文案...", 10);
pub const STEP_TEXTURE: (&str, u8) = ("正在生成风格底纹...", 20);
pub const STEP_HERO: (&str, u8) = ("正在生成主场景图...", 30);
pub const STEP_INSPIRATION: (&str, u8) = ("正在生成灵感模特图...", 45);
pub const STEP_SCENE: (&str, u8) = ("正在生成广角场景图...", 55);
pub const STEP_MODEL_WEAR: (&str, u8) = ("正在生成佩戴展示图...", 70);
pub const STEP_DETAILS: (&str, u8) = ("正在生成细节图...", 80);
pub const STEP_MULTI_ANGLE: (&str, u8) = ("正在生成多角度展示...", 90);
pub const STEP_DONE: (&str, u8) = ("组装完成", 100);

#[derive(Debug, Error)]
#[error("生成失败: {step}: {source}")]
pub struct GenerationError {
    pub step: &'static str,
    #[source]
    pub source: ArkError,
}

fn report<F: Fn(GenerationStatus)>(on_progress: &F, (step, progress): (&str, u8)) {
    info!("⏳ [{:>3}%] {}", progress, step);
    on_progress(GenerationStatus { step: step.to_string(), progress });
}

async fn image_step<B: GenerationBackend + ?Sized>(
    backend: &B,
    product: &ProductInfo,
    step: &'static str,
    prompt: String,
) -> Result<String, GenerationError> {
    backend.generate_image(product, &prompt).await.map_err(|source| {
        error!("❌ {} failed: {}", step, source);
        GenerationError { step, source }
    })
}

/// Runs every generation step for `product`, reporting progress as each step starts.
///
/// Any remote failure aborts the run; no partial assets escape. Malformed copy is the one
/// recoverable case and is replaced by the fallback copy.
pub async fn generate_assets<B, F>(
    backend: &B,
    product: &ProductInfo,
    on_progress: F,
) -> Result<GeneratedAssets, GenerationError>
where
    B: GenerationBackend + ?Sized,
    F: Fn(GenerationStatus),
{
    info!("🚀 Generating detail page assets for: {}", product.title);

    report(&on_progress, STEP_COPY);
    let raw_copy = backend
        .generate_copy(&prompts::copy_prompt(&product.title))
        .await
        .map_err(|source| {
            error!("❌ copy step failed: {}", source);
            GenerationError { step: STEP_COPY.0, source }
        })?;
    let copy = copy_or_fallback(raw_copy.as_deref());

    report(&on_progress, STEP_TEXTURE);
    let background_texture =
        image_step(backend, product, STEP_TEXTURE.0, prompts::background_texture_prompt(product)).await?;

    report(&on_progress, STEP_HERO);
    let hero_image = image_step(backend, product, STEP_HERO.0, prompts::hero_prompt(product)).await?;

    report(&on_progress, STEP_INSPIRATION);
    let model_inspiration_image =
        image_step(backend, product, STEP_INSPIRATION.0, prompts::inspiration_prompt(product)).await?;

    report(&on_progress, STEP_SCENE);
    let scene_wide_image = image_step(backend, product, STEP_SCENE.0, prompts::scene_wide_prompt(product)).await?;

    report(&on_progress, STEP_MODEL_WEAR);
    let model_wear_image =
        image_step(backend, product, STEP_MODEL_WEAR.0, prompts::model_wear_prompt(product)).await?;

    report(&on_progress, STEP_DETAILS);
    let (detail_image1, detail_image2) = tokio::try_join!(
        image_step(backend, product, STEP_DETAILS.0, prompts::detail_macro_prompt(product)),
        image_step(backend, product, STEP_DETAILS.0, prompts::detail_artistic_prompt(product)),
    )?;

    report(&on_progress, STEP_MULTI_ANGLE);
    let multi_angle_image =
        image_step(backend, product, STEP_MULTI_ANGLE.0, prompts::multi_angle_prompt(product)).await?;

    let assets = GeneratedAssets {
        subtitle: copy.subtitle,
        inspiration_text: copy.inspiration_text,
        hero_image,
        model_inspiration_image,
        scene_wide_image,
        model_wear_image,
        detail_image1,
        detail_image2,
        multi_angle_image,
        background_texture,
    };
    report(&on_progress, STEP_DONE);
    info!("✅ Assets assembled for: {}", product.title);
    Ok(assets)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::copy::MarketingCopy;
    use crate::models::InspirationStyle;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;

    /// In-memory backend: echoes a deterministic payload per prompt, optionally failing one.
    #[derive(Default)]
    pub(crate) struct MockBackend {
        pub copy: Option<String>,
        pub fail_on: Option<&'static str>,
        /// Makes the text call fail with a transport error.
        pub fail_copy: bool,
        pub prompts: Mutex<Vec<String>>,
    }

    impl MockBackend {
        pub(crate) fn with_copy(copy: &str) -> Self {
            Self { copy: Some(copy.to_string()), ..Default::default() }
        }
    }

    #[async_trait]
    impl GenerationBackend for MockBackend {
        async fn generate_copy(&self, prompt: &str) -> Result<Option<String>, ArkError> {
            self.prompts.lock().push(prompt.to_string());
            if self.fail_copy {
                return Err(ArkError::Http("connection reset".into()));
            }
            Ok(self.copy.clone())
        }

        async fn generate_image(&self, _product: &ProductInfo, prompt: &str) -> Result<String, ArkError> {
            let index = {
                let mut prompts = self.prompts.lock();
                prompts.push(prompt.to_string());
                prompts.len()
            };
            if let Some(needle) = self.fail_on {
                if prompt.contains(needle) {
                    return Err(ArkError::Status {
                        status: StatusCode::INTERNAL_SERVER_ERROR,
                        body: "upstream exploded".into(),
                    });
                }
            }
            Ok(format!("iVBORw0KGgo-image-{index}"))
        }
    }

    pub(crate) const GOOD_COPY: &str =
        r#"```json
{"subtitle":"温润典雅臻品之选","inspirationText":["祥云入梦","金玉良缘","温润如玉","福泽绵长"]}
```"#;

    pub(crate) fn product() -> ProductInfo {
        ProductInfo {
            title: "足金和田玉吊坠".into(),
            style_prompt: "中国风".into(),
            image_base64: "iVBORw0KGgo".into(),
            image_mime_type: "image/png".into(),
            inspiration_style: InspirationStyle::Traditional,
        }
    }

    #[tokio::test]
    async fn successful_run_reports_all_steps_and_fills_every_field() {
        let backend = MockBackend::with_copy(GOOD_COPY);
        let seen = Mutex::new(Vec::new());

        let assets = generate_assets(&backend, &product(), |s| seen.lock().push(s.progress))
            .await
            .unwrap();

        assert_eq!(*seen.lock(), vec![10, 20, 30, 45, 55, 70, 80, 90, 100]);
        assert_eq!(assets.subtitle, "温润典雅臻品之选");
        assert_eq!(assets.inspiration_text.len(), 4);
        assert!(assets.images().iter().all(|(_, data)| !data.is_empty()));
        // one copy call plus eight image calls
        assert_eq!(backend.prompts.lock().len(), 9);
    }

    #[tokio::test]
    async fn short_copy_falls_back_and_run_completes() {
        let backend = MockBackend::with_copy(r#"{"subtitle":"温润典雅臻品之选","inspirationText":["一","二","三"]}"#);
        let last = Mutex::new(0u8);

        let assets = generate_assets(&backend, &product(), |s| *last.lock() = s.progress)
            .await
            .unwrap();

        let fallback = MarketingCopy::fallback();
        assert_eq!(assets.subtitle, fallback.subtitle);
        assert_eq!(assets.inspiration_text, fallback.inspiration_text);
        assert_eq!(*last.lock(), 100);
    }

    #[tokio::test]
    async fn missing_copy_text_falls_back() {
        let backend = MockBackend::default();
        let assets = generate_assets(&backend, &product(), |_| {}).await.unwrap();
        assert_eq!(assets.inspiration_text, MarketingCopy::fallback().inspiration_text);
    }

    #[tokio::test]
    async fn image_failure_aborts_without_result() {
        let backend = MockBackend { fail_on: Some("广角"), ..MockBackend::with_copy(GOOD_COPY) };
        let seen = Mutex::new(Vec::new());

        let err = generate_assets(&backend, &product(), |s| seen.lock().push(s.progress))
            .await
            .unwrap_err();

        assert_eq!(err.step, STEP_SCENE.0);
        assert!(err.to_string().starts_with("生成失败: 正在生成广角场景图...: status=500"));
        assert_eq!(*seen.lock(), vec![10, 20, 30, 45, 55]);
        // nothing after the failing step was requested
        assert!(!backend.prompts.lock().iter().any(|p| p.contains("拼贴")));
    }

    #[tokio::test]
    async fn copy_transport_error_aborts_before_any_image() {
        let backend = MockBackend { fail_copy: true, ..MockBackend::with_copy(GOOD_COPY) };
        let seen = Mutex::new(Vec::new());

        let err = generate_assets(&backend, &product(), |s| seen.lock().push(s.progress))
            .await
            .unwrap_err();

        assert_eq!(err.step, STEP_COPY.0);
        assert!(matches!(err.source, ArkError::Http(_)));
        assert_eq!(*seen.lock(), vec![10]);
        // only the copy prompt was sent
        assert_eq!(backend.prompts.lock().len(), 1);
    }

    #[tokio::test]
    async fn failure_in_parallel_detail_pair_aborts() {
        let backend = MockBackend { fail_on: Some("艺术角度"), ..MockBackend::with_copy(GOOD_COPY) };
        let err = generate_assets(&backend, &product(), |_| {}).await.unwrap_err();
        assert_eq!(err.step, STEP_DETAILS.0);
    }

    #[tokio::test]
    async fn inspiration_step_uses_selected_style() {
        let backend = MockBackend::with_copy(GOOD_COPY);
        let mut paper_cut = product();
        paper_cut.inspiration_style = InspirationStyle::PaperCut;

        generate_assets(&backend, &paper_cut, |_| {}).await.unwrap();

        let prompts = backend.prompts.lock();
        assert!(prompts[3].contains("剪纸艺术"), "fourth call is the inspiration image: {}", prompts[3]);
    }
}
