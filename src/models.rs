use serde::{Serialize, Deserialize};
use serde_with::skip_serializing_none;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Visual treatment of the inspiration-section image.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum InspirationStyle {
    #[default]
    Traditional,
    Manga,
    #[serde(alias = "paper_cut")]
    PaperCut,
}

#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GenerateRequest {
    pub title: String,
    #[serde(default)]
    pub style_prompt: String,
    /// Raw base64 or a `data:` URL.
    pub image_base64: String,
    #[serde(default)]
    pub image_mime_type: Option<String>,
    #[serde(default)]
    pub inspiration_style: Option<InspirationStyle>,
}

/// Validated submission. Never mutated after intake.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProductInfo {
    pub title: String,
    pub style_prompt: String,
    pub image_base64: String,
    pub image_mime_type: String,
    #[serde(default)]
    pub inspiration_style: InspirationStyle,
}

impl ProductInfo {
    pub fn image_data_url(&self) -> String {
        format!("data:{};base64,{}", self.image_mime_type, self.image_base64)
    }
}

/// Output of one successful orchestration run.
///
/// Image fields hold base64 payloads; an empty string means the image is absent
/// and the renderer leaves that region blank.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct GeneratedAssets {
    pub subtitle: String,
    pub inspiration_text: Vec<String>,

    pub hero_image: String,
    pub model_inspiration_image: String,
    pub scene_wide_image: String,
    pub model_wear_image: String,
    pub detail_image1: String,
    pub detail_image2: String,
    pub multi_angle_image: String,
    pub background_texture: String,
}

impl GeneratedAssets {
    /// (field name, payload) for every image slot, in page order.
    pub fn images(&self) -> [(&'static str, &str); 8] {
        [
            ("hero_image", self.hero_image.as_str()),
            ("model_inspiration_image", self.model_inspiration_image.as_str()),
            ("scene_wide_image", self.scene_wide_image.as_str()),
            ("model_wear_image", self.model_wear_image.as_str()),
            ("detail_image1", self.detail_image1.as_str()),
            ("detail_image2", self.detail_image2.as_str()),
            ("multi_angle_image", self.multi_angle_image.as_str()),
            ("background_texture", self.background_texture.as_str()),
        ]
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct GenerationStatus {
    pub step: String,
    /// 0..=100
    pub progress: u8,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunState {
    Generating { status: GenerationStatus },
    Completed { assets: GeneratedAssets },
    Failed { error: String },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DetailPageRun {
    pub id: Uuid,
    pub product: ProductInfo,
    #[serde(flatten)]
    pub state: RunState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DetailPageRun {
    pub fn assets(&self) -> Option<&GeneratedAssets> {
        match &self.state {
            RunState::Completed { assets } => Some(assets),
            _ => None,
        }
    }
}

/// Polling view of a run: copy and progress only, no image payloads.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RunPhase {
    Generating { status: GenerationStatus },
    Completed { subtitle: String, inspiration_text: Vec<String> },
    Failed { error: String },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RunSnapshot {
    pub id: Uuid,
    pub title: String,
    #[serde(flatten)]
    pub phase: RunPhase,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&DetailPageRun> for RunSnapshot {
    fn from(run: &DetailPageRun) -> Self {
        let phase = match &run.state {
            RunState::Generating { status } => RunPhase::Generating { status: status.clone() },
            RunState::Completed { assets } => RunPhase::Completed {
                subtitle: assets.subtitle.clone(),
                inspiration_text: assets.inspiration_text.clone(),
            },
            RunState::Failed { error } => RunPhase::Failed { error: error.clone() },
        };
        Self {
            id: run.id,
            title: run.product.title.clone(),
            phase,
            created_at: run.created_at,
            updated_at: run.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RunCreated {
    pub id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn snapshot_of_completed_run_carries_copy_but_no_images() {
        let now = Utc::now();
        let run = DetailPageRun {
            id: Uuid::new_v4(),
            product: ProductInfo {
                title: "足金吊坠".into(),
                style_prompt: String::new(),
                image_base64: "iVBORw0KGgo-product".into(),
                image_mime_type: "image/png".into(),
                inspiration_style: InspirationStyle::Manga,
            },
            state: RunState::Completed {
                assets: GeneratedAssets {
                    subtitle: "温润典雅".into(),
                    inspiration_text: vec!["一".into(), "二".into(), "三".into(), "四".into()],
                    hero_image: "iVBORw0KGgo-hero".into(),
                    ..Default::default()
                },
            },
            created_at: now,
            updated_at: now,
        };

        let json = serde_json::to_value(RunSnapshot::from(&run)).unwrap();
        assert_eq!(json["state"], "completed");
        assert_eq!(json["subtitle"], "温润典雅");
        assert_eq!(json["inspiration_text"].as_array().unwrap().len(), 4);
        let text = json.to_string();
        assert!(!text.contains("iVBORw0KGgo"), "{text}");
    }

    #[test]
    fn generating_snapshot_exposes_status() {
        let phase = RunPhase::Generating { status: GenerationStatus { step: "正在生成文案...".into(), progress: 10 } };
        let json = serde_json::to_value(&phase).unwrap();
        assert_eq!(json["state"], "generating");
        assert_eq!(json["status"]["progress"], 10);
    }
}
