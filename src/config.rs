use std::path::PathBuf;

pub const DEFAULT_API_BASE: &str = "https://ark.cn-beijing.volces.com/api/v3";
pub const DEFAULT_TEXT_MODEL: &str = "doubao-seed-1-6-251015";
pub const DEFAULT_IMAGE_MODEL: &str = "doubao-seedream-4-5-251128";
pub const DEFAULT_IMAGE_SIZE: &str = "2K";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_RETAINED_RUNS: usize = 8;

/// Runtime settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Fallback key used when the browser does not send one.
    pub api_key: Option<String>,
    pub api_base: String,
    pub text_model: String,
    pub image_model: String,
    pub image_size: String,
    /// TrueType font embedded into PDF exports; the builtin Helvetica cannot draw CJK glyphs.
    pub pdf_font_path: Option<PathBuf>,
    pub port: u16,
    /// Finished runs kept in memory; older ones are dropped as new runs finish.
    pub max_retained_runs: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            api_key: non_empty("ARK_API_KEY"),
            api_base: non_empty("ARK_API_BASE")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            text_model: non_empty("ARK_TEXT_MODEL").unwrap_or_else(|| DEFAULT_TEXT_MODEL.to_string()),
            image_model: non_empty("ARK_IMAGE_MODEL").unwrap_or_else(|| DEFAULT_IMAGE_MODEL.to_string()),
            image_size: non_empty("ARK_IMAGE_SIZE").unwrap_or_else(|| DEFAULT_IMAGE_SIZE.to_string()),
            pdf_font_path: non_empty("PDF_FONT_PATH").map(PathBuf::from),
            port: non_empty("PORT").and_then(|v| v.parse().ok()).unwrap_or(DEFAULT_PORT),
            max_retained_runs: non_empty("MAX_RETAINED_RUNS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_RETAINED_RUNS),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
