use serde_json::Value;
use thiserror::Error;

pub const FALLBACK_SUBTITLE: &str = "璀璨臻品至美之选";
pub const FALLBACK_INSPIRATION: [&str; 4] = [
    "匠心独运耀目光华",
    "典雅设计传世之美",
    "璀璨宝石恒久闪耀",
    "珍贵材质雕琢非凡",
];

#[derive(Debug, Clone, PartialEq)]
pub struct MarketingCopy {
    pub subtitle: String,
    pub inspiration_text: Vec<String>,
}

impl MarketingCopy {
    pub fn fallback() -> Self {
        Self {
            subtitle: FALLBACK_SUBTITLE.to_string(),
            inspiration_text: FALLBACK_INSPIRATION.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum CopyError {
    #[error("response carried no text")]
    Empty,
    #[error("invalid JSON: {0}")]
    Json(String),
    #[error("missing or invalid subtitle")]
    Subtitle,
    #[error("inspirationText must be an array of 4 elements")]
    InspirationShape,
    #[error("inspirationText[{0}] must be a string")]
    InspirationEntry(usize),
}

/// Strips a surrounding ```json / ``` fence if the model added one.
pub fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let inner = if let Some(rest) = trimmed.strip_prefix("```json") {
        rest
    } else if let Some(rest) = trimmed.strip_prefix("```") {
        rest
    } else {
        return trimmed;
    };
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

pub fn parse_copy(content: &str) -> Result<MarketingCopy, CopyError> {
    let body = strip_code_fence(content);
    if body.is_empty() {
        return Err(CopyError::Empty);
    }
    let parsed: Value = serde_json::from_str(body).map_err(|e| CopyError::Json(e.to_string()))?;

    let subtitle = match parsed.get("subtitle") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => return Err(CopyError::Subtitle),
    };

    let lines = match parsed.get("inspirationText") {
        Some(Value::Array(items)) if items.len() == 4 => items,
        _ => return Err(CopyError::InspirationShape),
    };
    let inspiration_text = lines
        .iter()
        .enumerate()
        .map(|(i, v)| v.as_str().map(str::to_string).ok_or(CopyError::InspirationEntry(i)))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MarketingCopy { subtitle, inspiration_text })
}

/// Parses the text step's output, substituting [`MarketingCopy::fallback`] on any problem.
/// This is the only place a generation failure is absorbed.
pub fn copy_or_fallback(content: Option<&str>) -> MarketingCopy {
    match parse_copy(content.unwrap_or_default()) {
        Ok(copy) => copy,
        Err(e) => {
            tracing::warn!("⚠️ Copy response rejected ({}), using fallback copy. Raw: {:?}", e, content);
            MarketingCopy::fallback()
        }
    }
}
