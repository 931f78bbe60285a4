use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, info};

use crate::config::Config;
use crate::models::ProductInfo;

#[derive(Debug, Error)]
pub enum ArkError {
    #[error("HTTP error: {0}")] Http(String),
    #[error("status={status} body={body}")] Status { status: StatusCode, body: String },
    #[error("decode error: {0}")] Decode(String),
    #[error("未返回有效的图像数据")] NoImage,
}

/// Remote side of an orchestration run. Implemented by [`ArkClient`] and by test doubles.
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Raw model text for a copy prompt; `None` when the response had no text at all.
    async fn generate_copy(&self, prompt: &str) -> Result<Option<String>, ArkError>;
    /// Base64 image generated from `prompt` with the product photo as reference.
    async fn generate_image(&self, product: &ProductInfo, prompt: &str) -> Result<String, ArkError>;
}

// Helper function to truncate base64 data in JSON for cleaner logging
fn truncate_base64_in_json(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if key == "b64_json" || key == "image" {
                    if let serde_json::Value::String(s) = val {
                        if s.len() > 100 {
                            let head: String = s.chars().take(50).collect();
                            *val = serde_json::Value::String(format!("{}...[truncated {} chars]", head, s.len() - head.len()));
                        }
                    }
                } else {
                    truncate_base64_in_json(val);
                }
            }
        }
        serde_json::Value::Array(arr) => {
            for val in arr.iter_mut() {
                truncate_base64_in_json(val);
            }
        }
        _ => {}
    }
}

fn preview(data: &str) -> String {
    if data.len() > 50 {
        let head: String = data.chars().take(50).collect();
        format!("{}...[{} chars total]", head, data.len())
    } else {
        data.to_string()
    }
}

pub fn redact_key(key: &str) -> String {
    let shown: String = key.chars().take(6).collect();
    format!("{shown}***")
}

#[derive(Clone)]
pub struct ArkClient {
    client: Client,
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
    image_size: String,
}

impl ArkClient {
    /// One client per run: the key comes from the operator for that run only.
    pub fn new(client: Client, config: &Config, api_key: String) -> Self {
        Self {
            client,
            api_key,
            base_url: config.api_base.clone(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            image_size: config.image_size.clone(),
        }
    }

    async fn post_json(&self, path: &str, body: &serde_json::Value) -> Result<String, ArkError> {
        let url = format!("{}/{}", self.base_url, path);
        info!("🔗 POST {} (key {})", url, redact_key(&self.api_key));

        let mut logged = body.clone();
        truncate_base64_in_json(&mut logged);
        info!("📤 Request body: {}", logged);

        let response = self.client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| ArkError::Http(e.to_string()))?;

        let status = response.status();
        info!("📥 Response status: {}", status);

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            error!("❌ API Error response: {}", error_body);
            return Err(ArkError::Status { status, body: error_body });
        }

        response.text().await.map_err(|e| ArkError::Http(e.to_string()))
    }
}

#[async_trait]
impl GenerationBackend for ArkClient {
    async fn generate_copy(&self, prompt: &str) -> Result<Option<String>, ArkError> {
        info!("Generating copy with model {}...", self.text_model);
        let payload = json!({
            "model": self.text_model,
            "input": [{
                "role": "user",
                "content": [{ "type": "input_text", "text": prompt }]
            }]
        });

        let response_text = self.post_json("responses", &payload).await?;
        let text = extract_response_text(&response_text)?;
        match &text {
            Some(t) => info!("✅ Copy response received ({} chars)", t.len()),
            None => info!("⚠️ No text content found in copy response"),
        }
        Ok(text)
    }

    async fn generate_image(&self, product: &ProductInfo, prompt: &str) -> Result<String, ArkError> {
        info!("🎯 Generating image with prompt (truncated): {}", prompt.chars().take(40).collect::<String>());
        let payload = json!({
            "model": self.image_model,
            "prompt": prompt,
            "image": product.image_data_url(),
            "sequential_image_generation": "disabled",
            "response_format": "b64_json",
            "size": self.image_size,
            "stream": false,
            "watermark": false
        });

        let response_text = self.post_json("images/generations", &payload).await?;
        let image_data = extract_image_b64(&response_text)?;
        info!("🖼️ Extracted {} image from API response: {}", sniff_image_kind(&image_data), preview(&image_data));
        Ok(image_data)
    }
}

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize)]
struct TextResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct Choice { #[serde(default)] message: Option<Message> }

#[derive(Debug, Deserialize)]
struct Message { #[serde(default)] content: Option<String> }

#[derive(Debug, Deserialize)]
struct OutputItem { #[serde(default)] content: Vec<OutputContent> }

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ImageResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData { #[serde(default)] b64_json: Option<String> }

/// Chat-style `choices[0].message.content` first, then the responses-style `output_text` part.
fn extract_response_text(body: &str) -> Result<Option<String>, ArkError> {
    let parsed: TextResponse = serde_json::from_str(body)
        .map_err(|e| ArkError::Decode(format!("{}: {}", e, preview(body))))?;

    let from_choices = parsed
        .choices
        .first()
        .and_then(|c| c.message.as_ref())
        .and_then(|m| m.content.clone());
    if from_choices.is_some() {
        return Ok(from_choices);
    }

    Ok(parsed
        .output
        .iter()
        .flat_map(|item| item.content.iter())
        .find(|c| c.kind == "output_text")
        .and_then(|c| c.text.clone()))
}

fn extract_image_b64(body: &str) -> Result<String, ArkError> {
    let mut logged: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ArkError::Decode(format!("{}: {}", e, preview(body))))?;
    truncate_base64_in_json(&mut logged);
    info!("📥 Raw image API response: {}", logged);

    let parsed: ImageResponse = serde_json::from_str(body)
        .map_err(|e| ArkError::Decode(e.to_string()))?;
    parsed
        .data
        .into_iter()
        .next()
        .and_then(|d| d.b64_json)
        .filter(|d| !d.is_empty())
        .ok_or(ArkError::NoImage)
}

/// Guess from the first base64 characters; enough for logging and data URLs.
pub fn sniff_image_kind(data: &str) -> &'static str {
    if data.starts_with("iVBORw0KGgo") {
        "PNG"
    } else if data.starts_with("/9j/") {
        "JPEG"
    } else if data.starts_with("UklGR") {
        "WEBP"
    } else if data.starts_with("PHN2Zyg") {
        "SVG"
    } else {
        "Unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn text_from_chat_style_choices() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"{\"subtitle\":\"x\"}"}}]}"#;
        assert_eq!(extract_response_text(body).unwrap().as_deref(), Some(r#"{"subtitle":"x"}"#));
    }

    #[test]
    fn text_from_responses_output() {
        let body = r#"{"id":"resp_1","output":[
            {"type":"reasoning","content":[]},
            {"type":"message","content":[{"type":"output_text","text":"hello"}]}
        ]}"#;
        assert_eq!(extract_response_text(body).unwrap().as_deref(), Some("hello"));
    }

    #[test]
    fn text_missing_is_none_but_garbage_is_error() {
        assert_eq!(extract_response_text("{}").unwrap(), None);
        assert!(matches!(extract_response_text("<html>"), Err(ArkError::Decode(_))));
    }

    #[test]
    fn image_payload_extraction() {
        let body = r#"{"created":1,"data":[{"b64_json":"iVBORw0KGgoAAAA"}]}"#;
        assert_eq!(extract_image_b64(body).unwrap(), "iVBORw0KGgoAAAA");
        assert!(matches!(extract_image_b64(r#"{"data":[]}"#), Err(ArkError::NoImage)));
        assert!(matches!(extract_image_b64(r#"{"data":[{"url":"https://x"}]}"#), Err(ArkError::NoImage)));
    }

    #[test]
    fn truncates_long_payloads_for_logs() {
        let long = "A".repeat(500);
        let mut value = json!({"data": [{"b64_json": long}], "model": "m"});
        truncate_base64_in_json(&mut value);
        let shown = value["data"][0]["b64_json"].as_str().unwrap();
        assert!(shown.ends_with("[truncated 450 chars]"));
        assert_eq!(value["model"], "m");
    }

    #[test]
    fn sniffs_common_kinds_and_redacts_keys() {
        assert_eq!(sniff_image_kind("/9j/4AAQ"), "JPEG");
        assert_eq!(sniff_image_kind("iVBORw0KGgoAAA"), "PNG");
        assert_eq!(sniff_image_kind("zzz"), "Unknown");
        assert_eq!(redact_key("ark-1234567890"), "ark-12***");
    }
}
