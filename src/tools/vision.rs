//! 图像理解：base64 解码后交给视觉模型

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;

use crate::llm::LlmClient;

pub const DEFAULT_IMAGE_PROMPT: &str = "Describe this image.";

/// 过短的 base64 视为空
const MIN_BASE64_LEN: usize = 10;

pub struct ImageDescriber {
    llm: Arc<dyn LlmClient>,
}

impl ImageDescriber {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// 总是返回面向用户的文本（错误也以文本形式返回）
    pub async fn describe(&self, image_base64: &str, prompt: &str) -> String {
        let encoded = image_base64.trim();
        if encoded.len() < MIN_BASE64_LEN {
            return "Error: Received an empty or invalid base64 string.".to_string();
        }
        let bytes = match BASE64_STANDARD.decode(encoded) {
            Ok(bytes) => bytes,
            Err(e) => return format!("Image data processing error: {e}"),
        };
        tracing::info!(bytes = bytes.len(), "describing image");

        match self.llm.describe_image(prompt, &bytes).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "vision model failed");
                format!("Vision model error: {e}")
            }
        }
    }
}
