// crates/types/src/config.rs
use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// System prompt sent when the user has not configured their own.
pub const DEFAULT_PROMPT: &str = r#"你是一名专业的中文校对编辑。请逐句检查用户提供的文章，找出其中的错别字、语法错误、标点符号错误以及可以优化的表达。

只输出一个 JSON 对象，不要输出任何其他内容，格式如下：
{"issues":[{"original":"原文中有问题的片段","suggestion":"修改后的片段","reason":"修改原因","category":"错别字"}]}

要求：
1. original 必须是原文中逐字存在的连续片段，尽量短，但要足以唯一定位；
2. category 只能是 "错别字"、"语法错误"、"标点符号"、"表达优化" 之一；
3. 按问题在原文中出现的顺序输出；
4. 没有问题时输出 {"issues":[]}。"#;

/// User-editable proofreading configuration, persisted as one JSON document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "codegen", ts(export, export_to = "../../../web/src/types/generated/"))]
#[serde(rename_all = "camelCase", default)]
pub struct ProofreadingConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub custom_prompt: String,
    pub timeout_secs: u64,
}

impl Default for ProofreadingConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            api_key: String::new(),
            model: DEFAULT_MODEL.into(),
            custom_prompt: DEFAULT_PROMPT.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ProofreadingConfig {
    /// The system prompt to send: the custom one, or the built-in default
    /// when the user cleared it.
    pub fn system_prompt(&self) -> &str {
        if self.custom_prompt.trim().is_empty() {
            DEFAULT_PROMPT
        } else {
            &self.custom_prompt
        }
    }

    /// Names of the required fields that are still empty.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.api_url.trim().is_empty() {
            missing.push("apiUrl");
        }
        if self.api_key.trim().is_empty() {
            missing.push("apiKey");
        }
        if self.model.trim().is_empty() {
            missing.push("model");
        }
        missing
    }
}
