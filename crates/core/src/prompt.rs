// crates/core/src/prompt.rs
//! System prompt assembly and request construction.

use std::fmt::Write;

use proofread_types::{Correction, ProofreadingConfig};

use crate::llm::types::ChatCompletionRequest;

const GLOSSARY_HEADER: &str = "以下是用户自定义词库。文中出现左侧词语时，请以右侧写法为准，并按“错别字”类别报告：";

/// Append the user's glossary to `base`. No corrections, no change.
pub fn build_system_prompt<'a>(base: &str, corrections: impl IntoIterator<Item = &'a Correction>) -> String {
    let mut prompt = base.trim_end().to_string();
    let mut corrections = corrections.into_iter().peekable();
    if corrections.peek().is_none() {
        return prompt;
    }
    prompt.push_str("\n\n");
    prompt.push_str(GLOSSARY_HEADER);
    for c in corrections {
        // Writing to a String cannot fail.
        let _ = write!(prompt, "\n- {} → {}", c.original, c.suggestion);
    }
    prompt
}

/// The streamed proofreading request for `input_text`.
pub fn build_request<'a>(
    config: &ProofreadingConfig,
    corrections: impl IntoIterator<Item = &'a Correction>,
    input_text: &str,
) -> ChatCompletionRequest {
    let system = build_system_prompt(config.system_prompt(), corrections);
    ChatCompletionRequest::proofreading(&config.model, system, input_text)
}
