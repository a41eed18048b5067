// crates/core/src/llm/factory.rs
//! Provider factory: creates an LlmProvider from the persisted configuration.

use std::sync::Arc;

use proofread_types::ProofreadingConfig;

use super::openai::OpenAiCompatProvider;
use super::provider::LlmProvider;
use super::types::LlmError;

/// Create an LLM provider for the given configuration.
///
/// Fails with [`LlmError::NotConfigured`] naming every required field that
/// is blank, so the caller can prompt for all of them at once.
pub fn create_provider(config: &ProofreadingConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    let missing = config.missing_fields();
    if !missing.is_empty() {
        return Err(LlmError::NotConfigured(format!(
            "missing {}",
            missing.join(", ")
        )));
    }
    Ok(Arc::new(OpenAiCompatProvider::from_config(config)?))
}
