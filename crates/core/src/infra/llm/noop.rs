use async_trait::async_trait;

use super::{CompletionRequest, LlmClient, LlmError};

/// NoopLlmClient: API キー未設定時の実装。常に NotAvailable を返し、
/// 呼び出し側はフォールバック値で続行する。
pub struct NoopLlmClient;

#[async_trait]
impl LlmClient for NoopLlmClient {
    async fn complete(&self, _request: CompletionRequest) -> Result<String, LlmError> {
        Err(LlmError::NotAvailable("no API key configured".to_string()))
    }

    fn name(&self) -> &str {
        "noop"
    }
}
