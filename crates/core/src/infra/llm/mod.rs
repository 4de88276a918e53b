pub mod claude;
mod noop;
pub mod prompts;

pub use claude::ClaudeClient;
pub use noop::NoopLlmClient;

use async_trait::async_trait;

/// LLM 呼び出しエラー
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM not available: {0}")]
    NotAvailable(String),
    #[error("LLM request failed: {0}")]
    Failed(String),
    #[error("LLM request timeout")]
    Timeout,
}

/// 1回分の補完リクエスト（system + user の単発会話）
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    /// 採点は 0 で決定的にする
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens: 1024,
            temperature: None,
        }
    }

    pub fn deterministic(mut self) -> Self {
        self.temperature = Some(0.0);
        self
    }
}

/// リモート LLM クライアント trait（スキル抽出・出題・採点・要約で共用）
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError>;

    fn name(&self) -> &str;
}
