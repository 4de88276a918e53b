use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::types::VoiceRound;

/// 面接シミュレーター設定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSettings {
    /// 技術面接の回答取得締め切り（秒）
    pub technical_capture_timeout_secs: u64,
    /// HR面接の回答取得締め切り（秒）
    pub hr_capture_timeout_secs: u64,
    /// 質問間の待機（ミリ秒）
    pub inter_question_pause_ms: u64,
    /// 1ラウンドあたりの質問数
    pub question_count: usize,
    /// 読み上げ速度
    pub speech_rate: f32,
    /// 認識/読み上げ言語
    pub language: String,
    /// LLM モデル名
    pub llm_model: String,
    /// LLM エンドポイント
    pub llm_endpoint: String,
    /// LLM リクエストのタイムアウト（秒）
    pub llm_timeout_secs: u64,
    /// LLM API キー（未設定ならリモート呼び出しは全てフォールバック）
    pub llm_api_key: Option<String>,
}

impl InterviewSettings {
    pub fn capture_timeout(&self, round: VoiceRound) -> Duration {
        match round {
            VoiceRound::Technical => Duration::from_secs(self.technical_capture_timeout_secs),
            VoiceRound::Hr => Duration::from_secs(self.hr_capture_timeout_secs),
        }
    }

    pub fn inter_question_pause(&self) -> Duration {
        Duration::from_millis(self.inter_question_pause_ms)
    }

    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }
}

impl Default for InterviewSettings {
    fn default() -> Self {
        Self {
            technical_capture_timeout_secs: 15,
            hr_capture_timeout_secs: 20,
            inter_question_pause_ms: 2000,
            question_count: 3,
            speech_rate: 0.9,
            language: "en-US".to_string(),
            llm_model: "claude-sonnet-4-20250514".to_string(),
            llm_endpoint: "https://api.anthropic.com/v1/messages".to_string(),
            llm_timeout_secs: 30,
            llm_api_key: None,
        }
    }
}
