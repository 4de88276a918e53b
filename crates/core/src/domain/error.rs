use serde::Serialize;

/// アプリケーション共通エラーコード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorCode {
    #[serde(rename = "E_INVALID_STATE")]
    InvalidState,
    #[serde(rename = "E_INVALID_RESUME")]
    InvalidResume,
    #[serde(rename = "E_DEVICE")]
    Device,
    #[serde(rename = "E_REMOTE")]
    Remote,
    #[serde(rename = "E_INTERNAL")]
    Internal,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidState => "E_INVALID_STATE",
            Self::InvalidResume => "E_INVALID_RESUME",
            Self::Device => "E_DEVICE",
            Self::Remote => "E_REMOTE",
            Self::Internal => "E_INTERNAL",
        }
    }
}

/// アプリケーションエラー（イベントペイロード兼用）
#[derive(Debug, Clone, Serialize)]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub recoverable: bool,
}

impl AppError {
    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidState,
            message: msg.into(),
            recoverable: true,
        }
    }

    /// 履歴書アップロードの検証エラー（唯一ユーザーに見せるエラー）
    pub fn invalid_resume(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidResume,
            message: msg.into(),
            recoverable: true,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Internal,
            message: msg.into(),
            recoverable: false,
        }
    }

    pub fn device(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Device,
            message: msg.into(),
            recoverable: true,
        }
    }

    pub fn remote(msg: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::Remote,
            message: msg.into(),
            recoverable: true,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {}
