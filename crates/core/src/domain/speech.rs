use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};

// ─── CapturedAnswer ──────────────────────────────────────────────

/// 音声回答の取得結果。失敗時も `text` には固定の番兵文字列が入る。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedAnswer {
    pub text: String,
    pub status: CaptureStatus,
}

/// 取得結果の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptureStatus {
    /// 確定した書き起こし
    Recognized,
    /// 締め切りまでに確定結果なし、または発話なしで終了
    NoAnswer,
    /// 認識エンジンがエラーを報告
    Error,
    /// 実行環境に音声認識機能がない
    Unavailable,
}

impl CapturedAnswer {
    pub const NO_ANSWER: &'static str = "No answer captured.";
    pub const CAPTURE_ERROR: &'static str = "Error capturing audio.";
    pub const NOT_AVAILABLE: &'static str = "Speech recognition not available.";

    pub fn recognized(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            status: CaptureStatus::Recognized,
        }
    }

    pub fn no_answer() -> Self {
        Self {
            text: Self::NO_ANSWER.to_string(),
            status: CaptureStatus::NoAnswer,
        }
    }

    pub fn error() -> Self {
        Self {
            text: Self::CAPTURE_ERROR.to_string(),
            status: CaptureStatus::Error,
        }
    }

    pub fn unavailable() -> Self {
        Self {
            text: Self::NOT_AVAILABLE.to_string(),
            status: CaptureStatus::Unavailable,
        }
    }

    /// 番兵文字列かどうか
    pub fn is_sentinel_text(text: &str) -> bool {
        let t = text.trim();
        t.is_empty()
            || t.contains(Self::NO_ANSWER)
            || t.contains("No answer")
            || t == Self::CAPTURE_ERROR
            || t == Self::NOT_AVAILABLE
    }
}

// ─── SpeechError ─────────────────────────────────────────────────

/// 音声入出力・メディアデバイスで発生するエラー。
#[derive(Debug, Clone)]
pub struct SpeechError {
    pub kind: SpeechErrorKind,
    pub detail: String,
    pub recoverable: bool,
}

impl std::fmt::Display for SpeechError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SpeechError::{:?}: {}", self.kind, self.detail)
    }
}

impl std::error::Error for SpeechError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpeechErrorKind {
    /// 機能が存在しない
    NotAvailable,
    /// マイク/カメラ権限が拒否された
    PermissionDenied,
    /// デバイスエラー
    Device,
    /// 認識処理中のエラー
    RecognitionFailed,
}

impl SpeechError {
    pub fn not_available(detail: impl Into<String>) -> Self {
        Self { kind: SpeechErrorKind::NotAvailable, detail: detail.into(), recoverable: false }
    }

    pub fn permission_denied(detail: impl Into<String>) -> Self {
        Self { kind: SpeechErrorKind::PermissionDenied, detail: detail.into(), recoverable: false }
    }

    pub fn device(detail: impl Into<String>) -> Self {
        Self { kind: SpeechErrorKind::Device, detail: detail.into(), recoverable: true }
    }

    pub fn recognition_failed(detail: impl Into<String>) -> Self {
        Self { kind: SpeechErrorKind::RecognitionFailed, detail: detail.into(), recoverable: true }
    }
}

// ─── Options ─────────────────────────────────────────────────────

/// 読み上げオプション
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechOptions {
    pub rate: f32,
    pub language: String,
}

impl Default for SpeechOptions {
    fn default() -> Self {
        Self {
            rate: 0.9,
            language: "en-US".to_string(),
        }
    }
}

/// 認識オプション（単発・確定結果のみ）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognitionOptions {
    pub language: String,
    pub continuous: bool,
    pub interim_results: bool,
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            continuous: false,
            interim_results: false,
        }
    }
}

// ─── RecognitionEvent / CaptureHandle ────────────────────────────

/// 認識エンジンから届くイベント。
#[derive(Debug, Clone)]
pub enum RecognitionEvent {
    /// 部分結果（interim_results 有効時のみ）
    Partial(String),
    /// 確定結果
    Final { text: String, confidence: Option<f32> },
    /// エラー
    Error(SpeechError),
    /// 認識終了（マイク解放済み）
    Ended,
}

/// 進行中の音声取得へのハンドル。drop 時に停止を要求してマイクを解放させる。
pub struct CaptureHandle {
    events: mpsc::UnboundedReceiver<RecognitionEvent>,
    stop_tx: Option<oneshot::Sender<()>>,
}

/// 認識エンジン側の送信口。`stopped()` で停止要求を待てる。
pub struct CaptureFeed {
    events: mpsc::UnboundedSender<RecognitionEvent>,
    stop_rx: Option<oneshot::Receiver<()>>,
}

impl CaptureHandle {
    /// エンジン側の送信口とハンドルを組で生成する
    pub fn channel() -> (CaptureFeed, CaptureHandle) {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let (stop_tx, stop_rx) = oneshot::channel();
        (
            CaptureFeed {
                events: event_tx,
                stop_rx: Some(stop_rx),
            },
            CaptureHandle {
                events: event_rx,
                stop_tx: Some(stop_tx),
            },
        )
    }

    /// 次のイベント。送信側が閉じたら None。
    pub async fn next_event(&mut self) -> Option<RecognitionEvent> {
        self.events.recv().await
    }

    /// 停止を要求する（二度目以降は何もしない）
    pub fn stop(&mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stop_tx.is_none()
    }
}

impl Drop for CaptureHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

impl CaptureFeed {
    /// イベント送信。受信側が消えていれば false。
    pub fn send(&self, event: RecognitionEvent) -> bool {
        self.events.send(event).is_ok()
    }

    /// 停止要求（またはハンドル破棄）まで待つ
    pub async fn stopped(&mut self) {
        if let Some(rx) = self.stop_rx.as_mut() {
            let _ = rx.await;
            self.stop_rx = None;
        }
    }

    /// 停止要求が既に来ているか
    pub fn is_stop_requested(&mut self) -> bool {
        match self.stop_rx.as_mut().map(|rx| rx.try_recv()) {
            Some(Err(oneshot::error::TryRecvError::Empty)) => false,
            _ => {
                self.stop_rx = None;
                true
            }
        }
    }
}

// ─── Capability traits ───────────────────────────────────────────

/// テキスト読み上げ。再生終了・エラー・機能なしのいずれでも戻る（失敗しない）。
#[async_trait::async_trait]
pub trait SpeechOutput: Send + Sync {
    async fn speak(&self, text: &str, opts: &SpeechOptions);

    fn is_available(&self) -> bool;

    fn name(&self) -> &str;
}

/// 音声認識エンジン。締め切り管理は呼び出し側（SpeechInput）が持つ。
#[async_trait::async_trait]
pub trait SpeechRecognizer: Send + Sync {
    fn is_available(&self) -> bool;

    async fn start(&self, opts: &RecognitionOptions) -> Result<CaptureHandle, SpeechError>;

    fn name(&self) -> &str;
}

// ─── Media devices ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Camera,
    Microphone,
}

/// 取得済みメディアストリーム
pub trait MediaStream: Send {
    fn kind(&self) -> MediaKind;

    /// 全トラックを停止してデバイスを解放する
    fn stop(&mut self);
}

/// カメラ/マイクの取得口
#[async_trait::async_trait]
pub trait MediaDevices: Send + Sync {
    async fn acquire(&self, kind: MediaKind) -> Result<Box<dyn MediaStream>, SpeechError>;
}

/// ストリームの排他所有者。drop 時に必ず停止する。
pub struct MediaGuard {
    stream: Option<Box<dyn MediaStream>>,
}

impl MediaGuard {
    pub fn new(stream: Box<dyn MediaStream>) -> Self {
        Self {
            stream: Some(stream),
        }
    }

    /// デバイスなしで続行する場合の空ガード
    pub fn empty() -> Self {
        Self { stream: None }
    }

    pub fn is_active(&self) -> bool {
        self.stream.is_some()
    }

    pub fn release(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            log::info!("releasing {:?} stream", stream.kind());
            stream.stop();
        }
    }
}

impl Drop for MediaGuard {
    fn drop(&mut self) {
        self.release();
    }
}

// ─── Tests ───────────────────────────────────────────────────────
