use async_trait::async_trait;

use crate::domain::speech::{
    CaptureHandle, MediaDevices, MediaKind, MediaStream, RecognitionOptions, SpeechError,
    SpeechOptions, SpeechOutput, SpeechRecognizer,
};

/// 読み上げ機能がない環境用。即座に「読み上げ完了」として戻る。
pub struct NoopSpeechOutput;

#[async_trait]
impl SpeechOutput for NoopSpeechOutput {
    async fn speak(&self, text: &str, _opts: &SpeechOptions) {
        log::debug!("speech output unavailable, skipping prompt ({} chars)", text.len());
    }

    fn is_available(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "noop"
    }
}

/// 音声認識機能がない環境用
pub struct UnavailableRecognizer;

#[async_trait]
impl SpeechRecognizer for UnavailableRecognizer {
    fn is_available(&self) -> bool {
        false
    }

    async fn start(&self, _opts: &RecognitionOptions) -> Result<CaptureHandle, SpeechError> {
        Err(SpeechError::not_available("speech recognition is not supported"))
    }

    fn name(&self) -> &str {
        "unavailable"
    }
}

/// カメラ/マイクがない環境用
pub struct NoMediaDevices;

#[async_trait]
impl MediaDevices for NoMediaDevices {
    async fn acquire(&self, kind: MediaKind) -> Result<Box<dyn MediaStream>, SpeechError> {
        Err(SpeechError::not_available(format!("{kind:?} is not available")))
    }
}
