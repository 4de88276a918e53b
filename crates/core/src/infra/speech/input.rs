use std::sync::Arc;
use std::time::Duration;

use crate::domain::speech::{
    CaptureHandle, CapturedAnswer, RecognitionEvent, RecognitionOptions, SpeechErrorKind,
    SpeechRecognizer,
};

/// 締め切り付きの音声回答取得。
///
/// 最初の確定結果、または番兵文字列で必ず戻る。締め切りに達した場合は
/// 認識ハンドルを破棄して停止要求を送り、マイクを解放させる。
pub struct SpeechInput {
    recognizer: Arc<dyn SpeechRecognizer>,
    options: RecognitionOptions,
}

impl SpeechInput {
    pub fn new(recognizer: Arc<dyn SpeechRecognizer>, options: RecognitionOptions) -> Self {
        Self {
            recognizer,
            options,
        }
    }

    pub fn recognizer_name(&self) -> &str {
        self.recognizer.name()
    }

    /// `deadline` 以内に回答を取得する（失敗しない）
    pub async fn capture(&self, deadline: Duration) -> CapturedAnswer {
        // 機能がなければ締め切りを待たずに即返す
        if !self.recognizer.is_available() {
            return CapturedAnswer::unavailable();
        }

        match tokio::time::timeout(deadline, self.start_and_wait()).await {
            Ok(answer) => answer,
            Err(_) => {
                // ここで future ごと CaptureHandle が drop され、停止要求が送られる
                log::info!(
                    "capture deadline ({} ms) reached without a final transcript",
                    deadline.as_millis()
                );
                CapturedAnswer::no_answer()
            }
        }
    }

    async fn start_and_wait(&self) -> CapturedAnswer {
        let mut handle = match self.recognizer.start(&self.options).await {
            Ok(handle) => handle,
            Err(e) if e.kind == SpeechErrorKind::NotAvailable => {
                log::warn!("recognizer {} unavailable: {e}", self.recognizer.name());
                return CapturedAnswer::unavailable();
            }
            Err(e) => {
                log::warn!("recognizer {} failed to start: {e}", self.recognizer.name());
                return CapturedAnswer::error();
            }
        };

        let answer = wait_for_final(&mut handle).await;
        handle.stop();
        answer
    }
}

async fn wait_for_final(handle: &mut CaptureHandle) -> CapturedAnswer {
    loop {
        match handle.next_event().await {
            Some(RecognitionEvent::Final { text, confidence }) => {
                let text = text.trim();
                if text.is_empty() {
                    continue;
                }
                log::debug!("final transcript (confidence {confidence:?})");
                return CapturedAnswer::recognized(text);
            }
            Some(RecognitionEvent::Partial(text)) => {
                log::debug!("partial transcript: {text}");
            }
            Some(RecognitionEvent::Error(e)) => {
                log::warn!("recognition error: {e}");
                return CapturedAnswer::error();
            }
            Some(RecognitionEvent::Ended) | None => return CapturedAnswer::no_answer(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::speech::{CaptureStatus, SpeechError};
    use crate::infra::speech::UnavailableRecognizer;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// テスト用の認識エンジン。start 時に台本どおりのイベントを流す。
    enum Script {
        Final(&'static str),
        Silence,
        Error,
        EndedEmpty,
        StartFails,
    }

    struct ScriptedRecognizer {
        script: Script,
        stopped: Arc<AtomicBool>,
        feeds: Mutex<Vec<crate::domain::speech::CaptureFeed>>,
    }

    impl ScriptedRecognizer {
        fn new(script: Script) -> Self {
            Self {
                script,
                stopped: Arc::new(AtomicBool::new(false)),
                feeds: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SpeechRecognizer for ScriptedRecognizer {
        fn is_available(&self) -> bool {
            true
        }

        async fn start(&self, _opts: &RecognitionOptions) -> Result<CaptureHandle, SpeechError> {
            let (mut feed, handle) = CaptureHandle::channel();
            match self.script {
                Script::Final(text) => {
                    feed.send(RecognitionEvent::Partial("partial".into()));
                    feed.send(RecognitionEvent::Final {
                        text: text.into(),
                        confidence: Some(0.8),
                    });
                }
                Script::Silence => {}
                Script::Error => {
                    feed.send(RecognitionEvent::Error(SpeechError::recognition_failed(
                        "network",
                    )));
                }
                Script::EndedEmpty => {
                    feed.send(RecognitionEvent::Final {
                        text: "   ".into(),
                        confidence: None,
                    });
                    feed.send(RecognitionEvent::Ended);
                }
                Script::StartFails => return Err(SpeechError::device("mic busy")),
            }
            let stopped = self.stopped.clone();
            if matches!(self.script, Script::Silence) {
                tokio::spawn(async move {
                    feed.stopped().await;
                    stopped.store(true, Ordering::SeqCst);
                });
            } else {
                assert!(!feed.is_stop_requested());
                self.feeds.lock().push(feed);
            }
            Ok(handle)
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn input(script: Script) -> (SpeechInput, Arc<AtomicBool>) {
        let recognizer = ScriptedRecognizer::new(script);
        let stopped = recognizer.stopped.clone();
        (
            SpeechInput::new(Arc::new(recognizer), RecognitionOptions::default()),
            stopped,
        )
    }

    #[tokio::test]
    async fn test_returns_first_final() {
        let (input, _) = input(Script::Final("  I used Rust for a CLI  "));
        let answer = input.capture(Duration::from_secs(15)).await;
        assert_eq!(answer, CapturedAnswer::recognized("I used Rust for a CLI"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_yields_no_answer_and_stops_capture() {
        let (input, stopped) = input(Script::Silence);
        let started = tokio::time::Instant::now();
        let answer = input.capture(Duration::from_secs(15)).await;
        assert_eq!(answer.status, CaptureStatus::NoAnswer);
        assert_eq!(answer.text, CapturedAnswer::NO_ANSWER);
        assert!(started.elapsed() <= Duration::from_secs(15) + Duration::from_millis(10));

        // 停止要求を受けた側のタスクを走らせる
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;
        assert!(stopped.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_recognition_error_sentinel() {
        let (input, _) = input(Script::Error);
        let answer = input.capture(Duration::from_secs(15)).await;
        assert_eq!(answer, CapturedAnswer::error());
    }

    #[tokio::test]
    async fn test_ended_without_speech() {
        let (input, _) = input(Script::EndedEmpty);
        let answer = input.capture(Duration::from_secs(15)).await;
        assert_eq!(answer, CapturedAnswer::no_answer());
    }

    #[tokio::test]
    async fn test_start_failure_is_error_sentinel() {
        let (input, _) = input(Script::StartFails);
        let answer = input.capture(Duration::from_secs(15)).await;
        assert_eq!(answer, CapturedAnswer::error());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_resolves_immediately() {
        let input = SpeechInput::new(
            Arc::new(UnavailableRecognizer),
            RecognitionOptions::default(),
        );
        let started = tokio::time::Instant::now();
        let answer = input.capture(Duration::from_secs(20)).await;
        assert_eq!(answer, CapturedAnswer::unavailable());
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}
