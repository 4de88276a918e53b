//! ユースケース層テスト用のモック
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::domain::speech::{
    CaptureFeed, CaptureHandle, MediaDevices, MediaKind, MediaStream, RecognitionEvent,
    RecognitionOptions, SpeechError, SpeechOptions, SpeechOutput, SpeechRecognizer,
};
use crate::infra::llm::{CompletionRequest, LlmClient, LlmError};

/// 台本どおりに応答する LLM。台本が尽きたら失敗を返す。
pub(crate) struct ScriptedLlm {
    responses: Mutex<VecDeque<Result<String, LlmError>>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedLlm {
    pub(crate) fn new(responses: Vec<Result<String, LlmError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn replying(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub(crate) fn failing() -> Self {
        Self::new(vec![])
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn last_request(&self) -> Option<CompletionRequest> {
        self.requests.lock().last().cloned()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Failed("connection refused".to_string())))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// 読み上げた文を記録する
#[derive(Default)]
pub(crate) struct RecordingOutput {
    spoken: Mutex<Vec<String>>,
}

impl RecordingOutput {
    pub(crate) fn spoken(&self) -> Vec<String> {
        self.spoken.lock().clone()
    }
}

#[async_trait]
impl SpeechOutput for RecordingOutput {
    async fn speak(&self, text: &str, _opts: &SpeechOptions) {
        self.spoken.lock().push(text.to_string());
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// 呼び出しごとに台本の回答を返す認識エンジン。None は無音（締め切りまで何も届かない）。
pub(crate) struct ScriptedRecognizer {
    answers: Mutex<VecDeque<Option<String>>>,
    feeds: Mutex<Vec<CaptureFeed>>,
}

impl ScriptedRecognizer {
    pub(crate) fn new(answers: &[Option<&str>]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| a.map(str::to_string)).collect()),
            feeds: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn starts(&self) -> usize {
        self.feeds.lock().len()
    }

    /// 全ての取得に停止要求が届いたか
    pub(crate) fn all_stopped(&self) -> bool {
        self.feeds
            .lock()
            .iter_mut()
            .all(|feed| feed.is_stop_requested())
    }
}

#[async_trait]
impl SpeechRecognizer for ScriptedRecognizer {
    fn is_available(&self) -> bool {
        true
    }

    async fn start(&self, _opts: &RecognitionOptions) -> Result<CaptureHandle, SpeechError> {
        let (feed, handle) = CaptureHandle::channel();
        if let Some(Some(text)) = self.answers.lock().pop_front() {
            feed.send(RecognitionEvent::Final {
                text,
                confidence: Some(0.9),
            });
        }
        self.feeds.lock().push(feed);
        Ok(handle)
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// 取得・解放の回数を数えるカメラ
#[derive(Default)]
pub(crate) struct CountingMedia {
    pub(crate) acquired: AtomicUsize,
    pub(crate) released: Arc<AtomicUsize>,
}

struct CountingStream {
    kind: MediaKind,
    released: Arc<AtomicUsize>,
}

impl MediaStream for CountingStream {
    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn stop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl MediaDevices for CountingMedia {
    async fn acquire(&self, kind: MediaKind) -> Result<Box<dyn MediaStream>, SpeechError> {
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingStream {
            kind,
            released: self.released.clone(),
        }))
    }
}
