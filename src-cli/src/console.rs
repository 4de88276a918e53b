use std::io::BufRead;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use iv_core::domain::speech::{
    CaptureHandle, RecognitionEvent, RecognitionOptions, SpeechError, SpeechOptions,
    SpeechOutput, SpeechRecognizer,
};

/// 標準入力の行ソース。読み取りは専用スレッドで行い、非同期側へ流す。
pub struct ConsoleInput {
    lines: Mutex<mpsc::UnboundedReceiver<String>>,
}

impl ConsoleInput {
    pub fn spawn() -> Arc<Self> {
        let (tx, rx) = mpsc::unbounded_channel();
        std::thread::spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
            log::debug!("stdin closed");
        });
        Arc::new(Self {
            lines: Mutex::new(rx),
        })
    }

    /// 次の1行。EOF なら None。
    pub async fn read_line(&self) -> Option<String> {
        self.lines.lock().await.recv().await
    }
}

/// 質問をターミナルに表示する読み上げ
pub struct ConsoleSpeech;

#[async_trait]
impl SpeechOutput for ConsoleSpeech {
    async fn speak(&self, text: &str, _opts: &SpeechOptions) {
        println!("\nInterviewer: {text}");
    }

    fn is_available(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "console"
    }
}

/// 入力された1行を確定結果として返す認識エンジン
pub struct StdinRecognizer {
    input: Arc<ConsoleInput>,
}

impl StdinRecognizer {
    pub fn new(input: Arc<ConsoleInput>) -> Self {
        Self { input }
    }
}

#[async_trait]
impl SpeechRecognizer for StdinRecognizer {
    fn is_available(&self) -> bool {
        true
    }

    async fn start(&self, _opts: &RecognitionOptions) -> Result<CaptureHandle, SpeechError> {
        let (mut feed, handle) = CaptureHandle::channel();
        let input = self.input.clone();
        println!("(type your answer and press Enter)");

        tokio::spawn(async move {
            let line = tokio::select! {
                line = input.read_line() => Some(line),
                _ = feed.stopped() => None,
            };
            match line {
                Some(Some(text)) => {
                    feed.send(RecognitionEvent::Final {
                        text,
                        confidence: None,
                    });
                }
                Some(None) => {
                    feed.send(RecognitionEvent::Ended);
                }
                // 締め切り後の入力は次の取得に回す
                None => {}
            }
        });

        Ok(handle)
    }

    fn name(&self) -> &str {
        "stdin"
    }
}
