use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::domain::error::AppError;
use crate::domain::round::{PhaseTransition, RoundTracker};
use crate::domain::session::RoundWriter;
use crate::domain::settings::InterviewSettings;
use crate::domain::speech::{
    CapturedAnswer, MediaDevices, MediaGuard, MediaKind, RecognitionOptions, SpeechOptions,
    SpeechOutput, SpeechRecognizer,
};
use crate::domain::types::{AnswerRecord, RoundKind, VoiceRound};
use crate::infra::metrics::Metrics;
use crate::infra::speech::SpeechInput;

use super::evaluator::AnswerEvaluator;

/// 1ラウンド分の進行パラメータ
#[derive(Debug, Clone)]
pub struct RoundConfig {
    pub round: VoiceRound,
    pub capture_timeout: Duration,
    pub inter_question_pause: Duration,
    pub speech: SpeechOptions,
    pub recognition: RecognitionOptions,
    /// ラウンド中カメラを保持するか（HR のみ）
    pub use_camera: bool,
}

impl RoundConfig {
    pub fn from_settings(round: VoiceRound, settings: &InterviewSettings) -> Self {
        Self {
            round,
            capture_timeout: settings.capture_timeout(round),
            inter_question_pause: settings.inter_question_pause(),
            speech: SpeechOptions {
                rate: settings.speech_rate,
                language: settings.language.clone(),
            },
            recognition: RecognitionOptions {
                language: settings.language.clone(),
                ..RecognitionOptions::default()
            },
            use_camera: round == VoiceRound::Hr,
        }
    }
}

/// ラウンド進行イベント（UI 等の観測者向け）
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum RoundEvent {
    PhaseChanged(PhaseTransition),
    TranscriptCaptured {
        round: RoundKind,
        index: usize,
        answer: CapturedAnswer,
    },
    /// 記録済みの結果列（常に先頭からの全件）
    ResultRecorded {
        round: RoundKind,
        records: Vec<AnswerRecord>,
    },
    Completed {
        round: RoundKind,
        answered: usize,
    },
}

/// 音声ラウンドの進行役。
///
/// 質問ごとに 読み上げ → 締め切り付き取得 → 採点 → 記録 を順に行い、
/// 最後の記録の後にだけ complete に入って結果をセッションへ一度だけ書き込む。
/// 途中で future が破棄された場合（キャンセル）は何も書き込まない。
pub struct RoundOrchestrator {
    speech_output: Arc<dyn SpeechOutput>,
    recognizer: Arc<dyn SpeechRecognizer>,
    media: Arc<dyn MediaDevices>,
    evaluator: Arc<AnswerEvaluator>,
    metrics: Arc<Metrics>,
    event_tx: Option<mpsc::UnboundedSender<RoundEvent>>,
}

impl RoundOrchestrator {
    pub fn new(
        speech_output: Arc<dyn SpeechOutput>,
        recognizer: Arc<dyn SpeechRecognizer>,
        media: Arc<dyn MediaDevices>,
        evaluator: Arc<AnswerEvaluator>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            speech_output,
            recognizer,
            media,
            evaluator,
            metrics,
            event_tx: None,
        }
    }

    pub fn with_events(mut self, event_tx: mpsc::UnboundedSender<RoundEvent>) -> Self {
        self.event_tx = Some(event_tx);
        self
    }

    fn emit(&self, event: RoundEvent) {
        if let Some(tx) = &self.event_tx {
            // 受信側がいなくなっていても進行は続ける
            let _ = tx.send(event);
        }
    }

    fn emit_phase(&self, transition: PhaseTransition) {
        log::debug!(
            "[{}] q{} {} -> {}",
            transition.round.as_str(),
            transition.index,
            transition.prev_phase,
            transition.new_phase.as_str()
        );
        self.emit(RoundEvent::PhaseChanged(transition));
    }

    async fn acquire_camera(&self, config: &RoundConfig) -> MediaGuard {
        if !config.use_camera {
            return MediaGuard::empty();
        }
        match self.media.acquire(MediaKind::Camera).await {
            Ok(stream) => MediaGuard::new(stream),
            Err(e) => {
                log::warn!("camera unavailable, continuing without video: {e}");
                MediaGuard::empty()
            }
        }
    }

    pub async fn run(
        &self,
        config: &RoundConfig,
        questions: &[String],
        writer: &RoundWriter,
    ) -> Result<Vec<AnswerRecord>, AppError> {
        if writer.round() != config.round {
            return Err(AppError::invalid_state(format!(
                "writer for {} cannot record {} results",
                writer.round().as_str(),
                config.round.as_str()
            )));
        }

        let kind = RoundKind::from(config.round);
        let mut tracker = RoundTracker::new(kind, questions.len());
        let mut records: Vec<AnswerRecord> = Vec::with_capacity(questions.len());
        let input = SpeechInput::new(self.recognizer.clone(), config.recognition.clone());
        let mut camera = self.acquire_camera(config).await;

        self.metrics.inc_rounds_started();
        log::info!(
            "{} round started with {} questions (recognizer: {})",
            kind.as_str(),
            questions.len(),
            input.recognizer_name()
        );

        for (i, question) in questions.iter().enumerate() {
            self.emit_phase(tracker.next_question()?);
            self.metrics.inc_questions_asked();

            let started = Instant::now();
            self.speech_output.speak(question, &config.speech).await;
            self.metrics
                .record_latency("speak", started.elapsed().as_millis() as u64);
            self.emit_phase(tracker.on_prompt_delivered()?);

            let started = Instant::now();
            let answer = input.capture(config.capture_timeout).await;
            self.metrics
                .record_latency("listen", started.elapsed().as_millis() as u64);
            self.metrics.record_capture(answer.status);
            self.emit(RoundEvent::TranscriptCaptured {
                round: kind,
                index: i,
                answer: answer.clone(),
            });
            self.emit_phase(tracker.on_answer_captured()?);

            let started = Instant::now();
            let outcome = self
                .evaluator
                .evaluate(question, &answer.text, config.round)
                .await;
            self.metrics
                .record_latency("evaluate", started.elapsed().as_millis() as u64);

            records.push(AnswerRecord {
                question: question.clone(),
                answer: answer.text,
                score: outcome.score,
                feedback: outcome.feedback,
            });
            tracker.on_answer_recorded()?;
            self.emit(RoundEvent::ResultRecorded {
                round: kind,
                records: records.clone(),
            });

            if i + 1 < questions.len() {
                tokio::time::sleep(config.inter_question_pause).await;
            }
        }

        self.emit_phase(tracker.complete()?);
        camera.release();
        writer.commit(records.clone());
        self.metrics.inc_rounds_completed();
        log::info!("{} round complete ({} answers)", kind.as_str(), records.len());
        self.emit(RoundEvent::Completed {
            round: kind,
            answered: records.len(),
        });

        Ok(records)
    }
}
