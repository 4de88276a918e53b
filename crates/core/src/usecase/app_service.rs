use std::sync::Arc;

use tokio::sync::mpsc;

use crate::domain::aptitude::AptitudeQuiz;
use crate::domain::error::AppError;
use crate::domain::job::RoundJob;
use crate::domain::report::Report;
use crate::domain::session::{
    AptitudeWriter, IntakeWriter, InterviewSession, ModeWriter, RoundWriter, SessionSnapshot,
};
use crate::domain::settings::InterviewSettings;
use crate::domain::speech::{MediaDevices, SpeechOutput, SpeechRecognizer};
use crate::domain::types::{RoundKind, SelectedMode, Stage, VoiceRound};
use crate::infra::llm::LlmClient;
use crate::infra::metrics::{Metrics, MetricsSummary};

use super::evaluator::AnswerEvaluator;
use super::orchestrator::{RoundConfig, RoundEvent, RoundOrchestrator};
use super::questions::{self, QuestionGenerator};
use super::report::ReportAggregator;
use super::round_runner::RoundRunner;
use super::skills::{self, SkillExtractor};

/// ホストが用意する外部機能一式
pub struct Capabilities {
    pub llm: Arc<dyn LlmClient>,
    pub speech_output: Arc<dyn SpeechOutput>,
    pub recognizer: Arc<dyn SpeechRecognizer>,
    pub media: Arc<dyn MediaDevices>,
}

/// 面接シミュレーターのアプリケーションサービス。
/// セッションと各書き込みハンドルを所有し、ホストからの操作を受ける。
pub struct InterviewService {
    settings: InterviewSettings,
    session: InterviewSession,
    intake: IntakeWriter,
    mode: ModeWriter,
    aptitude: AptitudeWriter,
    technical: Arc<RoundWriter>,
    hr: Arc<RoundWriter>,
    skills: SkillExtractor,
    questions: QuestionGenerator,
    report: ReportAggregator,
    orchestrator: Arc<RoundOrchestrator>,
    runner: RoundRunner,
    metrics: Arc<Metrics>,
}

impl InterviewService {
    pub fn new(
        settings: InterviewSettings,
        caps: Capabilities,
        round_events: Option<mpsc::UnboundedSender<RoundEvent>>,
    ) -> Self {
        let metrics = Arc::new(Metrics::new());
        let (session, writers) = InterviewSession::new();

        let evaluator = Arc::new(AnswerEvaluator::new(caps.llm.clone(), metrics.clone()));
        let mut orchestrator = RoundOrchestrator::new(
            caps.speech_output,
            caps.recognizer,
            caps.media,
            evaluator,
            metrics.clone(),
        );
        if let Some(tx) = round_events {
            orchestrator = orchestrator.with_events(tx);
        }

        log::info!(
            "interview service ready (session {}, llm: {})",
            session.session_id(),
            caps.llm.name()
        );

        Self {
            skills: SkillExtractor::new(caps.llm.clone(), metrics.clone()),
            questions: QuestionGenerator::new(
                caps.llm.clone(),
                metrics.clone(),
                settings.question_count,
            ),
            report: ReportAggregator::new(caps.llm, metrics.clone()),
            orchestrator: Arc::new(orchestrator),
            runner: RoundRunner::new(),
            intake: writers.intake,
            mode: writers.mode,
            aptitude: writers.aptitude,
            technical: Arc::new(writers.technical),
            hr: Arc::new(writers.hr),
            settings,
            session,
            metrics,
        }
    }

    pub fn session(&self) -> &InterviewSession {
        &self.session
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    pub fn settings(&self) -> &InterviewSettings {
        &self.settings
    }

    // ==================== Intake ====================

    /// 履歴書を検証してスキルを抽出し、セッションに保存する
    pub async fn intake_resume(&self, file_name: &str, bytes: &[u8]) -> Result<Vec<String>, AppError> {
        let resume = skills::read_resume(file_name, bytes)?;
        let extracted = self.skills.extract(&resume.text).await;
        self.intake.set_resume(resume.file_name, extracted.clone());
        Ok(extracted)
    }

    /// 受験モードを選び、最初のラウンドを返す
    pub fn select_mode(&self, mode: SelectedMode) -> RoundKind {
        self.mode.select(mode);
        mode.first_round()
    }

    /// `finished` 完了後に進む先
    pub fn next_stage(&self, finished: RoundKind) -> Stage {
        self.session.selected_mode().next_after(finished)
    }

    // ==================== Aptitude ====================

    pub fn aptitude_quiz(&self) -> AptitudeQuiz {
        AptitudeQuiz::default()
    }

    /// 終了済みの適性検査スコアを確定する
    pub fn commit_aptitude(&self, quiz: &AptitudeQuiz) -> Result<u32, AppError> {
        let score = quiz
            .score()
            .ok_or_else(|| AppError::invalid_state("aptitude quiz is not finished"))?;
        self.aptitude.commit(score);
        log::info!("aptitude round committed: {score}%");
        Ok(score)
    }

    // ==================== Voice rounds ====================

    /// ラウンドの質問を用意する（技術はスキルから生成、HR は固定）
    pub async fn questions_for(&self, round: VoiceRound) -> Vec<String> {
        match round {
            VoiceRound::Technical => {
                self.questions
                    .technical_questions(&self.session.skills())
                    .await
            }
            VoiceRound::Hr => questions::hr_questions(),
        }
    }

    fn writer_for(&self, round: VoiceRound) -> Arc<RoundWriter> {
        match round {
            VoiceRound::Technical => self.technical.clone(),
            VoiceRound::Hr => self.hr.clone(),
        }
    }

    /// 質問を用意してラウンドをバックグラウンドで開始し、ジョブ ID を返す
    pub async fn start_round(&self, round: VoiceRound) -> Result<String, AppError> {
        if let Some(active) = self.runner.active().await {
            return Err(AppError::invalid_state(format!(
                "{} round is already running",
                active.round.as_str()
            )));
        }

        let questions = self.questions_for(round).await;
        let config = RoundConfig::from_settings(round, &self.settings);
        let orchestrator = self.orchestrator.clone();
        let writer = self.writer_for(round);

        self.runner
            .start(self.session.session_id(), round.into(), async move {
                orchestrator
                    .run(&config, &questions, &writer)
                    .await
                    .map(|_| ())
            })
            .await
    }

    /// ラウンドの終了を待つ
    pub async fn wait_round(&self, job_id: &str) -> Option<RoundJob> {
        self.runner.join(job_id).await
    }

    /// 進行中のラウンドを中断する。結果はセッションに書き込まれない。
    pub async fn cancel_round(&self) -> Option<String> {
        let canceled = self.runner.cancel_active().await;
        if canceled.is_some() {
            self.metrics.inc_rounds_canceled();
        }
        canceled
    }

    // ==================== Report ====================

    pub async fn build_report(&self) -> Report {
        self.report.generate(&self.session.snapshot()).await
    }

    pub fn metrics(&self) -> MetricsSummary {
        self.metrics.summary()
    }
}
