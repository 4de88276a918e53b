//! 面接全体の統合テスト（LLM・音声はテストダブル）。
//!
//! 実行: cargo test --test interview_flow

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use iv_core::domain::aptitude::AptitudeStep;
use iv_core::domain::job::JobStatus;
use iv_core::domain::report::Recommendation;
use iv_core::domain::session::SessionEvent;
use iv_core::domain::settings::InterviewSettings;
use iv_core::domain::speech::{
    CaptureFeed, CaptureHandle, CapturedAnswer, RecognitionEvent, RecognitionOptions,
    SpeechError, SpeechRecognizer,
};
use iv_core::domain::types::{RoundKind, SelectedMode, Stage, VoiceRound};
use iv_core::infra::llm::prompts;
use iv_core::infra::llm::{CompletionRequest, LlmClient, LlmError, NoopLlmClient};
use iv_core::infra::speech::{NoMediaDevices, NoopSpeechOutput, UnavailableRecognizer};
use iv_core::usecase::app_service::{Capabilities, InterviewService};
use iv_core::usecase::orchestrator::RoundEvent;
use iv_core::usecase::report::NEUTRAL_SUMMARY;

const QUESTIONS: &str = r#"[
    "What is Rust and why do developers choose it for new projects?",
    "Explain the difference between a vector and an array in Rust programs.",
    "How would you handle errors when reading a file in Rust code?"
]"#;

/// system プロンプトで用途を見分けて応答する LLM
struct RoutingLlm;

#[async_trait]
impl LlmClient for RoutingLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<String, LlmError> {
        let reply = if request.system == prompts::SYSTEM_EXTRACT_SKILLS {
            r#"["Rust", "Tokio", "PostgreSQL"]"#
        } else if request.system == prompts::SYSTEM_GENERATE_QUESTIONS {
            QUESTIONS
        } else if request.system == prompts::RUBRIC_TECHNICAL {
            r#"```json
{"score": 8, "feedback": "Accurate and clear."}
```"#
        } else if request.system == prompts::RUBRIC_HR {
            r#"{"score": 7, "feedback": "Structured answer."}"#
        } else {
            r#"{"summary": "A capable engineer.", "recommendation": "Strong Hire"}"#
        };
        Ok(reply.to_string())
    }

    fn name(&self) -> &str {
        "routing"
    }
}

/// 答えを台本どおりに返す。台本が尽きたら無音。
struct TypedAnswers {
    answers: Mutex<VecDeque<String>>,
    feeds: Mutex<Vec<CaptureFeed>>,
}

impl TypedAnswers {
    fn new(answers: &[&str]) -> Self {
        Self {
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            feeds: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl SpeechRecognizer for TypedAnswers {
    fn is_available(&self) -> bool {
        true
    }

    async fn start(&self, _opts: &RecognitionOptions) -> Result<CaptureHandle, SpeechError> {
        let (feed, handle) = CaptureHandle::channel();
        if let Some(text) = self.answers.lock().pop_front() {
            feed.send(RecognitionEvent::Final {
                text,
                confidence: Some(0.8),
            });
        }
        self.feeds.lock().push(feed);
        Ok(handle)
    }

    fn name(&self) -> &str {
        "typed"
    }
}

fn answer_aptitude(service: &InterviewService, picks: &[usize]) -> u32 {
    let mut quiz = service.aptitude_quiz();
    for &pick in picks {
        quiz.select(pick).unwrap();
        if let AptitudeStep::Finished(score) = quiz.next().unwrap() {
            assert_eq!(service.commit_aptitude(&quiz).unwrap(), score);
            return score;
        }
    }
    panic!("quiz did not finish");
}

async fn run_round(service: &InterviewService, round: VoiceRound) {
    let job_id = service.start_round(round).await.unwrap();
    let job = service.wait_round(&job_id).await.unwrap();
    assert_eq!(job.status, JobStatus::Done, "{:?}", job.error);
}

#[tokio::test(start_paused = true)]
async fn full_interview_all_rounds() {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let service = InterviewService::new(
        InterviewSettings::default(),
        Capabilities {
            llm: Arc::new(RoutingLlm),
            speech_output: Arc::new(NoopSpeechOutput),
            recognizer: Arc::new(TypedAnswers::new(&[
                "A systems language with memory safety.",
                "Vectors grow, arrays have a fixed size.",
                "I return a Result and use the question mark operator.",
                "I am a backend engineer who loves tooling.",
                "I ship reliable code quickly.",
                "I sometimes over-polish, so I time-box reviews.",
            ])),
            media: Arc::new(NoMediaDevices),
        },
        Some(event_tx),
    );
    let mut session_events = service.session().subscribe();

    let skills = service
        .intake_resume("candidate.pdf", b"%PDF-1.5 Rust Tokio PostgreSQL")
        .await
        .unwrap();
    assert_eq!(skills, vec!["Rust", "Tokio", "PostgreSQL"]);

    let mut stage = Stage::Round(service.select_mode(SelectedMode::All));
    let mut visited = Vec::new();
    while let Stage::Round(round) = stage {
        visited.push(round);
        match round {
            RoundKind::Aptitude => {
                assert_eq!(answer_aptitude(&service, &[1, 1, 1, 1, 0]), 80);
            }
            RoundKind::Technical => run_round(&service, VoiceRound::Technical).await,
            RoundKind::Hr => run_round(&service, VoiceRound::Hr).await,
        }
        stage = service.next_stage(round);
    }
    assert_eq!(
        visited,
        vec![RoundKind::Aptitude, RoundKind::Technical, RoundKind::Hr]
    );

    let snapshot = service.snapshot();
    assert_eq!(snapshot.technical_scores.len(), 3);
    assert!(snapshot.technical_scores.iter().all(|r| r.score == 8));
    assert_eq!(snapshot.hr_scores.len(), 3);
    assert_eq!(
        snapshot.hr_scores[0].question,
        "Tell me about yourself and your journey in tech."
    );

    let report = service.build_report().await;
    assert_eq!(report.figures.aptitude_score, Some(80));
    assert_eq!(report.figures.tech_avg, Some(80));
    assert_eq!(report.figures.hr_avg, Some(7));
    // round((80 + 80 + 7) / 3)
    assert_eq!(report.figures.overall, 56);
    assert_eq!(
        report.figures.recommendation,
        Recommendation::NeedsImprovement
    );
    assert_eq!(report.summary, "A capable engineer.");

    let mut completed = Vec::new();
    while let Ok(event) = session_events.try_recv() {
        if let SessionEvent::RoundCompleted(round) = event {
            completed.push(round);
        }
    }
    assert_eq!(
        completed,
        vec![RoundKind::Aptitude, RoundKind::Technical, RoundKind::Hr]
    );

    let mut finished_rounds = 0;
    while let Ok(event) = event_rx.try_recv() {
        if let RoundEvent::Completed { answered, .. } = event {
            assert_eq!(answered, 3);
            finished_rounds += 1;
        }
    }
    assert_eq!(finished_rounds, 2);

    let metrics = service.metrics();
    assert_eq!(metrics.rounds_completed, 2);
    assert_eq!(metrics.questions_asked, 6);
    assert_eq!(metrics.remote_fallbacks, 0);
}

#[tokio::test(start_paused = true)]
async fn offline_technical_round_uses_defaults() {
    let service = InterviewService::new(
        InterviewSettings::default(),
        Capabilities {
            llm: Arc::new(NoopLlmClient),
            speech_output: Arc::new(NoopSpeechOutput),
            recognizer: Arc::new(UnavailableRecognizer),
            media: Arc::new(NoMediaDevices),
        },
        None,
    );

    let skills = service
        .intake_resume("resume.pdf", b"%PDF-1.4")
        .await
        .unwrap();
    assert_eq!(
        skills,
        vec!["JavaScript", "React", "Node.js", "Python", "SQL"]
    );

    assert_eq!(
        service.select_mode(SelectedMode::Technical),
        RoundKind::Technical
    );
    run_round(&service, VoiceRound::Technical).await;
    assert_eq!(service.next_stage(RoundKind::Technical), Stage::Report);

    let snapshot = service.snapshot();
    assert_eq!(snapshot.technical_scores.len(), 3);
    for (record, skill) in snapshot.technical_scores.iter().zip(&skills) {
        assert!(record.question.contains(skill.as_str()));
        assert_eq!(record.answer, CapturedAnswer::NOT_AVAILABLE);
        assert_eq!(record.score, 1);
    }

    let report = service.build_report().await;
    assert_eq!(report.figures.aptitude_score, None);
    assert_eq!(report.figures.tech_avg, Some(10));
    assert_eq!(report.figures.hr_avg, None);
    assert_eq!(report.figures.overall, 10);
    assert_eq!(report.summary, NEUTRAL_SUMMARY);
    assert!(!report.summary_generated);
}

#[tokio::test(start_paused = true)]
async fn canceled_round_can_be_restarted() {
    let service = InterviewService::new(
        InterviewSettings::default(),
        Capabilities {
            llm: Arc::new(RoutingLlm),
            speech_output: Arc::new(NoopSpeechOutput),
            // 常に無音
            recognizer: Arc::new(TypedAnswers::new(&[])),
            media: Arc::new(NoMediaDevices),
        },
        None,
    );
    service.select_mode(SelectedMode::Hr);

    let first = service.start_round(VoiceRound::Hr).await.unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(service.cancel_round().await, Some(first.clone()));
    assert_eq!(
        service.wait_round(&first).await.unwrap().status,
        JobStatus::Canceled
    );
    assert!(service.snapshot().hr_scores.is_empty());

    // 無音のまま最後まで進めると締め切りごとに番兵が記録される
    run_round(&service, VoiceRound::Hr).await;
    let snapshot = service.snapshot();
    assert_eq!(snapshot.hr_scores.len(), 3);
    assert!(snapshot
        .hr_scores
        .iter()
        .all(|r| r.answer == CapturedAnswer::NO_ANSWER && r.score == 1));
    assert!(service.session().is_completed(RoundKind::Hr));
}
