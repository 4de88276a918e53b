use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::broadcast;

use super::types::{AnswerRecord, RoundKind, SelectedMode, VoiceRound};

/// セッションの読み取り専用スナップショット
#[derive(Debug, Clone, Default, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub skills: Vec<String>,
    pub resume_file: Option<String>,
    pub selected_mode: SelectedMode,
    /// 未受験なら None（0点とは区別する）
    pub aptitude_score: Option<u32>,
    pub technical_scores: Vec<AnswerRecord>,
    pub hr_scores: Vec<AnswerRecord>,
    pub completed_rounds: Vec<RoundKind>,
    pub created_at: String,
}

/// セッションレベルのイベント
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum SessionEvent {
    SkillsExtracted { count: usize },
    ModeSelected(SelectedMode),
    RoundCompleted(RoundKind),
}

struct Shared {
    data: RwLock<SessionSnapshot>,
    events: broadcast::Sender<SessionEvent>,
}

impl Shared {
    fn publish(&self, event: SessionEvent) {
        // 購読者がいなくてもエラーにしない
        let _ = self.events.send(event);
    }

    fn mark_completed(&self, data: &mut SessionSnapshot, round: RoundKind) {
        if !data.completed_rounds.contains(&round) {
            data.completed_rounds.push(round);
        }
    }
}

/// 面接セッション（ラウンドをまたぐ唯一の状態）。
///
/// このハンドルは読み取り専用。各フィールドの書き込みは
/// [`InterviewSession::new`] が返す [`SessionWriters`] の担当ハンドルだけが行える。
#[derive(Clone)]
pub struct InterviewSession {
    shared: Arc<Shared>,
}

impl InterviewSession {
    pub fn new() -> (Self, SessionWriters) {
        let (events, _) = broadcast::channel(32);
        let shared = Arc::new(Shared {
            data: RwLock::new(SessionSnapshot {
                session_id: uuid::Uuid::new_v4().to_string(),
                created_at: chrono::Utc::now().to_rfc3339(),
                ..Default::default()
            }),
            events,
        });
        let writers = SessionWriters {
            intake: IntakeWriter {
                shared: shared.clone(),
            },
            mode: ModeWriter {
                shared: shared.clone(),
            },
            aptitude: AptitudeWriter {
                shared: shared.clone(),
            },
            technical: RoundWriter {
                round: VoiceRound::Technical,
                shared: shared.clone(),
            },
            hr: RoundWriter {
                round: VoiceRound::Hr,
                shared: shared.clone(),
            },
        };
        (Self { shared }, writers)
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.shared.data.read().clone()
    }

    pub fn session_id(&self) -> String {
        self.shared.data.read().session_id.clone()
    }

    pub fn skills(&self) -> Vec<String> {
        self.shared.data.read().skills.clone()
    }

    pub fn selected_mode(&self) -> SelectedMode {
        self.shared.data.read().selected_mode
    }

    pub fn is_completed(&self, round: RoundKind) -> bool {
        self.shared.data.read().completed_rounds.contains(&round)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.shared.events.subscribe()
    }
}

/// フィールドごとの書き込みハンドル一式
pub struct SessionWriters {
    pub intake: IntakeWriter,
    pub mode: ModeWriter,
    pub aptitude: AptitudeWriter,
    pub technical: RoundWriter,
    pub hr: RoundWriter,
}

/// 履歴書取り込み（スキル・ファイル名）の書き込み担当
pub struct IntakeWriter {
    shared: Arc<Shared>,
}

impl IntakeWriter {
    pub fn set_resume(&self, resume_file: String, skills: Vec<String>) {
        let count = skills.len();
        {
            let mut data = self.shared.data.write();
            data.resume_file = Some(resume_file);
            data.skills = skills;
        }
        self.shared.publish(SessionEvent::SkillsExtracted { count });
    }
}

/// 受験モードの書き込み担当
pub struct ModeWriter {
    shared: Arc<Shared>,
}

impl ModeWriter {
    pub fn select(&self, mode: SelectedMode) {
        self.shared.data.write().selected_mode = mode;
        self.shared.publish(SessionEvent::ModeSelected(mode));
    }
}

/// 適性検査スコアの書き込み担当
pub struct AptitudeWriter {
    shared: Arc<Shared>,
}

impl AptitudeWriter {
    /// スコアを確定してラウンド完了を通知する
    pub fn commit(&self, percentage: u32) {
        {
            let mut data = self.shared.data.write();
            data.aptitude_score = Some(percentage.min(100));
            self.shared.mark_completed(&mut data, RoundKind::Aptitude);
        }
        self.shared
            .publish(SessionEvent::RoundCompleted(RoundKind::Aptitude));
    }
}

/// 音声ラウンド結果の書き込み担当
pub struct RoundWriter {
    round: VoiceRound,
    shared: Arc<Shared>,
}

impl RoundWriter {
    pub fn round(&self) -> VoiceRound {
        self.round
    }

    /// 最終結果列を書き込み、ラウンド完了を通知する
    pub fn commit(&self, records: Vec<AnswerRecord>) {
        let kind = RoundKind::from(self.round);
        {
            let mut data = self.shared.data.write();
            match self.round {
                VoiceRound::Technical => data.technical_scores = records,
                VoiceRound::Hr => data.hr_scores = records,
            }
            self.shared.mark_completed(&mut data, kind);
        }
        self.shared.publish(SessionEvent::RoundCompleted(kind));
    }
}
