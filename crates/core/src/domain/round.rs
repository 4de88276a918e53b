use serde::Serialize;

use super::error::AppError;
use super::types::RoundKind;

/// ラウンド進行フェーズ
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundPhase {
    Idle,
    Speaking,
    Listening,
    Evaluating,
    Complete,
}

impl RoundPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Speaking => "speaking",
            Self::Listening => "listening",
            Self::Evaluating => "evaluating",
            Self::Complete => "complete",
        }
    }
}

/// フェーズ遷移イベントペイロード
#[derive(Debug, Clone, Serialize)]
pub struct PhaseTransition {
    pub round: RoundKind,
    pub index: usize,
    pub prev_phase: String,
    pub new_phase: RoundPhase,
}

/// 1ラウンド分の状態機械。
///
/// idle → speaking → listening → evaluating → (次の質問の speaking) → complete。
/// complete にはラウンドにつき一度だけ、最後の評価が記録された後に入る。
pub struct RoundTracker {
    round: RoundKind,
    total: usize,
    index: usize,
    recorded: usize,
    phase: RoundPhase,
}

impl RoundTracker {
    pub fn new(round: RoundKind, total: usize) -> Self {
        Self {
            round,
            total,
            index: 0,
            recorded: 0,
            phase: RoundPhase::Idle,
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn recorded(&self) -> usize {
        self.recorded
    }

    pub fn total(&self) -> usize {
        self.total
    }

    fn transition(&mut self, new_phase: RoundPhase) -> PhaseTransition {
        let prev = self.phase.as_str().to_string();
        self.phase = new_phase;
        log::debug!(
            "{} round q{}: {} -> {}",
            self.round.as_str(),
            self.index,
            prev,
            new_phase.as_str()
        );
        PhaseTransition {
            round: self.round,
            index: self.index,
            prev_phase: prev,
            new_phase,
        }
    }

    /// 次の質問の読み上げ開始: Idle→Speaking（初回）、Evaluating→Speaking（記録済みの場合）
    pub fn next_question(&mut self) -> Result<PhaseTransition, AppError> {
        if self.recorded >= self.total {
            return Err(AppError::invalid_state(format!(
                "{} round has no remaining questions",
                self.round.as_str()
            )));
        }
        match self.phase {
            RoundPhase::Idle if self.recorded == 0 => {
                self.index = 0;
                Ok(self.transition(RoundPhase::Speaking))
            }
            RoundPhase::Evaluating if self.recorded == self.index + 1 => {
                self.index = self.recorded;
                Ok(self.transition(RoundPhase::Speaking))
            }
            other => Err(AppError::invalid_state(format!(
                "next_question is not allowed in {} phase",
                other.as_str()
            ))),
        }
    }

    /// 読み上げ完了: Speaking→Listening
    pub fn on_prompt_delivered(&mut self) -> Result<PhaseTransition, AppError> {
        match self.phase {
            RoundPhase::Speaking => Ok(self.transition(RoundPhase::Listening)),
            other => Err(AppError::invalid_state(format!(
                "on_prompt_delivered is not allowed in {} phase",
                other.as_str()
            ))),
        }
    }

    /// 回答取得完了: Listening→Evaluating
    pub fn on_answer_captured(&mut self) -> Result<PhaseTransition, AppError> {
        match self.phase {
            RoundPhase::Listening => Ok(self.transition(RoundPhase::Evaluating)),
            other => Err(AppError::invalid_state(format!(
                "on_answer_captured is not allowed in {} phase",
                other.as_str()
            ))),
        }
    }

    /// 評価結果を記録した（フェーズは Evaluating のまま）
    pub fn on_answer_recorded(&mut self) -> Result<usize, AppError> {
        match self.phase {
            RoundPhase::Evaluating if self.recorded == self.index => {
                self.recorded += 1;
                Ok(self.recorded)
            }
            RoundPhase::Evaluating => Err(AppError::invalid_state(format!(
                "question {} is already recorded",
                self.index
            ))),
            other => Err(AppError::invalid_state(format!(
                "on_answer_recorded is not allowed in {} phase",
                other.as_str()
            ))),
        }
    }

    /// 全問記録済み（または質問なし）で Complete へ
    pub fn complete(&mut self) -> Result<PhaseTransition, AppError> {
        match self.phase {
            RoundPhase::Idle if self.total == 0 => Ok(self.transition(RoundPhase::Complete)),
            RoundPhase::Evaluating if self.recorded == self.total => {
                Ok(self.transition(RoundPhase::Complete))
            }
            RoundPhase::Complete => Err(AppError::invalid_state("round is already complete")),
            other => Err(AppError::invalid_state(format!(
                "complete is not allowed in {} phase ({}/{} recorded)",
                other.as_str(),
                self.recorded,
                self.total
            ))),
        }
    }
}
