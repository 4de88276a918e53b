use serde::{Deserialize, Serialize};

/// 面接ラウンド種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundKind {
    Aptitude,
    Technical,
    Hr,
}

impl RoundKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Aptitude => "aptitude",
            Self::Technical => "technical",
            Self::Hr => "hr",
        }
    }
}

/// 音声ラウンド（リモート採点の対象）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoiceRound {
    Technical,
    Hr,
}

impl VoiceRound {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Technical => "technical",
            Self::Hr => "hr",
        }
    }
}

impl From<VoiceRound> for RoundKind {
    fn from(round: VoiceRound) -> Self {
        match round {
            VoiceRound::Technical => RoundKind::Technical,
            VoiceRound::Hr => RoundKind::Hr,
        }
    }
}

/// ユーザーが選んだ受験モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectedMode {
    #[default]
    All,
    Aptitude,
    Technical,
    Hr,
}

/// 画面遷移先（ラウンドかレポート）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", content = "round", rename_all = "snake_case")]
pub enum Stage {
    Round(RoundKind),
    Report,
}

impl SelectedMode {
    /// 最初に実施するラウンド
    pub fn first_round(&self) -> RoundKind {
        match self {
            Self::All | Self::Aptitude => RoundKind::Aptitude,
            Self::Technical => RoundKind::Technical,
            Self::Hr => RoundKind::Hr,
        }
    }

    /// `finished` 完了後の遷移先
    pub fn next_after(&self, finished: RoundKind) -> Stage {
        match (self, finished) {
            (Self::All, RoundKind::Aptitude) => Stage::Round(RoundKind::Technical),
            (Self::All, RoundKind::Technical) => Stage::Round(RoundKind::Hr),
            _ => Stage::Report,
        }
    }
}

impl std::str::FromStr for SelectedMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "aptitude" => Ok(Self::Aptitude),
            "technical" => Ok(Self::Technical),
            "hr" => Ok(Self::Hr),
            other => Err(format!("unknown mode: {other}")),
        }
    }
}

/// 1問分の回答記録
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub question: String,
    pub answer: String,
    pub score: u32,
    pub feedback: String,
}

/// 評価スコアの範囲
pub const MIN_SCORE: u32 = 1;
pub const MAX_SCORE: u32 = 10;

/// 正規化済みの評価結果。score は常に [1,10]、feedback は常に非空。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationOutcome {
    pub score: u32,
    pub feedback: String,
}

impl EvaluationOutcome {
    /// 回答なし（採点せず最低点）
    pub const NO_ANSWER_FEEDBACK: &'static str = "No valid answer was provided.";
    /// リモート採点が使えなかった場合
    pub const UNAVAILABLE_SCORE: u32 = 6;
    pub const UNAVAILABLE_FEEDBACK: &'static str =
        "AI evaluation unavailable. Default score assigned.";
    /// 応答を解釈できなかった場合
    pub const UNPARSABLE_SCORE: u32 = 5;
    pub const UNPARSABLE_FEEDBACK: &'static str =
        "Evaluation unavailable: the response could not be parsed. Default score applied.";
    /// feedback が空だった場合
    pub const DEFAULT_FEEDBACK: &'static str = "Answer evaluated successfully.";

    pub fn no_answer() -> Self {
        Self {
            score: MIN_SCORE,
            feedback: Self::NO_ANSWER_FEEDBACK.to_string(),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            score: Self::UNAVAILABLE_SCORE,
            feedback: Self::UNAVAILABLE_FEEDBACK.to_string(),
        }
    }

    pub fn unparsable() -> Self {
        Self {
            score: Self::UNPARSABLE_SCORE,
            feedback: Self::UNPARSABLE_FEEDBACK.to_string(),
        }
    }

    /// 生スコアを丸めて [1,10] にクランプし、空の feedback を既定文に置き換える。
    /// 数値でない（NaN/無限大を含む）スコアは解釈失敗として扱う。
    pub fn normalized(raw_score: f64, feedback: &str) -> Self {
        if !raw_score.is_finite() {
            return Self::unparsable();
        }
        let clamped = raw_score.round().clamp(MIN_SCORE as f64, MAX_SCORE as f64);
        let feedback = feedback.trim();
        Self {
            score: clamped as u32,
            feedback: if feedback.is_empty() {
                Self::DEFAULT_FEEDBACK.to_string()
            } else {
                feedback.to_string()
            },
        }
    }
}
