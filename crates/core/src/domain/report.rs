use serde::{Deserialize, Serialize};

use super::types::AnswerRecord;

/// 採用推薦
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recommendation {
    #[serde(rename = "Strong Hire")]
    StrongHire,
    #[serde(rename = "Consider")]
    Consider,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
    /// どのラウンドも未受験
    #[serde(rename = "No Evaluation")]
    NoEvaluation,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StrongHire => "Strong Hire",
            Self::Consider => "Consider",
            Self::NeedsImprovement => "Needs Improvement",
            Self::NoEvaluation => "No Evaluation",
        }
    }

    /// 1ラウンド以上受験している場合の閾値判定
    pub fn from_overall(overall: u32) -> Self {
        if overall >= 80 {
            Self::StrongHire
        } else if overall >= 60 {
            Self::Consider
        } else {
            Self::NeedsImprovement
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ローカルで算出するレポート数値。未受験の項目は None。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFigures {
    pub aptitude_score: Option<u32>,
    pub tech_avg: Option<u32>,
    pub hr_avg: Option<u32>,
    pub overall: u32,
    pub recommendation: Recommendation,
}

fn mean(records: &[AnswerRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let sum: u64 = records.iter().map(|r| r.score as u64).sum();
    Some(sum as f64 / records.len() as f64)
}

impl ReportFigures {
    pub fn compute(
        aptitude_score: Option<u32>,
        technical: &[AnswerRecord],
        hr: &[AnswerRecord],
    ) -> Self {
        let tech_avg = mean(technical).map(|m| (m * 10.0).round() as u32);
        let hr_avg = mean(hr).map(|m| m.round() as u32);

        let attempted: Vec<u32> = [aptitude_score, tech_avg, hr_avg]
            .into_iter()
            .flatten()
            .collect();

        let (overall, recommendation) = if attempted.is_empty() {
            (0, Recommendation::NoEvaluation)
        } else {
            let sum: u64 = attempted.iter().map(|&s| s as u64).sum();
            let overall = (sum as f64 / attempted.len() as f64).round() as u32;
            (overall, Recommendation::from_overall(overall))
        };

        Self {
            aptitude_score,
            tech_avg,
            hr_avg,
            overall,
            recommendation,
        }
    }
}

/// 最終レポート
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    #[serde(flatten)]
    pub figures: ReportFigures,
    pub summary: String,
    /// 要約がリモート生成か（false ならローカル固定文）
    pub summary_generated: bool,
    pub technical_breakdown: Vec<AnswerRecord>,
    pub hr_breakdown: Vec<AnswerRecord>,
}
