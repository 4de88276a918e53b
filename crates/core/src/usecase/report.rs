use std::sync::Arc;

use serde_json::Value;

use crate::domain::report::{Report, ReportFigures};
use crate::domain::session::SessionSnapshot;
use crate::infra::llm::prompts;
use crate::infra::llm::{CompletionRequest, LlmClient};
use crate::infra::metrics::Metrics;
use crate::infra::post_processor::PostProcessor;

/// 要約が得られなかったときの固定文
pub const NEUTRAL_SUMMARY: &str = "Evaluation complete.";

/// セッションの結果から最終レポートを組み立てる。
/// 数値と推薦はローカル計算で確定し、リモートには総評テキストだけを頼む。
pub struct ReportAggregator {
    llm: Arc<dyn LlmClient>,
    metrics: Arc<Metrics>,
}

impl ReportAggregator {
    pub fn new(llm: Arc<dyn LlmClient>, metrics: Arc<Metrics>) -> Self {
        Self { llm, metrics }
    }

    pub async fn generate(&self, snapshot: &SessionSnapshot) -> Report {
        let figures = ReportFigures::compute(
            snapshot.aptitude_score,
            &snapshot.technical_scores,
            &snapshot.hr_scores,
        );
        log::info!(
            "report figures: overall={} recommendation={}",
            figures.overall,
            figures.recommendation
        );

        let summary = self.summarize(&figures).await;
        let summary_generated = summary.is_some();

        Report {
            figures,
            summary: summary.unwrap_or_else(|| NEUTRAL_SUMMARY.to_string()),
            summary_generated,
            technical_breakdown: snapshot.technical_scores.clone(),
            hr_breakdown: snapshot.hr_scores.clone(),
        }
    }

    async fn summarize(&self, figures: &ReportFigures) -> Option<String> {
        let request =
            CompletionRequest::new(prompts::SYSTEM_REPORT_SUMMARY, prompts::build_summary_prompt(figures));

        self.metrics.inc_remote_calls();
        let raw = match self.llm.complete(request).await {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("report summary via {} failed: {e}", self.llm.name());
                self.metrics.inc_remote_fallbacks();
                return None;
            }
        };

        let summary = extract_summary(&raw, figures);
        if summary.is_none() {
            self.metrics.inc_remote_fallbacks();
        }
        summary
    }
}

/// 応答が `{"summary": ..., "recommendation": ...}` 形式ならその summary を、
/// そうでなければ本文をそのまま使う。推薦欄は採用しない。
fn extract_summary(raw: &str, figures: &ReportFigures) -> Option<String> {
    let cleaned = PostProcessor::strip_code_fence(raw);

    let text = match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Object(obj)) => {
            if let Some(remote) = obj.get("recommendation").and_then(Value::as_str) {
                if remote != figures.recommendation.as_str() {
                    log::debug!(
                        "ignoring remote recommendation {remote:?}, keeping {}",
                        figures.recommendation
                    );
                }
            }
            obj.get("summary")
                .and_then(Value::as_str)
                .unwrap_or("")
                .trim()
                .to_string()
        }
        _ => cleaned,
    };

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
