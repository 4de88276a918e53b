use std::sync::Arc;

use serde_json::Value;

use crate::domain::speech::CapturedAnswer;
use crate::domain::types::{EvaluationOutcome, VoiceRound};
use crate::infra::llm::prompts;
use crate::infra::llm::{CompletionRequest, LlmClient};
use crate::infra::metrics::Metrics;
use crate::infra::post_processor::PostProcessor;

/// 回答採点。リモート LLM にルーブリック付きで採点させ、結果を必ず正規化する。
///
/// どんな失敗（通信・非2xx・不正 JSON・範囲外スコア）でも既定の
/// [`EvaluationOutcome`] に変換するため、呼び出し側がエラー処理をする必要はない。
pub struct AnswerEvaluator {
    llm: Arc<dyn LlmClient>,
    metrics: Arc<Metrics>,
}

impl AnswerEvaluator {
    pub fn new(llm: Arc<dyn LlmClient>, metrics: Arc<Metrics>) -> Self {
        Self { llm, metrics }
    }

    pub async fn evaluate(
        &self,
        question: &str,
        answer: &str,
        round: VoiceRound,
    ) -> EvaluationOutcome {
        // 回答なしはリモートに送らない
        if CapturedAnswer::is_sentinel_text(answer) {
            return EvaluationOutcome::no_answer();
        }

        let request = CompletionRequest::new(
            prompts::rubric_for(round),
            prompts::build_evaluation_prompt(question, answer),
        )
        .deterministic();

        self.metrics.inc_remote_calls();
        match self.llm.complete(request).await {
            Ok(raw) => parse_evaluation(&raw).unwrap_or_else(|| {
                self.metrics.inc_remote_fallbacks();
                EvaluationOutcome::unparsable()
            }),
            Err(e) => {
                log::warn!(
                    "{} evaluation via {} failed, using default score: {e}",
                    round.as_str(),
                    self.llm.name()
                );
                self.metrics.inc_remote_fallbacks();
                EvaluationOutcome::unavailable()
            }
        }
    }
}

/// 採点応答（`{"score": n, "feedback": "..."}`、コードフェンス付き可）を正規化する。
/// スコアが読み取れなければ None。
pub fn parse_evaluation(raw: &str) -> Option<EvaluationOutcome> {
    let cleaned = PostProcessor::strip_code_fence(raw);
    let value: Value = match serde_json::from_str(&cleaned) {
        Ok(value) => value,
        Err(e) => {
            log::warn!("evaluation response is not JSON: {e}");
            return None;
        }
    };

    let Some(obj) = value.as_object() else {
        log::warn!("evaluation response is not an object");
        return None;
    };

    let score = match obj.get("score") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    let Some(score) = score else {
        log::warn!("evaluation response has no numeric score");
        return None;
    };

    let feedback = obj.get("feedback").and_then(Value::as_str).unwrap_or("");
    Some(EvaluationOutcome::normalized(score, feedback))
}
