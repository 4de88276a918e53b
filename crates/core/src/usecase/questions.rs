use std::sync::Arc;

use serde_json::Value;

use crate::infra::llm::prompts;
use crate::infra::llm::{CompletionRequest, LlmClient};
use crate::infra::metrics::Metrics;
use crate::infra::post_processor::PostProcessor;

pub const QUESTION_MIN_WORDS: usize = 10;
pub const QUESTION_MAX_WORDS: usize = 15;

/// 出題に含めてはいけないキーワード（小文字で部分一致）
const QUESTION_DENYLIST: &[&str] = &[
    "architecture",
    "internal",
    "fragmentation",
    "optimization",
    "microservices",
    "low-level",
    "thread pool",
    "complex",
    "scalability",
    "distributed",
    "clr",
    "large object heap",
    "generational",
    "state machine",
    "synchronizationcontext",
];

/// HR 面接の固定質問
pub const HR_QUESTIONS: [&str; 3] = [
    "Tell me about yourself and your journey in tech.",
    "Why should we hire you? What makes you stand out?",
    "What is your biggest weakness and how are you working on it?",
];

pub fn hr_questions() -> Vec<String> {
    HR_QUESTIONS.iter().map(|q| q.to_string()).collect()
}

/// 語数と除外語のチェック
pub fn is_acceptable_question(question: &str) -> bool {
    let words = PostProcessor::word_count(question);
    if !(QUESTION_MIN_WORDS..=QUESTION_MAX_WORDS).contains(&words) {
        return false;
    }
    let lower = question.to_lowercase();
    !QUESTION_DENYLIST.iter().any(|word| lower.contains(word))
}

/// スキルごとのテンプレート質問（先頭 count 件）
pub fn fallback_questions(skills: &[String], count: usize) -> Vec<String> {
    skills
        .iter()
        .take(count)
        .map(|skill| format!("Explain how {skill} works and describe a problem you solved with it."))
        .collect()
}

/// 技術面接の出題
pub struct QuestionGenerator {
    llm: Arc<dyn LlmClient>,
    metrics: Arc<Metrics>,
    question_count: usize,
}

impl QuestionGenerator {
    pub fn new(llm: Arc<dyn LlmClient>, metrics: Arc<Metrics>, question_count: usize) -> Self {
        Self {
            llm,
            metrics,
            question_count,
        }
    }

    pub async fn technical_questions(&self, skills: &[String]) -> Vec<String> {
        if skills.is_empty() {
            log::info!("no skills available, technical round has no questions");
            return Vec::new();
        }

        let request = CompletionRequest::new(
            prompts::SYSTEM_GENERATE_QUESTIONS,
            prompts::build_questions_prompt(skills),
        );

        self.metrics.inc_remote_calls();
        let raw = match self.llm.complete(request).await {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("question generation via {} failed: {e}", self.llm.name());
                self.metrics.inc_remote_fallbacks();
                return fallback_questions(skills, self.question_count);
            }
        };

        let mut valid = parse_questions(&raw);
        valid.retain(|q| is_acceptable_question(q));
        if valid.len() < self.question_count {
            log::warn!(
                "only {} acceptable questions generated, using templates",
                valid.len()
            );
            self.metrics.inc_remote_fallbacks();
            return fallback_questions(skills, self.question_count);
        }
        valid.truncate(self.question_count);
        valid
    }
}

fn parse_questions(raw: &str) -> Vec<String> {
    let cleaned = PostProcessor::strip_code_fence(raw);
    let Ok(Value::Array(items)) = serde_json::from_str::<Value>(&cleaned) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_str)
        .map(|q| q.trim().to_string())
        .collect()
}
