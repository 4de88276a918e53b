use std::sync::Arc;

use serde_json::Value;

use crate::domain::error::AppError;
use crate::infra::llm::prompts;
use crate::infra::llm::{CompletionRequest, LlmClient};
use crate::infra::metrics::Metrics;
use crate::infra::post_processor::PostProcessor;

/// 抽出結果が解釈できなかったときのスキル
pub const PARSE_FALLBACK_SKILLS: [&str; 3] = ["Java", "SQL", "React"];
/// リモートに到達できなかったときのスキル
pub const REMOTE_FALLBACK_SKILLS: [&str; 5] = ["JavaScript", "React", "Node.js", "Python", "SQL"];

pub const MAX_SKILLS: usize = 10;
pub const MAX_SKILL_WORDS: usize = 3;

/// 実装詳細とみなして除外するキーワード（小文字で部分一致）
const SKILL_DENYLIST: &[&str] = &[
    "architecture",
    "implementation",
    "internal",
    "optimization",
    "fragmentation",
    "state machine",
    "synchronizationcontext",
    "thread pool",
    "low-level",
    "runtime",
    "generational",
    "microservices",
];

const INVALID_RESUME_MESSAGE: &str = "Please upload a PDF file.";

/// 取り込み済みの履歴書
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumeText {
    pub file_name: String,
    pub text: String,
}

/// PDF であることを確認して本文を拾う。
/// 本文が拾えなければファイル名を代わりに使う。
pub fn read_resume(file_name: &str, bytes: &[u8]) -> Result<ResumeText, AppError> {
    let by_name = file_name.to_ascii_lowercase().ends_with(".pdf");
    let by_magic = bytes.starts_with(b"%PDF");
    if !by_name && !by_magic {
        return Err(AppError::invalid_resume(INVALID_RESUME_MESSAGE));
    }
    if bytes.is_empty() {
        return Err(AppError::invalid_resume("The uploaded file is empty."));
    }

    let scraped = PostProcessor::scrape_printable(bytes);
    let text = if scraped.is_empty() {
        log::debug!("no printable text in {file_name}, using the file name");
        file_name.to_string()
    } else {
        scraped
    };

    Ok(ResumeText {
        file_name: file_name.to_string(),
        text,
    })
}

fn is_denied(skill: &str) -> bool {
    let lower = skill.to_lowercase();
    SKILL_DENYLIST.iter().any(|word| lower.contains(word))
}

/// 抽出結果の整形: 空白正規化・除外語・語数制限・重複除去・上限
pub fn clean_skills<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut skills: Vec<String> = Vec::new();
    for item in raw {
        let skill = PostProcessor::collapse_whitespace(item.as_ref());
        if skill.is_empty()
            || is_denied(&skill)
            || PostProcessor::word_count(&skill) > MAX_SKILL_WORDS
        {
            continue;
        }
        if skills.iter().any(|s| s.eq_ignore_ascii_case(&skill)) {
            continue;
        }
        skills.push(skill);
        if skills.len() == MAX_SKILLS {
            break;
        }
    }
    skills
}

fn to_owned_list(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

/// リモート応答（JSON 配列）からスキル候補を読む。配列でなければ None。
fn parse_skill_list(raw: &str) -> Option<Vec<String>> {
    let cleaned = PostProcessor::strip_code_fence(raw);
    let value: Value = serde_json::from_str(&cleaned).ok()?;
    let items = value.as_array()?;
    Some(
        items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
    )
}

/// 履歴書テキストから技術スキルを抽出する
pub struct SkillExtractor {
    llm: Arc<dyn LlmClient>,
    metrics: Arc<Metrics>,
}

impl SkillExtractor {
    pub fn new(llm: Arc<dyn LlmClient>, metrics: Arc<Metrics>) -> Self {
        Self { llm, metrics }
    }

    /// 失敗時も必ず非空のスキル一覧を返す
    pub async fn extract(&self, resume_text: &str) -> Vec<String> {
        let request = CompletionRequest::new(prompts::SYSTEM_EXTRACT_SKILLS, resume_text);

        self.metrics.inc_remote_calls();
        let raw = match self.llm.complete(request).await {
            Ok(raw) => raw,
            Err(e) => {
                log::warn!("skill extraction via {} failed: {e}", self.llm.name());
                self.metrics.inc_remote_fallbacks();
                return to_owned_list(&REMOTE_FALLBACK_SKILLS);
            }
        };

        let Some(candidates) = parse_skill_list(&raw) else {
            log::warn!("skill extraction response is not a JSON array");
            self.metrics.inc_remote_fallbacks();
            return to_owned_list(&PARSE_FALLBACK_SKILLS);
        };

        let skills = clean_skills(candidates);
        if skills.is_empty() {
            log::warn!("no usable skills after filtering");
            self.metrics.inc_remote_fallbacks();
            return to_owned_list(&PARSE_FALLBACK_SKILLS);
        }
        log::info!("extracted {} skills", skills.len());
        skills
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::ErrorCode;
    use crate::usecase::test_support::ScriptedLlm;

    fn extractor(llm: Arc<ScriptedLlm>) -> SkillExtractor {
        SkillExtractor::new(llm, Arc::new(Metrics::new()))
    }

    #[test]
    fn test_read_resume_rejects_non_pdf() {
        let err = read_resume("resume.docx", b"PK\x03\x04").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidResume);
        assert_eq!(err.message, "Please upload a PDF file.");
    }

    #[test]
    fn test_read_resume_accepts_magic_without_extension() {
        let resume = read_resume("upload", b"%PDF-1.7 Rust Tokio Postgres").unwrap();
        assert!(resume.text.contains("Rust Tokio Postgres"));
    }

    #[test]
    fn test_read_resume_falls_back_to_file_name() {
        let resume = read_resume("jane_doe.pdf", &[0x00, 0x01, 0xff, 0xfe]).unwrap();
        assert_eq!(resume.text, "jane_doe.pdf");
    }

    #[test]
    fn test_read_resume_rejects_empty() {
        assert!(read_resume("empty.pdf", &[]).is_err());
    }

    #[test]
    fn test_clean_skills_filters() {
        let skills = clean_skills([
            "Rust",
            "  Spring   Boot ",
            "Microservices Architecture",
            "Large scale distributed caching systems",
            "rust",
            "CLR runtime",
            "",
            "PostgreSQL",
        ]);
        assert_eq!(skills, vec!["Rust", "Spring Boot", "PostgreSQL"]);
    }

    #[test]
    fn test_clean_skills_caps_at_ten() {
        let raw: Vec<String> = (0..15).map(|i| format!("Skill{i}")).collect();
        let skills = clean_skills(raw);
        assert_eq!(skills.len(), MAX_SKILLS);
        assert_eq!(skills[9], "Skill9");
    }

    #[tokio::test]
    async fn test_extract_success() {
        let llm = Arc::new(ScriptedLlm::replying(&[
            "```json\n[\"Go\", \"Kubernetes\", \"Thread Pool tuning\"]\n```",
        ]));
        let skills = extractor(llm.clone()).extract("resume text").await;
        assert_eq!(skills, vec!["Go", "Kubernetes"]);
        assert_eq!(llm.last_request().unwrap().user, "resume text");
    }

    #[tokio::test]
    async fn test_extract_parse_fallback() {
        let llm = Arc::new(ScriptedLlm::replying(&["Skills: Go, Rust"]));
        let skills = extractor(llm).extract("resume").await;
        assert_eq!(skills, vec!["Java", "SQL", "React"]);
    }

    #[tokio::test]
    async fn test_extract_all_filtered_uses_parse_fallback() {
        let llm = Arc::new(ScriptedLlm::replying(&[r#"["runtime internals"]"#]));
        let skills = extractor(llm).extract("resume").await;
        assert_eq!(skills, vec!["Java", "SQL", "React"]);
    }

    #[tokio::test]
    async fn test_extract_remote_fallback() {
        let skills = extractor(Arc::new(ScriptedLlm::failing()))
            .extract("resume")
            .await;
        assert_eq!(
            skills,
            vec!["JavaScript", "React", "Node.js", "Python", "SQL"]
        );
    }
}
