//! リモート LLM 向けのプロンプトテンプレート
use crate::domain::report::ReportFigures;
use crate::domain::types::VoiceRound;

/// 技術面接の採点ルーブリック
pub const RUBRIC_TECHNICAL: &str = "\
You are a technical interview evaluator.

Score strictly using this rubric:

1-3  = Incorrect or very weak understanding
4-6  = Basic understanding but lacks depth
7-8  = Good understanding with correct explanation
9-10 = Excellent explanation with clarity and accuracy

Return ONLY valid JSON:
{\"score\": number, \"feedback\": \"one sentence\"}";

/// HR面接の採点ルーブリック
pub const RUBRIC_HR: &str = "\
You are an HR interview evaluator.

Score strictly using this rubric:

1-3  = Poor (unclear, weak communication, no structure)
4-6  = Average (basic clarity but lacks depth or confidence)
7-8  = Good (clear, structured, confident answer)
9-10 = Excellent (strong communication, structured, confident, impactful)

Return ONLY valid JSON:
{\"score\": number, \"feedback\": \"one sentence\"}";

/// 履歴書からのスキル抽出
pub const SYSTEM_EXTRACT_SKILLS: &str = "\
Extract ONLY high-level technical skills from the resume.

Rules:
- Include only programming languages, frameworks, databases, tools.
- Do NOT include implementation details.
- Do NOT include long phrases.
- Each skill must be 1 to 3 words only.
- Return ONLY a JSON array.
Example:
[\"Java\", \"React\", \"SQL\", \"Node.js\", \".NET\"]";

/// 技術面接の出題
pub const SYSTEM_GENERATE_QUESTIONS: &str = "\
You are a campus placement technical interviewer.

Generate exactly 3 technical interview questions.

Question structure:
1. First question: Basic definition from first skill.
2. Second question: Concept explanation or comparison from second skill.
3. Third question: Slightly deeper but still beginner-friendly from third skill.

Rules:
- Each question must contain 10 to 15 words.
- Use simple and clear language.
- Do not include advanced architecture or internal implementation topics.
- Do not use complex terminology.
- No numbering.
- Return ONLY a valid JSON array.";

/// 総評の生成
pub const SYSTEM_REPORT_SUMMARY: &str = "\
You are an AI hiring evaluator. Write a 2-3 sentence professional feedback summary \
based strictly on the provided scores. Do not invent data.";

/// ラウンドに対応する採点ルーブリックを取得する
pub fn rubric_for(round: VoiceRound) -> &'static str {
    match round {
        VoiceRound::Technical => RUBRIC_TECHNICAL,
        VoiceRound::Hr => RUBRIC_HR,
    }
}

/// 採点依頼のユーザーメッセージ
pub fn build_evaluation_prompt(question: &str, answer: &str) -> String {
    format!(
        "Question:\n{question}\n\nCandidate Answer:\n{answer}\n\n\
         Evaluate strictly according to rubric.\nReturn JSON only."
    )
}

/// 出題依頼のユーザーメッセージ（先頭3スキル、足りない分は空欄）
pub fn build_questions_prompt(skills: &[String]) -> String {
    let mut msg = String::from("Skills:\n");
    for i in 0..3 {
        let skill = skills.get(i).map(String::as_str).unwrap_or("");
        msg.push_str(&format!("{}. {}\n", i + 1, skill));
    }
    msg.push_str("\nGenerate one question per skill in the specified order.");
    msg
}

fn figure(value: Option<u32>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| "Not Attempted".to_string())
}

/// 総評依頼のユーザーメッセージ
pub fn build_summary_prompt(figures: &ReportFigures) -> String {
    format!(
        "Candidate Performance:\n\
         Aptitude Score: {}\n\
         Technical Average: {}\n\
         HR Average: {}\n\
         Overall Score: {}\n\n\
         Write a constructive and professional evaluation summary.",
        figure(figures.aptitude_score),
        figure(figures.tech_avg),
        figure(figures.hr_avg),
        figures.overall
    )
}
