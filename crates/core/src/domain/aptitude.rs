use serde::{Deserialize, Serialize};

use super::error::AppError;

/// 適性検査の4択問題
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AptitudeQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct: usize,
}

impl AptitudeQuestion {
    fn new(prompt: &str, options: [&str; 4], correct: usize) -> Self {
        Self {
            prompt: prompt.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct,
        }
    }
}

/// 既定の5問
pub fn default_questions() -> Vec<AptitudeQuestion> {
    vec![
        AptitudeQuestion::new(
            "If a train travels 360 km in 4 hours, what is its average speed in km/h?",
            ["80 km/h", "90 km/h", "100 km/h", "70 km/h"],
            1,
        ),
        AptitudeQuestion::new(
            "A is twice as old as B. If A is 30 years old, how old will B be in 5 years?",
            ["15", "20", "25", "10"],
            1,
        ),
        AptitudeQuestion::new(
            "Complete the series: 2, 6, 18, 54, __",
            ["108", "162", "72", "216"],
            1,
        ),
        AptitudeQuestion::new(
            "If all roses are flowers and some flowers fade quickly, which statement is true?",
            [
                "All roses fade quickly",
                "Some roses may fade quickly",
                "No roses fade quickly",
                "All flowers are roses",
            ],
            1,
        ),
        AptitudeQuestion::new(
            "A shopkeeper sells an item at 20% profit. If the cost price is ₹500, what is the selling price?",
            ["₹550", "₹600", "₹650", "₹700"],
            1,
        ),
    ]
}

/// 正答率（0–100、四捨五入）
pub fn percentage(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((correct as f64 / total as f64) * 100.0).round() as u32
}

/// `next()` の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AptitudeStep {
    /// 次の問題へ
    Next(usize),
    /// 全問終了（スコア確定）
    Finished(u32),
}

/// 適性検査の進行管理。選択 → 次へ を問題数分繰り返す。
pub struct AptitudeQuiz {
    questions: Vec<AptitudeQuestion>,
    current: usize,
    selected: Option<usize>,
    answers: Vec<usize>,
    score: Option<u32>,
}

impl AptitudeQuiz {
    pub fn new(questions: Vec<AptitudeQuestion>) -> Self {
        Self {
            questions,
            current: 0,
            selected: None,
            answers: Vec::new(),
            score: None,
        }
    }

    pub fn questions(&self) -> &[AptitudeQuestion] {
        &self.questions
    }

    pub fn current(&self) -> Option<&AptitudeQuestion> {
        if self.score.is_some() {
            return None;
        }
        self.questions.get(self.current)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn score(&self) -> Option<u32> {
        self.score
    }

    pub fn select(&mut self, option: usize) -> Result<(), AppError> {
        let question = self
            .current()
            .ok_or_else(|| AppError::invalid_state("aptitude quiz is already finished"))?;
        if option >= question.options.len() {
            return Err(AppError::invalid_state(format!(
                "option {option} is out of range (0..{})",
                question.options.len()
            )));
        }
        self.selected = Some(option);
        Ok(())
    }

    pub fn next(&mut self) -> Result<AptitudeStep, AppError> {
        if self.score.is_some() {
            return Err(AppError::invalid_state("aptitude quiz is already finished"));
        }
        // 質問なしは即終了
        if self.questions.is_empty() {
            self.score = Some(0);
            return Ok(AptitudeStep::Finished(0));
        }
        let picked = self
            .selected
            .take()
            .ok_or_else(|| AppError::invalid_state("select an option before moving on"))?;
        self.answers.push(picked);

        if self.current + 1 < self.questions.len() {
            self.current += 1;
            return Ok(AptitudeStep::Next(self.current));
        }

        let correct = self
            .answers
            .iter()
            .zip(&self.questions)
            .filter(|(answer, q)| **answer == q.correct)
            .count();
        let score = percentage(correct, self.questions.len());
        self.score = Some(score);
        Ok(AptitudeStep::Finished(score))
    }
}

impl Default for AptitudeQuiz {
    fn default() -> Self {
        Self::new(default_questions())
    }
}
