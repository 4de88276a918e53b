use std::env;
use std::str::FromStr;

use iv_core::domain::settings::InterviewSettings;

/// 環境変数（と `.env`）から設定を組み立てる。
///
/// * `IV_API_KEY` / `ANTHROPIC_API_KEY`: LLM の API キー。未設定ならリモート呼び出しは全て既定値になる
/// * `IV_MODEL`: モデル名
/// * `IV_TECH_TIMEOUT_SECS` / `IV_HR_TIMEOUT_SECS`: 回答取得の締め切り
/// * `IV_PAUSE_MS`: 質問間の待機
pub fn load_settings() -> InterviewSettings {
    let mut settings = InterviewSettings::default();

    settings.llm_api_key = env::var("IV_API_KEY")
        .or_else(|_| env::var("ANTHROPIC_API_KEY"))
        .ok()
        .filter(|key| !key.trim().is_empty());
    if let Ok(model) = env::var("IV_MODEL") {
        settings.llm_model = model;
    }

    override_number("IV_TECH_TIMEOUT_SECS", &mut settings.technical_capture_timeout_secs);
    override_number("IV_HR_TIMEOUT_SECS", &mut settings.hr_capture_timeout_secs);
    override_number("IV_PAUSE_MS", &mut settings.inter_question_pause_ms);

    settings
}

fn override_number<T: FromStr>(var: &str, target: &mut T) {
    let Ok(raw) = env::var(var) else {
        return;
    };
    match raw.trim().parse::<T>() {
        Ok(value) => *target = value,
        Err(_) => log::warn!("ignoring {var}={raw:?}: not a number"),
    }
}
