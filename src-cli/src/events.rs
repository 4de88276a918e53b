use tokio::sync::mpsc;

use iv_core::domain::round::RoundPhase;
use iv_core::domain::speech::CaptureStatus;
use iv_core::usecase::orchestrator::RoundEvent;

/// ラウンドイベントをターミナルに表示する（`--json` 時は1行1イベント）
pub async fn print_round_events(mut rx: mpsc::UnboundedReceiver<RoundEvent>, json: bool) {
    while let Some(event) = rx.recv().await {
        if json {
            match serde_json::to_string(&event) {
                Ok(line) => eprintln!("{line}"),
                Err(e) => log::error!("failed to encode round event: {e}"),
            }
            continue;
        }
        print_event(&event);
    }
}

fn print_event(event: &RoundEvent) {
    match event {
        RoundEvent::PhaseChanged(t) if t.new_phase == RoundPhase::Evaluating => {
            println!("  evaluating...");
        }
        RoundEvent::PhaseChanged(_) => {}
        RoundEvent::TranscriptCaptured { answer, .. } => match answer.status {
            CaptureStatus::Recognized => {}
            _ => println!("  ({})", answer.text),
        },
        RoundEvent::ResultRecorded { records, .. } => {
            if let Some(last) = records.last() {
                println!("  score {}/10: {}", last.score, last.feedback);
            }
        }
        RoundEvent::Completed { round, answered } => {
            println!("\n{} round finished ({answered} answers)", round.as_str());
        }
    }
}
