mod config;
mod console;
mod events;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use tokio::sync::mpsc;

use iv_core::domain::aptitude::AptitudeStep;
use iv_core::domain::job::JobStatus;
use iv_core::domain::report::Report;
use iv_core::domain::settings::InterviewSettings;
use iv_core::domain::types::{RoundKind, SelectedMode, Stage, VoiceRound};
use iv_core::infra::llm::{ClaudeClient, LlmClient, NoopLlmClient};
use iv_core::infra::speech::NoMediaDevices;
use iv_core::usecase::app_service::{Capabilities, InterviewService};

use crate::console::{ConsoleInput, ConsoleSpeech, StdinRecognizer};

#[derive(Parser)]
#[command(version, about = "Mock interview: aptitude quiz, technical and HR rounds, final report")]
struct Cli {
    /// Resume PDF used to pick technical questions
    resume: PathBuf,
    /// Rounds to run: all, aptitude, technical or hr
    #[arg(long, default_value = "all")]
    mode: SelectedMode,
    /// Print the final report as JSON
    #[arg(long)]
    json: bool,
    /// Never call the remote LLM, even when an API key is configured
    #[arg(long)]
    offline: bool,
}

/// LLM クライアントを構築する（API キーなし/オフライン: Noop）
fn create_llm(settings: &InterviewSettings, offline: bool) -> Arc<dyn LlmClient> {
    if offline {
        log::info!("offline mode, remote LLM disabled");
        return Arc::new(NoopLlmClient);
    }
    let Some(key) = settings.llm_api_key.clone() else {
        log::warn!("no API key configured, every evaluation will use default scores");
        return Arc::new(NoopLlmClient);
    };
    match ClaudeClient::new(key, settings) {
        Ok(client) => {
            log::info!("using {} ({})", client.name(), settings.llm_model);
            Arc::new(client)
        }
        Err(e) => {
            log::error!("failed to build LLM client, falling back to Noop: {e}");
            Arc::new(NoopLlmClient)
        }
    }
}

async fn run_aptitude(service: &InterviewService, input: &ConsoleInput) -> Result<()> {
    let mut quiz = service.aptitude_quiz();
    println!("\n=== Aptitude round ===");

    loop {
        let Some(question) = quiz.current().cloned() else {
            break;
        };
        println!("\nQ{}. {}", quiz.current_index() + 1, question.prompt);
        for (i, option) in question.options.iter().enumerate() {
            println!("  {}) {option}", i + 1);
        }

        let line = input
            .read_line()
            .await
            .ok_or_else(|| anyhow!("input closed during the aptitude round"))?;
        let picked = match line.trim().parse::<usize>() {
            Ok(n) if n >= 1 => n - 1,
            _ => {
                println!("Enter an option number.");
                continue;
            }
        };
        if let Err(e) = quiz.select(picked) {
            println!("{}", e.message);
            continue;
        }
        match quiz.next().map_err(|e| anyhow!("{e}"))? {
            AptitudeStep::Next(_) => {}
            AptitudeStep::Finished(score) => println!("\nAptitude score: {score}%"),
        }
    }

    service.commit_aptitude(&quiz).map_err(|e| anyhow!("{e}"))?;
    Ok(())
}

async fn run_voice_round(service: &InterviewService, round: VoiceRound) -> Result<()> {
    println!("\n=== {} round ===", round.as_str());
    let job_id = service
        .start_round(round)
        .await
        .map_err(|e| anyhow!("{e}"))?;

    let job = tokio::select! {
        job = service.wait_round(&job_id) => job,
        _ = tokio::signal::ctrl_c() => {
            service.cancel_round().await;
            bail!("interview canceled");
        }
    };

    match job {
        Some(job) if job.status == JobStatus::Done => Ok(()),
        Some(job) => bail!(
            "{} round ended as {:?}: {}",
            round.as_str(),
            job.status,
            job.error.unwrap_or_default()
        ),
        None => bail!("round job {job_id} disappeared"),
    }
}

fn print_report(report: &Report) {
    let figure = |v: Option<u32>, suffix: &str| {
        v.map(|v| format!("{v}{suffix}"))
            .unwrap_or_else(|| "Not Attempted".to_string())
    };
    println!("\n=== Final report ===");
    println!("Aptitude:        {}", figure(report.figures.aptitude_score, "%"));
    println!("Technical avg:   {}", figure(report.figures.tech_avg, ""));
    println!("HR avg:          {}", figure(report.figures.hr_avg, ""));
    println!("Overall:         {}", report.figures.overall);
    println!("Recommendation:  {}", report.figures.recommendation);
    println!("\n{}", report.summary);

    for (title, records) in [
        ("Technical", &report.technical_breakdown),
        ("HR", &report.hr_breakdown),
    ] {
        if records.is_empty() {
            continue;
        }
        println!("\n{title} breakdown:");
        for (i, r) in records.iter().enumerate() {
            println!("  {}. {} [{}/10]", i + 1, r.question, r.score);
            println!("     answer:   {}", r.answer);
            println!("     feedback: {}", r.feedback);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = config::load_settings();

    let bytes = std::fs::read(&cli.resume)
        .with_context(|| format!("failed to read {}", cli.resume.display()))?;
    let file_name = cli
        .resume
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let input = ConsoleInput::spawn();
    let llm = create_llm(&settings, cli.offline);
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(events::print_round_events(event_rx, cli.json));

    let service = InterviewService::new(
        settings,
        Capabilities {
            llm,
            speech_output: Arc::new(ConsoleSpeech),
            recognizer: Arc::new(StdinRecognizer::new(input.clone())),
            media: Arc::new(NoMediaDevices),
        },
        Some(event_tx),
    );

    let skills = service
        .intake_resume(&file_name, &bytes)
        .await
        .map_err(|e| anyhow!("{}", e.message))?;
    println!("Skills found: {}", skills.join(", "));

    let mut stage = Stage::Round(service.select_mode(cli.mode));
    while let Stage::Round(round) = stage {
        match round {
            RoundKind::Aptitude => run_aptitude(&service, &input).await?,
            RoundKind::Technical => run_voice_round(&service, VoiceRound::Technical).await?,
            RoundKind::Hr => run_voice_round(&service, VoiceRound::Hr).await?,
        }
        stage = service.next_stage(round);
    }

    let report = service.build_report().await;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    log::debug!("metrics: {:?}", service.metrics());
    drop(service);
    let _ = printer.await;
    Ok(())
}
