use crate::infra::{bootstrap, triage_service};
use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;
use std::fmt::Write as _;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use triage_ai::error::AppError;
use triage_ai::triage::{
    BatchFailure, BatchOutcome, CallResult, CallSource, QueueEntry, TriageEngine, UrgencyLevel,
    FALLBACK_STRESS,
};

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// Recorded call (wav, mp3 or m4a)
    pub(crate) file: PathBuf,
    /// Transcription language code; detected automatically when omitted
    #[arg(long)]
    pub(crate) language: Option<String>,
    /// Print the result as JSON instead of a call card
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct QueueArgs {
    /// Recorded calls, in submission order
    #[arg(required = true)]
    pub(crate) files: Vec<PathBuf>,
    /// Transcription language code applied to every call
    #[arg(long)]
    pub(crate) language: Option<String>,
    /// Write the ranked queue as CSV to this path
    #[arg(long)]
    pub(crate) report: Option<PathBuf>,
    /// Print the queue as JSON instead of the operator view
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ScoreArgs {
    /// Transcript text to classify
    #[arg(long)]
    pub(crate) transcript: String,
    /// Stress score 0-100; defaults to the short-clip fallback
    #[arg(long)]
    pub(crate) stress: Option<f64>,
    /// Print the result as JSON instead of a call card
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Debug, Serialize)]
struct QueueReport<'a> {
    generated_at: DateTime<Utc>,
    queue: &'a [QueueEntry],
    top: &'a [QueueEntry],
    failures: &'a [BatchFailure],
}

pub(crate) fn run_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    let config = bootstrap()?;
    let service = triage_service(&config)?;

    let result = service.analyze(CallSource::Path(args.file), args.language.as_deref())?;
    print_result(&result, args.json)
}

pub(crate) fn run_score(args: ScoreArgs) -> Result<(), AppError> {
    bootstrap()?;
    let stress = args.stress.unwrap_or(FALLBACK_STRESS);
    let result = TriageEngine::default().assess("transcript", args.transcript, stress);
    print_result(&result, args.json)
}

pub(crate) fn run_queue(args: QueueArgs) -> Result<(), AppError> {
    let config = bootstrap()?;
    let service = triage_service(&config)?;

    let sources = args.files.into_iter().map(CallSource::Path).collect();
    let outcome = service.analyze_batch(sources, args.language.as_deref());

    if let Some(path) = &args.report {
        let file = File::create(path)?;
        outcome.queue.write_csv(BufWriter::new(file))?;
        eprintln!("Report written to {}", path.display());
    }

    if args.json {
        let report = QueueReport {
            generated_at: Utc::now(),
            queue: outcome.queue.entries(),
            top: outcome.queue.operator_summary(),
            failures: &outcome.failures,
        };
        println!("{}", to_json(&report)?);
    } else {
        print!("{}", render_queue(&outcome, Utc::now()));
    }

    Ok(())
}

fn print_result(result: &CallResult, json: bool) -> Result<(), AppError> {
    if json {
        println!("{}", to_json(result)?);
    } else {
        print!("{}", render_call_card(result));
    }
    Ok(())
}

fn to_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value)
        .map_err(|err| AppError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err)))
}

pub(crate) fn level_badge(level: UrgencyLevel) -> &'static str {
    match level {
        UrgencyLevel::Critical => "[!!!]",
        UrgencyLevel::High => "[!! ]",
        UrgencyLevel::Medium => "[!  ]",
        UrgencyLevel::Low => "[   ]",
    }
}

pub(crate) fn render_call_card(result: &CallResult) -> String {
    let mut out = String::new();
    let level = result.level();
    let _ = writeln!(out, "Call: {}", result.filename());
    let _ = writeln!(
        out,
        "{} {} urgency {}/100",
        level_badge(level),
        level.label(),
        result.urgency()
    );

    let transcript = if result.transcript().is_empty() {
        "(no speech detected)"
    } else {
        result.transcript()
    };
    let _ = writeln!(out, "Transcript: {}", transcript);
    let _ = writeln!(
        out,
        "Situation: {} ({:.2})",
        result.situation().label,
        result.situation().confidence
    );
    let _ = writeln!(
        out,
        "Emotion: {} ({:.2})",
        result.emotion().label,
        result.emotion().confidence
    );
    let _ = writeln!(out, "Stress: {:.1}/100", result.stress());

    let breakdown = result.breakdown();
    let _ = writeln!(
        out,
        "Breakdown: base {:.0} + situation {:.0} + emotion {:.2} + stress {:.2}",
        breakdown.base, breakdown.situation_weight, breakdown.emotion_term, breakdown.stress_term
    );

    let evidence = result.evidence();
    for (label, hits) in evidence.situation_hits {
        let _ = writeln!(out, "  situation hit {}: {}", label, hits.join(", "));
    }
    for (label, hits) in evidence.emotion_hits {
        let _ = writeln!(out, "  emotion hit {}: {}", label, hits.join(", "));
    }

    let _ = writeln!(out, "Instruction: {}", result.instruction());
    if result.manual_review() {
        let _ = writeln!(out, "Manual review recommended: low confidence or unclear situation.");
    }
    out
}

pub(crate) fn render_queue(outcome: &BatchOutcome, generated_at: DateTime<Utc>) -> String {
    let mut out = String::new();
    let queue = &outcome.queue;
    let _ = writeln!(
        out,
        "Emergency call queue ({} ranked, {} failed) generated {}",
        queue.len(),
        outcome.failures.len(),
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    if !queue.is_empty() {
        let _ = writeln!(out, "\nTop priority");
        for entry in queue.operator_summary() {
            let result = &entry.result;
            let _ = writeln!(
                out,
                "{}. {} {} {} (urgency {})",
                entry.rank,
                level_badge(result.level()),
                result.level().label(),
                result.filename(),
                result.urgency()
            );
            let _ = writeln!(
                out,
                "   {} / {} | {}",
                result.situation().label,
                result.emotion().label,
                result.instruction()
            );
            if result.manual_review() {
                let _ = writeln!(out, "   Manual review recommended");
            }
        }

        let _ = writeln!(out, "\nFull queue");
        for entry in queue.entries() {
            let result = &entry.result;
            let _ = writeln!(
                out,
                "{:>3} | {:>3} | {:<8} | {:<10} {:.2} | {:<7} {:.2} | stress {:>5.1} | review {}",
                entry.rank,
                result.urgency(),
                result.level().as_str(),
                result.situation().label.as_str(),
                result.situation().confidence,
                result.emotion().label.as_str(),
                result.emotion().confidence,
                result.stress(),
                if result.manual_review() { "yes" } else { "no" },
            );
        }
    }

    if !outcome.failures.is_empty() {
        let _ = writeln!(out, "\nFailed calls");
        for failure in &outcome.failures {
            let _ = writeln!(out, "- {} [{}]: {}", failure.filename, failure.stage, failure.error);
        }
    }
    out
}
