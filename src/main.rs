//! `hotseat` - review tools for recorded games
//!
//! ```text
//! hotseat classify game.json [--flipped] [--json]
//! hotseat scale -- -250
//! hotseat settings [--reset]
//! ```
//!
//! `classify` reads a JSON array of recorded evaluations
//! (`{"evaluation": 35, "move_number": 1, "white": true, "label": "e2e4"}`)
//! and replays it through the move quality classifier.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hotseat_chess::core::{load_settings, save_settings, settings_path, CoreSettings};
use hotseat_chess::engine::Color;
use hotseat_chess::game::resources::{EvaluationHistory, QualitySummary};
use hotseat_chess::ui::{scale, EvalBar};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "hotseat", version, about = "Review tools for pass-and-play chess games")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Annotate a recorded evaluation sequence with move quality tags
    Classify {
        /// JSON file holding the recorded moves
        file: PathBuf,

        /// Show the evaluation bar from Black's side
        #[arg(short, long, default_value = "false")]
        flipped: bool,

        /// Print the annotated history as JSON instead of a table
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Show how one evaluation is drawn on the evaluation bar
    Scale {
        /// Evaluation in centipawns, White's perspective
        #[arg(allow_hyphen_values = true)]
        centipawns: i32,

        /// Show the evaluation bar from Black's side
        #[arg(short, long, default_value = "false")]
        flipped: bool,
    },

    /// Print the settings file location and its contents
    Settings {
        /// Overwrite the file with default settings first
        #[arg(long, default_value = "false")]
        reset: bool,
    },
}

/// One move as recorded during play
#[derive(Debug, Deserialize)]
struct RecordedMove {
    evaluation: i32,
    move_number: u32,
    white: bool,
    #[serde(default)]
    label: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Command::Classify {
            file,
            flipped,
            json,
        } => classify(&file, EvalBar::new(flipped), json),
        Command::Scale {
            centipawns,
            flipped,
        } => {
            let bar = EvalBar::new(flipped);
            println!("evaluation  {}", bar.display_text(centipawns));
            println!("raw scale   {:.4}", scale(centipawns));
            println!("bar fill    {:.4}", bar.fill_fraction(centipawns));
            println!("magnitude   {:?}", bar.magnitude(centipawns));
            Ok(())
        }
        Command::Settings { reset } => {
            if reset {
                save_settings(&CoreSettings::default()).context("failed to reset settings")?;
            }
            println!("{}", settings_path().display());
            println!("{}", serde_json::to_string_pretty(&load_settings())?);
            Ok(())
        }
    }
}

fn classify(file: &Path, bar: EvalBar, json: bool) -> Result<()> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let moves: Vec<RecordedMove> = serde_json::from_str(&text)
        .with_context(|| format!("{} is not a list of recorded moves", file.display()))?;

    let mut history = EvaluationHistory::new();
    for recorded in moves {
        history.record_move(
            recorded.evaluation,
            recorded.move_number,
            recorded.white,
            recorded.label,
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(history.points())?);
        return Ok(());
    }

    for point in history.points() {
        let dots = if point.mover.is_white() { "." } else { "..." };
        println!(
            "{:>3}{:<4}{:<8}{:>7}  {:<10}{:<3} bar {:.3}",
            point.move_number,
            dots,
            point.label.as_deref().unwrap_or("-"),
            bar.display_text(point.evaluation),
            point.quality.label(),
            point.quality.symbol().unwrap_or(""),
            bar.fill_fraction(point.evaluation),
        );
    }

    println!();
    print_summary("White", history.summary(Color::White));
    print_summary("Black", history.summary(Color::Black));
    Ok(())
}

fn print_summary(side: &str, summary: QualitySummary) {
    println!(
        "{side}: {} moves, {} brilliant, {} good, {} inaccuracies, {} mistakes, {} blunders",
        summary.total(),
        summary.brilliant,
        summary.good,
        summary.inaccuracies,
        summary.mistakes,
        summary.blunders,
    );
}
