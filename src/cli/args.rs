use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::task::ProcessingMode;

#[derive(Parser, Debug)]
#[command(name = "papertrans")]
#[command(about = "Batch translation and summarization of academic PDFs with an LLM")]
#[command(version)]
pub struct Args {
    /// Configuration file (defaults to ./config.yaml, then ~/.config/papertrans/config.yaml)
    pub config: Option<PathBuf>,

    /// Processing mode: translate, summarize or both
    #[arg(long, value_parser = parse_mode)]
    pub mode: Option<ProcessingMode>,

    /// Model name
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Output language (e.g., French, Persian)
    #[arg(short = 't', long = "to")]
    pub to: Option<String>,

    /// Suppress the banner, progress bar and per-file status lines
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,
}

fn parse_mode(value: &str) -> Result<ProcessingMode, String> {
    ProcessingMode::parse(value)
        .ok_or_else(|| format!("unknown mode '{value}' (expected translate, summarize or both)"))
}
