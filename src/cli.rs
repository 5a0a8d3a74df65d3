use clap::Parser;
use std::path::PathBuf;

use tubesum::summarize::PlanTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TranscriptFormat {
    Text,
    Json,
    Srt,
}

#[derive(Parser)]
#[command(
    name = "tubesum",
    about = "Summarize YouTube videos from their captions",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// YouTube video URL or video ID (reads from stdin if omitted)
    pub url: Option<String>,

    /// Preferred caption language (default: first available track)
    #[arg(short, long)]
    pub lang: Option<String>,

    /// Plan tier selecting the model candidates: basic, plus, pro
    #[arg(short, long)]
    pub tier: Option<PlanTier>,

    /// Trade depth for speed: fastest model, shorter transcript
    #[arg(short, long)]
    pub quick: bool,

    /// Summary output format: text (default), json
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Print the transcript instead of summarizing it
    #[arg(long)]
    pub transcript_only: bool,

    /// Transcript output format when --transcript-only is set
    #[arg(long, value_enum, default_value_t = TranscriptFormat::Text)]
    pub transcript_format: TranscriptFormat,

    /// Ask a question about the video instead of summarizing it
    #[arg(short, long)]
    pub ask: Option<String>,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Always fetch captions, bypassing the transcript cache
    #[arg(long)]
    pub no_cache: bool,

    /// Show video, tier and model details on stderr
    #[arg(short, long)]
    pub verbose: bool,
}
