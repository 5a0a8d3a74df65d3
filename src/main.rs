use std::io::{self, BufRead};
use std::path::PathBuf;
use std::time::Duration;

use eyre::{Result, WrapErr, bail};
use log::{debug, info};

mod cli;

use cli::{Cli, OutputFormat, TranscriptFormat};
use tubesum::cache::{self, CachedSource};
use tubesum::llm::OpenAiClient;
use tubesum::pipeline::{Pipeline, SummaryRequest};
use tubesum::summarize::PlanTier;
use tubesum::youtube::{TranscriptSource, YouTubeCaptions, fetch_transcript};
use tubesum::{TranscriptError, TranscriptSegment, VideoId, output};

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("tubesum.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tubesum")
        .join("logs")
}

fn build_after_help() -> String {
    let log_path = log_dir().join("tubesum.log");
    format!(
        "\nCONFIG:\n  {}\n\nThe LLM API key is read from the config file or {}.\n\nLogs are written to: {}",
        tubesum::config::config_path().display(),
        tubesum::llm::API_KEY_ENV,
        log_path.display()
    )
}

/// Retry transient transcript failures with exponential backoff
async fn retry<F, Fut, T>(max_attempts: u32, operation: F) -> Result<T, TranscriptError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, TranscriptError>>,
{
    let mut attempt = 0;
    loop {
        match operation().await {
            Ok(val) => return Ok(val),
            Err(e) if e.is_transient() && attempt + 1 < max_attempts => {
                let delay = Duration::from_millis(500 * 2u64.pow(attempt));
                debug!("Attempt {} failed: {e}, retrying in {delay:?}", attempt + 1);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Fetches with caller-side backoff on captcha pages
struct RetryingSource<S> {
    inner: S,
    attempts: u32,
}

#[async_trait::async_trait]
impl<S: TranscriptSource> TranscriptSource for RetryingSource<S> {
    async fn fetch_segments(&self, video_id: &VideoId, lang: Option<&str>) -> Result<Vec<TranscriptSegment>, TranscriptError> {
        retry(self.attempts, || self.inner.fetch_segments(video_id, lang)).await
    }
}

fn render_transcript(segments: &[TranscriptSegment], format: TranscriptFormat) -> String {
    match format {
        TranscriptFormat::Text => output::render_text(segments),
        TranscriptFormat::Json => output::render_json(segments),
        TranscriptFormat::Srt => output::render_srt(segments),
    }
}

fn emit(cli: &Cli, rendered: &str) -> Result<()> {
    if let Some(ref path) = cli.output {
        std::fs::write(path, rendered)?;
        if cli.verbose {
            eprintln!("Output written to: {}", path.display());
        }
    } else {
        println!("{rendered}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = tubesum::config::Config::load().unwrap_or_default();

    // CLI flags take priority over config defaults
    let lang = cli.lang.clone().or_else(|| config.default_lang.clone());
    let tier = cli.tier.or(config.default_tier).unwrap_or(PlanTier::Basic);
    let quick = cli.quick || config.quick;

    if cli.verbose {
        let config_path = tubesum::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
        eprintln!("Tier: {tier}{}", if quick { " (quick)" } else { "" });
    }

    let client = reqwest::Client::builder().timeout(config.timeout()).build()?;

    let captions = RetryingSource {
        inner: YouTubeCaptions::new(client.clone()),
        attempts: 3,
    };
    let use_cache = config.cache && !cli.no_cache;
    let source: Box<dyn TranscriptSource> = if use_cache {
        Box::new(CachedSource::new(captions, cache::default_dir()))
    } else {
        Box::new(captions)
    };

    // Collect URLs: from arg or stdin
    let urls = if let Some(ref url) = cli.url {
        vec![url.clone()]
    } else {
        let stdin = io::stdin();
        stdin.lock().lines().collect::<Result<Vec<_>, _>>()?
    };
    let urls: Vec<&str> = urls.iter().map(|u| u.trim()).filter(|u| !u.is_empty()).collect();

    if urls.is_empty() {
        bail!("no URL or video ID provided\n\nUsage: tubesum <URL>\n       echo <URL> | tubesum");
    }

    if cli.transcript_only {
        for url_input in urls {
            let segments = fetch_transcript(&source, url_input, lang.as_deref())
                .await
                .wrap_err_with(|| format!("could not fetch transcript for {url_input}"))?;
            if cli.verbose {
                eprintln!("Source: {url_input}\nSegments: {}", segments.len());
            }
            emit(&cli, &render_transcript(&segments, cli.transcript_format))?;
        }
        return Ok(());
    }

    let api_key = config.api_key();
    let model = OpenAiClient::new(client, config.api_base_url(), api_key.as_deref(), config.max_tokens)?;
    let pipeline = Pipeline::new(source, model);

    for url_input in urls {
        if let Some(ref question) = cli.ask {
            let (_, segments) = pipeline
                .transcript(url_input, lang.as_deref())
                .await
                .wrap_err_with(|| format!("could not fetch transcript for {url_input}"))?;
            let transcript = tubesum::flatten(&segments)?;
            let answer = pipeline.ask(&transcript, &[], question, tier).await?;
            emit(&cli, &answer)?;
            continue;
        }

        let request = SummaryRequest {
            url: url_input.to_string(),
            lang: lang.clone(),
            tier,
            quick,
        };
        let report = pipeline
            .summarize(&request)
            .await
            .wrap_err_with(|| format!("could not summarize {url_input}"))?;

        if cli.verbose {
            eprintln!(
                "Video: {}\nTitle: {}\nAction steps: {}\nTranscript chars: {}",
                report.video_id,
                report.title,
                report.action_steps.len(),
                report.transcript.chars().count(),
            );
        }

        let rendered = match cli.format {
            OutputFormat::Text => output::render_summary_text(&report),
            OutputFormat::Json => output::render_summary_json(&report),
        };
        emit(&cli, &rendered)?;
    }

    Ok(())
}
