use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use display_error_chain::DisplayErrorChain;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use url::Url;
use video_summarizer::{
    summary::{
        config::{API_KEY_ENV, DEFAULT_OUTPUT_FILE},
        CleanupOutcome, CleanupPolicy, GeminiService, Summarizer, SummaryConfig,
    },
    GenerationConfig, DEFAULT_BASE_URL, DEFAULT_MODEL,
};

#[derive(Parser)]
#[command(name = "video-summarizer")]
#[command(about = "Summarize the visible events of a video with Gemini", long_about = None)]
struct Cli {
    /// Video file to summarize
    video: PathBuf,

    /// Gemini API key
    #[arg(long, env = API_KEY_ENV, hide_env_values = true)]
    api_key: Option<String>,

    /// Model used for the summary
    #[arg(short, long, default_value = DEFAULT_MODEL)]
    model: String,

    /// Replace the default instruction sent with the video
    #[arg(short, long, conflicts_with = "prompt_file")]
    prompt: Option<String>,

    /// Read the instruction from a file
    #[arg(long)]
    prompt_file: Option<PathBuf>,

    /// Where to write the summary; overwritten if it exists
    #[arg(short, long, default_value = DEFAULT_OUTPUT_FILE)]
    output: PathBuf,

    /// Media type declared for the upload
    #[arg(long, default_value = "video/mp4")]
    mime_type: mime::Mime,

    /// Gemini API base URL
    #[arg(long, default_value = DEFAULT_BASE_URL)]
    base_url: Url,

    /// Seconds between checks while the service processes the video
    #[arg(long, default_value_t = 5)]
    poll_interval_secs: u64,

    /// Give up waiting for processing after this many seconds (0 waits forever)
    #[arg(long, default_value_t = 600)]
    processing_timeout_secs: u64,

    /// Sampling temperature
    #[arg(long)]
    temperature: Option<f32>,

    /// Upper bound on generated tokens
    #[arg(long)]
    max_output_tokens: Option<i32>,

    /// Fail the run when the uploaded video cannot be deleted
    #[arg(long)]
    strict_cleanup: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match do_main(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let error_chain = DisplayErrorChain::new(e.as_ref());
            tracing::error!(error.debug = ?e, error.chained = %error_chain, "execution failed");
            ExitCode::FAILURE
        }
    }
}

async fn do_main(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = build_config(&cli).await?;
    let service = GeminiService::from_config(&config)?;

    let report = Summarizer::new(&service, &config).run(&cli.video).await?;

    if let CleanupOutcome::Failed(reason) = &report.cleanup {
        warn!(file.id = %report.id, reason = %reason, "uploaded video was left on the service");
    }
    info!(output = %report.output_path.display(), "done");
    Ok(())
}

async fn build_config(cli: &Cli) -> Result<SummaryConfig, Box<dyn std::error::Error>> {
    let mut config = SummaryConfig::with_api_key_or_placeholder(cli.api_key.clone())
        .with_base_url(cli.base_url.clone())
        .with_model(cli.model.as_str())
        .with_mime_type(cli.mime_type.clone())
        .with_output_path(&cli.output)
        .with_poll_interval(Duration::from_secs(cli.poll_interval_secs))
        .with_processing_timeout(
            (cli.processing_timeout_secs > 0)
                .then(|| Duration::from_secs(cli.processing_timeout_secs)),
        );

    if let Some(prompt) = &cli.prompt {
        config = config.with_prompt(prompt.as_str());
    } else if let Some(path) = &cli.prompt_file {
        config = config.with_prompt(tokio::fs::read_to_string(path).await?.trim());
    }

    if cli.strict_cleanup {
        config = config.with_cleanup_policy(CleanupPolicy::Fail);
    }

    if cli.temperature.is_some() || cli.max_output_tokens.is_some() {
        config = config.with_generation_config(GenerationConfig {
            temperature: cli.temperature,
            max_output_tokens: cli.max_output_tokens,
        });
    }

    Ok(config)
}
