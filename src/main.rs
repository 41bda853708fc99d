use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use subtrans::config::Config;
use subtrans::interactive::run_interactive_wizard;
use subtrans::pipeline::{
    describe_outcome, print_summary, translate_file_with_cancel, PipelineConfig,
};
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "subtrans")]
#[command(version, about = "Translate SRT subtitles using AI")]
#[command(long_about = "Translate SRT subtitle files with Google Gemini, batch by batch, \
saving progress after every batch so interrupted runs can resume.")]
struct Cli {
    /// Input SRT file (omit to start the interactive wizard)
    input: Option<PathBuf>,

    /// Output file (defaults to <name>.<target>.srt next to the input)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Source language tag (e.g., en)
    #[arg(short, long)]
    from: Option<String>,

    /// Target language tag (e.g., ko)
    #[arg(short, long)]
    to: Option<String>,

    /// Gemini model name
    #[arg(short, long)]
    model: Option<String>,

    /// Let the model reflow line breaks and markup
    #[arg(long)]
    no_preserve_formatting: bool,

    /// Do not rewrite the output file after every batch
    #[arg(long)]
    no_auto_save: bool,

    /// Ignore translations from an earlier run
    #[arg(long)]
    fresh: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.to_string().to_lowercase()));

    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();
}

/// First Ctrl+C asks the run to stop after the current batch; a second one exits.
fn install_cancel_handler() -> Result<Arc<AtomicBool>> {
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = cancelled.clone();

    ctrlc::set_handler(move || {
        if flag.swap(true, Ordering::SeqCst) {
            std::process::exit(130);
        }
        warn!("Cancelling after the current batch (press Ctrl+C again to quit now)");
    })
    .context("Failed to install Ctrl+C handler")?;

    Ok(cancelled)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let (input, output, config, pipeline_config) = match cli.input {
        Some(input) => {
            let mut config = Config::load().context("Failed to load configuration")?;
            if let Some(model) = cli.model {
                config.model = model;
            }
            config
                .validate()
                .context("Configuration validation failed")?;

            let mut pipeline_config = PipelineConfig::from_config(&config);
            if let Some(from) = cli.from {
                pipeline_config.settings.source_lang = from;
            }
            if let Some(to) = cli.to {
                pipeline_config.settings.target_lang = to;
            }
            pipeline_config.settings.preserve_formatting &= !cli.no_preserve_formatting;
            pipeline_config.auto_save = !cli.no_auto_save;
            pipeline_config.resume = !cli.fresh;

            (input, cli.output, config, pipeline_config)
        }
        None => {
            let wizard = run_interactive_wizard()?;
            (
                wizard.input,
                Some(wizard.output),
                wizard.config,
                wizard.pipeline_config,
            )
        }
    };

    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }

    info!("Input:     {}", input.display());
    info!(
        "Translate: {} -> {}",
        pipeline_config.settings.source_lang, pipeline_config.settings.target_lang
    );
    info!("Model:     {}", config.model);

    let cancelled = install_cancel_handler()?;

    let result = translate_file_with_cancel(
        &input,
        output.as_deref(),
        &config,
        pipeline_config,
        cancelled,
    )
    .await
    .context("Translation failed")?;

    info!("{}", describe_outcome(&result.outcome));
    print_summary(&result);

    Ok(())
}
