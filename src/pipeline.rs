use crate::config::Config;
use crate::error::{Result, SubtransError};
use crate::subtitle::{sort_by_index, srt, SubtitleEntry};
use crate::translate::{
    autosave_path, create_translator, try_apply_existing, BatchOrchestrator, ResumeStatus,
    RunOutcome, TranslationSettings,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// Configuration for one subtitle translation run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Language pair and formatting flag.
    pub settings: TranslationSettings,
    /// Rewrite the auto-save file after every batch.
    pub auto_save: bool,
    /// Import translations from an earlier auto-save before starting.
    pub resume: bool,
    /// Show progress bars.
    pub show_progress: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            settings: TranslationSettings::default(),
            auto_save: true,
            resume: true,
            show_progress: true,
        }
    }
}

impl PipelineConfig {
    /// Language and formatting defaults taken from the user's config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            settings: TranslationSettings {
                source_lang: config.source_language.clone(),
                target_lang: config.target_language.clone(),
                preserve_formatting: config.preserve_formatting,
            },
            ..Self::default()
        }
    }
}

/// Statistics from the translation process.
#[derive(Debug, Clone)]
pub struct PipelineStats {
    /// Total time taken for the entire pipeline.
    pub total_time: Duration,
    /// Number of cues parsed from the input.
    pub subtitle_entries: usize,
    /// Cues whose translation came from an earlier auto-save.
    pub resumed_entries: usize,
    /// Model used for translation.
    pub model: String,
}

/// Result of the translation pipeline.
#[derive(Debug)]
pub struct PipelineResult {
    /// Path to the output subtitle file.
    pub output_path: PathBuf,
    /// Entries after the run, sorted by index.
    pub entries: Vec<SubtitleEntry>,
    pub outcome: RunOutcome,
    pub resume: Option<ResumeStatus>,
    pub stats: PipelineStats,
}

/// Translate an SRT file.
///
/// Stages:
/// 1. Parse the input and sort by index
/// 2. Import earlier translations from the auto-save file
/// 3. Translate remaining cues batch by batch
/// 4. Write the output file
pub async fn translate_file(
    input: &Path,
    output: Option<&Path>,
    config: &Config,
    pipeline_config: PipelineConfig,
) -> Result<PipelineResult> {
    let cancelled = Arc::new(AtomicBool::new(false));
    translate_file_with_cancel(input, output, config, pipeline_config, cancelled).await
}

/// Translate an SRT file with cancellation support.
pub async fn translate_file_with_cancel(
    input: &Path,
    output: Option<&Path>,
    config: &Config,
    pipeline_config: PipelineConfig,
    cancelled: Arc<AtomicBool>,
) -> Result<PipelineResult> {
    let start_time = Instant::now();

    if !input.exists() {
        return Err(SubtransError::FileNotFound(input.display().to_string()));
    }

    let translator = create_translator(config)?;
    let settings = &pipeline_config.settings;
    let save_path = autosave_path(input, &settings.target_lang);
    let output_path = output.map(Path::to_path_buf).unwrap_or_else(|| save_path.clone());

    // Stage 1: parse
    info!("Stage 1/4: Parsing {:?}", input);
    let mut entries = srt::parse_file(input)?;
    sort_by_index(&mut entries);
    info!("Parsed {} subtitle entries", entries.len());

    // Stage 2: resume
    let resume = if pipeline_config.resume {
        info!("Stage 2/4: Checking for earlier output at {:?}", save_path);
        Some(try_apply_existing(&mut entries, input, &settings.target_lang))
    } else {
        info!("Stage 2/4: Resume disabled, starting fresh");
        None
    };
    let resumed_entries = match resume {
        Some(ResumeStatus::Applied { imported }) => imported,
        _ => 0,
    };

    // Stage 3: translate
    info!(
        "Stage 3/4: Translating {} -> {} with {}",
        settings.source_lang, settings.target_lang, config.model
    );
    let auto_save = pipeline_config.auto_save.then(|| save_path.clone());
    let orchestrator = BatchOrchestrator::new(Box::new(translator))
        .with_auto_save(auto_save)
        .with_progress(pipeline_config.show_progress);

    let outcome = orchestrator.run(&mut entries, settings, &cancelled).await?;

    // Stage 4: output. Skipped when auto-save already wrote the same file.
    let already_saved = pipeline_config.auto_save
        && output_path == save_path
        && outcome.any_batch_sent();
    if already_saved {
        info!("Stage 4/4: Output already auto-saved to {:?}", output_path);
    } else {
        info!("Stage 4/4: Writing {:?}", output_path);
        srt::write_file(&output_path, &entries, true)?;
    }

    let stats = PipelineStats {
        total_time: start_time.elapsed(),
        subtitle_entries: entries.len(),
        resumed_entries,
        model: config.model.clone(),
    };

    Ok(PipelineResult {
        output_path,
        entries,
        outcome,
        resume,
        stats,
    })
}

/// Print a summary of the pipeline results.
pub fn print_summary(result: &PipelineResult) {
    println!();
    println!("═══════════════════════════════════════════════════════════════");
    println!("                    Subtitle Translation Summary               ");
    println!("═══════════════════════════════════════════════════════════════");
    println!();
    println!("  Status:     {}", describe_outcome(&result.outcome));
    println!("  Output:     {}", result.output_path.display());
    println!("  Entries:    {}", result.stats.subtitle_entries);
    println!("  Model:      {}", result.stats.model);
    if result.stats.resumed_entries > 0 {
        println!("  Resumed:    {} from earlier output", result.stats.resumed_entries);
    }
    if let Some(ResumeStatus::Unreadable(ref reason)) = result.resume {
        println!("  Note: earlier output ignored ({})", reason);
    }
    println!();
    println!(
        "  Total:      {:.2}s",
        result.stats.total_time.as_secs_f64()
    );
    println!();
    println!("═══════════════════════════════════════════════════════════════");
}

/// One-line, user-facing description of how a run ended.
pub fn describe_outcome(outcome: &RunOutcome) -> String {
    match outcome {
        RunOutcome::NothingToDo => "Nothing to do (already translated)".to_string(),
        RunOutcome::Completed {
            translated,
            total,
            batches,
        } => format!(
            "Completed: {}/{} translated in {} batch(es)",
            translated, total, batches
        ),
        RunOutcome::Cancelled {
            processed, total, ..
        } => format!("Cancelled after {}/{} translated", processed, total),
    }
}
