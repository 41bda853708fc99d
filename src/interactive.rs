use crate::config::Config;
use crate::pipeline::PipelineConfig;
use crate::translate::{autosave_path, TranslationSettings};
use console::style;
use dialoguer::{Confirm, Input, Select};
use std::fs;
use std::path::{Path, PathBuf};

const SUPPORTED_EXTENSIONS: &[&str] = &["srt"];

const LANGUAGES: &[(&str, &str)] = &[
    ("en", "English"),
    ("ko", "Korean"),
    ("ja", "Japanese"),
    ("es", "Spanish"),
    ("fr", "French"),
    ("de", "German"),
    ("zh", "Chinese"),
    ("pt", "Portuguese"),
    ("it", "Italian"),
    ("ru", "Russian"),
    ("ar", "Arabic"),
    ("hi", "Hindi"),
    ("nl", "Dutch"),
    ("pl", "Polish"),
    ("tr", "Turkish"),
];

pub struct InteractiveResult {
    pub input: PathBuf,
    pub output: PathBuf,
    pub config: Config,
    pub pipeline_config: PipelineConfig,
}

pub fn run_interactive_wizard() -> anyhow::Result<InteractiveResult> {
    print_header();

    // Step 1: Check/Setup API Key and model
    let config = setup_api_key()?;

    // Step 2: Select subtitle file
    let input = select_source_file()?;

    // Step 3: Languages
    let source_lang = select_language("Select source language:", &config.source_language)?;
    let target_lang = select_language("Select target language:", &config.target_language)?;

    if target_lang == source_lang {
        anyhow::bail!("Target language is the same as the source language");
    }

    // Step 4: Formatting
    let preserve_formatting = Confirm::new()
        .with_prompt("Preserve line breaks and inline tags?")
        .default(config.preserve_formatting)
        .interact()?;

    let output = autosave_path(&input, &target_lang);

    // Step 5: Confirm
    print_summary(&input, &output, &source_lang, &target_lang, &config.model);

    if output.exists() {
        println!(
            "{} {} exists; already translated lines will be reused",
            style("!").yellow(),
            output.display()
        );
    }

    if !Confirm::new()
        .with_prompt("Proceed with these settings?")
        .default(true)
        .interact()?
    {
        anyhow::bail!("Cancelled by user");
    }

    println!();

    let pipeline_config = PipelineConfig {
        settings: TranslationSettings {
            source_lang,
            target_lang,
            preserve_formatting,
        },
        ..PipelineConfig::default()
    };

    Ok(InteractiveResult {
        input,
        output,
        config,
        pipeline_config,
    })
}

fn print_header() {
    println!();
    println!(
        "{}",
        style("╔═══════════════════════════════════════════════════╗").cyan()
    );
    println!(
        "{}",
        style("║        subtrans - AI Subtitle Translator          ║").cyan()
    );
    println!(
        "{}",
        style("╚═══════════════════════════════════════════════════╝").cyan()
    );
    println!();
}

fn setup_api_key() -> anyhow::Result<Config> {
    let mut config = Config::load().unwrap_or_default();

    if config.validate().is_ok() {
        println!(
            "{} API key configured (model: {})",
            style("✓").green(),
            config.model
        );
        return Ok(config);
    }

    println!(
        "{} Gemini API key not found",
        style("!").yellow()
    );
    println!("  Get one at: https://aistudio.google.com/apikey\n");

    let api_key: String = Input::new()
        .with_prompt("Enter your Gemini API key")
        .interact_text()?;

    if api_key.trim().is_empty() {
        anyhow::bail!("API key is required");
    }

    let model: String = Input::new()
        .with_prompt("Model")
        .default(config.model.clone())
        .interact_text()?;

    config.gemini_api_key = Some(api_key.trim().to_string());
    config.model = model.trim().to_string();

    // Offer to save
    if Confirm::new()
        .with_prompt("Save API key and model to config file?")
        .default(true)
        .interact()?
    {
        let path = config.save()?;
        println!(
            "{} Settings saved to {}\n",
            style("✓").green(),
            path.display()
        );
    }

    Ok(config)
}

fn select_source_file() -> anyhow::Result<PathBuf> {
    println!("\n{}", style("Select subtitle file:").bold());

    let files = scan_subtitle_files(Path::new("."))?;

    if files.is_empty() {
        println!("  No .srt files found in current directory.\n");
        return prompt_for_path();
    }

    let mut items: Vec<String> = files
        .iter()
        .map(|f| {
            let size = fs::metadata(f)
                .map(|m| format_size(m.len()))
                .unwrap_or_else(|_| "?".to_string());
            format!("{} ({})", f.display(), size)
        })
        .collect();
    items.push("Enter custom path...".to_string());

    let selection = Select::new()
        .with_prompt("Choose a file")
        .items(&items)
        .default(0)
        .interact()?;

    if selection == files.len() {
        prompt_for_path()
    } else {
        Ok(files[selection].clone())
    }
}

fn prompt_for_path() -> anyhow::Result<PathBuf> {
    let path: String = Input::new()
        .with_prompt("Enter file path")
        .interact_text()?;
    let path = PathBuf::from(path.trim());
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    Ok(path)
}

/// Subtitle files in `dir`, skipping earlier outputs like `movie.ko.srt`.
fn scan_subtitle_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }

        let is_subtitle = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| SUPPORTED_EXTENSIONS.contains(&ext.to_lowercase().as_str()));
        if is_subtitle && !is_translated_output(&path) {
            files.push(path);
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn is_translated_output(path: &Path) -> bool {
    path.file_stem()
        .and_then(|s| Path::new(s).extension())
        .and_then(|tag| tag.to_str())
        .is_some_and(|tag| tag == "translated" || LANGUAGES.iter().any(|(code, _)| *code == tag))
}

fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

fn select_language(prompt: &str, default_code: &str) -> anyhow::Result<String> {
    let mut options: Vec<String> = LANGUAGES
        .iter()
        .map(|(code, name)| format!("{} ({})", name, code))
        .collect();
    options.push("Other (enter code)...".to_string());

    let default = LANGUAGES
        .iter()
        .position(|(code, _)| *code == default_code)
        .unwrap_or(0);

    let selection = Select::new()
        .with_prompt(prompt)
        .items(&options)
        .default(default)
        .interact()?;

    if selection == LANGUAGES.len() {
        let code: String = Input::new()
            .with_prompt("Enter language code or name (e.g., 'vi' or 'Vietnamese')")
            .interact_text()?;
        let code = code.trim().to_string();
        if code.is_empty() {
            anyhow::bail!("Language must not be empty");
        }
        Ok(code)
    } else {
        Ok(LANGUAGES[selection].0.to_string())
    }
}

fn print_summary(input: &Path, output: &Path, source: &str, target: &str, model: &str) {
    println!("\n{}", style("═══ Summary ═══").bold());
    println!("  Input:     {}", style(input.display()).cyan());
    println!("  Output:    {}", style(output.display()).cyan());
    println!(
        "  Translate: {} → {}",
        get_language_name(source),
        get_language_name(target)
    );
    println!("  Model:     {}", model);
    println!();
}

fn get_language_name(code: &str) -> String {
    LANGUAGES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(c, n)| format!("{} ({})", n, c))
        .unwrap_or_else(|| code.to_string())
}
