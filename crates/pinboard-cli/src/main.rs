use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use pinboard_core::config_file::{self, ConfigFile};
use pinboard_core::{
    ExtractRequest, ExtractionWorker, JsonFileStore, SettingsStore, WorkerMessage, add_category,
    add_model_to_tree, move_model_to_category, move_top_level, remove_model_from_tree,
    rename_category, retain_known, toggle_pin, update_pinned,
};
use pinboard_pdf_mupdf::MupdfBackend;

mod logging;
mod output;

use output::ColorMode;

/// Pinboard - manage pinned model trees and extract text from PDFs
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the UI settings JSON file
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log at debug level regardless of the configured level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the text of a PDF, page by page
    Extract {
        /// Path to the PDF file
        pdf_path: PathBuf,

        /// Write the extracted text here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print every worker message as a JSON line
        #[arg(long)]
        json: bool,
    },

    /// Inspect or edit the pinned model tree
    Pins {
        #[command(subcommand)]
        action: PinsCommand,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Subcommand, Debug)]
enum PinsCommand {
    /// Show the pinned tree
    List {
        /// Print the flattened model ids only
        #[arg(long)]
        ids: bool,

        /// Comma-separated list of model ids the registry knows; others are hidden
        #[arg(long, value_delimiter = ',')]
        known: Vec<String>,
    },

    /// Pin a model at the end of the top level
    Add { model_id: String },

    /// Unpin a model everywhere it appears
    Remove { model_id: String },

    /// Pin if unpinned, unpin if pinned
    Toggle { model_id: String },

    /// Move the top-level entry at FROM to position TO (0-based)
    Move { from: usize, to: usize },

    /// File a model under a top-level category, creating it if needed
    File { model_id: String, category: String },

    /// Manage categories
    Category {
        #[command(subcommand)]
        action: CategoryCommand,
    },

    /// Drop pinned models the registry no longer knows
    Prune {
        /// Comma-separated list of model ids to keep
        #[arg(long, value_delimiter = ',', required = true)]
        known: Vec<String>,
    },
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    /// Append an empty category to the top level
    Add { name: String },

    /// Rename every category called OLD
    Rename { old: String, new: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = config_file::load_config();

    let level = if cli.verbose {
        "debug"
    } else {
        config.log_level()
    };
    let _log_guard = logging::init(level, config.log_dir().as_deref());
    let color = ColorMode(!cli.no_color);

    match cli.command {
        Command::Extract {
            pdf_path,
            output,
            json,
        } => extract(&pdf_path, output.as_deref(), json, &config, color).await,
        Command::Pins { action } => {
            let path = resolve_settings_path(cli.settings, &config)?;
            tracing::debug!(path = %path.display(), "using settings file");
            pins(action, &JsonFileStore::new(path), color)
        }
        Command::Config => show_config(&config, cli.settings),
    }
}

/// Settings path: CLI flag > `PINBOARD_SETTINGS` > config file > platform default.
fn resolve_settings_path(flag: Option<PathBuf>, config: &ConfigFile) -> anyhow::Result<PathBuf> {
    flag.or_else(|| std::env::var("PINBOARD_SETTINGS").ok().map(PathBuf::from))
        .or_else(|| config.settings_path())
        .ok_or_else(|| {
            anyhow::anyhow!("Could not determine a settings file. Pass --settings <path>.")
        })
}

async fn extract(
    pdf_path: &Path,
    output: Option<&Path>,
    json: bool,
    config: &ConfigFile,
    color: ColorMode,
) -> anyhow::Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};

    if !pdf_path.exists() {
        anyhow::bail!("File not found: {}", pdf_path.display());
    }
    let bytes = std::fs::read(pdf_path)?;

    let file_name = pdf_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| pdf_path.display().to_string());

    let backend = MupdfBackend::new()
        .with_header_exclusion(config.header_exclusion())
        .with_footer_exclusion(config.footer_exclusion());
    let worker = ExtractionWorker::spawn(Arc::new(backend));
    let mut rx = worker.submit(ExtractRequest { bytes });

    let bar = if json {
        ProgressBar::hidden()
    } else {
        let bar = ProgressBar::new(0);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} {msg} [{bar:40.green/dim}] page {pos}/{len}",
            )?
            .progress_chars("=> "),
        );
        bar.set_message(file_name.clone());
        bar
    };

    let mut stdout = std::io::stdout();
    let mut pages = 0;
    let mut outcome: Result<String, String> =
        Err("extraction worker exited without a result".to_string());

    while let Some(message) = rx.recv().await {
        if json {
            writeln!(stdout, "{}", serde_json::to_string(&message)?)?;
        }
        match message {
            WorkerMessage::Progress { page, total } => {
                bar.set_length(total as u64);
                bar.set_position(page as u64);
                pages = total;
            }
            WorkerMessage::Done { text } => {
                outcome = Ok(text);
                break;
            }
            WorkerMessage::Error { error } => {
                outcome = Err(error);
                break;
            }
        }
    }
    bar.finish_and_clear();
    worker.shutdown().await;

    let text = outcome.map_err(|e| anyhow::anyhow!("Extraction failed: {}", e))?;

    if let Some(path) = output {
        std::fs::write(path, &text)?;
    } else if !json {
        stdout.write_all(text.as_bytes())?;
    }

    if !json {
        output::print_extraction_summary(&mut std::io::stderr(), &file_name, pages, &text, color)?;
    }
    Ok(())
}

fn pins(action: PinsCommand, store: &JsonFileStore, color: ColorMode) -> anyhow::Result<()> {
    let mut stdout = std::io::stdout();

    let tree = match action {
        PinsCommand::List { ids, known } => {
            let pinned = store.load()?.pinned_models;
            let tree = if known.is_empty() {
                pinned
            } else {
                retain_known(&pinned, |id| known.iter().any(|k| k == id))
            };
            if ids {
                output::print_ids(&mut stdout, &tree)?;
            } else {
                output::print_tree(&mut stdout, &tree, color)?;
            }
            return Ok(());
        }
        PinsCommand::Add { model_id } => update_pinned(store, |t| add_model_to_tree(t, &model_id))?,
        PinsCommand::Remove { model_id } => {
            update_pinned(store, |t| remove_model_from_tree(t, &model_id))?
        }
        PinsCommand::Toggle { model_id } => update_pinned(store, |t| toggle_pin(t, &model_id))?,
        PinsCommand::Move { from, to } => update_pinned(store, |t| move_top_level(t, from, to))?,
        PinsCommand::File { model_id, category } => {
            update_pinned(store, |t| move_model_to_category(t, &model_id, &category))?
        }
        PinsCommand::Category {
            action: CategoryCommand::Add { name },
        } => update_pinned(store, |t| add_category(t, &name))?,
        PinsCommand::Category {
            action: CategoryCommand::Rename { old, new },
        } => update_pinned(store, |t| rename_category(t, &old, &new))?,
        PinsCommand::Prune { known } => update_pinned(store, |t| {
            retain_known(t, |id| known.iter().any(|k| k == id))
        })?,
    };

    output::print_tree(&mut stdout, &tree, color)?;
    Ok(())
}

fn show_config(config: &ConfigFile, settings_flag: Option<PathBuf>) -> anyhow::Result<()> {
    print!("{}", toml::to_string_pretty(config)?);
    match resolve_settings_path(settings_flag, config) {
        Ok(path) => println!("# settings file: {}", path.display()),
        Err(e) => println!("# settings file: unavailable ({})", e),
    }
    if let Some(path) = config_file::config_path() {
        println!("# platform config: {}", path.display());
    }
    Ok(())
}
