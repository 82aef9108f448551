//! Command-line interface for document extraction.
//!
//! Opens one extraction session for a document, launches a job per requested
//! tool, and prints every job's result once all of them have settled.

mod display;

use clap::{Parser, Subcommand};
use extraction::{Document, ExtractionSession, HttpBackend, JobId, JobStatus, Settings, Tool, UiState};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Parser)]
#[command(name = "orioris")]
#[command(version, about = "Run document extractions from the command line", long_about = None)]
struct Cli {
    /// Settings file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one extraction per tool against a document
    Extract {
        /// Document to extract
        document: PathBuf,

        /// Extraction tool: spacy, plumber, docling (repeatable)
        #[arg(short, long = "tool")]
        tools: Vec<Tool>,

        /// Return the backend's unprocessed output
        #[arg(long)]
        no_process_output: bool,

        /// Skip table extraction
        #[arg(long)]
        no_tables: bool,

        /// Skip text extraction
        #[arg(long)]
        no_text: bool,

        /// Extraction API base URL
        #[arg(long)]
        api_url: Option<String>,

        /// Print job infos as JSON
        #[arg(long)]
        json: bool,

        /// Print raw payloads instead of formatted results
        #[arg(long)]
        raw: bool,
    },

    /// Show the effective settings
    Config {
        /// Write the effective settings to the settings file
        #[arg(long)]
        init: bool,
    },
}

struct ExtractArgs {
    document: PathBuf,
    tools: Vec<Tool>,
    no_process_output: bool,
    no_tables: bool,
    no_text: bool,
    api_url: Option<String>,
    json: bool,
    raw: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Extract {
            document,
            tools,
            no_process_output,
            no_tables,
            no_text,
            api_url,
            json,
            raw,
        } => {
            let args = ExtractArgs {
                document,
                tools,
                no_process_output,
                no_tables,
                no_text,
                api_url,
                json,
                raw,
            };
            handle_extract(cli.config, args).await
        }
        Commands::Config { init } => handle_config(cli.config, init).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn load_settings(
    path: Option<PathBuf>,
) -> Result<(Settings, PathBuf), Box<dyn std::error::Error>> {
    let path = match path {
        Some(path) => path,
        None => Settings::default_path()?,
    };
    let settings = Settings::load(&path).await?;
    Ok((settings, path))
}

async fn handle_extract(
    config_path: Option<PathBuf>,
    args: ExtractArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let (settings, _) = load_settings(config_path).await?;

    let document = Document::open(&args.document).await?;
    let api_url = args.api_url.unwrap_or_else(|| settings.api_url.clone());
    let backend = Arc::new(HttpBackend::new(api_url));
    let session = ExtractionSession::with_capacity(document, backend, settings.max_extractions);

    let mut ui = UiState::new(settings.defaults);
    ui.set_show_raw(args.raw);
    if args.no_process_output {
        ui.form.set_process_output(false);
    }
    if args.no_tables {
        ui.form.set_extract_tables(false);
    }
    if args.no_text {
        ui.form.set_extract_text(false);
    }

    let tools = if args.tools.is_empty() {
        vec![ui.form.tool()]
    } else {
        args.tools
    };

    for tool in tools {
        if !session.can_submit() {
            let reason = ui.submit_label(&session.snapshot(), session.capacity());
            warn!(%tool, "{reason}, skipping");
            continue;
        }
        ui.form.set_tool(tool);
        ui.submit(&session);
    }

    let (interrupt_tx, interrupt_rx) = mpsc::unbounded_channel();
    ctrlc::set_handler(move || {
        let _ = interrupt_tx.send(());
    })?;

    wait_with_progress(&session, interrupt_rx).await?;

    let snapshot = session.snapshot();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot.infos())?);
    } else {
        let document = session.document();
        println!(
            "Document: {} ({}, {})\n",
            document.name(),
            document.display_size(),
            document.mime_type()
        );
        if snapshot.is_empty() {
            println!("No extractions completed.");
        }
        for job in snapshot.jobs() {
            println!("== {} ==", job.label());
            print!("{}", display::render_info(&job.info()));
            println!();
            print!("{}", display::render_job(job, ui.show_raw()));
            println!();
        }
    }

    let failed = snapshot
        .jobs()
        .iter()
        .filter(|job| job.status() == JobStatus::Error)
        .count();
    if failed > 0 {
        return Err(format!("{failed} extraction(s) failed").into());
    }
    Ok(())
}

/// Show a spinner per job until none is pending. Ctrl-C deletes every
/// pending job, which cancels its request.
async fn wait_with_progress(
    session: &ExtractionSession,
    mut interrupts: mpsc::UnboundedReceiver<()>,
) -> Result<(), Box<dyn std::error::Error>> {
    let progress = MultiProgress::new();
    let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold} {msg}")?;

    let mut bars: HashMap<JobId, ProgressBar> = HashMap::new();
    for job in session.snapshot().jobs() {
        let bar = progress.add(ProgressBar::new_spinner());
        bar.set_style(style.clone());
        bar.set_prefix(job.label());
        bar.set_message("Extracting...");
        bar.enable_steady_tick(Duration::from_millis(100));
        bars.insert(job.id(), bar);
    }

    let mut updates = session.subscribe();
    loop {
        let snapshot = updates.borrow_and_update().clone();
        for (id, bar) in &bars {
            if bar.is_finished() {
                continue;
            }
            match snapshot.get(*id) {
                Some(job) if !job.is_pending() => {
                    bar.set_prefix(job.label());
                    bar.finish_with_message(job.status().to_string());
                }
                Some(_) => {}
                None => bar.abandon_with_message("Cancelled"),
            }
        }

        if !snapshot.has_pending() {
            return Ok(());
        }

        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    return Ok(());
                }
            }
            Some(()) = interrupts.recv() => {
                warn!("Interrupted, cancelling pending extractions");
                for job in snapshot.jobs().iter().filter(|job| job.is_pending()) {
                    session.delete(job.id());
                }
            }
        }
    }
}

async fn handle_config(
    config_path: Option<PathBuf>,
    init: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let (settings, path) = load_settings(config_path).await?;

    if init {
        settings.save(&path).await?;
        println!("Wrote {}", path.display());
    }
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}
