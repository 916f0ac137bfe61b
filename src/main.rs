use std::path::{Path, PathBuf};

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use colored::*;
use tracing::info;

mod app;
mod handler;
mod tui;
mod ui;

use quotation_client::{
    logging, Config, DocumentFile, DocumentKind, FileSelection, ProgressStep, QuotationClient,
    ResponseMode,
};

use app::App;

#[derive(Parser)]
#[command(name = "quotation")]
#[command(about = "Upload a proposal form and financial statement to get an insurance quotation")]
struct Cli {
    /// Backend base URL (overrides config and QUOTATION_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Response handling: buffered or streaming
    #[arg(long, global = true, value_parser = parse_mode)]
    mode: Option<ResponseMode>,
    /// Request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive upload form (default)
    Tui,
    /// Upload two documents and print the quotation
    Submit {
        /// Proposal form (.pdf, .docx, .doc)
        #[arg(short, long)]
        proposal: PathBuf,
        /// Financial statement (.csv, .xlsx, .xls, .pdf)
        #[arg(short, long)]
        financial: PathBuf,
    },
    /// Show the effective configuration
    Config {
        /// Persist the effective configuration to the config file
        #[arg(long)]
        save: bool,
    },
}

fn parse_mode(s: &str) -> Result<ResponseMode, String> {
    ResponseMode::from_str(s)
        .ok_or_else(|| format!("unknown mode '{}' (expected buffered or streaming)", s))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, load_error) = Config::load();
    if let Some(e) = &load_error {
        eprintln!("{}: {:#}; using defaults", "Warning".yellow().bold(), e);
    }
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    if let Some(timeout) = cli.timeout {
        config.timeout_secs = timeout;
    }

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => run_tui(&config).await,
        Commands::Submit { proposal, financial } => {
            logging::init_stderr();
            submit_once(&config, &proposal, &financial).await
        }
        Commands::Config { save } => show_config(&config, save),
    }
}

async fn run_tui(config: &Config) -> Result<()> {
    logging::init_file(&config.log_path()?)?;
    info!(base_url = %config.base_url, mode = config.mode.as_str(), "starting tui");

    let client = QuotationClient::new(&config.base_url, config.mode, config.timeout());
    let mut app = App::new(client);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = tui::EventHandler::new();
    let tx = events.sender();

    let result = async {
        while !app.should_quit {
            terminal.draw(|frame| ui::render(&mut app, frame))?;
            match events.next().await {
                Some(event) => handler::handle_event(&mut app, event, &tx).await?,
                None => break,
            }
        }
        Ok::<(), anyhow::Error>(())
    }
    .await;

    if let Some(task) = app.request_task.take() {
        task.abort();
    }
    tui::restore()?;
    result
}

async fn submit_once(config: &Config, proposal: &Path, financial: &Path) -> Result<()> {
    let files = FileSelection {
        proposal: Some(DocumentFile::load(DocumentKind::Proposal, proposal).await?),
        financial: Some(DocumentFile::load(DocumentKind::Financial, financial).await?),
    };

    let client = QuotationClient::new(&config.base_url, config.mode, config.timeout());
    println!("📤 Uploading to {} ({})\n", client.upload_url().cyan(), config.mode.as_str());

    let print_steps = |steps: Vec<ProgressStep>| {
        for step in steps {
            println!(
                "  • {}: {}% - {}",
                step.name.bold(),
                step.progress.to_string().yellow(),
                step.description.dimmed()
            );
        }
    };

    match client.submit(&files, print_steps).await {
        Ok(result) => {
            println!("\n{}", "Quotation Result".bold().green());
            println!("{}", "=".repeat(30).dimmed());
            println!("Premium:        {}", result.premium_display().bold());
            println!("Risk Score:     {}", result.risk_display().bold());
            println!("Recommendation: {}", result.recommendation.bold().cyan());
            Ok(())
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            Err(anyhow!("quotation request failed"))
        }
    }
}

fn show_config(config: &Config, save: bool) -> Result<()> {
    println!("\n{}", "⚙️  Quotation Client Configuration".bold().blue());
    println!("{}", "=".repeat(40).dimmed());
    println!("  base_url:     {}", config.base_url.green());
    println!("  mode:         {}", config.mode.as_str().green());
    println!("  timeout_secs: {}", config.timeout_secs.to_string().green());
    println!("  log_file:     {}", config.log_path()?.display().to_string().dimmed());

    if save {
        let path = config.save()?;
        println!("\nSaved to {}", path.display().to_string().bold());
    } else {
        let path = Config::get_config_path()?;
        println!("\nConfig file: {}", path.display().to_string().dimmed());
    }

    Ok(())
}
