use chrono::{Datelike, Local};
use clap::{CommandFactory, Parser, Subcommand};
use inquire::{Select, Text};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitCode};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use proposal_builder::error::{AppError, Result};
use proposal_builder::model::Proposal;
use proposal_builder::normalize::Normalizer;
use proposal_builder::render::Renderer;
use proposal_builder::report::{ProposalListing, list_table, scope_table, summary_table};
use proposal_builder::settings::{self, AppSettings};
use proposal_builder::store::{ProposalStore, file_name};
use proposal_builder::totals::compute_proposal_totals;
use proposal_builder::wizard;

// ==========================================
// Constants
// ==========================================
const OUTPUT_ROOT_OPT: &str = "📂 Open Root Output Directory";
const PROPOSALS_OPT: &str = "🗂  Open Proposals Directory";

// ==========================================
// CLI
// ==========================================

#[derive(Parser)]
#[command(name = "proposal-builder", about = "Build and price glazing proposals")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new proposal
    New,
    /// Add a scope to a stored proposal
    AddScope,
    /// Show totals for a proposal
    Totals {
        /// Proposal JSON file (prompts from the store when omitted)
        file: Option<PathBuf>,
    },
    /// Render the printable preview (and PDF when typst is installed)
    Preview {
        /// Proposal JSON file (prompts from the store when omitted)
        file: Option<PathBuf>,
    },
    /// Normalize an outside proposal file into the store
    Import {
        path: PathBuf,
    },
    /// List stored proposals
    List,
    /// Configure data directory
    Config,
    /// Open output folder
    Open,
}

// ==========================================
// Main Function
// ==========================================

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        Cli::command().print_help().ok();
        return ExitCode::SUCCESS;
    };

    match run(command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.is_cancelled() => {
            println!("Cancelled");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("❌ Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<()> {
    let config_path = settings::config_path();

    // A broken settings file must not block fixing it.
    if let Commands::Config = command {
        setup_config_wizard(&config_path)?;
        return Ok(());
    }

    let settings = match settings::load_settings(&config_path)? {
        Some(settings) => settings,
        None => setup_config_wizard(&config_path)?,
    };
    let root = settings.root();
    let defaults = settings::load_defaults(&root)?;
    let mut normalizer = Normalizer::new().with_defaults(defaults);
    let store = ProposalStore::new(&root);

    match command {
        Commands::New => {
            let mut proposal = wizard::proposal_wizard(&mut normalizer)?;
            let path = store.save(&mut proposal, &normalizer)?;
            println!("✅ Proposal saved: {}", path.display());
            print_totals(&proposal);
        }
        Commands::AddScope => {
            let path = select_proposal(&store)?;
            let mut proposal = store.load(&path, &mut normalizer)?;
            let scope = wizard::scope_wizard(&mut normalizer)?;
            proposal.scopes.push(scope);
            let saved = store.save(&mut proposal, &normalizer)?;
            println!("✅ Scope added: {}", saved.display());
            print_totals(&proposal);
        }
        Commands::Totals { file } => {
            let proposal = load_or_select(&store, file, &mut normalizer)?;
            print_totals(&proposal);
        }
        Commands::Preview { file } => {
            let proposal = load_or_select(&store, file, &mut normalizer)?;
            generate_preview(&root, &proposal)?;
        }
        Commands::Import { path } => {
            let (proposal, saved) = store.import(&path, &mut normalizer)?;
            println!("✅ Imported {} as {}", path.display(), saved.display());
            print_totals(&proposal);
        }
        Commands::List => list_proposals(&store, &mut normalizer)?,
        Commands::Open => open_folder_wizard(&root, &store)?,
        // handled before settings are loaded
        Commands::Config => {}
    }
    Ok(())
}

// ==========================================
// 1. Proposal Selection
// ==========================================

fn relative_name(store: &ProposalStore, path: &Path) -> String {
    path.strip_prefix(store.dir())
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}

fn select_proposal(store: &ProposalStore) -> Result<PathBuf> {
    let files = store.list()?;
    if files.is_empty() {
        return Err(AppError::NoProposals(store.dir().to_path_buf()));
    }

    let options: Vec<String> = files.iter().map(|p| relative_name(store, p)).collect();
    let choice = Select::new("Select Proposal (Type to Filter):", options)
        .with_page_size(10)
        .prompt()?;
    Ok(store.dir().join(choice))
}

fn load_or_select(
    store: &ProposalStore,
    file: Option<PathBuf>,
    normalizer: &mut Normalizer,
) -> Result<Proposal> {
    let path = match file {
        Some(path) => path,
        None => select_proposal(store)?,
    };
    store.load(&path, normalizer)
}

// ==========================================
// 2. Totals & Listing
// ==========================================

fn print_totals(proposal: &Proposal) {
    let totals = compute_proposal_totals(proposal);
    if !proposal.scopes.is_empty() {
        println!("\n--- Scopes ---");
        println!("{}", scope_table(proposal, &totals));
    }
    println!("\n--- Commercial Summary ---");
    println!("{}", summary_table(proposal, &totals));
}

fn list_proposals(store: &ProposalStore, normalizer: &mut Normalizer) -> Result<()> {
    println!("--- Proposals in {} ---", store.dir().display());
    let files = store.list()?;
    if files.is_empty() {
        println!("(None found)");
        return Ok(());
    }

    let mut rows = Vec::with_capacity(files.len());
    for path in &files {
        match store.load(path, normalizer) {
            Ok(proposal) => {
                let totals = compute_proposal_totals(&proposal);
                rows.push(ProposalListing::new(relative_name(store, path), &proposal, &totals));
            }
            Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable proposal"),
        }
    }
    println!("{}", list_table(&rows));
    Ok(())
}

// ==========================================
// 3. Preview Generation
// ==========================================

fn generate_preview(root: &Path, proposal: &Proposal) -> Result<()> {
    let renderer = Renderer::from_dir(&root.join("templates"))?;
    let today = Local::now().date_naive();
    let rendered = renderer.render(proposal, &today.format("%m/%d/%Y").to_string())?;

    let output_dir = root.join("output").join(today.year().to_string());
    fs::create_dir_all(&output_dir).map_err(AppError::io(&output_dir))?;

    let typ_path = output_dir.join(file_name(proposal)).with_extension("typ");
    let pdf_path = typ_path.with_extension("pdf");
    fs::write(&typ_path, rendered).map_err(AppError::io(&typ_path))?;
    info!(path = %typ_path.display(), "preview written");
    println!("📝 Preview written: {}", typ_path.display());

    if Command::new("typst").arg("--version").output().is_err() {
        warn!("typst not found on PATH, skipping compile");
        println!("⚠️  'typst' is not installed; skipping PDF (brew install typst).");
        open_and_reveal(&typ_path);
        return Ok(());
    }

    println!("\n🔨 Compiling PDF...");
    let status = Command::new("typst")
        .arg("compile")
        .arg(&typ_path)
        .arg(&pdf_path)
        .status()
        .map_err(AppError::io(&typ_path))?;
    if !status.success() {
        return Err(AppError::Compile(typ_path));
    }
    info!(path = %pdf_path.display(), "pdf compiled");
    println!("✅ PDF Generated: {}", pdf_path.display());
    open_and_reveal(&pdf_path);
    Ok(())
}

// ==========================================
// 4. Open Folder Logic
// ==========================================

fn open_folder_wizard(root: &Path, store: &ProposalStore) -> Result<()> {
    let output_root = root.join("output");

    let mut years: Vec<String> = match fs::read_dir(&output_root) {
        Ok(entries) => entries
            .flatten()
            .filter(|e| e.path().is_dir())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect(),
        Err(_) => Vec::new(),
    };
    years.sort();
    years.reverse();

    let mut options = vec![OUTPUT_ROOT_OPT.to_string(), PROPOSALS_OPT.to_string()];
    options.extend(years);

    let choice = Select::new("Select Folder to Open:", options).prompt()?;
    let target = match choice.as_str() {
        OUTPUT_ROOT_OPT => output_root,
        PROPOSALS_OPT => store.dir().to_path_buf(),
        year => output_root.join(year),
    };
    println!("🚀 Opening: {}", target.display());
    open_path(&target);
    Ok(())
}

// ==========================================
// 5. Config & Utilities
// ==========================================

fn setup_config_wizard(path: &Path) -> Result<AppSettings> {
    println!("\n⚙️  --- Configuration Setup ---");
    let current = match settings::load_settings(path) {
        Ok(Some(settings)) => settings,
        Ok(None) => AppSettings::default(),
        Err(e) => {
            warn!(error = %e, "ignoring unreadable settings");
            AppSettings::default()
        }
    };

    let data_root = Text::new("Enter Root Data Directory:")
        .with_default(&current.data_root)
        .prompt()?;
    let settings = AppSettings {
        data_root: data_root.trim().to_string(),
    };
    settings::save_settings(path, &settings)?;
    println!("✅ Settings saved.");
    Ok(settings)
}

fn open_path(path: &Path) {
    #[cfg(target_os = "macos")]
    Command::new("open").arg(path).spawn().ok();

    #[cfg(target_os = "windows")]
    Command::new("explorer").arg(path).spawn().ok();

    #[cfg(target_os = "linux")]
    Command::new("xdg-open").arg(path).spawn().ok();
}

// Helper: Open file and reveal in Finder/Explorer
fn open_and_reveal(path: &Path) {
    #[cfg(target_os = "macos")]
    Command::new("open").arg("-R").arg(path).spawn().ok();

    #[cfg(target_os = "windows")]
    Command::new("explorer")
        .arg(format!("/select,{}", path.to_string_lossy()))
        .spawn()
        .ok();

    #[cfg(target_os = "linux")]
    Command::new("xdg-open")
        .arg(path.parent().unwrap_or(path))
        .spawn()
        .ok();

    open_path(path);
}
