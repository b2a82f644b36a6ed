//! Memos CLI - tiered memo storage from the terminal
//!
//! The `memos` command drives the same storage engine a side panel would:
//! memos go to the synced tier while it has room and overflow to the local
//! tier otherwise.
//!
//! ## Commands
//!
//! - `init`: Run the cold-start sequence and seed default settings
//! - `add`: Capture text, a URL or a fenced code block
//! - `list`: Show the merged memo view, newest first
//! - `import` / `export`: Move memos in and out as JSON

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};

use memo_core::{
    parse_input, validate_memo_data, AppContext, HttpMetadataFetcher, ImportStrategy, Memo,
    MetadataFetcher, OfflineFetcher, StorageEngine, Theme, TierLimits, METRICS,
};
use memo_state::fakes::MemoryKvArea;
use memo_state::{StoreConfig, StoreHandle};

#[derive(Parser)]
#[command(name = "memos")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tiered memo storage", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Storage directory (default: MEMOS_DB_URL / MEMOS_DATA_DIR, then .memos/db)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Evict an oversized synced tier, rebuild the search index, seed settings
    Init,

    /// Capture a memo; input is classified as text, url or code
    Add {
        /// Memo body
        text: String,

        /// Store in the local tier even if it would fit the synced tier
        #[arg(long)]
        local: bool,

        /// Do not fetch page metadata for URLs
        #[arg(long)]
        offline: bool,
    },

    /// List memos, newest first
    List {
        /// Only memos whose title or content contains this (any case)
        #[arg(short, long)]
        query: Option<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Replace the body (and optionally the title) of a memo
    Edit {
        id: String,
        text: String,

        #[arg(short, long)]
        title: Option<String>,
    },

    /// Delete a memo
    Rm { id: String },

    /// Search the index for a keyword
    Search { keyword: String },

    /// Find the url memo saved for a page
    FindUrl { url: String },

    /// Import memos from a JSON export
    Import {
        file: PathBuf,

        /// What to do with ids that already exist: skip, overwrite or duplicate
        #[arg(short, long, default_value = "skip")]
        strategy: ImportStrategy,
    },

    /// Export every memo as JSON
    Export {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show synced tier usage
    Usage,

    /// Show or change user settings
    Settings {
        #[arg(long)]
        theme: Option<Theme>,

        #[arg(long)]
        shortcut: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    memo_core::init_tracing(cli.json, level);

    let engine = open_engine(cli.data_dir.as_deref())
        .await
        .context("Failed to open memo storage")?;

    let result = match cli.command {
        Commands::Init => cmd_init(&engine).await,
        Commands::Add {
            text,
            local,
            offline,
        } => {
            let fetcher: Arc<dyn MetadataFetcher> = if offline {
                Arc::new(OfflineFetcher)
            } else {
                Arc::new(HttpMetadataFetcher::new(Duration::from_secs(5))?)
            };
            cmd_add(&engine, fetcher.as_ref(), &text, local).await
        }
        Commands::List { query, format } => {
            cmd_list(&engine, query.as_deref(), format).await
        }
        Commands::Edit { id, text, title } => {
            cmd_edit(&engine, &id, &text, title.as_deref()).await
        }
        Commands::Rm { id } => cmd_rm(&engine, &id).await,
        Commands::Search { keyword } => cmd_search(&engine, &keyword).await,
        Commands::FindUrl { url } => cmd_find_url(&engine, &url).await,
        Commands::Import { file, strategy } => cmd_import(&engine, &file, strategy).await,
        Commands::Export { output } => cmd_export(&engine, output.as_deref()).await,
        Commands::Usage => cmd_usage(&engine).await,
        Commands::Settings { theme, shortcut } => {
            cmd_settings(&engine, theme, shortcut.as_deref()).await
        }
    };

    METRICS.flush();
    result
}

/// Connect the tier backends. The session area lives only as long as the process.
async fn open_engine(data_dir: Option<&Path>) -> Result<StorageEngine> {
    let config = match data_dir {
        Some(dir) => StoreConfig::local(dir),
        None => StoreConfig::from_env(),
    };
    let store = StoreHandle::connect(&config).await?;
    let limits = TierLimits::from_env()?;
    let session = Arc::new(MemoryKvArea::session());
    Ok(StorageEngine::from_store(&store, session).with_limits(limits))
}

async fn find_memo(engine: &StorageEngine, id: &str) -> Result<Memo> {
    engine
        .get_all_memos()
        .await?
        .into_iter()
        .find(|m| m.id == id)
        .with_context(|| format!("Memo not found: {}", id))
}

fn print_memo(memo: &Memo) {
    let tier = if memo.local_only { "local" } else { "sync" };
    println!("{}  [{}] [{}] {}", memo.id, memo.kind, tier, memo.title);
}

async fn cmd_init(engine: &StorageEngine) -> Result<()> {
    let seeded = engine.install_defaults().await?;
    let memos = engine.init_storage().await?;
    info!(count = memos.len(), seeded, "storage initialized");

    if seeded {
        println!("Installed default settings");
    }
    println!("Loaded {} memos", memos.len());
    Ok(())
}

async fn cmd_add(
    engine: &StorageEngine,
    fetcher: &dyn MetadataFetcher,
    text: &str,
    local: bool,
) -> Result<()> {
    if text.trim().is_empty() {
        bail!("Nothing to save: input is blank");
    }
    let parsed = parse_input(text, fetcher).await;
    let mut new = parsed.into_new_memo(chrono::Utc::now().timestamp_millis());
    new.local_only = local;

    let memo = engine.save_memo(new).await?;
    println!("Saved memo {} to the {} tier", memo.id, memo.tier());
    Ok(())
}

async fn cmd_list(
    engine: &StorageEngine,
    query: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let mut ctx = AppContext::new(engine.clone(), Arc::new(OfflineFetcher));
    ctx.load().await?;
    if let Some(q) = query {
        ctx.set_query(q);
    }
    let memos = ctx.filtered_memos();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&memos)?),
        OutputFormat::Text if memos.is_empty() => println!("No memos"),
        OutputFormat::Text => memos.iter().for_each(|m| print_memo(m)),
    }
    Ok(())
}

async fn cmd_edit(
    engine: &StorageEngine,
    id: &str,
    text: &str,
    title: Option<&str>,
) -> Result<()> {
    let mut memo = find_memo(engine, id).await?;
    memo.content = text.to_string();
    if let Some(title) = title {
        memo.title = title.to_string();
    }
    let updated = engine.update_memo(&memo).await?;
    println!("Updated memo {} ({} tier)", updated.id, updated.tier());
    Ok(())
}

async fn cmd_rm(engine: &StorageEngine, id: &str) -> Result<()> {
    let memo = find_memo(engine, id).await?;
    engine.delete_memo(&memo).await?;
    println!("Deleted memo {}", id);
    Ok(())
}

async fn cmd_search(engine: &StorageEngine, keyword: &str) -> Result<()> {
    let hits = engine
        .search_memos(keyword)
        .await
        .context("Search index unavailable")?;
    if hits.is_empty() {
        println!("No memos match '{}'", keyword);
    }
    hits.iter().for_each(print_memo);
    Ok(())
}

async fn cmd_find_url(engine: &StorageEngine, url: &str) -> Result<()> {
    match engine.find_memo_by_url(url).await? {
        Some(memo) => print_memo(&memo),
        None => println!("No memo saved for {}", url),
    }
    Ok(())
}

async fn cmd_import(
    engine: &StorageEngine,
    file: &Path,
    strategy: ImportStrategy,
) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .context(format!("Failed to read import file: {:?}", file))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).context("Import file is not valid JSON")?;
    if !validate_memo_data(&value) {
        bail!("Import file is not a list of memos");
    }
    let memos: Vec<Memo> = serde_json::from_value(value)?;

    let summary = engine.import_memos(memos, strategy).await?;
    println!(
        "Imported {}, skipped {}, errors {}",
        summary.imported, summary.skipped, summary.errors
    );
    Ok(())
}

async fn cmd_export(engine: &StorageEngine, output: Option<&Path>) -> Result<()> {
    let memos = engine.export_memos().await?;
    let json = serde_json::to_string_pretty(&memos)?;
    match output {
        Some(path) => {
            std::fs::write(path, json).context(format!("Failed to write {:?}", path))?;
            println!("Exported {} memos to {:?}", memos.len(), path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

async fn cmd_usage(engine: &StorageEngine) -> Result<()> {
    let usage = engine.sync_usage().await?;
    println!(
        "Synced tier: {} / {} bytes ({:.1}%)",
        usage.bytes_in_use,
        usage.quota,
        usage.percentage * 100.0
    );
    Ok(())
}

async fn cmd_settings(
    engine: &StorageEngine,
    theme: Option<Theme>,
    shortcut: Option<&str>,
) -> Result<()> {
    let mut settings = engine.settings().await?;
    if theme.is_some() || shortcut.is_some() {
        if let Some(theme) = theme {
            settings.theme = theme;
        }
        if let Some(shortcut) = shortcut {
            settings.quick_save_shortcut = shortcut.to_string();
        }
        engine.save_settings(&settings).await?;
    }
    println!("{}", serde_json::to_string_pretty(&settings)?);
    Ok(())
}
