use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use swapbind::config::Config;
use swapbind::db::{BindingStore, SqliteStore};
use swapbind::document::{DocumentGraph, MemoryDocument, NoticeLog};
use swapbind::engine::{analyze_component, InstanceLocator, RefreshOrchestrator};
use swapbind::session::{run_stdio_session, SessionController};

#[derive(Parser)]
#[command(name = "swapbind")]
#[command(about = "Bind component text layers to instance-swap properties")]
struct Cli {
    /// SQLite database holding saved bindings (overrides SWAPBIND_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive session over stdin/stdout (JSON lines)
    Session {
        /// Document snapshot to operate on
        #[arg(short, long)]
        document: PathBuf,

        /// Save text edits back into the snapshot when the session ends
        #[arg(long)]
        write_back: bool,
    },
    /// Re-apply every binding of a component to all of its instances
    Refresh {
        #[arg(short, long)]
        document: PathBuf,

        /// Key of the component to refresh
        #[arg(short, long)]
        component: String,

        #[arg(long)]
        write_back: bool,
    },
    /// Show what a component offers for binding
    Inspect {
        #[arg(short, long)]
        document: PathBuf,

        #[arg(short, long)]
        component: String,
    },
    /// Manage saved bindings
    Bindings {
        #[command(subcommand)]
        command: BindingsCommand,
    },
}

#[derive(Subcommand)]
enum BindingsCommand {
    /// Print saved bindings as JSON
    List {
        /// Only bindings for this component key
        #[arg(short, long)]
        component: Option<String>,
    },
}

/// Initialize tracing with output to stderr (for session mode) or stdout
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "swapbind=info".into()),
    );

    if use_stderr {
        // Session mode: stdout carries the protocol
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn open_bindings(config: &Config) -> Result<BindingStore> {
    let db_path = config.resolved_db_path()?;
    let backend = SqliteStore::open(db_path.clone())
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    backend.migrate()?;
    let store = BindingStore::load(Arc::new(backend), config.storage_key.clone()).await?;
    Ok(store)
}

fn finish_document(document: &MemoryDocument, path: &Path, write_back: bool) -> Result<()> {
    if write_back {
        document.save(path)?;
        tracing::info!("Wrote document to {}", path.display());
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let use_stderr = matches!(cli.command, Commands::Session { .. });
    init_tracing(use_stderr);

    let config = Config::from_env().with_db_path(cli.db);

    match cli.command {
        Commands::Session {
            document,
            write_back,
        } => {
            let doc = MemoryDocument::open(&document)?;
            let store = open_bindings(&config).await?;

            let mut controller = SessionController::new(Arc::new(doc.clone()), store);
            run_stdio_session(&mut controller).await?;

            finish_document(&doc, &document, write_back)?;
        }
        Commands::Refresh {
            document,
            component,
            write_back,
        } => {
            let doc = MemoryDocument::open(&document)?;
            let store = open_bindings(&config).await?;

            let target = doc
                .component_by_key(&component)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Component '{}' not found", component))?;

            let notices = NoticeLog::new();
            let report = RefreshOrchestrator::new(&doc, &notices)
                .refresh(&target, &store)
                .await?;

            println!("{}", serde_json::to_string_pretty(&report)?);
            finish_document(&doc, &document, write_back)?;
        }
        Commands::Inspect {
            document,
            component,
        } => {
            let doc = MemoryDocument::open(&document)?;

            let target = doc
                .component_by_key(&component)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Component '{}' not found", component))?;
            let definition = doc
                .component_definition(&target.id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Component '{}' not found", component))?;

            let surface = analyze_component(&definition);
            let instances = InstanceLocator::new(&doc)
                .find_all_instances(&target.key)
                .await?;

            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "componentKey": target.key,
                    "componentName": target.name,
                    "instanceCount": instances.len(),
                    "textProperties": surface.text_properties,
                    "instanceProperties": surface.instance_properties,
                }))?
            );
        }
        Commands::Bindings {
            command: BindingsCommand::List { component },
        } => {
            let store = open_bindings(&config).await?;
            let bindings = match component {
                Some(key) => store.for_component(&key),
                None => store.all().to_vec(),
            };
            println!("{}", serde_json::to_string_pretty(&bindings)?);
        }
    }

    Ok(())
}
