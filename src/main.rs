//! Traitlab CLI
//!
//! Entry point for the experiment client: serve the proxy, build and
//! submit an experiment, poll a job's results, or list every job this
//! client has submitted.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use traitlab::config::{load_config_or_default, resolve_path};
use traitlab::error::{SubmissionError, ValidationError};
use traitlab::experiment::{validate, ExperimentForm};
use traitlab::experiment::encode;
use traitlab::poll::{PollOutcome, Poller, ResultCache, PENDING_NOTICE};
use traitlab::proxy::{create_router, ProxyState};
use traitlab::registry::{JobRegistry, SqliteStore};
use traitlab::state::Database;
use traitlab::submit::{submit_and_register, Submitter};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Traitlab -- Experiment Submission Client
#[derive(Parser, Debug)]
#[command(name = "traitlab", version = VERSION, about = "Experiment submission client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the proxy that relays requests to the generation backend
    Serve {
        /// Address to listen on (overrides the config file)
        #[arg(long)]
        listen: Option<String>,
    },
    /// Build an experiment and submit it for generation
    Submit {
        /// Seed value for the experiment
        #[arg(long, default_value = "")]
        seed: String,
        /// New trait as name=value (repeatable, order preserved)
        #[arg(long = "trait", value_name = "NAME=VALUE")]
        traits: Vec<String>,
        /// Base image file to embed
        #[arg(long)]
        base_image: Option<PathBuf>,
        /// Base image trait as name=value (repeatable, order preserved)
        #[arg(long = "base-trait", value_name = "NAME=VALUE")]
        base_traits: Vec<String>,
        /// Print the assembled payload instead of submitting
        #[arg(long)]
        preview: bool,
    },
    /// Fetch the result batch for a submitted job
    Results {
        /// The job id returned at submission
        id: String,
        /// Directory to write decoded result images into
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List every job id this client has submitted
    Jobs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let config = load_config_or_default();

    match cli.command {
        Command::Serve { listen } => serve(&config.backend_api, listen.as_deref().unwrap_or(&config.listen_addr)).await,
        Command::Submit {
            seed,
            traits,
            base_image,
            base_traits,
            preview,
        } => {
            submit(
                &config.proxy_url,
                &config.db_path,
                &seed,
                &traits,
                base_image.as_deref(),
                &base_traits,
                preview,
            )
            .await
        }
        Command::Results { id, out } => results(&config.proxy_url, &id, out.as_deref()).await,
        Command::Jobs => jobs(&config.db_path),
    }
}

// ---- Serve ------------------------------------------------------------------

async fn serve(backend_api: &str, listen: &str) -> Result<()> {
    let now = chrono::Utc::now().to_rfc3339();
    println!("[{}] traitlab proxy v{} starting...", now, VERSION);

    let state = Arc::new(ProxyState::new(backend_api.to_string()));
    let app = create_router(state);

    let addr: SocketAddr = listen
        .parse()
        .with_context(|| format!("invalid listen address: {listen}"))?;
    info!(backend = backend_api, "listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---- Submit -----------------------------------------------------------------

/// Split a `name=value` argument. A missing `=` means an empty value.
fn parse_trait_arg(arg: &str) -> (String, String) {
    match arg.split_once('=') {
        Some((name, value)) => (name.to_string(), value.to_string()),
        None => (arg.to_string(), String::new()),
    }
}

async fn submit(
    proxy_url: &str,
    db_path: &str,
    seed: &str,
    traits: &[String],
    base_image: Option<&std::path::Path>,
    base_traits: &[String],
    preview: bool,
) -> Result<()> {
    let mut form = ExperimentForm::new();
    form.set_seed(seed);

    for (i, arg) in traits.iter().enumerate() {
        let (name, value) = parse_trait_arg(arg);
        form.new_traits.append();
        form.new_traits.set_name(i, &name).map_err(|e| ValidationError(vec![e]))?;
        form.new_traits.set_value(i, &value).map_err(|e| ValidationError(vec![e]))?;
    }
    for (i, arg) in base_traits.iter().enumerate() {
        let (name, value) = parse_trait_arg(arg);
        form.base_traits.append();
        form.base_traits.set_name(i, &name).map_err(|e| ValidationError(vec![e]))?;
        form.base_traits.set_value(i, &value).map_err(|e| ValidationError(vec![e]))?;
    }

    form.attach_base_image(base_image).await?;

    if preview {
        println!("{}", form.preview());
        return Ok(());
    }

    let payload = form.payload();
    if let Err(e) = validate::validate(&payload) {
        eprintln!("{}", e.to_string().red());
        for field in e.fields() {
            eprintln!("  {}", field);
        }
        bail!("submission blocked");
    }

    let db = Database::open(&resolve_path(db_path))?;
    let mut registry = JobRegistry::load(SqliteStore::new(db));
    let submitter = Submitter::new(proxy_url.to_string());

    match submit_and_register(&submitter, &mut registry, &payload).await {
        Ok(id) => {
            println!("{}", format!("Submitted. Job id: {}", id).green());
            println!("Fetch results with: traitlab results {}", id);
            Ok(())
        }
        Err(e) => {
            if let Some(sub) = e.downcast_ref::<SubmissionError>() {
                eprintln!("{}", sub.to_string().red());
            }
            Err(e)
        }
    }
}

// ---- Results ----------------------------------------------------------------

async fn results(proxy_url: &str, id: &str, out: Option<&std::path::Path>) -> Result<()> {
    let poller = Poller::new(proxy_url.to_string());
    let mut cache = ResultCache::new();

    match poller.poll(id, &mut cache).await {
        Ok(PollOutcome::Pending) => {
            println!("{}", PENDING_NOTICE.yellow());
            Ok(())
        }
        Ok(PollOutcome::Complete(batch)) => {
            println!("{}", format!("{} result(s) for job {}", batch.len(), id).green());
            for (i, result) in batch.iter().enumerate() {
                println!("--- image {} ---", i);
                println!("{}", serde_json::to_string_pretty(&result.traits)?);

                if let Some(dir) = out {
                    write_image(dir, id, i, &result.image)?;
                }
            }
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e.to_string().red());
            Err(e.into())
        }
    }
}

/// Decode a data-URL image into `dir/<job>-<index>.bin`. Images that are
/// plain URLs rather than data URLs are skipped with a note.
fn write_image(dir: &std::path::Path, id: &str, index: usize, image: &str) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory: {}", dir.display()))?;

    match encode::decode_data_url(image) {
        Ok(bytes) => {
            let path = dir.join(format!("{}-{}.bin", id, index));
            std::fs::write(&path, bytes)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("wrote {}", path.display());
        }
        Err(_) => {
            println!("image {} is not an embedded data URL, skipping decode", index);
        }
    }
    Ok(())
}

// ---- Jobs -------------------------------------------------------------------

fn jobs(db_path: &str) -> Result<()> {
    let db = Database::open(&resolve_path(db_path))?;
    let registry = JobRegistry::load(SqliteStore::new(db));

    if registry.is_empty() {
        println!("No jobs submitted yet.");
        return Ok(());
    }

    println!("{}", "Submitted jobs:".bold());
    for id in registry.list() {
        println!("  {}", id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trait_arg_splits_on_first_equals() {
        assert_eq!(
            parse_trait_arg("eyes=deep=blue"),
            ("eyes".to_string(), "deep=blue".to_string())
        );
    }

    #[test]
    fn test_parse_trait_arg_without_value() {
        assert_eq!(parse_trait_arg("eyes"), ("eyes".to_string(), String::new()));
    }
}
