use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use resource_resolution::meta::{load_assignments, load_dictionary, load_payload};
use resource_resolution::{Collaborators, EngineConfig, Resolver};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "resolve", about = "Resolve resource assignments against a resource dictionary")]
struct Cli {
    /// Engine config file (defaults to ./resolution.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolves a batch and prints the outcome as JSON.
    Run {
        #[arg(long)]
        assignments: PathBuf,
        /// Dictionary map file, or a directory with one definition per file.
        #[arg(long)]
        dictionary: PathBuf,
        #[arg(long)]
        payload: Option<PathBuf>,
        /// Resolve independent assignments of a batch concurrently.
        #[arg(long)]
        parallel: bool,
        /// Exit non-zero if any assignment did not resolve.
        #[arg(long)]
        strict: bool,
    },
    /// Maps sources and prints the resolution order without calling any source.
    Plan {
        #[arg(long)]
        assignments: PathBuf,
        #[arg(long)]
        dictionary: PathBuf,
    },
    /// Lists the source names the resolver can dispatch.
    Sources,
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    EngineConfig::load(path).context("failed to load engine config")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Run { assignments, dictionary, payload, parallel, strict } => {
            config.resolution.parallel_batches |= parallel;
            let batch = load_assignments(&assignments)
                .with_context(|| format!("failed to read assignments from {}", assignments.display()))?;
            let dictionary = load_dictionary(&dictionary)
                .with_context(|| format!("failed to read dictionary from {}", dictionary.display()))?;
            let payload = match payload {
                Some(path) => load_payload(&path)
                    .with_context(|| format!("failed to read payload from {}", path.display()))?,
                None => Value::Object(Default::default()),
            };

            let collaborators = Collaborators::from_config(&config).await?;
            let resolver = Resolver::new(config).with_collaborators(collaborators);
            let outcome = resolver.resolve(batch, &dictionary, &payload).await?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);

            let unresolved: Vec<&str> = outcome.unresolved().map(|ra| ra.name.as_str()).collect();
            if strict && !unresolved.is_empty() {
                bail!("unresolved assignments: {}", unresolved.join(", "));
            }
        }
        Commands::Plan { assignments, dictionary } => {
            let mut batch = load_assignments(&assignments)?;
            let dictionary = load_dictionary(&dictionary)?;
            let plan = Resolver::new(config).plan(&mut batch, &dictionary)?;
            let batches: Vec<Vec<&str>> = plan
                .sequence
                .batches
                .iter()
                .map(|b| b.iter().map(|&i| batch[i].name.as_str()).collect())
                .collect();
            let bindings: Vec<Value> = batch
                .iter()
                .zip(&plan.kinds)
                .map(|(ra, kind)| {
                    json!({
                        "name": ra.name,
                        "dictionary-name": ra.dictionary_name(),
                        "dictionary-source": ra.source(),
                        "kind": kind,
                        "dependencies": ra.dependencies,
                    })
                })
                .collect();
            info!(batches = batches.len(), "planned resolution");
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({ "batches": batches, "assignments": bindings }))?
            );
        }
        Commands::Sources => {
            for name in Resolver::new(config).registered_sources() {
                println!("{name}");
            }
        }
    }
    Ok(())
}
