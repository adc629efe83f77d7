mod serve;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, eyre};
use color_eyre::Result;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use pros_core::{setup, Config, GraphDriver, ModelManager, Neo4jDriver, QueryTemplate};

#[derive(Parser)]
#[command(name = "pros")]
#[command(about = "Inspect graph model catalogues and serve their read endpoints", long_about = None)]
struct Cli {
    /// Config file to use instead of pros.toml discovery
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every catalogued model
    Models,
    /// Print a model's catalogue entry as JSON
    Show {
        /// Model name, bare or `app.Model`
        model: String,
    },
    /// Print a model's response schema as JSON Schema
    Schema {
        model: String,
    },
    /// Print the read query of a model
    Query {
        model: String,
        /// Print the fetch plan as JSON instead of the query text
        #[arg(long)]
        plan: bool,
    },
    /// Read one node from the database
    Get {
        model: String,
        uid: String,
    },
    /// Serve read endpoints over HTTP
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Print a default pros.toml
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Commands::Init = cli.command {
        print!("{}", Config::default_config_string());
        return Ok(());
    }

    let mut config = match &cli.config {
        Some(path) => {
            let mut config = Config::from_file(path)?;
            config.apply_env_overrides()?;
            config
        }
        None => Config::load()?,
    };
    debug!(project = %config.project.name, apps = ?config.project.installed_apps, "loaded config");

    let manager = setup(&config)?;

    match cli.command {
        Commands::Models => list_models(&manager),
        Commands::Show { model } => {
            let model = manager.get_model(model.as_str())?;
            println!("{}", serde_json::to_string_pretty(model)?);
        }
        Commands::Schema { model } => {
            let schema = manager.response_schema(model.as_str())?;
            println!("{}", serde_json::to_string_pretty(&schema)?);
        }
        Commands::Query { model, plan } => {
            let query = pros_core::build_read_query(&manager, model.as_str())?;
            if plan {
                println!("{}", serde_json::to_string_pretty(&query)?);
            } else {
                println!("{}", query.text());
            }
        }
        Commands::Get { model, uid } => {
            let driver: Arc<dyn GraphDriver> =
                Arc::new(Neo4jDriver::from_config(&config.database));
            let template = QueryTemplate::build(&manager, model.as_str(), driver)?;
            match template.fetch(&uid).await? {
                Some(document) => println!("{}", serde_json::to_string_pretty(&document)?),
                None => bail!("{} {} not found", model, uid),
            }
        }
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let driver: Arc<dyn GraphDriver> =
                Arc::new(Neo4jDriver::from_config(&config.database));
            serve::start_server(&config, manager, driver).await?;
        }
        Commands::Init => return Err(eyre!("init is handled before setup")),
    }

    Ok(())
}

/// Log to stderr; `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "pros_core=info,pros=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn list_models(manager: &ModelManager) {
    if manager.is_empty() {
        println!("No models found. Check installed_apps in pros.toml.");
        return;
    }

    println!("{:<32} {:<14} {:<9} LABELS", "MODEL", "KIND", "ABSTRACT");
    for model in manager.models() {
        println!(
            "{:<32} {:<14} {:<9} {}",
            format!("{}.{}", model.app_name, model.model_name),
            model.kind.as_str(),
            if model.is_abstract { "yes" } else { "" },
            model.inherited_labels.join(", ")
        );
    }
}
