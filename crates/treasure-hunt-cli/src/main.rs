use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};

use treasure_hunt_core::config::Config;
use treasure_hunt_core::types::PipelineResult;
use treasure_hunt_gateway::GatewayState;
use treasure_hunt_pipeline::Pipeline;
use treasure_hunt_providers::{BlobStore, ClientSecretCredential, ObjectStore, TokenCredential};

mod logging;

#[derive(Parser)]
#[command(
    name = "treasure-hunt",
    about = "Find the secret hidden in an image: OCR, interpretation, and a spoken answer",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Port to listen on (default: gateway.port or 8080)
        #[arg(long)]
        port: Option<u16>,

        /// Do not serve the picker page
        #[arg(long)]
        no_ui: bool,
    },

    /// Analyze one image and print the JSON result
    Analyze {
        /// Image (blob) name in the storage container
        image: String,

        /// Also write the decoded speech audio to this file
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// List the images in the storage container
    Images,

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the merged configuration (secrets redacted)
    Show,
    /// Get a specific config value by dotted path
    Get { key: String },
    /// Check the configuration for missing or invalid settings
    Validate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load config, then fill gaps from the deployment environment
    let config_path = cli
        .config
        .map(PathBuf::from)
        .unwrap_or_else(Config::config_path);

    let config = Config::load_with_env(&config_path)?;

    logging::init_logging(config.logging.as_ref(), cli.verbose);

    match cli.command {
        Commands::Serve { port, no_ui } => serve(config, port, !no_ui).await?,
        Commands::Analyze { image, out } => {
            let result = analyze(&config, &image, out.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Images => {
            for name in list_images(&config).await? {
                println!("{name}");
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let json = serde_json::to_string_pretty(&config.redacted())?;
                println!("{json}");
            }
            ConfigAction::Get { key } => match config.get_path(&key) {
                Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
                None => anyhow::bail!("{key} is not set"),
            },
            ConfigAction::Validate => {
                println!("Config: {}", config_path.display());
                let (warnings, errors) = config.validate();
                for w in &warnings {
                    println!("warning: {w}");
                }
                for e in &errors {
                    println!("error: {e}");
                }
                if errors.is_empty() {
                    println!("Configuration OK");
                } else {
                    std::process::exit(1);
                }
            }
        },
    }

    Ok(())
}

/// Refuse to start with an incomplete configuration.
fn check_config(config: &Config) -> anyhow::Result<()> {
    let (warnings, errors) = config.validate();
    for w in &warnings {
        warn!("{w}");
    }
    for e in &errors {
        error!("{e}");
    }
    if !errors.is_empty() {
        anyhow::bail!(
            "Invalid configuration ({} errors); run `treasure-hunt config validate`",
            errors.len()
        );
    }
    Ok(())
}

fn credential(config: &Config) -> anyhow::Result<Arc<dyn TokenCredential>> {
    Ok(Arc::new(ClientSecretCredential::from_config(config)?))
}

fn build_pipeline(config: &Config) -> anyhow::Result<Pipeline> {
    check_config(config)?;
    Pipeline::from_config(config, credential(config)?)
}

async fn serve(config: Config, port: Option<u16>, ui: bool) -> anyhow::Result<()> {
    let port = port.unwrap_or_else(|| config.gateway_port());
    let pipeline = build_pipeline(&config)?;

    #[cfg(feature = "metrics")]
    let (pipeline, handle) = {
        let handle = treasure_hunt_gateway::metrics::install_prometheus_recorder()?;
        let observer = Arc::new(treasure_hunt_gateway::metrics::MetricsObserver);
        (pipeline.with_observer(observer), handle)
    };

    let state = GatewayState::new(Arc::new(config), Arc::new(pipeline));

    #[cfg(feature = "metrics")]
    let state = state.with_metrics(handle);

    info!(port, ui, hunter = state.hunter_name(), "Starting treasure hunt gateway");
    treasure_hunt_gateway::start_gateway(Arc::new(state), port, ui).await
}

async fn analyze(config: &Config, image: &str, out: Option<&Path>) -> anyhow::Result<PipelineResult> {
    let pipeline = build_pipeline(config)?;

    match pipeline.run(image).await {
        Ok(analysis) => {
            if let Some(path) = out {
                tokio::fs::write(path, &analysis.speech).await?;
                info!(path = %path.display(), bytes = analysis.speech.len(), "Wrote speech audio");
            }
            Ok(analysis.into_result())
        }
        Err(e) => Ok(PipelineResult::Failure { error: e.render() }),
    }
}

async fn list_images(config: &Config) -> anyhow::Result<Vec<String>> {
    let url = config
        .storage_url()
        .ok_or_else(|| anyhow::anyhow!("storage.url not configured (STORAGE_URL)"))?;
    let container = config
        .storage_container()
        .ok_or_else(|| anyhow::anyhow!("storage.container not configured (STORAGE_CONTAINER)"))?;

    let store = BlobStore::new(url, container, credential(config)?);
    store.list_objects().await
}
