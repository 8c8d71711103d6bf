use anyhow::Result;
use clap::Parser;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use verse_image_generator::generator::{GeneratorServices, ImageGenerator};
use verse_image_generator::host::{ExecutionContext, LocalCommandBus};
use verse_image_generator::models::{Config, GENERATE_IMAGES_COMMAND};
use verse_image_generator::router::MirrorRouter;
use verse_image_generator::storage::FileStore;

#[derive(Debug, Parser)]
#[command(name = "verse-image-generator")]
#[command(about = "Generate images for a prompt through a third-party mirror")]
struct CliArgs {
    /// Prompt to generate images for.
    #[arg(value_name = "PROMPT")]
    prompt: String,

    /// Mirror to use: 0 chat-gpt.pictures, 1 craiyon, 2 svg.io. Anything else uses 0.
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    mirror: i64,

    /// Directory holding the persisted image cache (overrides STORAGE_DIR).
    #[arg(long, value_name = "DIR")]
    storage_dir: Option<PathBuf>,

    /// Storage namespace token (overrides EXECUTION_TOKEN).
    #[arg(long)]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "verse_image_generator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let mut config = Config::from_env()?;
    if let Some(storage_dir) = args.storage_dir {
        config.storage_dir = storage_dir;
    }
    if let Some(token) = args.token {
        config.execution_token = token;
    }

    let context = ExecutionContext::new(config.execution_token.clone());
    let services = GeneratorServices {
        router: MirrorRouter::from_config(&config)?,
        store: Arc::new(FileStore::new(config.storage_dir.clone())),
    };

    let bus = LocalCommandBus::new();
    let generator = ImageGenerator::activate(&context, services, &bus).await?;

    let response = bus
        .send_command(
            GENERATE_IMAGES_COMMAND,
            vec![json!(args.prompt), json!(args.mirror)],
        )
        .await;

    generator.deactivate().await;

    match response {
        Ok(value) => {
            let images: Vec<String> = serde_json::from_value(value)?;
            if images.is_empty() {
                warn!("No images generated");
            } else {
                info!("Generated {} images", images.len());
            }
            for image in images {
                println!("{}", image);
            }
            Ok(())
        }
        Err(e) => {
            error!("Generation failed: {}", e);
            std::process::exit(1);
        }
    }
}
