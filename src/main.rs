use alt_text_generator::ai::mime::detect_image_mime;
use alt_text_generator::client::{ClientController, HttpProxyTransport, MemoryClipboard, UiEvent};
use alt_text_generator::models::{Config, FileInput};
use alt_text_generator::server::{self, GENERATE_PATH};
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "alt-text-generator")]
#[command(about = "Generate screen-reader alt text for images")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the proxy endpoint.
    Serve,
    /// Send one image through a running proxy and print the description.
    Describe {
        #[arg(value_name = "IMAGE")]
        image: PathBuf,
        /// Base URL of the proxy.
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        proxy_url: String,
    },
}

fn file_input(path: &Path) -> Result<FileInput> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mime_type = detect_image_mime(&bytes).unwrap_or("application/octet-stream");

    Ok(FileInput {
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        mime_type: mime_type.to_string(),
        bytes,
    })
}

fn endpoint_url(proxy_url: &str) -> String {
    format!("{}{}", proxy_url.trim_end_matches('/'), GENERATE_PATH)
}

async fn describe(image: &Path, proxy_url: &str) -> Result<()> {
    let controller = ClientController::new(
        Box::new(HttpProxyTransport::new(endpoint_url(proxy_url))),
        Box::new(MemoryClipboard::new()),
    );

    controller
        .dispatch(UiEvent::FileSelected(file_input(image)?))
        .await;
    controller.dispatch(UiEvent::GenerateClicked).await;

    let view = controller.view();
    match (view.result, view.message) {
        (Some(result), _) => {
            println!("{}", result);
            Ok(())
        }
        (None, Some(message)) => bail!(message.text),
        (None, None) => bail!("No description was generated"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "alt_text_generator=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    let outcome = match args.command {
        Command::Serve => {
            info!("Starting alt-text proxy");
            match Config::from_env() {
                Ok(config) => server::serve(config).await.map_err(anyhow::Error::from),
                Err(e) => Err(e.into()),
            }
        }
        Command::Describe { image, proxy_url } => describe(&image, &proxy_url).await,
    };

    if let Err(e) = outcome {
        error!("{:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
