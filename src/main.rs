use anyhow::Result;
use clap::{Parser, Subcommand};
use griot::ContentClient;
use std::{io, time::Duration};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::upload::UploadArgs;

mod config;
mod upload;

#[derive(Parser)]
#[command(name = "griot")]
#[command(version)]
#[command(about = "A tool for managing content in Griot")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage content
    Content {
        #[command(subcommand)]
        command: ContentCommands,
    },
}

#[derive(Subcommand)]
enum ContentCommands {
    /// Upload content
    Upload(UploadArgs),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let cli = Cli::parse();

    rt.block_on(async {
        match cli.command {
            Commands::Content {
                command: ContentCommands::Upload(args),
            } => upload_content(args).await,
        }
    })
}

async fn upload_content(args: UploadArgs) -> Result<()> {
    let upload = args.validate()?;
    let config = config::read_config()?;

    let client = ContentClient::new(reqwest::Client::new(), &config.content_base_url)?
        .with_pipe_capacity(config.pipe_capacity);

    let cancel = CancellationToken::new();
    let watcher = cancel_on_interrupt(cancel.clone(), args.timeout.or(config.upload_timeout));

    let result = upload::handle(&client, &cancel, upload, &mut io::stdout()).await;
    watcher.abort();
    result
}

/// Cancels `cancel` on Ctrl-C or once `timeout` has elapsed.
fn cancel_on_interrupt(cancel: CancellationToken, timeout: Option<Duration>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let deadline = async {
            match timeout {
                Some(timeout) => tokio::time::sleep(timeout).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::signal::ctrl_c() => warn!("interrupted, cancelling upload"),
            _ = deadline => warn!(?timeout, "upload timed out, cancelling"),
        }
        cancel.cancel();
    })
}
