//! Serve command - run the HTTP extraction service.

use clap::Args;

use crate::server;

use super::config::load_config;

/// Arguments for the serve command.
#[derive(Args)]
pub struct ServeArgs {
    /// Address to listen on (overrides server.bind)
    #[arg(short, long, env = "LINEITEM_BIND")]
    bind: Option<String>,

    /// Maximum upload size in bytes (overrides server.max_upload_bytes)
    #[arg(long)]
    max_upload_bytes: Option<usize>,
}

pub async fn run(args: ServeArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let mut config = load_config(config_path)?;

    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(max) = args.max_upload_bytes {
        config.server.max_upload_bytes = max;
    }
    config.validate()?;

    server::serve(&config).await
}
