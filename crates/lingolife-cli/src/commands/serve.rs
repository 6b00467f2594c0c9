//! The `lingolife serve` command.

use std::path::PathBuf;

use anyhow::Result;

use lingolife_server::load_config_from;

pub async fn execute(config_path: Option<PathBuf>, port: Option<u16>) -> Result<()> {
    let mut config = load_config_from(config_path.as_deref())?;
    if let Some(port) = port {
        config.server.port = port;
    }
    lingolife_server::serve(config).await
}
