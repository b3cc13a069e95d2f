//! Serve command

use crate::app::ServeArgs;
use anyhow::Result;
use leadqual_core::error::exit_codes;
use leadqual_core::{Config, Services};
use leadqual_server::{start_server, AppState};

pub async fn run(args: ServeArgs, mut config: Config) -> Result<i32> {
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }

    let services = Services::from_config(&config)?;
    let state = AppState::from_services(&services, &config)?;
    start_server(state, &config.server).await?;
    Ok(exit_codes::SUCCESS)
}
