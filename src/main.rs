use clap::Parser;
use log::{error, info};

use crate::core::{
    cli::{Cli, Command},
    configuration::get_configuration,
    core as commands, logger,
};

mod core;
mod switches;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    let configuration_file = cli
        .configuration_file
        .clone()
        .unwrap_or_else(|| "config.toml".to_string());

    let conf = get_configuration(configuration_file).await?;

    conf.check_data_directory()?;

    let _logger = logger::init(&conf, cli.verbosity)?;

    info!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let res = match cli.command {
        Command::Serve { port } => {
            let port = port.unwrap_or_else(|| conf.port());
            commands::serve(conf, port).await
        }
        Command::List => commands::list(conf).await,
        Command::TurnOn { entity_id } => commands::switch(conf, &entity_id, true).await,
        Command::TurnOff { entity_id } => commands::switch(conf, &entity_id, false).await,
        Command::SessionDiagnostic { show_token } => {
            commands::session_diagnostic(conf, show_token.unwrap_or(false)).await
        }
    };

    if let Err(e) = &res {
        error!("{e}");
    }

    res
}
