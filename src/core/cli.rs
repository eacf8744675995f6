use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    /// the configuration file, defaults to config.toml
    #[arg(short, long)]
    pub configuration_file: Option<String>,
    #[arg(short, long)]
    pub verbosity: Option<log::LevelFilter>,
}

#[derive(Subcommand)]
pub enum Command {
    /// polls the router and serves the WAN switches as metrics
    Serve {
        /// the port to serve the metrics on
        port: Option<u16>,
    },
    /// lists the WAN switches and their state
    List,
    /// enables the WAN behind a switch
    TurnOn {
        /// the switch entity id, e.g. switch.peplink_wan1_enable
        entity_id: String,
    },
    /// disables the WAN behind a switch
    TurnOff {
        /// the switch entity id, e.g. switch.peplink_wan1_enable
        entity_id: String,
    },
    /// runs a diagnostic on the session
    SessionDiagnostic {
        /// show the token
        show_token: Option<bool>,
    },
}
