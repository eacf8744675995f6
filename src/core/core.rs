use std::sync::Arc;

use log::info;

use crate::switches::{metrics::WanSwitchMetricMap, relay::CommandRelay, SwitchPlatform};

use super::{
    authenticator::{credentials_provider::ConfigurationProvider, Authenticator},
    configuration::Configuration,
    coordinator::Coordinator,
    prometheus,
    router::PeplinkClient,
};

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// ### Serve
/// Logs in, builds one switch per WAN and serves their state as metrics
/// while the coordinator keeps polling the router.
/// ### Arguments
/// * `conf` - The configuration object
/// * `port` - The port to serve the metrics on
/// ### Errors
/// * If the router refuses the credentials or the first refresh fails
/// * If the metrics endpoint cannot be bound
pub async fn serve(conf: Configuration, port: u16) -> Result<(), BoxedError> {
    let platform = setup_platform(&conf).await?;
    let metrics = WanSwitchMetricMap::new(&conf.metrics_prefix())?;

    let server = prometheus::Server::new(port, platform, metrics);

    server.run().await
}

/// Prints the state of every WAN switch as JSON.
pub async fn list(conf: Configuration) -> Result<(), BoxedError> {
    let platform = setup_platform(&conf).await?;

    println!("{}", serde_json::to_string_pretty(&platform.states())?);

    Ok(())
}

/// ### Switch
/// Enables or disables the WAN behind `entity_id`, waits for the delayed
/// refresh and prints the resulting switch state.
/// ### Arguments
/// * `conf` - The configuration object
/// * `entity_id` - The switch to act on, e.g. `switch.peplink_wan1_enable`
/// * `enable` - The requested enable flag
pub async fn switch(conf: Configuration, entity_id: &str, enable: bool) -> Result<(), BoxedError> {
    let platform = setup_platform(&conf).await?;

    let command = if enable {
        platform.turn_on(entity_id).await
    } else {
        platform.turn_off(entity_id).await
    };

    // waits for the delayed refresh so the printed state is the router's
    command?.await?;

    if let Some(state) = platform.state(entity_id) {
        println!("{}", serde_json::to_string_pretty(&state)?);
    }

    Ok(())
}

/// ### Session diagnostic
/// Grants a fresh access token to check the configured client credentials
/// ## Arguments
/// * `conf` - The configuration object
/// * `show_token` - Whether to print the granted token or not
pub async fn session_diagnostic(conf: Configuration, show_token: bool) -> Result<(), BoxedError> {
    authenticator(&conf)?.diagnostic(show_token).await
}

fn authenticator(conf: &Configuration) -> Result<Authenticator, BoxedError> {
    Ok(Authenticator::new(
        conf.api_url()?,
        Box::new(ConfigurationProvider::new(
            conf.api.client_id.clone(),
            conf.api.client_secret.clone(),
        )),
        conf.http_client_options(),
    ))
}

async fn setup_platform(conf: &Configuration) -> Result<SwitchPlatform, BoxedError> {
    let factory = authenticator(conf)?.login().await?;

    let coordinator = Arc::new(Coordinator::new(
        Arc::new(PeplinkClient::new(factory)),
        conf.refresh_interval(),
    ));

    // switches are created from the first snapshot
    coordinator.refresh().await?;

    let relay = CommandRelay::new(
        coordinator.clone(),
        conf.apply_changes(),
        conf.refresh_delay(),
    );

    let device_name = conf.device_name();
    info!("setting up WAN switches for device {device_name}");

    Ok(SwitchPlatform::setup(coordinator, relay, &device_name))
}
