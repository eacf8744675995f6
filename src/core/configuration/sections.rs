use serde::Deserialize;

#[derive(Deserialize, Clone, Debug, Default)]
pub struct CoreConfiguration {
    pub data_directory: Option<String>,
    pub port: Option<u16>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct ApiConfiguration {
    /// router address, with an optional port
    pub host: Option<String>,
    pub https: Option<bool>,
    pub accept_invalid_certs: Option<bool>,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// polling interval in seconds
    pub refresh: Option<u64>,
    /// HTTP timeout in seconds
    pub timeout: Option<u64>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct DeviceConfiguration {
    pub name: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct SwitchesConfiguration {
    /// issue `cmd.config.apply` after each change
    pub apply_changes: Option<bool>,
    /// seconds to wait before refreshing after a change
    pub refresh_delay: Option<u64>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct MetricsConfiguration {
    pub prefix: Option<String>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct LogConfiguration {
    pub level: Option<String>,
    pub retention: Option<usize>,
}
