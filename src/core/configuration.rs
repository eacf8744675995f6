use serde::Deserialize;
use std::{
    fs::{self},
    path::Path,
    time::Duration,
};
use tokio::{fs::File, io::AsyncReadExt};

pub mod sections;

pub use sections::{
    ApiConfiguration, CoreConfiguration, DeviceConfiguration, LogConfiguration,
    MetricsConfiguration, SwitchesConfiguration,
};

use super::common::http_client_factory::HttpClientOptions;
use crate::switches::entity_id::slugify;

pub const DEFAULT_PORT: u16 = 9186;
pub const DEFAULT_DEVICE_NAME: &str = "peplink";

#[derive(Deserialize, Clone, Debug, Default)]
pub struct Configuration {
    #[serde(default)]
    pub api: ApiConfiguration,
    #[serde(default)]
    pub device: DeviceConfiguration,
    #[serde(default)]
    pub switches: SwitchesConfiguration,
    #[serde(default)]
    pub metrics: MetricsConfiguration,
    #[serde(default)]
    pub core: CoreConfiguration,
    #[serde(default)]
    pub log: LogConfiguration,
}

#[derive(Debug)]
pub struct ConfigurationError {
    reason: String,
}

impl ConfigurationError {
    pub fn new(reason: String) -> Self {
        Self { reason }
    }
}

impl std::fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid configuration: {}", self.reason)
    }
}

impl std::error::Error for ConfigurationError {}

impl Configuration {
    pub fn assert_data_dir_permissions(&self) -> Result<(), &str> {
        let data_dir = self.data_directory();

        let path = Path::new(&data_dir);

        match path.try_exists() {
            Ok(true) => {}
            _ => return Err("data dir does not exist"),
        }

        let permissions = match fs::metadata(path) {
            Ok(m) => m.permissions(),
            Err(_) => return Err("cannot read data dir metadata"),
        };

        if permissions.readonly() {
            return Err("data_dir cannot be readonly");
        }

        Ok(())
    }

    /// Log files land in the data directory, it must exist and be writable.
    pub fn check_data_directory(&self) -> Result<(), ConfigurationError> {
        self.assert_data_dir_permissions().map_err(|e| {
            ConfigurationError::new(format!("{e}: {}", self.data_directory()))
        })
    }

    pub fn assert_metrics_prefix_is_not_empty(&self) -> Result<(), ()> {
        self.metrics.prefix.clone().map_or_else(
            || Err(()),
            |v| match v.trim() {
                "" => Err(()),
                _ => Ok(()),
            },
        )
    }

    pub fn assert_api_host_is_set(&self) -> Result<(), &str> {
        match self.api.host.as_deref().map(str::trim) {
            Some(h) if !h.is_empty() => Ok(()),
            _ => Err("api.host is missing"),
        }
    }

    /// Base URL of the router API, always ending with `/api/`.
    pub fn api_url(&self) -> Result<String, ConfigurationError> {
        self.assert_api_host_is_set()
            .map_err(|e| ConfigurationError::new(e.to_string()))?;

        let host = self.api.host.as_deref().unwrap_or_default().trim();
        let host = host.trim_end_matches('/');

        if host.starts_with("http://") || host.starts_with("https://") {
            return Ok(format!("{host}/api/"));
        }

        let scheme = match self.api.https.unwrap_or(true) {
            true => "https",
            false => "http",
        };

        Ok(format!("{scheme}://{host}/api/"))
    }

    /// Device name used for entity ids, `peplink` unless configured with at
    /// least one ASCII letter or digit.
    pub fn device_name(&self) -> String {
        self.device
            .name
            .clone()
            .filter(|n| !slugify(n).is_empty())
            .unwrap_or_else(|| DEFAULT_DEVICE_NAME.to_string())
    }

    pub fn data_directory(&self) -> String {
        self.core
            .data_directory
            .clone()
            .unwrap_or_else(|| ".".to_string())
    }

    pub fn port(&self) -> u16 {
        self.core.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.api.refresh.unwrap_or(30).max(1))
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_secs(self.switches.refresh_delay.unwrap_or(3))
    }

    pub fn apply_changes(&self) -> bool {
        self.switches.apply_changes.unwrap_or(true)
    }

    pub fn metrics_prefix(&self) -> String {
        match self.assert_metrics_prefix_is_not_empty() {
            Ok(()) => self.metrics.prefix.clone().unwrap_or_default(),
            Err(()) => "peplink".to_string(),
        }
    }

    pub fn http_client_options(&self) -> HttpClientOptions {
        let defaults = HttpClientOptions::default();
        HttpClientOptions {
            accept_invalid_certs: self
                .api
                .accept_invalid_certs
                .unwrap_or(defaults.accept_invalid_certs),
            timeout: self
                .api
                .timeout
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
        }
    }
}

pub async fn get_configuration(
    file_path: String,
) -> Result<Configuration, Box<dyn std::error::Error + Send + Sync>> {
    let path = Path::new(&file_path);

    if !path.exists() {
        return Err(Box::new(ConfigurationError::new(format!(
            "configuration file {file_path} is missing"
        ))));
    }

    let mut file = File::open(path).await?;
    let mut buffer = vec![];

    file.read_to_end(&mut buffer).await?;

    let result = String::from_utf8(buffer)?;

    match toml::from_str::<Configuration>(&result) {
        Ok(c) => Ok(c),
        Err(e) => Err(Box::new(ConfigurationError::new(format!(
            "configuration file {file_path} is corrupted: {e}"
        )))),
    }
}
