use std::net::SocketAddr;

use log::{info, warn};

use crate::switches::{metrics::WanSwitchMetricMap, SwitchPlatform};

pub struct Server {
    port: u16,
    platform: SwitchPlatform,
    metrics: WanSwitchMetricMap,
}

impl Server {
    pub fn new(port: u16, platform: SwitchPlatform, metrics: WanSwitchMetricMap) -> Self {
        Self {
            port,
            platform,
            metrics,
        }
    }

    /// Serves the metrics and re-projects them on every published snapshot.
    pub async fn run(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr: SocketAddr = format!("0.0.0.0:{}", self.port).parse()?;
        let _exporter = prometheus_exporter::start(addr)?;

        info!("serving metrics on {addr}");

        let coordinator = self.platform.coordinator().clone();
        let mut updates = coordinator.subscribe();

        tokio::spawn(coordinator.clone().run());

        self.project();

        while updates.changed().await.is_ok() {
            self.project();
        }

        warn!("coordinator stopped publishing, exiting");

        Ok(())
    }

    fn project(&self) {
        let state = self.platform.coordinator().current();
        self.metrics
            .set(&self.platform.states(), state.last_update_success);
    }
}
