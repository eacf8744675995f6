use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use tokio::{
    sync::{watch, Mutex},
    task::JoinHandle,
};

use crate::{core::router::RouterApi, switches::models::WanConnection};

/// Immutable view of the router's WAN interfaces at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct WanSnapshot {
    pub connections: Vec<WanConnection>,
    pub fetched_at: DateTime<Utc>,
}

impl WanSnapshot {
    pub fn new(connections: Vec<WanConnection>) -> Self {
        Self {
            connections,
            fetched_at: Utc::now(),
        }
    }

    pub fn get(&self, wan_id: u32) -> Option<&WanConnection> {
        self.connections.iter().find(|c| c.id == wan_id)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CoordinatorState {
    pub snapshot: Option<Arc<WanSnapshot>>,
    pub last_update_success: bool,
}

impl CoordinatorState {
    pub fn connection(&self, wan_id: u32) -> Option<&WanConnection> {
        self.snapshot.as_ref().and_then(|s| s.get(wan_id))
    }
}

/// Polls the router and republishes the WAN snapshot.
///
/// Snapshots are swapped whole through a watch channel, readers never see a
/// partially updated one. A failed refresh keeps the previous snapshot and
/// clears `last_update_success`.
pub struct Coordinator {
    api: Arc<dyn RouterApi>,
    state: watch::Sender<CoordinatorState>,
    refresh_lock: Mutex<()>,
    refresh_interval: Duration,
}

impl Coordinator {
    pub fn new(api: Arc<dyn RouterApi>, refresh_interval: Duration) -> Self {
        let (state, _) = watch::channel(CoordinatorState::default());
        Self {
            api,
            state,
            refresh_lock: Mutex::new(()),
            refresh_interval,
        }
    }

    pub fn api(&self) -> Arc<dyn RouterApi> {
        self.api.clone()
    }

    pub fn current(&self) -> CoordinatorState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<CoordinatorState> {
        self.state.subscribe()
    }

    pub async fn refresh(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let _guard = self.refresh_lock.lock().await;

        debug!("refreshing wan status");

        match self.api.wan_connections().await {
            Ok(connections) => {
                debug!("fetched {} wan connections", connections.len());
                let snapshot = Arc::new(WanSnapshot::new(connections));
                self.state.send_replace(CoordinatorState {
                    snapshot: Some(snapshot),
                    last_update_success: true,
                });
                Ok(())
            }
            Err(e) => {
                self.state.send_modify(|s| s.last_update_success = false);
                Err(e)
            }
        }
    }

    /// Best-effort refresh after `delay`, failures are only logged.
    pub fn schedule_refresh(self: &Arc<Self>, delay: Duration) -> JoinHandle<()> {
        let coordinator = self.clone();

        tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            debug!("running delayed coordinator refresh");
            if let Err(e) = coordinator.refresh().await {
                warn!("delayed refresh failed: {e}");
            }
        })
    }

    /// Refreshes forever on the configured interval.
    pub async fn run(self: Arc<Self>) {
        info!(
            "polling wan status every {} seconds",
            self.refresh_interval.as_secs()
        );

        let mut interval = tokio::time::interval(self.refresh_interval);

        loop {
            interval.tick().await;

            if let Err(e) = self.refresh().await {
                warn!("wan status refresh failed: {e}");
            }
        }
    }
}
