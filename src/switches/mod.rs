use std::sync::Arc;

use entity::{SwitchState, WanSwitch};
use entity_id::EntityId;
use log::{debug, info, warn};
use relay::{CommandRelay, SwitchCommandError};
use tokio::task::JoinHandle;

use crate::core::coordinator::Coordinator;

pub mod entity;
pub mod entity_id;
pub mod metrics;
pub mod models;
pub mod relay;

/// One switch per WAN interface known when the platform was set up.
pub struct SwitchPlatform {
    coordinator: Arc<Coordinator>,
    relay: CommandRelay,
    switches: Vec<WanSwitch>,
}

impl SwitchPlatform {
    /// Creates the switches from the coordinator's current snapshot.
    pub fn setup(coordinator: Arc<Coordinator>, relay: CommandRelay, device_name: &str) -> Self {
        let state = coordinator.current();

        let switches: Vec<WanSwitch> = match state.snapshot.as_ref() {
            Some(snapshot) => snapshot
                .connections
                .iter()
                .map(|connection| {
                    debug!(
                        "creating WAN enable switch for WAN {} ({}), enable={}",
                        connection.id,
                        connection.display_name(),
                        connection.enable
                    );
                    WanSwitch::new(device_name, connection)
                })
                .collect(),
            None => vec![],
        };

        if switches.is_empty() {
            warn!("no WAN connections found to create switches");
        } else {
            info!("set up {} WAN switches", switches.len());
        }

        Self {
            coordinator,
            relay,
            switches,
        }
    }

    pub fn switches(&self) -> &[WanSwitch] {
        &self.switches
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    pub fn find(&self, entity_id: &str) -> Option<&WanSwitch> {
        let id = EntityId::parse(entity_id)?;
        self.switches.iter().find(|s| *s.entity_id() == id)
    }

    pub fn states(&self) -> Vec<SwitchState> {
        let state = self.coordinator.current();
        self.switches.iter().map(|s| s.state(&state)).collect()
    }

    pub fn state(&self, entity_id: &str) -> Option<SwitchState> {
        let state = self.coordinator.current();
        self.find(entity_id).map(|s| s.state(&state))
    }

    pub async fn turn_on(&self, entity_id: &str) -> Result<JoinHandle<()>, SwitchCommandError> {
        let switch = self.resolve(entity_id)?;
        self.relay.turn_on(switch.wan_id()).await
    }

    pub async fn turn_off(&self, entity_id: &str) -> Result<JoinHandle<()>, SwitchCommandError> {
        let switch = self.resolve(entity_id)?;
        self.relay.turn_off(switch.wan_id()).await
    }

    fn resolve(&self, entity_id: &str) -> Result<&WanSwitch, SwitchCommandError> {
        self.find(entity_id)
            .ok_or_else(|| SwitchCommandError::UnknownEntity(entity_id.to_string()))
    }
}
