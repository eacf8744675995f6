use serde::Serialize;

use crate::{
    core::coordinator::CoordinatorState,
    switches::{entity_id::EntityId, models::WanConnection},
};

pub const MANUFACTURER: &str = "Peplink";
pub const WAN_MODEL: &str = "WAN Connection";

/// Groups the switch under a per-WAN device attached to the router device.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct DeviceInfo {
    pub identifiers: String,
    pub manufacturer: String,
    pub model: String,
    pub name: String,
    pub via_device: String,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntityState {
    On,
    Off,
    Unavailable,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct WanSwitchAttributes {
    pub wan_id: String,
    pub wan_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_led: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct SwitchState {
    pub entity_id: String,
    pub unique_id: String,
    pub name: String,
    pub state: EntityState,
    pub attributes: WanSwitchAttributes,
    pub device: DeviceInfo,
}

/// Enable switch of one WAN interface.
///
/// Holds no state of its own: everything it reports is read from the
/// coordinator state handed in by the caller.
#[derive(Clone, Debug)]
pub struct WanSwitch {
    wan_id: u32,
    wan_name: String,
    entity_id: EntityId,
    unique_id: String,
    device_info: DeviceInfo,
}

impl WanSwitch {
    pub fn new(device_name: &str, connection: &WanConnection) -> Self {
        let entity_id = EntityId::new(device_name, connection.id);
        let device_key = entity_id.device.clone();

        Self {
            wan_id: connection.id,
            wan_name: connection.display_name(),
            unique_id: entity_id.object_id(),
            entity_id,
            device_info: DeviceInfo {
                identifiers: format!("{}_wan{}", device_key, connection.id),
                manufacturer: MANUFACTURER.to_string(),
                model: WAN_MODEL.to_string(),
                name: format!("{} WAN{}", device_name, connection.id),
                via_device: device_key,
            },
        }
    }

    pub fn wan_id(&self) -> u32 {
        self.wan_id
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    pub fn is_on(&self, state: &CoordinatorState) -> Option<bool> {
        state.connection(self.wan_id).map(|c| c.enable)
    }

    /// Unavailable when the last refresh failed or the WAN left the snapshot.
    pub fn available(&self, state: &CoordinatorState) -> bool {
        state.last_update_success && state.connection(self.wan_id).is_some()
    }

    pub fn attributes(&self, state: &CoordinatorState) -> WanSwitchAttributes {
        let connection = state.connection(self.wan_id);

        WanSwitchAttributes {
            wan_id: self.wan_id.to_string(),
            wan_name: self.wan_name.clone(),
            status_led: connection.and_then(|c| c.status_led.clone()),
            message: connection.and_then(|c| c.message.clone()),
            kind: connection.and_then(|c| c.kind.clone()),
            method: connection.and_then(|c| c.method.clone()),
        }
    }

    pub fn state(&self, state: &CoordinatorState) -> SwitchState {
        let entity_state = match (self.available(state), self.is_on(state)) {
            (true, Some(true)) => EntityState::On,
            (true, Some(false)) => EntityState::Off,
            _ => EntityState::Unavailable,
        };

        SwitchState {
            entity_id: self.entity_id.to_string(),
            unique_id: self.unique_id.clone(),
            name: format!("{} Enabled", self.wan_name),
            state: entity_state,
            attributes: self.attributes(state),
            device: self.device_info().clone(),
        }
    }
}
