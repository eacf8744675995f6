use std::{fmt::Display, sync::Arc, time::Duration};

use log::{debug, error, info};
use tokio::task::JoinHandle;

use crate::{
    core::{
        authenticator::AuthenticationError, common::transport::PeplinkResponseError,
        coordinator::Coordinator,
    },
    switches::models::WanUpdatePayload,
};

#[derive(Debug)]
pub enum SwitchCommandError {
    /// the API client is read-only, or its credentials were refused
    Unauthorized(String),
    NotFound(u32),
    UnknownEntity(String),
    Rejected { code: Option<u16>, message: String },
    Transport(Box<dyn std::error::Error + Send + Sync>),
}

impl SwitchCommandError {
    fn classify(wan_id: u32, error: Box<dyn std::error::Error + Send + Sync>) -> Self {
        if let Some(e) = error.downcast_ref::<PeplinkResponseError>() {
            if e.is_authorization() {
                return Self::Unauthorized(e.to_string());
            }
            if e.is_not_found() {
                return Self::NotFound(wan_id);
            }
            return Self::Rejected {
                code: e.code,
                message: e.reason.clone(),
            };
        }

        if let Some(e) = error.downcast_ref::<AuthenticationError>() {
            return Self::Unauthorized(e.to_string());
        }

        Self::Transport(error)
    }
}

impl Display for SwitchCommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized(reason) => write!(
                f,
                "not authorized to change WAN settings, a Read-Write API client is required: {reason}"
            ),
            Self::NotFound(wan_id) => write!(f, "WAN {wan_id} does not exist on the router"),
            Self::UnknownEntity(entity_id) => write!(f, "unknown switch entity {entity_id}"),
            Self::Rejected { code, message } => match code {
                Some(code) => write!(f, "router rejected the change: {message} (code: {code})"),
                None => write!(f, "router rejected the change: {message}"),
            },
            Self::Transport(e) => write!(f, "cannot reach the router: {e}"),
        }
    }
}

impl std::error::Error for SwitchCommandError {}

/// Sends enable/disable commands for WAN interfaces and triggers the follow-up refresh.
pub struct CommandRelay {
    coordinator: Arc<Coordinator>,
    apply_changes: bool,
    refresh_delay: Duration,
}

impl CommandRelay {
    pub fn new(coordinator: Arc<Coordinator>, apply_changes: bool, refresh_delay: Duration) -> Self {
        Self {
            coordinator,
            apply_changes,
            refresh_delay,
        }
    }

    /// Updates the `enable` flag of one WAN interface.
    ///
    /// Nothing is sent for an id missing from the current snapshot. On
    /// success the returned handle resolves once the delayed refresh is done;
    /// dropping it leaves the refresh running.
    pub async fn set_wan_enable(
        &self,
        wan_id: u32,
        enable: bool,
    ) -> Result<JoinHandle<()>, SwitchCommandError> {
        if self.coordinator.current().connection(wan_id).is_none() {
            error!("WAN {} is not part of the current snapshot", wan_id);
            return Err(SwitchCommandError::NotFound(wan_id));
        }

        let api = self.coordinator.api();
        let payload = WanUpdatePayload::set_enable(wan_id, enable);

        debug!("updating WAN {}: {:?}", wan_id, payload);

        if let Err(e) = api.update_wan_connection(payload).await {
            let err = SwitchCommandError::classify(wan_id, e);
            error!("failed to set WAN {} enable={}: {}", wan_id, enable, err);
            return Err(err);
        }

        if self.apply_changes {
            debug!("applying configuration for WAN {}", wan_id);

            if let Err(e) = api.apply_config().await {
                let err = SwitchCommandError::classify(wan_id, e);
                error!("failed to apply configuration for WAN {}: {}", wan_id, err);
                return Err(err);
            }
        }

        info!("WAN {} enable={} sent to the router", wan_id, enable);

        Ok(self.coordinator.schedule_refresh(self.refresh_delay))
    }

    pub async fn turn_on(&self, wan_id: u32) -> Result<JoinHandle<()>, SwitchCommandError> {
        self.set_wan_enable(wan_id, true).await
    }

    pub async fn turn_off(&self, wan_id: u32) -> Result<JoinHandle<()>, SwitchCommandError> {
        self.set_wan_enable(wan_id, false).await
    }
}
