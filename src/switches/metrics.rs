use log::debug;
use prometheus_exporter::prometheus::{
    register_int_gauge, register_int_gauge_vec, Error, IntGauge, IntGaugeVec,
};

use crate::switches::entity::{EntityState, SwitchState};

const LABELS: &[&str] = &["wan_id", "wan_name", "entity_id"];

pub struct WanSwitchMetricMap {
    enabled_metric: IntGaugeVec,
    available_metric: IntGaugeVec,
    refresh_success_metric: IntGauge,
}

impl WanSwitchMetricMap {
    pub fn new(prefix: &str) -> Result<Self, Error> {
        Ok(Self {
            enabled_metric: register_int_gauge_vec!(
                format!("{prefix}_wan_enabled"),
                "1 when the WAN interface is enabled on the router",
                LABELS
            )?,
            available_metric: register_int_gauge_vec!(
                format!("{prefix}_wan_available"),
                "1 when the WAN interface is present in the latest successful refresh",
                LABELS
            )?,
            refresh_success_metric: register_int_gauge!(
                format!("{prefix}_refresh_success"),
                "1 when the last WAN status refresh succeeded"
            )?,
        })
    }

    fn reset_all(&self) {
        self.enabled_metric.reset();
        self.available_metric.reset();
    }

    pub fn set(&self, states: &[SwitchState], last_update_success: bool) {
        debug!("projecting {} switches to metrics", states.len());

        self.reset_all();
        self.refresh_success_metric
            .set(i64::from(last_update_success));

        for state in states {
            let labels = [
                state.attributes.wan_id.as_str(),
                state.attributes.wan_name.as_str(),
                state.entity_id.as_str(),
            ];

            let available = state.state != EntityState::Unavailable;
            self.available_metric
                .with_label_values(&labels)
                .set(i64::from(available));

            if available {
                self.enabled_metric
                    .with_label_values(&labels)
                    .set(i64::from(state.state == EntityState::On));
            }
        }
    }

    pub fn enabled(&self) -> &IntGaugeVec {
        &self.enabled_metric
    }

    pub fn available(&self) -> &IntGaugeVec {
        &self.available_metric
    }
}
