use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::common::transport::PeplinkResponseError;

/// One WAN interface as reported by `status.wan.connection`.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct WanConnection {
    pub id: u32,
    pub name: Option<String>,
    #[serde(default)]
    pub enable: bool,
    #[serde(rename = "statusLed")]
    pub status_led: Option<String>,
    pub message: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub method: Option<String>,
}

impl WanConnection {
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or_else(|| format!("WAN {}", self.id))
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct WanUpdateEntry {
    pub id: u32,
    pub enable: bool,
}

/// Body of `POST config.wan.connection`.
#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct WanUpdatePayload {
    pub action: String,
    pub list: Vec<WanUpdateEntry>,
}

impl WanUpdatePayload {
    pub fn set_enable(id: u32, enable: bool) -> Self {
        Self {
            action: String::from("update"),
            list: vec![WanUpdateEntry { id, enable }],
        }
    }
}

/// Reads the `response` member of `status.wan.connection`.
///
/// Firmware answers with an object keyed by WAN id plus an `order` array.
/// A `connection` array of records carrying their own `id` is accepted too.
pub fn parse_wan_connections(response: Value) -> Result<Vec<WanConnection>, PeplinkResponseError> {
    let mut object = match response {
        Value::Object(o) => o,
        other => {
            return Err(PeplinkResponseError::new(format!(
                "unexpected wan status payload: {other}"
            )))
        }
    };

    if let Some(Value::Array(list)) = object.remove("connection") {
        let mut connections = list
            .into_iter()
            .map(serde_json::from_value::<WanConnection>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| PeplinkResponseError::new(format!("malformed wan connection: {e}")))?;
        connections.sort_by_key(|c| c.id);
        return Ok(connections);
    }

    let order: Vec<u32> = match object.remove("order") {
        Some(v) => serde_json::from_value(v)
            .map_err(|e| PeplinkResponseError::new(format!("malformed wan order: {e}")))?,
        None => vec![],
    };

    let mut connections = vec![];

    for (key, value) in object {
        let id = match key.parse::<u32>() {
            Ok(id) => id,
            Err(_) => continue,
        };

        let mut record = match value {
            Value::Object(o) => o,
            _ => continue,
        };
        record.insert("id".to_string(), Value::from(id));

        let connection = serde_json::from_value::<WanConnection>(Value::Object(record))
            .map_err(|e| PeplinkResponseError::new(format!("malformed wan {id}: {e}")))?;

        connections.push(connection);
    }

    connections.sort_by_key(|c| {
        (
            order.iter().position(|o| *o == c.id).unwrap_or(usize::MAX),
            c.id,
        )
    });

    Ok(connections)
}
