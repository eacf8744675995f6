use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Envelope returned by every Peplink local API endpoint.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct PeplinkResponse<T: Clone> {
    pub stat: Option<String>,
    pub code: Option<u16>,
    pub message: Option<String>,
    pub response: Option<T>,
}

impl<T: Clone> PeplinkResponse<T> {
    pub fn is_ok(&self) -> bool {
        self.stat.as_deref() == Some("ok")
    }

    /// Turns a `stat: fail` envelope into an error, keeps the envelope otherwise.
    pub fn into_result(self, endpoint: &str) -> Result<Self, PeplinkResponseError> {
        if self.is_ok() {
            return Ok(self);
        }

        Err(PeplinkResponseError::with_code(
            self.code,
            self.message
                .unwrap_or_else(|| format!("{endpoint} response was not ok")),
        ))
    }
}

/*
401     Unauthorized: token missing, expired, or the API client lacks the permission
403     Forbidden: the API client is read-only and tried to change the configuration
404     Not found: unknown endpoint or unknown object id
 */

#[derive(Debug, Clone, PartialEq)]
pub struct PeplinkResponseError {
    pub code: Option<u16>,
    pub reason: String,
}

impl PeplinkResponseError {
    pub fn new(reason: String) -> Self {
        Self { code: None, reason }
    }

    pub fn with_code(code: Option<u16>, reason: String) -> Self {
        Self { code, reason }
    }

    pub fn is_authorization(&self) -> bool {
        matches!(self.code, Some(401) | Some(403))
    }

    pub fn is_not_found(&self) -> bool {
        self.code == Some(404)
    }
}

impl Display for PeplinkResponseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.code {
            Some(code) => write!(f, "{} (code: {})", self.reason, code),
            None => write!(f, "{}", self.reason),
        }
    }
}

impl std::error::Error for PeplinkResponseError {}

#[cfg(test)]
mod tests {
    use super::{PeplinkResponse, PeplinkResponseError};

    #[test]
    fn fail_envelope_becomes_error() {
        let res: PeplinkResponse<serde_json::Value> = serde_json::from_str(
            r#"{"stat":"fail","code":401,"message":"Unauthorized"}"#,
        )
        .unwrap();

        let err = res.into_result("config.wan.connection").unwrap_err();

        assert_eq!(Some(401), err.code);
        assert!(err.is_authorization());
        assert!(!err.is_not_found());
        assert_eq!("Unauthorized (code: 401)", err.to_string());
    }

    #[test]
    fn fail_envelope_without_message_names_endpoint() {
        let res: PeplinkResponse<serde_json::Value> =
            serde_json::from_str(r#"{"stat":"fail"}"#).unwrap();

        let err = res.into_result("cmd.config.apply").unwrap_err();

        assert_eq!(
            PeplinkResponseError::new("cmd.config.apply response was not ok".to_string()),
            err
        );
    }

    #[test]
    fn ok_envelope_is_kept() {
        let res: PeplinkResponse<serde_json::Value> =
            serde_json::from_str(r#"{"stat":"ok","response":{"a":1}}"#).unwrap();

        let res = res.into_result("status.wan.connection").unwrap();

        assert!(res.response.is_some());
    }
}
