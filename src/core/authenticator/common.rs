use serde::{Deserialize, Serialize};

#[derive(Clone, PartialEq)]
pub struct ClientCredentials {
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"********")
            .finish()
    }
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrantPayload {
    pub client_id: String,
    pub client_secret: String,
    pub scope: String,
}

impl TokenGrantPayload {
    pub fn new(credentials: ClientCredentials) -> Self {
        Self {
            client_id: credentials.client_id,
            client_secret: credentials.client_secret,
            scope: String::from("api"),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct TokenGrantResult {
    pub access_token: Option<String>,
    /// lifetime in seconds
    pub expires_in: Option<i64>,
}

#[derive(Debug)]
pub struct AuthenticationError {
    reason: String,
}

impl AuthenticationError {
    pub fn new(reason: String) -> Self {
        Self { reason }
    }
}

impl std::fmt::Display for AuthenticationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "authentication failed: {}", self.reason)
    }
}

impl std::error::Error for AuthenticationError {}
