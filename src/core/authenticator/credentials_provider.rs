use std::env;

use async_trait::async_trait;
use log::error;
use mockall::automock;

use super::common::{AuthenticationError, ClientCredentials};

pub const CLIENT_ID_VARIABLE: &str = "PEPLINK_CLIENT_ID";
pub const CLIENT_SECRET_VARIABLE: &str = "PEPLINK_CLIENT_SECRET";

/// Source of the API client id/secret pair created on the router
/// (System > API Access). Writes need a Read-Write client.
#[automock]
#[async_trait]
pub trait ClientCredentialsProvider: Send + Sync {
    async fn get(&self) -> Result<ClientCredentials, Box<dyn std::error::Error + Send + Sync>>;
}

/// Reads credentials from the configuration file, the environment wins when set.
#[derive(Clone)]
pub struct ConfigurationProvider {
    client_id: Option<String>,
    client_secret: Option<String>,
}

impl ConfigurationProvider {
    pub fn new(client_id: Option<String>, client_secret: Option<String>) -> Self {
        Self {
            client_id,
            client_secret,
        }
    }

    fn resolve(variable: &str, configured: &Option<String>) -> Option<String> {
        env::var(variable)
            .ok()
            .or_else(|| configured.clone())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

#[async_trait]
impl ClientCredentialsProvider for ConfigurationProvider {
    async fn get(&self) -> Result<ClientCredentials, Box<dyn std::error::Error + Send + Sync>> {
        let client_id = Self::resolve(CLIENT_ID_VARIABLE, &self.client_id);
        let client_secret = Self::resolve(CLIENT_SECRET_VARIABLE, &self.client_secret);

        match (client_id, client_secret) {
            (Some(client_id), Some(client_secret)) => Ok(ClientCredentials {
                client_id,
                client_secret,
            }),
            _ => {
                error!(
                    "api client credentials are missing, set api.client_id and api.client_secret or {} and {}",
                    CLIENT_ID_VARIABLE, CLIENT_SECRET_VARIABLE
                );
                Err(Box::new(AuthenticationError::new(
                    "missing api client credentials".to_string(),
                )))
            }
        }
    }
}
