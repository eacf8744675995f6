use chrono::{DateTime, TimeDelta, Utc};
use log::{debug, error};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::core::{
    authenticator::common::{AuthenticationError, TokenGrantPayload, TokenGrantResult},
    common::{
        http_client_factory::{http_client_factory, HttpClientOptions},
        transport::{PeplinkResponse, PeplinkResponseError},
    },
};

use super::credentials_provider::ClientCredentialsProvider;

const TOKEN_GRANT_ENDPOINT: &str = "auth.token.grant";
const DEFAULT_TOKEN_LIFETIME: i64 = 3600;

#[derive(Clone, Debug)]
pub struct AccessToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessToken {
    /// A token is renewed one minute before the router would reject it.
    pub fn is_fresh(&self) -> bool {
        Utc::now() + TimeDelta::seconds(60) < self.expires_at
    }
}

#[derive(Clone)]
pub struct AccessTokenProvider {
    cached: Arc<Mutex<Option<AccessToken>>>,
    credentials: Arc<dyn ClientCredentialsProvider>,
    client: Client,
    api_url: String,
}

impl AccessTokenProvider {
    pub fn new(
        credentials: Arc<dyn ClientCredentialsProvider>,
        api_url: String,
        options: &HttpClientOptions,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Ok(Self {
            cached: Arc::new(Mutex::new(None)),
            credentials,
            client: http_client_factory(options)?,
            api_url,
        })
    }

    /// Returns the cached token, granting a new one when it is missing or about to expire.
    pub async fn get(&self) -> Result<AccessToken, Box<dyn std::error::Error + Send + Sync>> {
        let mut guard = self.cached.lock().await;

        if let Some(token) = guard.as_ref() {
            if token.is_fresh() {
                return Ok(token.clone());
            }
            debug!("access token expires at {}, renewing", token.expires_at);
        }

        let token = self.grant().await?;
        *guard = Some(token.clone());

        Ok(token)
    }

    /// Forgets the cached token, the next `get` grants a new one.
    pub async fn invalidate(&self) {
        debug!("dropping cached access token");
        *self.cached.lock().await = None;
    }

    pub async fn grant(&self) -> Result<AccessToken, Box<dyn std::error::Error + Send + Sync>> {
        debug!("requesting access token");

        let credentials = self.credentials.get().await?;
        let payload = TokenGrantPayload::new(credentials);

        let resp = self
            .client
            .post(format!("{}{}", self.api_url, TOKEN_GRANT_ENDPOINT))
            .json(&payload)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        let res = match serde_json::from_str::<PeplinkResponse<TokenGrantResult>>(&body) {
            Ok(r) => r,
            Err(_) if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN => {
                return Err(Box::new(AuthenticationError::new(format!(
                    "router refused the token grant with HTTP {status}"
                ))))
            }
            Err(e) => return Err(Box::new(e)),
        };

        if !res.is_ok() {
            let reason = res.message.unwrap_or_default();
            error!("token grant failed: {} (code: {:?})", reason, res.code);
            return Err(Box::new(AuthenticationError::new(format!(
                "failed to get access token: {reason}"
            ))));
        }

        let result = res.response.ok_or_else(|| {
            PeplinkResponseError::new(format!("{TOKEN_GRANT_ENDPOINT} response was empty"))
        })?;

        let value = result.access_token.ok_or_else(|| {
            AuthenticationError::new("token grant response has no access token".to_string())
        })?;

        let lifetime = result.expires_in.unwrap_or(DEFAULT_TOKEN_LIFETIME);

        Ok(AccessToken {
            value,
            expires_at: Utc::now() + TimeDelta::seconds(lifetime),
        })
    }
}
