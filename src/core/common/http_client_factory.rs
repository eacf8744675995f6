use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use log::debug;
use reqwest::Client;

use crate::core::authenticator::AccessTokenProvider;

static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

/// Peplink routers ship a self-signed certificate, hence `accept_invalid_certs` defaults to true.
#[derive(Clone, Debug)]
pub struct HttpClientOptions {
    pub accept_invalid_certs: bool,
    pub timeout: Duration,
}

impl Default for HttpClientOptions {
    fn default() -> Self {
        Self {
            accept_invalid_certs: true,
            timeout: Duration::from_secs(10),
        }
    }
}

pub fn http_client_factory(options: &HttpClientOptions) -> Result<Client, reqwest::Error> {
    debug!("creating HTTP client");

    reqwest::ClientBuilder::new()
        .danger_accept_invalid_certs(options.accept_invalid_certs)
        .timeout(options.timeout)
        .user_agent(APP_USER_AGENT)
        .build()
}

#[derive(Clone)]
pub struct AuthenticatedHttpClientFactory {
    pub api_url: String,
    token_provider: AccessTokenProvider,
    options: HttpClientOptions,
    expiration: TimeDelta,
}

impl AuthenticatedHttpClientFactory {
    /// Create a new factory with the API URL and the access token provider.
    pub fn new(
        api_url: String,
        token_provider: AccessTokenProvider,
        options: HttpClientOptions,
    ) -> Self {
        Self {
            api_url,
            token_provider,
            options,
            expiration: TimeDelta::minutes(30),
        }
    }

    /// Creates a managed HTTP client bound to the current access token.
    ///
    /// # Errors
    ///
    /// Fails when no access token can be granted, or the HTTP client cannot be built.
    pub async fn create_managed_client(
        &self,
    ) -> Result<ManagedHttpClient, Box<dyn std::error::Error + Sync + Send>> {
        debug!("creating managed http client");

        let token = self.token_provider.get().await?;
        let client = http_client_factory(&self.options)?;

        Ok(ManagedHttpClient::new(
            client,
            token.value,
            client_expiry(token.expires_at, self.expiration),
        ))
    }

    /// Drops the cached access token after the router refused it.
    pub async fn invalidate(&self) {
        self.token_provider.invalidate().await;
    }
}

/// A managed client never outlives its token, nor `expiration`.
fn client_expiry(token_expiry: DateTime<Utc>, expiration: TimeDelta) -> DateTime<Utc> {
    token_expiry.min(Utc::now() + expiration)
}

#[derive(Clone)]
pub struct ManagedHttpClient {
    client: Client,
    access_token: String,
    expiry: DateTime<Utc>,
}

impl ManagedHttpClient {
    pub fn new(client: Client, access_token: String, expiry: DateTime<Utc>) -> Self {
        Self {
            client,
            access_token,
            expiry,
        }
    }

    pub fn get(&self) -> Result<Client, Box<dyn std::error::Error + Sync + Send>> {
        if Utc::now() > self.expiry {
            return Err(Box::new(ManagedHttpClientError::new(
                "HTTP Client expired".to_string(),
            )));
        }
        Ok(self.client.clone())
    }

    /// Value for the `accessToken` query parameter.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

#[derive(Debug)]
pub struct ManagedHttpClientError {
    error: String,
}

impl ManagedHttpClientError {
    pub fn new(error: String) -> Self {
        Self { error }
    }
}

impl std::fmt::Display for ManagedHttpClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "ManagedHttpClientError: {}", self.error)
    }
}

impl std::error::Error for ManagedHttpClientError {}
