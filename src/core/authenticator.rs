use credentials_provider::ClientCredentialsProvider;
use log::{debug, info};
use std::sync::Arc;

pub mod access_token_provider;
pub mod common;
pub mod credentials_provider;
mod tests;
pub use access_token_provider::AccessTokenProvider;
pub use common::AuthenticationError;

use super::common::http_client_factory::{AuthenticatedHttpClientFactory, HttpClientOptions};

pub struct Authenticator {
    api_url: String,
    credentials: Arc<dyn ClientCredentialsProvider>,
    options: HttpClientOptions,
}

impl Authenticator {
    pub fn new(
        api_url: String,
        credentials: Box<dyn ClientCredentialsProvider>,
        options: HttpClientOptions,
    ) -> Self {
        Self {
            api_url,
            credentials: Arc::from(credentials),
            options,
        }
    }

    /// Grants a first access token and hands out a factory bound to it.
    pub async fn login(
        &self,
    ) -> Result<AuthenticatedHttpClientFactory, Box<dyn std::error::Error + Send + Sync>> {
        debug!("login in");

        let provider = self.token_provider()?;
        provider.get().await?;

        Ok(AuthenticatedHttpClientFactory::new(
            self.api_url.clone(),
            provider,
            self.options.clone(),
        ))
    }

    pub async fn diagnostic(
        &self,
        show_token: bool,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let provider = self.token_provider()?;
        let token = provider.grant().await?;

        info!("access token granted, expires at {}", token.expires_at);

        if show_token {
            println!("ACCESS_TOKEN: {}", token.value);
        }

        Ok(())
    }

    fn token_provider(&self) -> Result<AccessTokenProvider, Box<dyn std::error::Error + Send + Sync>> {
        AccessTokenProvider::new(self.credentials.clone(), self.api_url.clone(), &self.options)
    }
}
