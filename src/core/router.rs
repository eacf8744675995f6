use async_trait::async_trait;
use log::{debug, warn};
use mockall::automock;
use reqwest::{Client, Method};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::{
    core::common::{
        http_client_factory::{AuthenticatedHttpClientFactory, ManagedHttpClient},
        transport::{PeplinkResponse, PeplinkResponseError},
    },
    switches::models::{parse_wan_connections, WanConnection, WanUpdatePayload},
};

pub const WAN_STATUS_ENDPOINT: &str = "status.wan.connection";
pub const WAN_CONFIG_ENDPOINT: &str = "config.wan.connection";
pub const CONFIG_APPLY_ENDPOINT: &str = "cmd.config.apply";

/// The router endpoints used to mirror and drive WAN interfaces.
#[automock]
#[async_trait]
pub trait RouterApi: Send + Sync {
    async fn wan_connections(
        &self,
    ) -> Result<Vec<WanConnection>, Box<dyn std::error::Error + Send + Sync>>;
    async fn update_wan_connection(
        &self,
        payload: WanUpdatePayload,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    async fn apply_config(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

pub struct PeplinkClient {
    factory: AuthenticatedHttpClientFactory,
    managed_client: Mutex<Option<ManagedHttpClient>>,
}

impl PeplinkClient {
    pub fn new(factory: AuthenticatedHttpClientFactory) -> Self {
        Self {
            factory,
            managed_client: Mutex::new(None),
        }
    }

    async fn get_managed_client(
        &self,
    ) -> Result<(Client, String), Box<dyn std::error::Error + Send + Sync>> {
        let mut guard = self.managed_client.lock().await;

        if let Some(managed) = guard.as_ref() {
            if let Ok(client) = managed.get() {
                return Ok((client, managed.access_token().to_string()));
            }
            debug!("renewing managed client");
        } else {
            debug!("creating managed client");
        }

        let managed = self.factory.create_managed_client().await?;
        let client = managed.get()?;
        let token = managed.access_token().to_string();
        *guard = Some(managed);

        Ok((client, token))
    }

    async fn call<T: DeserializeOwned + Clone, P: Serialize + ?Sized>(
        &self,
        method: Method,
        endpoint: &str,
        payload: Option<&P>,
    ) -> Result<PeplinkResponse<T>, Box<dyn std::error::Error + Send + Sync>> {
        debug!("calling {} {}", method, endpoint);

        let is_read = method == Method::GET;
        let (client, token) = self.get_managed_client().await?;

        let mut request = client
            .request(method, format!("{}{}", self.factory.api_url, endpoint))
            .query(&[("accessToken", token.as_str())]);

        if let Some(p) = payload {
            request = request.json(p);
        }

        let resp = request.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        let res = match serde_json::from_str::<PeplinkResponse<T>>(&body) {
            Ok(r) => r.into_result(endpoint),
            Err(_) if !status.is_success() => Err(PeplinkResponseError::with_code(
                Some(status.as_u16()),
                format!("{endpoint} answered HTTP {status}"),
            )),
            Err(e) => return Err(Box::new(e)),
        };

        match res {
            Ok(r) => Ok(r),
            Err(mut e) => {
                if e.code.is_none() && !status.is_success() {
                    e.code = Some(status.as_u16());
                }
                // on writes 401 means a read-only client, the token is fine
                if is_read && e.is_authorization() {
                    self.reset_session().await;
                }
                Err(Box::new(e))
            }
        }
    }

    /// Forces a new token grant on the next call.
    async fn reset_session(&self) {
        warn!("router refused the access token, a new one will be granted");

        *self.managed_client.lock().await = None;
        self.factory.invalidate().await;
    }
}

#[async_trait]
impl RouterApi for PeplinkClient {
    async fn wan_connections(
        &self,
    ) -> Result<Vec<WanConnection>, Box<dyn std::error::Error + Send + Sync>> {
        let res = self
            .call::<Value, Value>(Method::GET, WAN_STATUS_ENDPOINT, None)
            .await?;

        let response = res.response.ok_or_else(|| {
            PeplinkResponseError::new(format!("{WAN_STATUS_ENDPOINT} response was empty"))
        })?;

        Ok(parse_wan_connections(response)?)
    }

    async fn update_wan_connection(
        &self,
        payload: WanUpdatePayload,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.call::<Value, WanUpdatePayload>(Method::POST, WAN_CONFIG_ENDPOINT, Some(&payload))
            .await?;
        Ok(())
    }

    async fn apply_config(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.call::<Value, Value>(Method::POST, CONFIG_APPLY_ENDPOINT, Some(&json!({})))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    use super::{PeplinkClient, RouterApi};
    use crate::{
        core::{
            authenticator::{
                common::ClientCredentials, credentials_provider::MockClientCredentialsProvider,
                Authenticator,
            },
            common::{http_client_factory::HttpClientOptions, transport::PeplinkResponseError},
        },
        switches::models::WanUpdatePayload,
    };

    fn token_grant(token: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "stat": "ok", "response": { "accessToken": token, "expiresIn": 172800 }
        }))
    }

    async fn client_for(mock_server: &MockServer) -> PeplinkClient {
        Mock::given(method("POST"))
            .and(path("/api/auth.token.grant"))
            .respond_with(token_grant("tok"))
            .expect(1)
            .mount(mock_server)
            .await;

        login(mock_server).await
    }

    async fn login(mock_server: &MockServer) -> PeplinkClient {
        let mut credentials = MockClientCredentialsProvider::new();
        credentials.expect_get().returning(|| {
            Ok(ClientCredentials {
                client_id: "id".to_string(),
                client_secret: "secret".to_string(),
            })
        });

        let authenticator = Authenticator::new(
            format!("{}/api/", mock_server.uri()),
            Box::new(credentials),
            HttpClientOptions::default(),
        );

        PeplinkClient::new(authenticator.login().await.unwrap())
    }

    #[tokio::test]
    async fn wan_connections_follow_router_order() {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server).await;

        Mock::given(method("GET"))
            .and(path("/api/status.wan.connection"))
            .and(query_param("accessToken", "tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "stat": "ok",
                "response": {
                    "order": [2, 1],
                    "1": { "name": "Fiber", "enable": true, "statusLed": "green",
                           "message": "Connected", "type": "ethernet", "method": "dhcp" },
                    "2": { "name": "Cellular", "enable": false, "statusLed": "gray",
                           "message": "Disabled", "type": "modem" }
                }
            })))
            .expect(2)
            .mount(&mock_server)
            .await;

        let connections = client.wan_connections().await.unwrap();

        assert_eq!(vec![2, 1], connections.iter().map(|c| c.id).collect::<Vec<_>>());
        assert_eq!(Some("modem".to_string()), connections[0].kind);
        assert_eq!(None, connections[0].method);
        assert!(connections[1].enable);

        // the managed client and its token are reused
        assert_eq!(2, client.wan_connections().await.unwrap().len());
    }

    #[tokio::test]
    async fn update_posts_exact_payload() {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server).await;

        Mock::given(method("POST"))
            .and(path("/api/config.wan.connection"))
            .and(query_param("accessToken", "tok"))
            .and(body_json(json!({"action":"update","list":[{"id":3,"enable":false}]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"stat": "ok"})))
            .expect(1)
            .mount(&mock_server)
            .await;

        client
            .update_wan_connection(WanUpdatePayload::set_enable(3, false))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn read_only_client_is_refused() {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server).await;

        Mock::given(method("POST"))
            .and(path("/api/config.wan.connection"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "stat": "fail", "code": 401, "message": "Unauthorized"
            })))
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/status.wan.connection"))
            .and(query_param("accessToken", "tok"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "stat": "ok", "response": { "connection": [{ "id": 1, "enable": true }] }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let err = client
            .update_wan_connection(WanUpdatePayload::set_enable(1, true))
            .await
            .unwrap_err();

        let err = err.downcast_ref::<PeplinkResponseError>().unwrap();
        assert!(err.is_authorization());

        // a refused write keeps the token, polling goes on without a new grant
        assert_eq!(1, client.wan_connections().await.unwrap().len());
    }

    #[tokio::test]
    async fn refused_token_is_granted_again_on_next_poll() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/auth.token.grant"))
            .respond_with(token_grant("old"))
            .up_to_n_times(1)
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth.token.grant"))
            .respond_with(token_grant("new"))
            .expect(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("GET"))
            .and(path("/api/status.wan.connection"))
            .and(query_param("accessToken", "old"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "stat": "fail", "code": 401, "message": "Unauthorized"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/status.wan.connection"))
            .and(query_param("accessToken", "new"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "stat": "ok", "response": { "connection": [{ "id": 1, "enable": true }] }
            })))
            .expect(2)
            .mount(&mock_server)
            .await;

        let client = login(&mock_server).await;

        let err = client.wan_connections().await.unwrap_err();
        assert!(err
            .downcast_ref::<PeplinkResponseError>()
            .unwrap()
            .is_authorization());

        assert_eq!(1, client.wan_connections().await.unwrap().len());
        assert_eq!(1, client.wan_connections().await.unwrap().len());
    }

    #[tokio::test]
    async fn http_status_without_envelope_is_classified() {
        let mock_server = MockServer::start().await;
        let client = client_for(&mock_server).await;

        Mock::given(method("POST"))
            .and(path("/api/cmd.config.apply"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
            .mount(&mock_server)
            .await;

        let err = client.apply_config().await.unwrap_err();

        let err = err.downcast_ref::<PeplinkResponseError>().unwrap();
        assert_eq!(Some(403), err.code);
    }
}
