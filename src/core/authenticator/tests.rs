#[cfg(test)]
mod tests {

    use crate::core::{
        authenticator::{
            self, common::ClientCredentials, credentials_provider::MockClientCredentialsProvider,
            AuthenticationError,
        },
        common::http_client_factory::HttpClientOptions,
    };
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, method, path},
        Mock, MockServer,
    };

    fn credentials_mock(times: usize) -> MockClientCredentialsProvider {
        let mut store_mock = MockClientCredentialsProvider::new();
        store_mock.expect_get().times(times).returning(|| {
            Ok(ClientCredentials {
                client_id: "client".to_string(),
                client_secret: "secret".to_string(),
            })
        });
        store_mock
    }

    #[tokio::test]
    async fn login_test() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/auth.token.grant"))
            .and(body_json(json!({
                "clientId": "client", "clientSecret": "secret", "scope": "api"
            })))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "stat": "ok",
                "response": { "accessToken": "4321", "authorizationType": "grant", "expiresIn": 172800 }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let api_url = format!("{}/api/", mock_server.uri());

        let authenticator = authenticator::Authenticator::new(
            api_url.to_owned(),
            Box::new(credentials_mock(1)),
            HttpClientOptions::default(),
        );

        let factory = match authenticator.login().await {
            Ok(f) => f,
            Err(e) => {
                println!("{e}:#?");
                panic!();
            }
        };

        // the token granted during login is reused
        let managed = factory.create_managed_client().await.unwrap();

        assert_eq!("4321", managed.access_token());
        assert_eq!(api_url, factory.api_url);
    }

    #[tokio::test]
    async fn login_with_rejected_credentials_test() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/auth.token.grant"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "stat": "fail", "code": 401, "message": "Invalid client credentials"
            })))
            .mount(&mock_server)
            .await;

        let authenticator = authenticator::Authenticator::new(
            format!("{}/api/", mock_server.uri()),
            Box::new(credentials_mock(1)),
            HttpClientOptions::default(),
        );

        let err = match authenticator.login().await {
            Ok(_) => panic!("login should fail"),
            Err(e) => e,
        };

        assert!(err.downcast_ref::<AuthenticationError>().is_some());
    }

    #[tokio::test]
    async fn login_with_http_unauthorized_test() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/auth.token.grant"))
            .respond_with(wiremock::ResponseTemplate::new(401).set_body_string("Unauthorized"))
            .mount(&mock_server)
            .await;

        let authenticator = authenticator::Authenticator::new(
            format!("{}/api/", mock_server.uri()),
            Box::new(credentials_mock(1)),
            HttpClientOptions::default(),
        );

        let err = match authenticator.login().await {
            Ok(_) => panic!("login should fail"),
            Err(e) => e,
        };

        assert!(err.downcast_ref::<AuthenticationError>().is_some());
    }

    #[tokio::test]
    async fn diagnostic_test() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/auth.token.grant"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_json(json!({
                "stat": "ok", "response": { "accessToken": "4321", "expiresIn": 60 }
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let authenticator = authenticator::Authenticator::new(
            format!("{}/api/", mock_server.uri()),
            Box::new(credentials_mock(1)),
            HttpClientOptions::default(),
        );

        assert!(authenticator.diagnostic(false).await.is_ok());
    }
}
