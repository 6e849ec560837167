use crate::config::ClientConfig;
use crate::domain::auth::Authentication;
use crate::utils::error::{NacosError, Result};
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use url::Url;

const LOGIN_ENDPOINT: &str = "/v1/auth/login";
const ACCESS_TOKEN_PARAM: &str = "accessToken";

/// Refresh the cached token once this share of its TTL has elapsed.
const TOKEN_REFRESH_WINDOW: f64 = 0.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    fn as_reqwest(&self) -> reqwest::Method {
        match self {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// One Open API call: endpoint, method and parameters.
///
/// GET and DELETE parameters go on the query string, POST and PUT parameters
/// in a form body, matching the v1 server convention.
#[derive(Debug, Clone)]
pub struct OpenApiRequest {
    pub path: String,
    pub method: HttpMethod,
    params: Vec<(&'static str, String)>,
    headers: Vec<(&'static str, String)>,
    read_timeout: Option<Duration>,
}

impl OpenApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method,
            params: Vec::new(),
            headers: Vec::new(),
            read_timeout: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, path)
    }

    pub fn param(mut self, name: &'static str, value: impl ToString) -> Self {
        self.params.push((name, value.to_string()));
        self
    }

    /// Adds the parameter only when a value is present. Optional parameters
    /// are never sent empty.
    pub fn opt_param<T: ToString>(mut self, name: &'static str, value: Option<T>) -> Self {
        if let Some(value) = value {
            self.params.push((name, value.to_string()));
        }
        self
    }

    /// Adds `tenant` unless the namespace is the default public one, which
    /// the server addresses by an absent tenant.
    pub fn tenant_param(self, name: &'static str, namespace_id: &str) -> Self {
        if namespace_id.is_empty() || namespace_id == crate::domain::model::DEFAULT_NAMESPACE_ID {
            self
        } else {
            self.param(name, namespace_id)
        }
    }

    pub fn header(mut self, name: &'static str, value: impl ToString) -> Self {
        self.headers.push((name, value.to_string()));
        self
    }

    /// Overrides the client-level request timeout, used by long polling.
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }
}

#[derive(Debug)]
struct CachedToken {
    access_token: String,
    refresh_at: Instant,
}

/// HTTP transport shared by all sub-clients. Cheap to clone.
#[derive(Clone)]
pub struct OpenApiClient {
    http: Client,
    base_url: Url,
    config: Arc<ClientConfig>,
    token: Arc<RwLock<Option<CachedToken>>>,
}

impl std::fmt::Debug for OpenApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

impl OpenApiClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .build()
            .map_err(NacosError::Http)?;

        let mut base = config.server_address().trim_end_matches('/').to_string();
        base.push_str(config.context_path());
        let base_url = Url::parse(&base).map_err(|e| {
            NacosError::config(format!("Invalid server address '{}': {}", base, e))
        })?;

        Ok(Self {
            http,
            base_url,
            config: Arc::new(config),
            token: Arc::new(RwLock::new(None)),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Sends the request and returns the raw body of a 2xx response.
    pub async fn send(&self, request: &OpenApiRequest) -> Result<String> {
        match self.dispatch(request).await? {
            (status, body) if status.is_success() => Ok(body),
            (status, body) => Err(api_error(status, &body)),
        }
    }

    /// Like [`send`](Self::send) but maps 404 to `None`.
    pub async fn send_optional(&self, request: &OpenApiRequest) -> Result<Option<String>> {
        match self.dispatch(request).await? {
            (status, body) if status.is_success() => Ok(Some(body)),
            (StatusCode::NOT_FOUND, _) => Ok(None),
            (status, body) => Err(api_error(status, &body)),
        }
    }

    pub async fn fetch_json<T: DeserializeOwned>(&self, request: &OpenApiRequest) -> Result<T> {
        let body = self.send(request).await?;
        serde_json::from_str(&body).map_err(|e| {
            NacosError::unexpected(format!("{} (while decoding {})", e, request.path))
        })
    }

    pub async fn fetch_optional_json<T: DeserializeOwned>(
        &self,
        request: &OpenApiRequest,
    ) -> Result<Option<T>> {
        match self.send_optional(request).await? {
            Some(body) => serde_json::from_str(&body).map(Some).map_err(|e| {
                NacosError::unexpected(format!("{} (while decoding {})", e, request.path))
            }),
            None => Ok(None),
        }
    }

    /// v1 write endpoints acknowledge with a bare `true` or `ok` body.
    pub async fn execute_ok(&self, request: &OpenApiRequest) -> Result<bool> {
        let body = self.send(request).await?;
        let normalized = body.trim().to_ascii_lowercase();
        Ok(normalized == "true" || normalized == "ok")
    }

    /// Authenticates against `/v1/auth/login` with the given credentials.
    pub async fn login_with(&self, username: &str, password: &str) -> Result<Authentication> {
        let request = OpenApiRequest::post(LOGIN_ENDPOINT)
            .param("username", username)
            .param("password", password);

        let (status, body) = self.dispatch_unauthenticated(&request).await?;
        if !status.is_success() {
            return Err(NacosError::Auth {
                message: format!("login returned status {}: {}", status, extract_message(&body)),
            });
        }

        let auth: Authentication = serde_json::from_str(&body)
            .map_err(|e| NacosError::unexpected(format!("{} (while decoding login)", e)))?;

        let ttl = Duration::from_secs(auth.token_ttl).mul_f64(TOKEN_REFRESH_WINDOW);
        let mut token = self.token.write().await;
        *token = Some(CachedToken {
            access_token: auth.access_token.clone(),
            refresh_at: Instant::now() + ttl,
        });
        tracing::debug!(ttl_secs = auth.token_ttl, "Authenticated against Nacos server");

        Ok(auth)
    }

    /// Logs in with the configured credentials.
    pub async fn login(&self) -> Result<Authentication> {
        match (self.config.username(), self.config.password()) {
            (Some(username), Some(password)) => self.login_with(username, password).await,
            _ => Err(NacosError::Auth {
                message: "No credentials configured".to_string(),
            }),
        }
    }

    async fn dispatch(&self, request: &OpenApiRequest) -> Result<(StatusCode, String)> {
        let token = self.ensure_token().await?;
        self.dispatch_inner(request, token).await
    }

    async fn dispatch_unauthenticated(
        &self,
        request: &OpenApiRequest,
    ) -> Result<(StatusCode, String)> {
        self.dispatch_inner(request, None).await
    }

    async fn dispatch_inner(
        &self,
        request: &OpenApiRequest,
        token: Option<String>,
    ) -> Result<(StatusCode, String)> {
        let url = self.endpoint_url(&request.path)?;
        tracing::debug!(method = ?request.method, path = %request.path, "Dispatching Open API request");

        let mut params: Vec<(&str, &str)> = request
            .params
            .iter()
            .map(|(name, value)| (*name, value.as_str()))
            .collect();
        if let Some(token) = token.as_deref() {
            params.push((ACCESS_TOKEN_PARAM, token));
        }

        let mut builder = match request.method {
            HttpMethod::Get | HttpMethod::Delete => self
                .http
                .request(request.method.as_reqwest(), url)
                .query(&params),
            HttpMethod::Post | HttpMethod::Put => self
                .http
                .request(request.method.as_reqwest(), url)
                .form(&params),
        };

        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }
        if let Some(timeout) = request.read_timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(status = %status, path = %request.path, "Open API response");

        Ok((status, body))
    }

    /// Returns a valid access token when credentials are configured,
    /// logging in again once the refresh deadline passes.
    async fn ensure_token(&self) -> Result<Option<String>> {
        if self.config.auth.is_none() {
            return Ok(None);
        }

        {
            let token = self.token.read().await;
            if let Some(cached) = token.as_ref() {
                if Instant::now() < cached.refresh_at {
                    return Ok(Some(cached.access_token.clone()));
                }
            }
        }

        let auth = self.login().await?;
        Ok(Some(auth.access_token))
    }

    fn endpoint_url(&self, path: &str) -> Result<Url> {
        let mut raw = self.base_url.as_str().trim_end_matches('/').to_string();
        raw.push_str(path);
        Url::parse(&raw)
            .map_err(|e| NacosError::config(format!("Invalid endpoint '{}': {}", raw, e)))
    }
}

fn api_error(status: StatusCode, body: &str) -> NacosError {
    NacosError::Api {
        status: status.as_u16(),
        message: extract_message(body),
    }
}

/// Error bodies are either plain text or a JSON object with a `message`
/// (or legacy `error`) field.
fn extract_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(message) = value.get(key).and_then(|m| m.as_str()) {
                return message.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "no response body".to_string()
    } else {
        trimmed.chars().take(200).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn test_client(server: &MockServer) -> OpenApiClient {
        let config = ClientConfig::new(server.base_url()).with_context_path("");
        OpenApiClient::new(config).unwrap()
    }

    #[tokio::test]
    async fn test_get_sends_query_params() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v1/cs/configs")
                .query_param("dataId", "app.properties")
                .query_param("group", "DEFAULT_GROUP");
            then.status(200).body("a=1");
        });

        let client = test_client(&server);
        let request = OpenApiRequest::get("/v1/cs/configs")
            .param("dataId", "app.properties")
            .param("group", "DEFAULT_GROUP");
        let body = client.send(&request).await.unwrap();

        mock.assert();
        assert_eq!(body, "a=1");
    }

    #[tokio::test]
    async fn test_post_sends_form_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/cs/configs")
                .header("content-type", "application/x-www-form-urlencoded")
                .body_includes("dataId=app.properties")
                .body_includes("content=a%3D1");
            then.status(200).body("true");
        });

        let client = test_client(&server);
        let request = OpenApiRequest::post("/v1/cs/configs")
            .param("dataId", "app.properties")
            .param("content", "a=1");
        assert!(client.execute_ok(&request).await.unwrap());

        mock.assert();
    }

    #[tokio::test]
    async fn test_error_status_maps_to_api_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/ns/instance");
            then.status(500)
                .json_body(serde_json::json!({"message": "instance not found"}));
        });

        let client = test_client(&server);
        let err = client
            .send(&OpenApiRequest::get("/v1/ns/instance"))
            .await
            .unwrap_err();

        match err {
            NacosError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "instance not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_send_optional_maps_404_to_none() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v1/cs/configs");
            then.status(404).body("config data not exist");
        });

        let client = test_client(&server);
        let body = client
            .send_optional(&OpenApiRequest::get("/v1/cs/configs"))
            .await
            .unwrap();
        assert!(body.is_none());
    }

    #[tokio::test]
    async fn test_execute_ok_accepts_ok_and_true() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/ok");
            then.status(200).body("ok");
        });
        server.mock(|when, then| {
            when.method(POST).path("/true");
            then.status(200).body(" True ");
        });
        server.mock(|when, then| {
            when.method(POST).path("/other");
            then.status(200).body("nope");
        });

        let client = test_client(&server);
        assert!(client.execute_ok(&OpenApiRequest::post("/ok")).await.unwrap());
        assert!(client.execute_ok(&OpenApiRequest::post("/true")).await.unwrap());
        assert!(!client.execute_ok(&OpenApiRequest::post("/other")).await.unwrap());
    }

    #[tokio::test]
    async fn test_token_injected_after_login() {
        let server = MockServer::start();
        let login_mock = server.mock(|when, then| {
            when.method(POST)
                .path("/v1/auth/login")
                .body_includes("username=nacos");
            then.status(200).json_body(serde_json::json!({
                "accessToken": "token-123",
                "tokenTtl": 18000,
                "globalAdmin": true
            }));
        });
        let data_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v1/cs/configs")
                .query_param("accessToken", "token-123");
            then.status(200).body("a=1");
        });

        let config = ClientConfig::new(server.base_url())
            .with_context_path("")
            .with_credentials("nacos", "nacos");
        let client = OpenApiClient::new(config).unwrap();

        let body = client
            .send(&OpenApiRequest::get("/v1/cs/configs"))
            .await
            .unwrap();
        assert_eq!(body, "a=1");

        // Second call reuses the cached token instead of logging in again.
        client
            .send(&OpenApiRequest::get("/v1/cs/configs"))
            .await
            .unwrap();

        login_mock.assert_hits(1);
        data_mock.assert_hits(2);
    }

    #[tokio::test]
    async fn test_tenant_param_omitted_for_public_namespace() {
        let request = OpenApiRequest::get("/v1/cs/configs")
            .tenant_param("tenant", "public")
            .tenant_param("tenant", "");
        assert!(request.params.is_empty());

        let request = OpenApiRequest::get("/v1/cs/configs").tenant_param("tenant", "staging");
        assert_eq!(request.params, vec![("tenant", "staging".to_string())]);
    }

    #[tokio::test]
    async fn test_truncated_body_surfaces_transport_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            // Announce more body bytes than are sent, then close the socket.
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\ntrue")
                .await;
        });

        let config = ClientConfig::new(format!("http://{addr}")).with_context_path("");
        let client = OpenApiClient::new(config).unwrap();

        let err = client
            .execute_ok(&OpenApiRequest::post("/v1/cs/configs"))
            .await
            .unwrap_err();
        assert!(matches!(err, NacosError::Http(_)));
    }

    #[tokio::test]
    async fn test_login_failure_is_auth_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/v1/auth/login");
            then.status(403).body("unknown user!");
        });

        let config = ClientConfig::new(server.base_url())
            .with_context_path("")
            .with_credentials("nacos", "wrong");
        let client = OpenApiClient::new(config).unwrap();

        let err = client.login().await.unwrap_err();
        assert!(matches!(err, NacosError::Auth { .. }));
    }
}
