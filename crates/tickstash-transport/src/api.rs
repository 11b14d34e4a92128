//! HTTP API calls needed before the socket can be opened.
//!
//! | Call | Endpoint |
//! |------|----------|
//! | [`ApiClient::sign_in`] | `POST api/auth/signin` |
//! | [`ApiClient::me`] | `GET api/auth/me` |
//! | [`ApiClient::shards`] | `GET api/game/shards/info` |

use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tickstash_types::ShardName;
use tracing::debug;

use crate::error::TransportError;

const SIGNIN_ENDPOINT: &str = "api/auth/signin";
const ME_ENDPOINT: &str = "api/auth/me";
const SHARDS_ENDPOINT: &str = "api/game/shards/info";
const SOCKET_ENDPOINT: &str = "socket/websocket";

#[derive(Debug, Deserialize)]
struct SignInResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct MeResponse {
    #[serde(rename = "_id")]
    id: String,
}

#[derive(Debug, Deserialize)]
struct ShardInfo {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ShardsResponse {
    #[serde(default)]
    shards: Vec<ShardInfo>,
}

/// Client for the game server's HTTP API.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the server at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Http`] if the HTTP client cannot be built.
    pub fn new(base_url: &str) -> Result<Self, TransportError> {
        Ok(Self {
            client: Client::builder().build()?,
            base_url: normalize_base(base_url),
        })
    }

    /// The base URL, always ending in `/`.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Exchange an email (or username) and password for a token.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Api`] if the server refuses the credentials.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<String, TransportError> {
        debug!(endpoint = SIGNIN_ENDPOINT, "signing in");
        let request = self
            .client
            .post(self.url(SIGNIN_ENDPOINT))
            .json(&serde_json::json!({ "email": email, "password": password }));
        let response: SignInResponse = send(request, SIGNIN_ENDPOINT).await?;
        Ok(response.token)
    }

    /// Look up the id of the user owning `token`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Api`] if the token is not accepted.
    pub async fn me(&self, token: &str) -> Result<String, TransportError> {
        let request = authorize(self.client.get(self.url(ME_ENDPOINT)), token);
        let response: MeResponse = send(request, ME_ENDPOINT).await?;
        Ok(response.id)
    }

    /// List the server's shards.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Api`] if the endpoint is missing or fails.
    pub async fn shards(&self, token: &str) -> Result<Vec<ShardName>, TransportError> {
        let request = authorize(self.client.get(self.url(SHARDS_ENDPOINT)), token);
        let response: ShardsResponse = send(request, SHARDS_ENDPOINT).await?;
        Ok(response
            .shards
            .into_iter()
            .map(|shard| ShardName::new(shard.name))
            .collect())
    }

    /// The socket URL for this server.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] if the base URL is not HTTP(S).
    pub fn socket_url(&self) -> Result<String, TransportError> {
        socket_url(&self.base_url)
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{endpoint}", self.base_url)
    }
}

fn authorize(request: RequestBuilder, token: &str) -> RequestBuilder {
    request.header("X-Token", token).header("X-Username", token)
}

async fn send<T: DeserializeOwned>(
    request: RequestBuilder,
    endpoint: &'static str,
) -> Result<T, TransportError> {
    let response = request.send().await?;
    let response = check_status(response, endpoint).await?;
    Ok(response.json().await?)
}

async fn check_status(response: Response, endpoint: &'static str) -> Result<Response, TransportError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(TransportError::Api {
        endpoint,
        status: status.as_u16(),
        body: response.text().await.unwrap_or_default(),
    })
}

fn normalize_base(url: &str) -> String {
    let mut base = url.trim().to_owned();
    if !base.ends_with('/') {
        base.push('/');
    }
    base
}

/// Turn an HTTP(S) base URL into the matching socket URL.
///
/// # Errors
///
/// Returns [`TransportError::InvalidUrl`] if `base_url` is not HTTP(S).
pub fn socket_url(base_url: &str) -> Result<String, TransportError> {
    let base = normalize_base(base_url);
    let socket_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        return Err(TransportError::InvalidUrl(base));
    };
    Ok(format!("{socket_base}{SOCKET_ENDPOINT}"))
}
