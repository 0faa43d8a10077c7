//! HTTP transport for the chat backend
//!
//! Thin `reqwest` wrapper: session CRUD returns unwrapped envelopes, and
//! the completions call hands back the raw response body as a
//! [`ByteSource`] for the stream assembler. No retries are attempted.
//!
//! REST calls carry a whole-request timeout. The completions stream only
//! has the client's read timeout, so a long answer that keeps producing
//! chunks is never cut off.

use std::time::Duration;

use anyhow::Result as AnyResult;
use bytes::Bytes;
use futures::stream::{BoxStream, StreamExt};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};
use url::Url;

use crate::chat::{
    ApiResponse, ChatMessage, ChatSendRequest, ChatSession, PageResult, SessionTitle,
};
use crate::config::Config;
use crate::error::{ClientError, TransportError};
use crate::stream::ByteSource;
use crate::user::{LoginRequest, LoginResult, Quota, UserProfile};

const CHAT_API: [&str; 3] = ["api", "v1", "chat"];
const USER_API: [&str; 3] = ["api", "v1", "users"];

/// Client for the chat REST + streaming API
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
    /// Applied per REST request, never to the completions stream
    request_timeout: Option<Duration>,
}

impl ChatClient {
    pub fn new(
        base_url: Url,
        token: Option<String>,
        http: reqwest::Client,
    ) -> Result<Self, ClientError> {
        if base_url.cannot_be_a_base() {
            return Err(ClientError::Url(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            ));
        }
        Ok(Self {
            http,
            base_url,
            token,
            request_timeout: None,
        })
    }

    /// Build a client from configuration
    pub fn from_config(config: &Config) -> AnyResult<Self> {
        Self::from_config_with(config, Self::http_builder(config))
    }

    /// Build a client from configuration on top of a prepared HTTP builder
    pub fn from_config_with(config: &Config, builder: reqwest::ClientBuilder) -> AnyResult<Self> {
        let http = builder.build()?;
        let client = Self::new(config.base_url()?, config.auth.token.clone(), http)?;
        Ok(client.with_request_timeout(config.server.timeout()))
    }

    /// HTTP builder with the configured connect and idle timeouts
    ///
    /// No total timeout is set here; see [`Self::with_request_timeout`].
    pub fn http_builder(config: &Config) -> reqwest::ClientBuilder {
        reqwest::Client::builder()
            .connect_timeout(config.server.connect_timeout())
            .read_timeout(config.server.idle_timeout())
    }

    /// Limit the total duration of each REST call
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Replace the bearer token, e.g. after logging in
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `/api/v1/chat/<segments...>` against the base URL
    ///
    /// Segments are percent-encoded, so ids can't escape the path.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        self.api_url(&CHAT_API, segments)
    }

    /// Resolve `/api/v1/users/<segments...>` against the base URL
    pub fn user_endpoint(&self, segments: &[&str]) -> Url {
        self.api_url(&USER_API, segments)
    }

    fn api_url(&self, area: &[&str], segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(area.iter().chain(segments.iter()));
        }
        url
    }

    /// Authenticated request without a total timeout
    fn build_request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.http.request(method, url);
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Authenticated REST request, bounded by the request timeout
    fn build_rest_request(&self, method: Method, url: Url) -> RequestBuilder {
        let request = self.build_request(method, url);
        match self.request_timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }

    /// Turn a non-2xx response into `ClientError::Status`
    async fn handle_error_response(&self, response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        warn!("Chat API returned {}: {}", status, body);
        Err(ClientError::Status {
            status: status.as_u16(),
            body,
        })
    }

    async fn call<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<ApiResponse<T>, ClientError> {
        let response = self.handle_error_response(request.send().await?).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Send a user message and open the streamed answer
    ///
    /// Without `session_id` the server creates a new session and announces
    /// it in the first stream frame.
    pub async fn stream_completion(
        &self,
        content: &str,
        session_id: Option<&str>,
    ) -> Result<ResponseBodySource, ClientError> {
        let body = ChatSendRequest {
            content: content.to_string(),
            session_id: session_id.map(str::to_string),
        };
        let url = self.endpoint(&["completions"]);
        info!("Opening completion stream: {} (session={:?})", url, session_id);

        let request = self
            .build_request(Method::POST, url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&body);
        let response = self.handle_error_response(request.send().await?).await?;

        Ok(ResponseBodySource::new(response))
    }

    /// `GET /sessions?current=&size=`
    pub async fn list_sessions(
        &self,
        current: u64,
        size: u64,
    ) -> Result<PageResult<ChatSession>, ClientError> {
        let request = self
            .build_rest_request(Method::GET, self.endpoint(&["sessions"]))
            .query(&[("current", current), ("size", size)]);
        let page: PageResult<ChatSession> = self.call(request).await?.into_data()?;
        debug!("Loaded {} of {} sessions", page.records.len(), page.total);
        Ok(page)
    }

    /// `POST /sessions`, returning the new session id
    pub async fn create_session(&self, title: &str) -> Result<String, ClientError> {
        let request = self
            .build_rest_request(Method::POST, self.endpoint(&["sessions"]))
            .json(&SessionTitle {
                title: title.to_string(),
            });
        self.call(request).await?.into_data()
    }

    /// `PATCH /sessions/{id}`
    pub async fn update_session_title(
        &self,
        session_id: &str,
        title: &str,
    ) -> Result<(), ClientError> {
        let request = self
            .build_rest_request(Method::PATCH, self.endpoint(&["sessions", session_id]))
            .json(&SessionTitle {
                title: title.to_string(),
            });
        self.call::<serde_json::Value>(request).await?.into_result()?;
        Ok(())
    }

    /// `DELETE /sessions/{id}`
    pub async fn delete_session(&self, session_id: &str) -> Result<(), ClientError> {
        let request =
            self.build_rest_request(Method::DELETE, self.endpoint(&["sessions", session_id]));
        self.call::<serde_json::Value>(request).await?.into_result()?;
        Ok(())
    }

    /// `GET /sessions/{id}/messages`
    pub async fn session_messages(
        &self,
        session_id: &str,
    ) -> Result<Vec<ChatMessage>, ClientError> {
        let request = self.build_rest_request(
            Method::GET,
            self.endpoint(&["sessions", session_id, "messages"]),
        );
        Ok(self
            .call::<Vec<ChatMessage>>(request)
            .await?
            .into_result()?
            .unwrap_or_default())
    }

    /// `POST /users/login`, returning the JWT and a minimal profile
    ///
    /// Sent without a bearer token. The caller decides where the returned
    /// token goes.
    pub async fn login(&self, account: &str, password: &str) -> Result<LoginResult, ClientError> {
        let url = self.user_endpoint(&["login"]);
        info!("Logging in as {} at {}", account, url);

        let mut request = self.http.post(url).json(&LoginRequest {
            account: account.to_string(),
            password: password.to_string(),
        });
        if let Some(timeout) = self.request_timeout {
            request = request.timeout(timeout);
        }
        self.call(request).await?.into_data()
    }

    /// `GET /users/profile` for the token's owner
    pub async fn profile(&self) -> Result<UserProfile, ClientError> {
        let request = self.build_rest_request(Method::GET, self.user_endpoint(&["profile"]));
        self.call(request).await?.into_data()
    }

    /// `GET /users/quota`
    pub async fn quota(&self) -> Result<Quota, ClientError> {
        let request = self.build_rest_request(Method::GET, self.user_endpoint(&["quota"]));
        self.call(request).await?.into_data()
    }
}

/// Streaming response body exposed as a pull-based byte source
pub struct ResponseBodySource {
    body: BoxStream<'static, reqwest::Result<Bytes>>,
}

impl ResponseBodySource {
    pub fn new(response: Response) -> Self {
        Self {
            body: response.bytes_stream().boxed(),
        }
    }
}

#[async_trait::async_trait]
impl ByteSource for ResponseBodySource {
    async fn read(&mut self) -> Result<Option<Bytes>, TransportError> {
        match self.body.next().await {
            Some(chunk) => Ok(Some(chunk?)),
            None => Ok(None),
        }
    }
}
