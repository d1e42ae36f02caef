/// REST client for the marketplace backend
///
/// Endpoints:
///   POST /api/auth/login               body: {"email":"...","password":"...","remember_me":bool}
///   GET  /api/auth/me
///   GET  /api/messages/conversations
///   GET  /api/messages/conversation/:peer_id
///   POST /api/messages/send            body: {"recipient_id":"...","message":"...","trip_id":null}
///   POST /api/messages/mark-read       body: {"conversation_id":"..."}
///
/// Non-2xx responses carry a JSON body with an `error` string; transport
/// failures and timeouts map to their own variants. The bearer token is
/// read from the session store on every call.
use crate::error::{ClientError, Result};
use crate::session::{SessionStore, SessionUser};
use crate::types::{Conversation, LoginResponse, SendReceipt, Thread};
use bytes::Bytes;
use http::{header, Method, Request, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::{connect::HttpConnector, Client};
use hyper_util::rt::TokioExecutor;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client<HttpConnector, Full<Bytes>>,
    session: SessionStore,
    request_timeout: Duration,
}

#[derive(Deserialize)]
struct ConversationsResponse {
    #[serde(default)]
    conversations: Vec<Conversation>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: &str, session: SessionStore, request_timeout: Duration) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::builder(TokioExecutor::new()).build_http(),
            session,
            request_timeout,
        }
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Exchange credentials for a token. The caller decides whether to
    /// persist the result in the session store.
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        remember_me: bool,
    ) -> Result<LoginResponse> {
        self.request_json(
            Method::POST,
            "/api/auth/login",
            false,
            Some(serde_json::json!({
                "email": email,
                "password": password,
                "remember_me": remember_me,
            })),
        )
        .await
    }

    /// Identity behind the current token.
    pub async fn current_user(&self) -> Result<SessionUser> {
        self.request_json(Method::GET, "/api/auth/me", true, None)
            .await
    }

    /// All conversations for the current user, in backend order.
    pub async fn conversations(&self) -> Result<Vec<Conversation>> {
        let resp: ConversationsResponse = self
            .request_json(Method::GET, "/api/messages/conversations", true, None)
            .await?;
        Ok(resp.conversations)
    }

    /// Full message history with one peer, plus peer identity.
    pub async fn thread(&self, peer_id: &str) -> Result<Thread> {
        let path = format!(
            "/api/messages/conversation/{}",
            urlencoding::encode(peer_id)
        );
        self.request_json(Method::GET, &path, true, None).await
    }

    pub async fn send_message(
        &self,
        recipient_id: &str,
        message: &str,
        trip_id: Option<&str>,
    ) -> Result<SendReceipt> {
        self.request_json(
            Method::POST,
            "/api/messages/send",
            true,
            Some(serde_json::json!({
                "recipient_id": recipient_id,
                "message": message,
                "trip_id": trip_id,
            })),
        )
        .await
    }

    pub async fn mark_read(&self, conversation_id: &str) -> Result<()> {
        // The response body carries nothing the client consumes
        let _: serde_json::Value = self
            .request_json(
                Method::POST,
                "/api/messages/mark-read",
                true,
                Some(serde_json::json!({ "conversation_id": conversation_id })),
            )
            .await?;
        Ok(())
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        authorized: bool,
        body: Option<serde_json::Value>,
    ) -> Result<T> {
        let uri: Uri = format!("{}{}", self.base_url, path)
            .parse()
            .map_err(|e| ClientError::Config(format!("Invalid request URL: {}", e)))?;

        let request_id = Uuid::new_v4();
        debug!("{} {} [req {}]", method, path, request_id);

        let mut builder = Request::builder().method(method.clone()).uri(uri);
        if authorized {
            let token = self.session.require_token()?;
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let payload = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Bytes::from(serde_json::to_vec(&value).map_err(ClientError::Serialization)?)
            }
            None => Bytes::new(),
        };

        let request = builder
            .body(Full::new(payload))
            .map_err(|e| ClientError::Http(format!("Failed to build request: {}", e)))?;

        let response = timeout(self.request_timeout, self.http.request(request))
            .await
            .map_err(|_| ClientError::Timeout(format!("{} {} timed out", method, path)))?
            .map_err(|e| ClientError::Http(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?
            .to_bytes();

        if !status.is_success() {
            let message = decode_error_body(&bytes, status);
            warn!("{} {} failed [req {}]: {}", method, path, request_id, message);
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&bytes).map_err(ClientError::Serialization)
    }
}

fn decode_error_body(bytes: &[u8], status: StatusCode) -> String {
    serde_json::from_slice::<ErrorBody>(bytes)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}
