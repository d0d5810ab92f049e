//! Remote reply dispatch with a uniform fallback outcome.
//!
//! [`ReplyClient`] is the transport seam (HTTP in production, doubles in
//! tests). [`RemoteDispatcher`] wraps a client with credential lookup and an
//! explicit timeout, and folds every failure into [`DispatchOutcome::Fallback`].

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use counselor_core::config::RemoteConfig;
use counselor_core::Language;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;

// =============================================================================
// Credentials
// =============================================================================

/// Bearer credential for the reply endpoint. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token; blank tokens count as absent.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token.trim().to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Supplier of the session's bearer credential (owned by the auth layer).
pub trait CredentialSource: Send + Sync {
    fn credential(&self) -> Option<Credential>;
}

/// Fixed credential, or none at all.
#[derive(Debug, Clone, Default)]
pub struct StaticCredential(Option<Credential>);

impl StaticCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Credential::new(token))
    }

    pub fn none() -> Self {
        Self(None)
    }
}

impl CredentialSource for StaticCredential {
    fn credential(&self) -> Option<Credential> {
        self.0.clone()
    }
}

/// Reads the credential from an environment variable on every dispatch, so a
/// token refreshed by the host is picked up without reopening the widget.
#[derive(Debug, Clone)]
pub struct EnvCredential {
    var: String,
}

impl EnvCredential {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialSource for EnvCredential {
    fn credential(&self) -> Option<Credential> {
        std::env::var(&self.var).ok().and_then(Credential::new)
    }
}

// =============================================================================
// Wire types
// =============================================================================

/// `POST` body sent to the reply endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplyRequest {
    pub message: String,
    pub language: Language,
}

/// Successful response body. Extra fields are ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplyBody {
    pub response: String,
}

// =============================================================================
// Transport
// =============================================================================

/// One attempt at a remote reply.
#[async_trait]
pub trait ReplyClient: Send + Sync {
    async fn request_reply(
        &self,
        text: &str,
        language: Language,
        credential: &Credential,
    ) -> Result<String, ChatError>;
}

/// `reqwest`-backed client for the JSON reply endpoint.
#[derive(Debug, Clone)]
pub struct HttpReplyClient {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpReplyClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChatError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    pub fn from_config(config: &RemoteConfig) -> Result<Self, ChatError> {
        Self::new(config.endpoint.clone(), config.timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ReplyClient for HttpReplyClient {
    async fn request_reply(
        &self,
        text: &str,
        language: Language,
        credential: &Credential,
    ) -> Result<String, ChatError> {
        let body = ReplyRequest {
            message: text.to_string(),
            language,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credential.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChatError::Timeout(self.timeout)
                } else {
                    ChatError::TransportFailure(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::ServerError {
                status: status.as_u16(),
            });
        }

        let raw = response.text().await.map_err(|e| {
            if e.is_timeout() {
                ChatError::Timeout(self.timeout)
            } else {
                ChatError::TransportFailure(e.to_string())
            }
        })?;
        let reply: ReplyBody =
            serde_json::from_str(&raw).map_err(|e| ChatError::MalformedReply(e.to_string()))?;
        Ok(reply.response)
    }
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Result of a dispatch as seen by the conversation controller.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// The endpoint produced a usable reply.
    Reply(String),
    /// Any failure. The error is kept for logging only.
    Fallback(ChatError),
}

impl DispatchOutcome {
    pub fn is_fallback(&self) -> bool {
        matches!(self, DispatchOutcome::Fallback(_))
    }
}

/// Best-effort remote reply with credential gating and a hard timeout.
#[derive(Clone)]
pub struct RemoteDispatcher {
    client: Arc<dyn ReplyClient>,
    credentials: Arc<dyn CredentialSource>,
    timeout: Duration,
}

impl fmt::Debug for RemoteDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteDispatcher")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RemoteDispatcher {
    pub fn new(
        client: Arc<dyn ReplyClient>,
        credentials: Arc<dyn CredentialSource>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            credentials,
            timeout,
        }
    }

    /// HTTP dispatcher reading its credential from `config.token_env`.
    pub fn from_config(config: &RemoteConfig) -> Result<Self, ChatError> {
        let client = HttpReplyClient::from_config(config)?;
        Ok(Self::new(
            Arc::new(client),
            Arc::new(EnvCredential::new(config.token_env.clone())),
            config.timeout(),
        ))
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Request a reply. Never fails: every error becomes `Fallback`.
    pub async fn dispatch(&self, text: &str, language: Language) -> DispatchOutcome {
        match self.try_dispatch(text, language).await {
            Ok(reply) => {
                tracing::debug!(%language, reply_len = reply.len(), "Remote reply received");
                DispatchOutcome::Reply(reply)
            }
            Err(e) => {
                tracing::warn!(%language, error = %e, "Remote reply failed, using local fallback");
                DispatchOutcome::Fallback(e)
            }
        }
    }

    async fn try_dispatch(&self, text: &str, language: Language) -> Result<String, ChatError> {
        let credential = self
            .credentials
            .credential()
            .ok_or(ChatError::CredentialMissing)?;

        let reply = tokio::time::timeout(
            self.timeout,
            self.client.request_reply(text, language, &credential),
        )
        .await
        .map_err(|_| ChatError::Timeout(self.timeout))??;

        let reply = reply.trim();
        if reply.is_empty() {
            return Err(ChatError::EmptyReply);
        }
        Ok(reply.to_string())
    }
}
