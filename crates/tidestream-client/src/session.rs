//! One streamed HTTP request and its observers.

use std::future::Future;
use std::sync::Arc;

use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tokio::time::Instant;
use uuid::Uuid;

use tidestream_core::abort::AbortHandle;
use tidestream_core::config::StreamOptions;
use tidestream_core::error::{CancelReason, Result, StreamError};
use tidestream_core::observer::Observers;
use tidestream_core::processor::ChunkProcessor;

use crate::auth::{TokenProvider, header_value};
use crate::url::resolve_url;

/// Lifecycle of a [`StreamSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Idle,
    Connecting,
    Streaming,
    Draining,
    Completed,
    Failed,
    Aborted,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Aborted)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Connecting => "connecting",
            Self::Streaming => "streaming",
            Self::Draining => "draining",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Status line and headers of the response a session received.
#[derive(Debug, Clone)]
pub struct StreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub url: String,
}

impl StreamResponse {
    fn from_response(response: &reqwest::Response) -> Self {
        Self {
            status: response.status(),
            headers: response.headers().clone(),
            url: response.url().to_string(),
        }
    }

    pub fn status_text(&self) -> &str {
        self.status.canonical_reason().unwrap_or("")
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

/// A streamed request: configure it, register observers, then [`execute`].
///
/// ```no_run
/// use reqwest::Method;
/// use serde_json::json;
/// use tidestream_client::session::StreamSession;
/// use tidestream_core::config::StreamOptions;
///
/// # async fn run() -> tidestream_core::error::Result<()> {
/// let options = StreamOptions::new().with_base_url("http://localhost:8000/api");
/// let mut session = StreamSession::new("chat/stream", Method::POST, json!({"q": "hi"}), options);
/// session
///     .on_json(|value| println!("{value}"))
///     .on_error(|err| eprintln!("{err}"))
///     .on_complete(|| println!("done"));
/// let response = session.execute().await?;
/// println!("{}", response.status);
/// # Ok(())
/// # }
/// ```
///
/// [`execute`]: StreamSession::execute
pub struct StreamSession {
    id: Uuid,
    address: String,
    method: Method,
    payload: Value,
    options: StreamOptions,
    headers: Vec<(String, String)>,
    observers: Observers,
    abort: AbortHandle,
    client: reqwest::Client,
    token_provider: Option<Arc<dyn TokenProvider>>,
    state: SessionState,
}

impl std::fmt::Debug for StreamSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamSession")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("method", &self.method)
            .field("options", &self.options)
            .field("observers", &self.observers)
            .field("state", &self.state)
            .finish()
    }
}

impl StreamSession {
    pub fn new(
        address: impl Into<String>,
        method: Method,
        payload: Value,
        options: StreamOptions,
    ) -> Self {
        let headers = vec![("Content-Type".to_string(), options.content_type.clone())];
        Self {
            id: Uuid::new_v4(),
            address: address.into(),
            method,
            payload,
            options,
            headers,
            observers: Observers::new(),
            abort: AbortHandle::new(),
            client: reqwest::Client::new(),
            token_provider: None,
            state: SessionState::Idle,
        }
    }

    /// Reuse an existing connection pool.
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn options(&self) -> &StreamOptions {
        &self.options
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Outgoing headers in insertion order.
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Set one header. Names compare case-insensitively; the last write wins.
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(&key));
        self.headers.push((key, value.into()));
        self
    }

    pub fn set_headers<K, V>(&mut self, headers: impl IntoIterator<Item = (K, V)>) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in headers {
            self.set_header(key, value);
        }
        self
    }

    /// Register a chunk observer. `raw` selects undecorated network slices
    /// over logically complete segments.
    pub fn on_chunk(&mut self, handler: impl FnMut(&str) + Send + 'static, raw: bool) -> &mut Self {
        self.observers.on_chunk(handler, raw);
        self
    }

    pub fn on_json(&mut self, handler: impl FnMut(&Value) + Send + 'static) -> &mut Self {
        self.observers.on_json(handler);
        self
    }

    pub fn on_error(&mut self, handler: impl FnMut(&StreamError) + Send + 'static) -> &mut Self {
        self.observers.on_error(handler);
        self
    }

    pub fn on_complete(&mut self, handler: impl FnMut() + Send + 'static) -> &mut Self {
        self.observers.on_complete(handler);
        self
    }

    /// Handle for aborting from another task while `execute` is running.
    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Abort the request. A no-op once the session has finished.
    pub fn abort(&self) {
        if !self.state.is_terminal() {
            self.abort.abort();
        }
    }

    /// Perform the request and drive the body through the observers.
    ///
    /// Returns the response status line and headers. If the failure happens
    /// after a response arrived (bad status, broken body, abort, timeout),
    /// error observers run and the response is still returned; check
    /// [`state`](Self::state) for the outcome. Without a response the error
    /// is returned as well.
    pub async fn execute(&mut self) -> Result<StreamResponse> {
        if self.state != SessionState::Idle {
            return Err(StreamError::AlreadyExecuted);
        }
        self.state = SessionState::Connecting;
        self.observers.attach_abort(self.abort.clone());

        let deadline = self.options.timeout().map(|t| Instant::now() + t);
        let mut received = None;
        let outcome = self.run(deadline, &mut received).await;

        match outcome {
            Ok(()) => {
                self.state = SessionState::Completed;
                self.observers.emit_complete();
                if self.options.debug {
                    tracing::debug!(session = %self.id, "stream completed");
                }
                // run() only succeeds after a response arrived.
                received.ok_or_else(|| StreamError::Transport("no response received".into()))
            }
            Err(err) => {
                self.state = if err.is_cancelled() {
                    SessionState::Aborted
                } else {
                    SessionState::Failed
                };
                if self.options.debug {
                    tracing::debug!(session = %self.id, error = %err, "stream request error");
                }
                self.observers.emit_error(&err);
                received.ok_or(err)
            }
        }
    }

    async fn run(
        &mut self,
        deadline: Option<Instant>,
        received: &mut Option<StreamResponse>,
    ) -> Result<()> {
        let abort = self.abort.clone();
        let url = resolve_url(&self.options.base_url, &self.address);
        let headers = self.build_headers()?;
        if self.options.debug {
            let names: Vec<&str> = headers.keys().map(HeaderName::as_str).collect();
            tracing::debug!(session = %self.id, method = %self.method, url = %url, headers = ?names, "stream request");
        }

        let mut request = self
            .client
            .request(self.method.clone(), url.as_str())
            .headers(headers);
        if self.method != Method::GET && !self.payload.is_null() {
            request = request.body(serde_json::to_vec(&self.payload)?);
        }

        let response = race(&abort, deadline, request.send())
            .await?
            .map_err(|e| {
                if e.is_builder() {
                    StreamError::InvalidUrl(format!("{url}: {e}"))
                } else {
                    StreamError::Transport(e.to_string())
                }
            })?;

        let meta = StreamResponse::from_response(&response);
        let status = meta.status;
        *received = Some(meta);

        if !status.is_success() {
            return Err(StreamError::Status {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("").to_string(),
            });
        }
        if !has_body(&self.method, status) {
            return Err(StreamError::MissingBody);
        }

        self.state = SessionState::Streaming;
        let mut processor = ChunkProcessor::new(self.options.clone());
        let mut body = Box::pin(response.bytes_stream());

        loop {
            match race(&abort, deadline, body.next()).await? {
                Some(Ok(bytes)) => processor.feed(&bytes, &mut self.observers),
                Some(Err(e)) => return Err(StreamError::Transport(e.to_string())),
                None => break,
            }
            check_aborted(&abort)?;
        }

        self.state = SessionState::Draining;
        processor.finish(&mut self.observers);
        check_aborted(&abort)?;

        if self.options.debug {
            tracing::debug!(
                session = %self.id,
                segments = processor.segments_processed(),
                "stream drained"
            );
        }
        Ok(())
    }

    fn build_headers(&self) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        for (key, value) in &self.headers {
            insert_header(&mut map, key, value)?;
        }

        let has_token_header = self
            .headers
            .iter()
            .any(|(k, _)| k.eq_ignore_ascii_case(&self.options.token_header));
        if self.options.with_auth_token && !has_token_header {
            if let Some(token) = self.token_provider.as_ref().and_then(|p| p.token()) {
                let value = header_value(&token, self.options.token_scheme.as_deref());
                insert_header(&mut map, &self.options.token_header, &value)?;
            }
        }
        Ok(map)
    }
}

fn insert_header(map: &mut HeaderMap, key: &str, value: &str) -> Result<()> {
    let name = HeaderName::from_bytes(key.as_bytes())
        .map_err(|e| StreamError::InvalidHeader(format!("{key}: {e}")))?;
    let value =
        HeaderValue::from_str(value).map_err(|e| StreamError::InvalidHeader(format!("{key}: {e}")))?;
    map.insert(name, value);
    Ok(())
}

/// Responses that never carry a body.
fn has_body(method: &Method, status: StatusCode) -> bool {
    *method != Method::HEAD
        && !matches!(
            status,
            StatusCode::NO_CONTENT | StatusCode::RESET_CONTENT | StatusCode::NOT_MODIFIED
        )
}

fn check_aborted(abort: &AbortHandle) -> Result<()> {
    if abort.is_aborted() {
        Err(StreamError::Cancelled(
            abort.reason().unwrap_or(CancelReason::User),
        ))
    } else {
        Ok(())
    }
}

/// Run `fut` unless the session is aborted or the deadline passes first.
async fn race<F: Future>(abort: &AbortHandle, deadline: Option<Instant>, fut: F) -> Result<F::Output> {
    check_aborted(abort)?;
    tokio::select! {
        biased;
        _ = abort.aborted() => Err(StreamError::Cancelled(
            abort.reason().unwrap_or(CancelReason::User),
        )),
        _ = sleep_until(deadline) => {
            abort.abort_with(CancelReason::Timeout);
            Err(StreamError::Cancelled(
                abort.reason().unwrap_or(CancelReason::Timeout),
            ))
        }
        out = fut => Ok(out),
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
