//! Shortcuts for the common ways chat endpoints are streamed.

use reqwest::Method;
use serde_json::Value;

use tidestream_core::config::StreamOptions;
use tidestream_core::error::{Result, StreamError};
use tidestream_core::mode::DataType;
use tidestream_core::token::extract_token;

use crate::session::{StreamResponse, StreamSession};

/// Build a session without executing it.
pub fn create_stream_request(
    address: impl Into<String>,
    method: Method,
    payload: Value,
    options: StreamOptions,
) -> StreamSession {
    StreamSession::new(address, method, payload, options)
}

/// POST `payload` to `address` and deliver every SSE `data:` payload to
/// `on_data`.
pub async fn execute_stream_request(
    address: impl Into<String>,
    payload: Value,
    options: StreamOptions,
    on_data: impl FnMut(&Value) + Send + 'static,
    on_error: Option<Box<dyn FnMut(&StreamError) + Send>>,
) -> Result<StreamResponse> {
    let options = options.with_data_type(DataType::Sse);
    let mut session = create_stream_request(address, Method::POST, payload, options);
    session.on_json(on_data);
    if let Some(handler) = on_error {
        session.on_error(handler);
    }
    session.execute().await
}

/// Callbacks for [`token_stream`].
pub struct TokenCallbacks {
    pub on_token: Box<dyn FnMut(&str) + Send>,
    pub on_raw_chunk: Option<Box<dyn FnMut(&str) + Send>>,
    pub on_error: Option<Box<dyn FnMut(&StreamError) + Send>>,
}

impl TokenCallbacks {
    pub fn new(on_token: impl FnMut(&str) + Send + 'static) -> Self {
        Self {
            on_token: Box::new(on_token),
            on_raw_chunk: None,
            on_error: None,
        }
    }

    pub fn with_raw_chunk(mut self, handler: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_raw_chunk = Some(Box::new(handler));
        self
    }

    pub fn with_error(mut self, handler: impl FnMut(&StreamError) + Send + 'static) -> Self {
        self.on_error = Some(Box::new(handler));
        self
    }
}

/// POST `payload` and stream tokens as they arrive.
///
/// Runs in realtime token mode. Every processed chunk reaches the JSON
/// observers either parsed or wrapped as `{"content": ..}`, so `on_token`
/// receives whatever [`extract_token`] finds there, once per chunk.
pub async fn token_stream(
    address: impl Into<String>,
    payload: Value,
    options: StreamOptions,
    callbacks: TokenCallbacks,
) -> Result<StreamResponse> {
    let options = options
        .with_data_type(DataType::Token)
        .with_realtime(true);
    let mut session = create_stream_request(address, Method::POST, payload, options);

    let mut on_token = callbacks.on_token;
    session.on_json(move |value| {
        if let Some(token) = extract_token(value) {
            on_token(token);
        }
    });
    if let Some(on_raw) = callbacks.on_raw_chunk {
        session.on_chunk(on_raw, true);
    }
    if let Some(on_error) = callbacks.on_error {
        session.on_error(on_error);
    }

    session.execute().await
}
