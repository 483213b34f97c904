//! In-process HTTP server for session tests.
#![allow(dead_code)]

use std::convert::Infallible;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::Value;

/// Start the test server on an ephemeral port and return its base URL.
pub async fn spawn_server() -> String {
    let app = Router::new()
        .route("/chat/stream", post(chat_stream))
        .route("/tokens", post(tokens))
        .route("/json-lines", get(json_lines))
        .route("/echo", post(echo))
        .route("/hang", get(hang))
        .route("/fail", get(fail))
        .route("/empty", get(empty));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn event_stream(body: Body) -> Response {
    ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
}

/// Three SSE records, each sent separately.
async fn chat_stream() -> Response {
    let stream = async_stream::stream! {
        for record in [
            "data: {\"content\":\"A\"}\n\n",
            "data: {\"content\":\"B\"}\n\n",
            "data: [DONE]\n\n",
        ] {
            yield Ok::<_, Infallible>(record.to_string());
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    };
    event_stream(Body::from_stream(stream))
}

/// Bare token fragments with no framing.
async fn tokens() -> Response {
    let stream = async_stream::stream! {
        for fragment in ["He", "llo", " world"] {
            yield Ok::<_, Infallible>(fragment.to_string());
            tokio::time::sleep(Duration::from_millis(40)).await;
        }
    };
    event_stream(Body::from_stream(stream))
}

/// A JSON line split mid-document across two writes.
async fn json_lines() -> Response {
    let stream = async_stream::stream! {
        yield Ok::<_, Infallible>("{\"a\"".to_string());
        tokio::time::sleep(Duration::from_millis(30)).await;
        yield Ok::<_, Infallible>(":1}\n".to_string());
    };
    event_stream(Body::from_stream(stream))
}

/// Echo the request body back as one SSE record, and the credential and
/// trace headers back as `x-seen-*` response headers.
async fn echo(headers: HeaderMap, body: String) -> Response {
    let mut out = HeaderMap::new();
    out.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/event-stream"));
    for (from, to) in [
        ("authorization", "x-seen-auth"),
        ("x-trace", "x-seen-trace"),
        ("content-type", "x-seen-content-type"),
    ] {
        if let Some(value) = headers.get(from) {
            out.insert(to, value.clone());
        }
    }
    (out, format!("data: {body}\n\n")).into_response()
}

/// One record, then the body never ends.
async fn hang() -> Response {
    let stream = async_stream::stream! {
        yield Ok::<_, Infallible>("data: {\"content\":\"first\"}\n\n".to_string());
        std::future::pending::<()>().await;
    };
    event_stream(Body::from_stream(stream))
}

async fn fail() -> Response {
    (StatusCode::SERVICE_UNAVAILABLE, "down").into_response()
}

async fn empty() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

/// Everything the observers of one session saw.
#[derive(Clone, Default)]
pub struct Recorder {
    pub raw: Arc<Mutex<Vec<String>>>,
    pub chunks: Arc<Mutex<Vec<String>>>,
    pub json: Arc<Mutex<Vec<Value>>>,
    pub errors: Arc<Mutex<Vec<String>>>,
    pub cancelled: Arc<Mutex<Vec<bool>>>,
    pub completed: Arc<Mutex<usize>>,
}

impl Recorder {
    pub fn attach(&self, session: &mut tidestream_client::StreamSession) {
        let raw = self.raw.clone();
        session.on_chunk(move |c| raw.lock().unwrap().push(c.to_string()), true);
        let chunks = self.chunks.clone();
        session.on_chunk(move |c| chunks.lock().unwrap().push(c.to_string()), false);
        let json = self.json.clone();
        session.on_json(move |v| json.lock().unwrap().push(v.clone()));
        let errors = self.errors.clone();
        let cancelled = self.cancelled.clone();
        session.on_error(move |e| {
            errors.lock().unwrap().push(e.to_string());
            cancelled.lock().unwrap().push(e.is_cancelled());
        });
        let completed = self.completed.clone();
        session.on_complete(move || *completed.lock().unwrap() += 1);
    }

    pub fn raw(&self) -> Vec<String> {
        self.raw.lock().unwrap().clone()
    }

    pub fn chunks(&self) -> Vec<String> {
        self.chunks.lock().unwrap().clone()
    }

    pub fn json(&self) -> Vec<Value> {
        self.json.lock().unwrap().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn cancelled(&self) -> Vec<bool> {
        self.cancelled.lock().unwrap().clone()
    }

    pub fn completed(&self) -> usize {
        *self.completed.lock().unwrap()
    }
}
