//! Stream an SSE chat endpoint and print every JSON payload.
//!
//! Base URL, timeout and debug logging come from `TIDESTREAM_BASE_URL`,
//! `TIDESTREAM_TIMEOUT_MS` and `TIDESTREAM_DEBUG`; the bearer token from
//! `TIDESTREAM_TOKEN`.
//!
//! ```bash
//! TIDESTREAM_BASE_URL=http://localhost:8000/api \
//!   cargo run --example chat_stream -p tidestream-examples -- rag/chat/stream '{"prompt":"hi"}'
//! ```

use std::sync::Arc;

use reqwest::Method;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tidestream_client::auth::EnvToken;
use tidestream_client::{SessionState, StreamSession};
use tidestream_core::config::StreamOptions;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tidestream=info".into()),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let address = args.next().unwrap_or_else(|| "chat/stream".into());
    let payload = match args.next() {
        Some(raw) => match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                eprintln!("payload is not valid JSON: {e}");
                std::process::exit(2);
            }
        },
        None => serde_json::json!({}),
    };

    let mut session = StreamSession::new(address, Method::POST, payload, StreamOptions::from_env())
        .with_token_provider(Arc::new(EnvToken::new("TIDESTREAM_TOKEN")));
    session
        .on_json(|value| println!("{value}"))
        .on_error(|err| {
            if !err.is_cancelled() {
                eprintln!("stream failed: {err}");
            }
        })
        .on_complete(|| tracing::info!("stream complete"));

    match session.execute().await {
        Ok(response) => {
            tracing::info!(status = %response.status, state = %session.state(), "finished");
            if session.state() != SessionState::Completed {
                std::process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("request failed: {e}");
            std::process::exit(1);
        }
    }
}
