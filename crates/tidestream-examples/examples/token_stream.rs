//! Print LLM tokens as they arrive. Ctrl-C aborts the request.
//!
//! ```bash
//! cargo run --example token_stream -p tidestream-examples -- \
//!   http://localhost:8000/api/llm/enhance '{"prompt":"write a haiku"}'
//! ```

use std::io::Write;

use reqwest::Method;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tidestream_client::StreamSession;
use tidestream_core::config::StreamOptions;
use tidestream_core::mode::DataType;
use tidestream_core::token::extract_token;

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
    let Some(url) = args.next() else {
        eprintln!("usage: token_stream <url> [json-payload]");
        std::process::exit(2);
    };
    let payload = args
        .next()
        .and_then(|raw| serde_json::from_str(&raw).ok())
        .unwrap_or_else(|| serde_json::json!({}));

    let options = StreamOptions::from_env()
        .with_data_type(DataType::Token)
        .with_realtime(true);
    let mut session = StreamSession::new(url, Method::POST, payload, options);
    session.on_json(|value| {
        if let Some(token) = extract_token(value) {
            print!("{token}");
            let _ = std::io::stdout().flush();
        }
    });
    session.on_error(|err| {
        if err.is_cancelled() {
            tracing::info!("stream cancelled");
        } else {
            eprintln!("\nstream failed: {err}");
        }
    });

    let handle = session.abort_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.abort();
        }
    });

    if let Err(e) = session.execute().await {
        eprintln!("request failed: {e}");
        std::process::exit(1);
    }
    println!();
}
