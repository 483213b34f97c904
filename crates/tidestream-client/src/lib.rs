//! Streamed HTTP requests delivered through observers.
//!
//! A [`StreamSession`](session::StreamSession) sends one request, decodes
//! the response body as it arrives and hands raw slices, complete segments
//! and JSON payloads to registered callbacks. Segment handling lives in
//! `tidestream-core`; this crate adds the reqwest transport, URL
//! resolution, credentials, timeout and cancellation.

pub mod auth;
pub mod helpers;
pub mod session;
pub mod url;

pub use session::{SessionState, StreamResponse, StreamSession};
pub use tidestream_core::prelude::*;
