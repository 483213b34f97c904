//! Callback registry for a streamed request.

use serde_json::Value;

use crate::abort::AbortHandle;
use crate::error::StreamError;

pub type ChunkHandler = Box<dyn FnMut(&str) + Send>;
pub type JsonHandler = Box<dyn FnMut(&Value) + Send>;
pub type ErrorHandler = Box<dyn FnMut(&StreamError) + Send>;
pub type CompleteHandler = Box<dyn FnMut() + Send>;

/// Observers of one session, dispatched in registration order per kind.
///
/// Once the attached [`AbortHandle`] fires, chunk, JSON and completion
/// dispatch stop. Error observers still run so the cancellation itself
/// can be reported.
#[derive(Default)]
pub struct Observers {
    raw: Vec<ChunkHandler>,
    chunk: Vec<ChunkHandler>,
    json: Vec<JsonHandler>,
    error: Vec<ErrorHandler>,
    complete: Vec<CompleteHandler>,
    abort: Option<AbortHandle>,
}

impl std::fmt::Debug for Observers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observers")
            .field("raw", &self.raw.len())
            .field("chunk", &self.chunk.len())
            .field("json", &self.json.len())
            .field("error", &self.error.len())
            .field("complete", &self.complete.len())
            .finish()
    }
}

impl Observers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop chunk/JSON/completion dispatch once `handle` is aborted.
    pub fn attach_abort(&mut self, handle: AbortHandle) {
        self.abort = Some(handle);
    }

    /// `raw = true` receives every decoded slice before buffering;
    /// `raw = false` receives logically complete segments.
    pub fn on_chunk(&mut self, handler: impl FnMut(&str) + Send + 'static, raw: bool) {
        if raw {
            self.raw.push(Box::new(handler));
        } else {
            self.chunk.push(Box::new(handler));
        }
    }

    pub fn on_json(&mut self, handler: impl FnMut(&Value) + Send + 'static) {
        self.json.push(Box::new(handler));
    }

    pub fn on_error(&mut self, handler: impl FnMut(&StreamError) + Send + 'static) {
        self.error.push(Box::new(handler));
    }

    pub fn on_complete(&mut self, handler: impl FnMut() + Send + 'static) {
        self.complete.push(Box::new(handler));
    }

    pub fn is_halted(&self) -> bool {
        self.abort.as_ref().is_some_and(AbortHandle::is_aborted)
    }

    pub fn emit_raw(&mut self, text: &str) {
        if self.is_halted() {
            return;
        }
        for handler in &mut self.raw {
            handler(text);
        }
    }

    pub fn emit_chunk(&mut self, chunk: &str) {
        if self.is_halted() {
            return;
        }
        for handler in &mut self.chunk {
            handler(chunk);
        }
    }

    pub fn emit_json(&mut self, value: &Value) {
        if self.is_halted() {
            return;
        }
        for handler in &mut self.json {
            handler(value);
        }
    }

    pub fn emit_error(&mut self, err: &StreamError) {
        for handler in &mut self.error {
            handler(err);
        }
    }

    pub fn emit_complete(&mut self) {
        if self.is_halted() {
            return;
        }
        for handler in &mut self.complete {
            handler();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn raw_and_processed_are_separate() {
        let log = Arc::new(Mutex::new(Vec::<String>::new()));
        let mut obs = Observers::new();
        let l1 = log.clone();
        obs.on_chunk(move |c| l1.lock().unwrap().push(format!("raw:{c}")), true);
        let l2 = log.clone();
        obs.on_chunk(move |c| l2.lock().unwrap().push(format!("chunk:{c}")), false);

        obs.emit_raw("a");
        obs.emit_chunk("b");
        assert_eq!(*log.lock().unwrap(), vec!["raw:a", "chunk:b"]);
    }

    #[test]
    fn registration_order_is_kept() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut obs = Observers::new();
        for i in 0..3 {
            let l = log.clone();
            obs.on_json(move |_| l.lock().unwrap().push(i));
        }
        obs.emit_json(&serde_json::json!({}));
        assert_eq!(*log.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn abort_halts_everything_but_errors() {
        let log = Arc::new(Mutex::new(Vec::<String>::new()));
        let mut obs = Observers::new();
        let handle = AbortHandle::new();
        obs.attach_abort(handle.clone());

        let l = log.clone();
        obs.on_chunk(move |c| l.lock().unwrap().push(c.to_string()), false);
        let l = log.clone();
        obs.on_error(move |e| l.lock().unwrap().push(e.to_string()));
        let l = log.clone();
        obs.on_complete(move || l.lock().unwrap().push("done".into()));

        handle.abort();
        assert!(obs.is_halted());
        obs.emit_chunk("ignored");
        obs.emit_complete();
        obs.emit_error(&StreamError::Cancelled(crate::error::CancelReason::User));
        assert_eq!(*log.lock().unwrap(), vec!["Request aborted"]);
    }

    #[test]
    fn debug_shows_counts() {
        let mut obs = Observers::new();
        obs.on_complete(|| {});
        let dbg = format!("{obs:?}");
        assert!(dbg.contains("complete: 1"));
    }
}
