//! Buffering and per-mode segment processing.
//!
//! [`ChunkProcessor`] owns the text buffer of one session. Body slices go in
//! through [`ChunkProcessor::feed`]; the processor decodes them, hands the
//! decoded text to raw observers, buffers it, cuts delimiter-bounded
//! segments out of the buffer and interprets each according to the
//! configured [`DataType`]. [`ChunkProcessor::finish`] flushes whatever is
//! left when the body ends.

use serde_json::{Value, json};

use crate::config::StreamOptions;
use crate::decoder::Utf8Decoder;
use crate::mode::DataType;
use crate::observer::Observers;

pub const SSE_DATA_PREFIX: &str = "data: ";
pub const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug)]
pub struct ChunkProcessor {
    options: StreamOptions,
    decoder: Utf8Decoder,
    buffer: String,
    segments: usize,
}

impl ChunkProcessor {
    pub fn new(options: StreamOptions) -> Self {
        Self {
            options,
            decoder: Utf8Decoder::new(),
            buffer: String::new(),
            segments: 0,
        }
    }

    pub fn options(&self) -> &StreamOptions {
        &self.options
    }

    /// Text received but not yet cut into a segment.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Number of segments handed to the mode procedure so far.
    pub fn segments_processed(&self) -> usize {
        self.segments
    }

    /// Process one body slice.
    pub fn feed(&mut self, bytes: &[u8], observers: &mut Observers) {
        let text = self.decoder.decode(bytes);
        if !text.is_empty() {
            self.feed_text(&text, observers);
        }
    }

    /// Process already-decoded text as if it were one body slice.
    pub fn feed_text(&mut self, text: &str, observers: &mut Observers) {
        observers.emit_raw(text);
        if observers.is_halted() {
            return;
        }

        self.buffer.push_str(text);

        if self.options.is_realtime_token() && !text.trim().is_empty() {
            self.process_realtime_token(text, observers);
            self.buffer.clear();
            return;
        }

        if self.options.delimiter.is_empty() {
            return;
        }
        while let Some(pos) = self.buffer.find(self.options.delimiter.as_str()) {
            if observers.is_halted() {
                return;
            }
            let segment: String = self.buffer[..pos].to_string();
            self.buffer.drain(..pos + self.options.delimiter.len());
            self.process_segment(&segment, observers);
        }
    }

    /// End of stream: flush the decoder and any non-blank remainder.
    pub fn finish(&mut self, observers: &mut Observers) {
        let tail = self.decoder.finish();
        if !tail.is_empty() {
            self.feed_text(&tail, observers);
        }
        if observers.is_halted() {
            return;
        }

        let rest = std::mem::take(&mut self.buffer);
        if !rest.trim().is_empty() {
            if self.options.debug {
                tracing::debug!(len = rest.len(), "flushing trailing buffer");
            }
            self.process_segment(&rest, observers);
        }
    }

    fn process_segment(&mut self, segment: &str, observers: &mut Observers) {
        if self.options.ignore_empty_chunks && segment.trim().is_empty() {
            return;
        }
        self.segments += 1;

        match self.options.data_type {
            DataType::Text => observers.emit_chunk(segment),
            DataType::Json => {
                observers.emit_chunk(segment);
                match serde_json::from_str::<Value>(segment) {
                    Ok(value) => observers.emit_json(&value),
                    Err(err) => {
                        if self.options.debug {
                            tracing::debug!(error = %err, "dropping non-JSON segment");
                        }
                    }
                }
            }
            DataType::Sse => {
                observers.emit_chunk(segment);
                self.process_sse(segment, observers);
            }
            DataType::Token => {
                observers.emit_chunk(segment);
                if let Some(token) = self.normalize_token(segment) {
                    observers.emit_json(&self.parse_or_wrap(token));
                }
            }
        }
    }

    fn process_sse(&self, segment: &str, observers: &mut Observers) {
        for line in segment.split('\n') {
            let line = line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let Some(data) = line.strip_prefix(SSE_DATA_PREFIX) else {
                continue;
            };
            if data == DONE_SENTINEL {
                continue;
            }
            observers.emit_json(&self.parse_or_wrap(data));
        }
    }

    /// One realtime slice: processed-chunk observers see the normalised
    /// token rather than the slice itself.
    fn process_realtime_token(&self, text: &str, observers: &mut Observers) {
        if let Some(token) = self.normalize_token(text) {
            observers.emit_chunk(token);
            observers.emit_json(&self.parse_or_wrap(token));
        }
    }

    /// Strip `data: ` and one trailing delimiter. `None` for `[DONE]`.
    fn normalize_token<'a>(&self, text: &'a str) -> Option<&'a str> {
        let mut token = text.strip_prefix(SSE_DATA_PREFIX).unwrap_or(text);
        if !self.options.delimiter.is_empty() {
            token = token
                .strip_suffix(self.options.delimiter.as_str())
                .unwrap_or(token);
        }
        (token != DONE_SENTINEL).then_some(token)
    }

    /// Parse `data` as JSON, or wrap it as `{"content": data}`.
    fn parse_or_wrap(&self, data: &str) -> Value {
        serde_json::from_str(data).unwrap_or_else(|_| {
            if self.options.debug {
                tracing::debug!(data, "payload is not JSON, wrapping as content");
            }
            json!({ "content": data })
        })
    }
}
