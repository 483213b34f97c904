//! Incremental UTF-8 decoding for body slices.

const REPLACEMENT: char = '\u{FFFD}';

/// Decodes a byte stream slice by slice.
///
/// A multi-byte sequence split across two slices is held back until the
/// rest arrives. Invalid sequences become U+FFFD.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next slice, keeping any trailing partial sequence.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let joined;
        let mut rest: &[u8] = if self.pending.is_empty() {
            bytes
        } else {
            let mut buf = std::mem::take(&mut self.pending);
            buf.extend_from_slice(bytes);
            joined = buf;
            &joined
        };

        let mut out = String::with_capacity(rest.len());
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    out.push_str(text);
                    break;
                }
                Err(err) => {
                    let (valid, tail) = rest.split_at(err.valid_up_to());
                    if let Ok(text) = std::str::from_utf8(valid) {
                        out.push_str(text);
                    }
                    match err.error_len() {
                        Some(len) => {
                            out.push(REPLACEMENT);
                            rest = &tail[len..];
                        }
                        None => {
                            // Incomplete sequence at the end: wait for more bytes.
                            self.pending = tail.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        out
    }

    /// Flush at end of stream. A dangling partial sequence becomes U+FFFD.
    pub fn finish(&mut self) -> String {
        if self.pending.is_empty() {
            String::new()
        } else {
            self.pending.clear();
            REPLACEMENT.to_string()
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ascii_passes_through() {
        let mut dec = Utf8Decoder::new();
        assert_eq!(dec.decode(b"hello"), "hello");
        assert!(!dec.has_pending());
    }

    #[test]
    fn split_multibyte_sequence() {
        let bytes = "你好".as_bytes();
        let mut dec = Utf8Decoder::new();
        assert_eq!(dec.decode(&bytes[..1]), "");
        assert!(dec.has_pending());
        assert_eq!(dec.decode(&bytes[1..4]), "你");
        assert_eq!(dec.decode(&bytes[4..]), "好");
        assert_eq!(dec.finish(), "");
    }

    #[test]
    fn byte_by_byte_emoji() {
        let bytes = "a😀b".as_bytes();
        let mut dec = Utf8Decoder::new();
        let out: String = bytes.iter().map(|b| dec.decode(&[*b])).collect();
        assert_eq!(out, "a😀b");
    }

    #[test]
    fn invalid_byte_is_replaced() {
        let mut dec = Utf8Decoder::new();
        assert_eq!(dec.decode(b"a\xffb"), "a\u{FFFD}b");
    }

    #[test]
    fn truncated_sequence_flushes_as_replacement() {
        let mut dec = Utf8Decoder::new();
        assert_eq!(dec.decode(&"é".as_bytes()[..1]), "");
        assert_eq!(dec.finish(), "\u{FFFD}");
        assert!(!dec.has_pending());
    }
}
