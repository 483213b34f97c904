use serde::{Deserialize, Serialize};

use crate::mode::DataType;

pub const DEFAULT_DELIMITER: &str = "\n\n";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_CONTENT_TYPE: &str = "application/json";
pub const DEFAULT_TOKEN_HEADER: &str = "Authorization";

pub const ENV_BASE_URL: &str = "TIDESTREAM_BASE_URL";
pub const ENV_TIMEOUT_MS: &str = "TIDESTREAM_TIMEOUT_MS";
pub const ENV_DEBUG: &str = "TIDESTREAM_DEBUG";

/// Options for a single streamed request.
///
/// Every field has a default, so partial maps deserialize cleanly:
///
/// ```
/// use tidestream_core::config::StreamOptions;
/// use tidestream_core::mode::DataType;
///
/// let opts: StreamOptions =
///     serde_json::from_str(r#"{"dataType":"token","realtime":true}"#).unwrap();
/// assert_eq!(opts.data_type, DataType::Token);
/// assert_eq!(opts.delimiter, "\n\n");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StreamOptions {
    /// Emit diagnostic `tracing` events for this request.
    pub debug: bool,

    /// Segment interpretation strategy.
    pub data_type: DataType,

    /// Segment boundary. Ignored on the realtime token path.
    pub delimiter: String,

    /// Drop whitespace-only segments before dispatch.
    pub ignore_empty_chunks: bool,

    /// Abort the whole transfer after this many milliseconds. `0` disables.
    #[serde(rename = "timeout")]
    pub timeout_ms: u64,

    /// Prefix for addresses that are not already absolute.
    pub base_url: String,

    /// Attach the credential header when a token is available.
    #[serde(alias = "withToken")]
    pub with_auth_token: bool,

    pub content_type: String,

    /// With `DataType::Token`, process every decoded slice immediately.
    pub realtime: bool,

    /// Header carrying the credential.
    pub token_header: String,

    /// Scheme written before the token, e.g. `Bearer`. `None` sends the bare token.
    pub token_scheme: Option<String>,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            debug: false,
            data_type: DataType::Sse,
            delimiter: DEFAULT_DELIMITER.to_string(),
            ignore_empty_chunks: true,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            base_url: String::new(),
            with_auth_token: true,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            realtime: false,
            token_header: DEFAULT_TOKEN_HEADER.to_string(),
            token_scheme: Some("Bearer".to_string()),
        }
    }
}

impl StreamOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with `TIDESTREAM_BASE_URL`, `TIDESTREAM_TIMEOUT_MS`
    /// and `TIDESTREAM_DEBUG`. Unparseable values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut opts = Self::default();
        if let Some(base) = lookup(ENV_BASE_URL) {
            opts.base_url = base;
        }
        if let Some(ms) = lookup(ENV_TIMEOUT_MS).and_then(|v| v.trim().parse().ok()) {
            opts.timeout_ms = ms;
        }
        if let Some(flag) = lookup(ENV_DEBUG) {
            opts.debug = matches!(flag.trim(), "1" | "true" | "yes" | "on");
        }
        opts
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_data_type(mut self, data_type: DataType) -> Self {
        self.data_type = data_type;
        self
    }

    pub fn with_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    pub fn with_ignore_empty_chunks(mut self, ignore: bool) -> Self {
        self.ignore_empty_chunks = ignore;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_auth_token(mut self, with_auth_token: bool) -> Self {
        self.with_auth_token = with_auth_token;
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    pub fn with_realtime(mut self, realtime: bool) -> Self {
        self.realtime = realtime;
        self
    }

    pub fn with_token_header(
        mut self,
        header: impl Into<String>,
        scheme: Option<impl Into<String>>,
    ) -> Self {
        self.token_header = header.into();
        self.token_scheme = scheme.map(Into::into);
        self
    }

    pub fn timeout(&self) -> Option<std::time::Duration> {
        (self.timeout_ms > 0).then(|| std::time::Duration::from_millis(self.timeout_ms))
    }

    /// True when slices bypass delimiter splitting.
    pub fn is_realtime_token(&self) -> bool {
        self.realtime && self.data_type == DataType::Token
    }
}
