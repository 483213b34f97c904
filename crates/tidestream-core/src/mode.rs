use serde::{Deserialize, Serialize};

/// How a delimiter-bounded segment of a streamed body is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Plain text. Segments reach processed-chunk observers and nothing else.
    Text,
    /// One JSON document per segment. Unparseable segments are dropped.
    Json,
    /// Server-Sent Events: `data: ` lines, `[DONE]` sentinel.
    #[default]
    Sse,
    /// LLM token stream, optionally processed per network slice (realtime).
    Token,
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
            Self::Sse => write!(f, "sse"),
            Self::Token => write!(f, "token"),
        }
    }
}

impl std::str::FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            "sse" => Ok(Self::Sse),
            "token" => Ok(Self::Token),
            other => Err(format!("unknown data type: '{other}'")),
        }
    }
}
