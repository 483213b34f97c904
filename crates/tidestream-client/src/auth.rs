//! Credential sources for the auth header.

use std::sync::{Arc, RwLock};

/// Supplies the credential token at request construction time.
pub trait TokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

/// A fixed token.
#[derive(Debug, Clone)]
pub struct StaticToken(pub String);

impl TokenProvider for StaticToken {
    fn token(&self) -> Option<String> {
        (!self.0.is_empty()).then(|| self.0.clone())
    }
}

/// Reads the token from an environment variable on every request.
#[derive(Debug, Clone)]
pub struct EnvToken {
    var: String,
}

impl EnvToken {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl TokenProvider for EnvToken {
    fn token(&self) -> Option<String> {
        std::env::var(&self.var).ok().filter(|t| !t.is_empty())
    }
}

/// Process-wide token updated on login/logout and read by every session.
#[derive(Debug, Clone, Default)]
pub struct SharedToken {
    inner: Arc<RwLock<Option<String>>>,
}

impl SharedToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, token: impl Into<String>) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = Some(token.into());
        }
    }

    pub fn clear(&self) {
        if let Ok(mut guard) = self.inner.write() {
            *guard = None;
        }
    }
}

impl TokenProvider for SharedToken {
    fn token(&self) -> Option<String> {
        self.inner.read().ok().and_then(|guard| guard.clone())
    }
}

/// Render the header value for `token` under `scheme`.
pub fn header_value(token: &str, scheme: Option<&str>) -> String {
    match scheme {
        Some(scheme) if !scheme.is_empty() => format!("{scheme} {token}"),
        _ => token.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_token() {
        assert_eq!(StaticToken("abc".into()).token().as_deref(), Some("abc"));
        assert!(StaticToken(String::new()).token().is_none());
    }

    #[test]
    fn shared_token_updates_are_visible_to_clones() {
        let shared = SharedToken::new();
        let reader = shared.clone();
        assert!(reader.token().is_none());
        shared.set("t1");
        assert_eq!(reader.token().as_deref(), Some("t1"));
        shared.clear();
        assert!(reader.token().is_none());
    }

    #[test]
    fn env_token_missing_variable() {
        let provider = EnvToken::new("TIDESTREAM_TEST_TOKEN_THAT_IS_NEVER_SET");
        assert!(provider.token().is_none());
    }

    #[test]
    fn header_value_with_and_without_scheme() {
        assert_eq!(header_value("abc", Some("Bearer")), "Bearer abc");
        assert_eq!(header_value("abc", None), "abc");
        assert_eq!(header_value("abc", Some("")), "abc");
    }

    #[test]
    fn providers_are_object_safe() {
        let providers: Vec<Arc<dyn TokenProvider>> = vec![
            Arc::new(StaticToken("a".into())),
            Arc::new(SharedToken::new()),
        ];
        assert_eq!(providers[0].token().as_deref(), Some("a"));
        assert!(providers[1].token().is_none());
    }
}
