/// True when `address` already names an `http` or `https` target.
pub fn is_absolute(address: &str) -> bool {
    let lower = address.get(..8).unwrap_or(address).to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Join `address` onto `base` unless it is already absolute.
///
/// Exactly one `/` separates the two parts. An empty base leaves the
/// address untouched.
pub fn resolve_url(base: &str, address: &str) -> String {
    if is_absolute(address) || base.is_empty() {
        return address.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        address.trim_start_matches('/')
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absolute_addresses_are_kept() {
        assert_eq!(
            resolve_url("http://api.local", "https://other.host/x"),
            "https://other.host/x"
        );
        assert_eq!(resolve_url("http://api.local", "HTTP://Up.per/"), "HTTP://Up.per/");
    }

    #[test]
    fn relative_address_joined_with_single_slash() {
        assert_eq!(
            resolve_url("http://api.local/v1", "chat/stream"),
            "http://api.local/v1/chat/stream"
        );
        assert_eq!(
            resolve_url("http://api.local/v1/", "/chat/stream"),
            "http://api.local/v1/chat/stream"
        );
        assert_eq!(
            resolve_url("http://api.local//", "//chat"),
            "http://api.local/chat"
        );
    }

    #[test]
    fn empty_base_leaves_address() {
        assert_eq!(resolve_url("", "/chat/stream"), "/chat/stream");
    }

    #[test]
    fn scheme_like_prefixes_are_not_absolute() {
        assert!(!is_absolute("httpbin/get"));
        assert!(!is_absolute("localhost:8080/x"));
        assert!(is_absolute("https://a"));
    }
}
