use axum::http::{header, HeaderMap};
use uuid::Uuid;

use crate::config::SessionConfig;

pub fn session_cookie(cfg: &SessionConfig, token: Uuid) -> String {
    build_cookie(cfg, &token.to_string(), cfg.ttl_minutes.max(0) * 60)
}

pub fn clear_session_cookie(cfg: &SessionConfig) -> String {
    build_cookie(cfg, "", 0)
}

fn build_cookie(cfg: &SessionConfig, value: &str, max_age_secs: i64) -> String {
    let mut cookie = format!(
        "{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
        cfg.cookie_name, value, max_age_secs
    );
    if cfg.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

/// Session token carried by the request's `Cookie` headers.
pub fn session_from_cookies(headers: &HeaderMap, cookie_name: &str) -> Option<Uuid> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn cfg(secure: bool) -> SessionConfig {
        SessionConfig {
            ttl_minutes: 60 * 24,
            cookie_name: "exoai.sid".into(),
            secure_cookie: secure,
            enforce: false,
        }
    }

    #[test]
    fn cookie_attributes_follow_environment() {
        let token = Uuid::new_v4();
        let dev = session_cookie(&cfg(false), token);
        assert!(dev.starts_with(&format!("exoai.sid={token};")));
        assert!(dev.contains("HttpOnly"));
        assert!(dev.contains("Max-Age=86400"));
        assert!(!dev.contains("Secure"));
        assert!(session_cookie(&cfg(true), token).ends_with("; Secure"));
        assert!(clear_session_cookie(&cfg(false)).contains("Max-Age=0"));
    }

    #[test]
    fn finds_session_among_other_cookies() {
        let token = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(
            header::COOKIE,
            HeaderValue::from_str(&format!("lang=en; exoai.sid={token}")).unwrap(),
        );
        assert_eq!(session_from_cookies(&headers, "exoai.sid"), Some(token));
        assert_eq!(session_from_cookies(&headers, "missing"), None);
    }

    #[test]
    fn ignores_malformed_session_values() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("exoai.sid=garbage"));
        assert_eq!(session_from_cookies(&headers, "exoai.sid"), None);
    }
}
