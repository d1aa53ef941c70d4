//! Cookie Management Infrastructure
//!
//! Builders for the secure session cookies. Session tokens travel only
//! as HttpOnly + Secure + SameSite=Strict cookies with an absolute
//! Expires matching the store-side expiry.

use axum::http::{HeaderMap, HeaderValue, header};
use chrono::{DateTime, Utc};

/// SameSite policy for cookies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    #[default]
    Strict,
    Lax,
    None,
}

impl SameSite {
    pub fn as_str(&self) -> &'static str {
        match self {
            SameSite::Strict => "Strict",
            SameSite::Lax => "Lax",
            SameSite::None => "None",
        }
    }
}

/// Cookie configuration
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: SameSite,
    pub path: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "session".to_string(),
            secure: true,
            http_only: true,
            same_site: SameSite::Strict,
            path: "/".to_string(),
        }
    }
}

impl CookieConfig {
    /// Build Set-Cookie header value with an absolute expiry
    pub fn build_set_cookie(&self, value: &str, expires: DateTime<Utc>) -> String {
        let mut cookie = format!("{}={}", self.name, value);

        if self.http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie.push_str(&format!("; SameSite={}", self.same_site.as_str()));
        cookie.push_str(&format!("; Path={}", self.path));
        cookie.push_str(&format!(
            "; Expires={}",
            expires.format("%a, %d %b %Y %H:%M:%S GMT")
        ));

        cookie
    }

    /// Build Set-Cookie header for deletion (expired)
    pub fn build_delete_cookie(&self) -> String {
        format!("{}=; HttpOnly; Path={}; Max-Age=0", self.name, self.path)
    }
}

/// Extract a cookie value from headers
pub fn extract_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|cookie| {
            let (key, value) = cookie.trim().split_once('=')?;

            if key == name {
                Some(value.to_string())
            } else {
                None
            }
        })
}

/// Create a Set-Cookie header value
pub fn set_cookie_header(
    config: &CookieConfig,
    value: &str,
    expires: DateTime<Utc>,
) -> HeaderValue {
    HeaderValue::from_str(&config.build_set_cookie(value, expires))
        .unwrap_or_else(|_| HeaderValue::from_static(""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_cookie_config_build() {
        let config = CookieConfig {
            name: "access_token".to_string(),
            secure: true,
            http_only: true,
            same_site: SameSite::Strict,
            path: "/".to_string(),
        };

        let expires = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();
        let cookie = config.build_set_cookie("value123", expires);
        assert!(cookie.contains("access_token=value123"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Expires=Sun, 01 Mar 2026 12:30:00 GMT"));
    }

    #[test]
    fn test_refresh_cookie_path_scoping() {
        let config = CookieConfig {
            name: "refresh_token".to_string(),
            path: "/api/auth/refresh".to_string(),
            ..Default::default()
        };

        let cookie = config.build_set_cookie("tok", Utc::now());
        assert!(cookie.contains("Path=/api/auth/refresh"));
    }

    #[test]
    fn test_extract_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("foo=bar; session=abc123; other=xyz"),
        );

        assert_eq!(
            extract_cookie(&headers, "session"),
            Some("abc123".to_string())
        );
        assert_eq!(extract_cookie(&headers, "foo"), Some("bar".to_string()));
        assert_eq!(extract_cookie(&headers, "missing"), None);
    }
}
