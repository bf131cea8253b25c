//! Session markers written by the old browser client.
//!
//! Earlier clients kept a JSON blob (`currentAdmin` / `currentUser`) in browser
//! storage and treated its presence as "logged in". Those blobs are never trusted
//! for authorization; requests carrying them get a deprecation warning logged and
//! the cookie expired.

use axum::http::HeaderMap;
use serde::Deserialize;

use crate::middleware::cookies::cookie_value;

pub const LEGACY_ADMIN_KEY: &str = "currentAdmin";
pub const LEGACY_BUSINESS_KEY: &str = "currentUser";

pub const LEGACY_KEYS: [&str; 2] = [LEGACY_ADMIN_KEY, LEGACY_BUSINESS_KEY];

/// Shape of the old blob, only decoded so the deprecation log can say who sent it
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacySessionMarker {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub login_time: Option<String>,
}

impl LegacySessionMarker {
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }
}

#[derive(Debug, Clone)]
pub struct LegacyCookie {
    pub name: &'static str,
    pub marker: Option<LegacySessionMarker>,
}

/// Legacy marker cookies present on a request
pub fn legacy_cookies(headers: &HeaderMap) -> Vec<LegacyCookie> {
    LEGACY_KEYS
        .iter()
        .filter_map(|name| {
            cookie_value(headers, name).map(|raw| LegacyCookie {
                name,
                marker: LegacySessionMarker::parse(&raw),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::COOKIE;

    #[test]
    fn detects_legacy_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            r#"theme=dark; currentAdmin={"id":"1","role":"super_admin","email":"a@b.c","loginTime":"2024-01-01"}"#
                .parse()
                .unwrap(),
        );

        let found = legacy_cookies(&headers);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, LEGACY_ADMIN_KEY);
        let marker = found[0].marker.as_ref().unwrap();
        assert_eq!(marker.role.as_deref(), Some("super_admin"));
        assert_eq!(marker.login_time.as_deref(), Some("2024-01-01"));
    }

    #[test]
    fn undecodable_marker_is_still_reported() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, "currentUser=%7B%22email%22%7D".parse().unwrap());

        let found = legacy_cookies(&headers);
        assert_eq!(found.len(), 1);
        assert!(found[0].marker.is_none());
    }

    #[test]
    fn no_legacy_cookies() {
        assert!(legacy_cookies(&HeaderMap::new()).is_empty());
    }
}
