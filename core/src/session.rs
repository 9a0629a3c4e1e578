//! Session cookies scoped to the origin of the API base URL.
//!
//! # Design
//! A browser would keep these cookies in its own jar and attach them to
//! same-origin requests. Here the jar is an explicit value shared by every
//! call made through one `Fetcher`, so tests can inspect and seed it.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use cookie::time::{Duration, OffsetDateTime};
use cookie::Cookie;
use url::Url;

#[derive(Debug)]
pub struct Session {
    origin: String,
    cookies: Mutex<BTreeMap<String, String>>,
}

impl Session {
    pub fn new(base_url: &Url) -> Self {
        Self {
            origin: base_url.origin().ascii_serialization(),
            cookies: Mutex::new(BTreeMap::new()),
        }
    }

    /// `scheme://host[:port]` of the API.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn is_same_origin(&self, url: &str) -> bool {
        Url::parse(url)
            .map(|url| url.origin().ascii_serialization() == self.origin)
            .unwrap_or(false)
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        self.jar().get(name).cloned()
    }

    pub fn set_cookie(&self, name: impl Into<String>, value: impl Into<String>) {
        self.jar().insert(name.into(), value.into());
    }

    /// Value for a `Cookie` request header, if the jar holds anything.
    pub fn cookie_header(&self) -> Option<String> {
        let jar = self.jar();
        if jar.is_empty() {
            return None;
        }
        let pairs: Vec<String> = jar
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        Some(pairs.join("; "))
    }

    /// Apply every `Set-Cookie` header in `headers`. An empty value, a
    /// non-positive `Max-Age` or an `Expires` in the past deletes the cookie.
    /// Headers that do not parse as a cookie are skipped.
    pub fn store_set_cookies(&self, headers: &[(String, String)]) {
        let mut jar = self.jar();
        for (_, raw) in headers
            .iter()
            .filter(|(name, _)| name.eq_ignore_ascii_case("set-cookie"))
        {
            let Ok(cookie) = Cookie::parse(raw.as_str()) else {
                continue;
            };
            let value = cookie.value_trimmed();
            if value.is_empty() || is_expired(&cookie) {
                jar.remove(cookie.name());
            } else {
                jar.insert(cookie.name().to_string(), value.to_string());
            }
        }
    }

    pub fn clear(&self) {
        self.jar().clear();
    }

    fn jar(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.cookies.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn is_expired(cookie: &Cookie<'_>) -> bool {
    cookie.max_age().is_some_and(|age| age <= Duration::ZERO)
        || cookie
            .expires_datetime()
            .is_some_and(|at| at <= OffsetDateTime::now_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(&Url::parse("http://localhost:8080/app/").unwrap())
    }

    fn set_cookie(value: &str) -> Vec<(String, String)> {
        vec![("Set-Cookie".to_string(), value.to_string())]
    }

    #[test]
    fn origin_ignores_path() {
        let session = session();
        assert_eq!(session.origin(), "http://localhost:8080");
        assert!(session.is_same_origin("http://localhost:8080/rest/user"));
        assert!(!session.is_same_origin("http://localhost:9090/rest/user"));
        assert!(!session.is_same_origin("https://localhost:8080/rest/user"));
        assert!(!session.is_same_origin("http://evil.example/rest/user"));
        assert!(!session.is_same_origin("rest/user"));
    }

    #[test]
    fn set_cookie_is_stored_without_attributes() {
        let session = session();
        session.store_set_cookies(&set_cookie("USER_TOKEN=abc; Path=/; HttpOnly"));
        assert_eq!(session.cookie("USER_TOKEN").as_deref(), Some("abc"));
        assert_eq!(session.cookie_header().as_deref(), Some("USER_TOKEN=abc"));
    }

    #[test]
    fn max_age_zero_deletes_cookie() {
        let session = session();
        session.set_cookie("USER_TOKEN", "abc");
        session.store_set_cookies(&set_cookie("USER_TOKEN=; Path=/; Max-Age=0"));
        assert!(session.cookie("USER_TOKEN").is_none());
        assert!(session.cookie_header().is_none());

        session.set_cookie("USER_TOKEN", "abc");
        session.store_set_cookies(&set_cookie("USER_TOKEN=abc; max-age=0"));
        assert!(session.cookie("USER_TOKEN").is_none());
    }

    #[test]
    fn quoted_values_are_unquoted() {
        let session = session();
        session.store_set_cookies(&set_cookie("USER_TOKEN=\"abc\"; Path=/"));
        assert_eq!(session.cookie("USER_TOKEN").as_deref(), Some("abc"));
    }

    #[test]
    fn past_expires_deletes_cookie() {
        let session = session();
        session.set_cookie("USER_TOKEN", "abc");
        session.store_set_cookies(&set_cookie(
            "USER_TOKEN=abc; Path=/; Expires=Thu, 01 Jan 1970 00:00:01 GMT",
        ));
        assert!(session.cookie("USER_TOKEN").is_none());

        session.store_set_cookies(&set_cookie(
            "USER_TOKEN=def; Expires=Wed, 01 Jan 2200 00:00:00 GMT",
        ));
        assert_eq!(session.cookie("USER_TOKEN").as_deref(), Some("def"));
    }

    #[test]
    fn malformed_set_cookie_is_ignored() {
        let session = session();
        session.set_cookie("USER_TOKEN", "abc");
        session.store_set_cookies(&set_cookie("=nameless"));
        session.store_set_cookies(&set_cookie("no-equals-sign"));
        assert_eq!(session.cookie_header().as_deref(), Some("USER_TOKEN=abc"));
    }

    #[test]
    fn several_cookies_join_in_one_header() {
        let session = session();
        session.store_set_cookies(&[
            ("set-cookie".to_string(), "b=2".to_string()),
            ("content-type".to_string(), "a=1".to_string()),
            ("set-cookie".to_string(), "a=1; Max-Age=3600".to_string()),
        ]);
        assert_eq!(session.cookie_header().as_deref(), Some("a=1; b=2"));
        session.clear();
        assert!(session.cookie_header().is_none());
    }
}
