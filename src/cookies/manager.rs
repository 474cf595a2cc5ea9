//! Signed cookie encoding and the set / read / delete / flash operations.
//!
//! # Wire format
//! ```text
//! name=<base64url(value)>|<base64url(HMAC-SHA256(key, value))>
//!     ; Path=/; HttpOnly; Secure; SameSite=Strict; Max-Age=..; Expires=..
//! ```
//!
//! # Design Decisions
//! - Cookie attributes are fixed; there is no way to ask for a lax cookie
//! - The signature covers the raw value, not its base64 form
//! - Missing, malformed and forged cookies all read as `""`

use axum::http::{
    header::{COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use cookie::{Cookie, SameSite};
use time::{Duration, OffsetDateTime};

use crate::cookies::signer::{CookieSigner, SecretKey};
use crate::observability::metrics;

/// Separator between the encoded payload and its signature.
const SEPARATOR: char = '|';

/// Signs and verifies cookies with one process-wide key.
///
/// The key cannot change after construction; share the manager behind an
/// `Arc`.
#[derive(Debug, Clone)]
pub struct CookieManager {
    signer: CookieSigner,
}

impl CookieManager {
    pub fn new(key: SecretKey) -> Self {
        Self {
            signer: CookieSigner::new(key),
        }
    }

    pub fn signer(&self) -> &CookieSigner {
        &self.signer
    }

    /// Produce the signed wire value for `value`.
    pub fn encode_value(&self, value: &str) -> String {
        let encoded = URL_SAFE.encode(value.as_bytes());
        let signature = self.signer.sign(value.as_bytes());
        format!("{encoded}{SEPARATOR}{signature}")
    }

    /// Recover the value from a signed wire value.
    ///
    /// Returns `None` for anything that cannot be trusted. The reason is only
    /// recorded in metrics.
    pub fn decode_value(&self, raw: &str) -> Option<String> {
        // base64 never produces the separator, so the first one is the split
        let Some((encoded, signature)) = raw.split_once(SEPARATOR) else {
            metrics::record_cookie_rejected("malformed");
            return None;
        };

        let Ok(payload) = URL_SAFE.decode(encoded) else {
            metrics::record_cookie_rejected("encoding");
            return None;
        };

        if !self.signer.verify(&payload, signature) {
            tracing::debug!("Rejected cookie with bad signature");
            metrics::record_cookie_rejected("signature");
            return None;
        }

        match String::from_utf8(payload) {
            Ok(value) => Some(value),
            Err(_) => {
                metrics::record_cookie_rejected("utf8");
                None
            }
        }
    }

    /// Build a signed cookie. Negative `max_age_secs` is treated as zero.
    pub fn build_cookie(&self, name: &str, value: &str, max_age_secs: i64) -> Cookie<'static> {
        let max_age = Duration::seconds(max_age_secs.max(0));
        Cookie::build((name.to_string(), self.encode_value(value)))
            .path("/")
            .http_only(true)
            .secure(true)
            .same_site(SameSite::Strict)
            .max_age(max_age)
            .expires(OffsetDateTime::now_utc() + max_age)
            .build()
    }

    /// Build the cookie that tells the client to drop `name` now.
    ///
    /// `Max-Age=0` with an epoch `Expires` is what a `MaxAge < 0` deletion
    /// looks like on the wire.
    pub fn build_removal(name: &str) -> Cookie<'static> {
        Cookie::build((name.to_string(), String::new()))
            .path("/")
            .http_only(true)
            .secure(true)
            .max_age(Duration::ZERO)
            .expires(OffsetDateTime::UNIX_EPOCH)
            .build()
    }

    /// Append a signed `Set-Cookie` to `response`.
    pub fn set_cookie(&self, response: &mut HeaderMap, name: &str, value: &str, max_age_secs: i64) {
        append_set_cookie(response, &self.build_cookie(name, value, max_age_secs));
    }

    /// Read and verify `name` from the request headers. `""` when absent or
    /// untrusted.
    pub fn read_cookie(&self, request: &HeaderMap, name: &str) -> String {
        find_cookie(request, name)
            .and_then(|raw| self.decode_value(&raw))
            .unwrap_or_default()
    }

    /// Append a `Set-Cookie` that deletes `name` on the client.
    pub fn del_cookie(&self, response: &mut HeaderMap, name: &str) {
        append_set_cookie(response, &Self::build_removal(name));
    }

    /// Read `name` once, then delete it whether or not the read succeeded.
    pub fn read_flash(&self, request: &HeaderMap, response: &mut HeaderMap, name: &str) -> String {
        let value = self.read_cookie(request, name);
        self.del_cookie(response, name);
        metrics::record_flash_read();
        value
    }
}

/// Raw value of the first cookie called `name` in the request headers.
///
/// Unparseable cookie pairs are skipped.
pub fn find_cookie(request: &HeaderMap, name: &str) -> Option<String> {
    request_cookies(request)
        .into_iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v)
}

/// Every `(name, value)` pair sent in `Cookie` headers, in order.
pub fn request_cookies(request: &HeaderMap) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    for header in request.get_all(COOKIE) {
        let Ok(header) = header.to_str() else {
            continue;
        };

        for cookie in Cookie::split_parse(header) {
            let Ok(cookie) = cookie else {
                continue;
            };
            pairs.push((cookie.name().to_string(), cookie.value_trimmed().to_string()));
        }
    }
    pairs
}

pub(crate) fn append_set_cookie(response: &mut HeaderMap, cookie: &Cookie<'_>) {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            response.append(SET_COOKIE, value);
        }
        Err(_) => tracing::warn!(cookie = %cookie.name(), "Dropping cookie that is not a valid header value"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> CookieManager {
        CookieManager::new(SecretKey::new(b"0123456789abcdef0123456789abcdef".to_vec()))
    }

    fn request_with(cookie: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_str(cookie).unwrap());
        headers
    }

    /// Turn the Set-Cookie headers of a response into a request Cookie header.
    fn echo(response: &HeaderMap) -> HeaderMap {
        let mut request = HeaderMap::new();
        for value in response.get_all(SET_COOKIE) {
            let cookie = Cookie::parse(value.to_str().unwrap().to_string()).unwrap();
            let pair = format!("{}={}", cookie.name(), cookie.value());
            request.append(COOKIE, HeaderValue::from_str(&pair).unwrap());
        }
        request
    }

    #[test]
    fn test_set_then_read() {
        let manager = manager();
        let mut response = HeaderMap::new();
        manager.set_cookie(&mut response, "session", "user=42", 3600);

        let request = echo(&response);
        assert_eq!(manager.read_cookie(&request, "session"), "user=42");
    }

    #[test]
    fn test_wire_format() {
        let manager = manager();
        let wire = manager.encode_value("hello");
        let (encoded, signature) = wire.split_once('|').unwrap();

        assert_eq!(encoded, URL_SAFE.encode("hello"));
        assert_eq!(signature, manager.signer().sign(b"hello"));
    }

    #[test]
    fn test_set_cookie_attributes() {
        let mut response = HeaderMap::new();
        manager().set_cookie(&mut response, "session", "v", 3600);

        let header = response[SET_COOKIE].to_str().unwrap();
        let cookie = Cookie::parse(header.to_string()).unwrap();
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
        assert_eq!(cookie.max_age(), Some(Duration::seconds(3600)));

        let expires = cookie.expires_datetime().unwrap();
        let delta = expires - OffsetDateTime::now_utc();
        assert!(delta > Duration::seconds(3590) && delta <= Duration::seconds(3600));
    }

    #[test]
    fn test_value_containing_separator() {
        let manager = manager();
        let mut response = HeaderMap::new();
        manager.set_cookie(&mut response, "prefs", "a|b||c", 60);

        assert_eq!(manager.read_cookie(&echo(&response), "prefs"), "a|b||c");
    }

    #[test]
    fn test_missing_and_tampered_are_indistinguishable() {
        let manager = manager();
        let missing = manager.read_cookie(&HeaderMap::new(), "session");

        let wire = manager.encode_value("admin=false");
        let (_, signature) = wire.split_once('|').unwrap();
        let forged = format!("session={}|{}", URL_SAFE.encode("admin=true"), signature);
        let tampered = manager.read_cookie(&request_with(&forged), "session");

        assert_eq!(missing, "");
        assert_eq!(missing, tampered);
    }

    #[test]
    fn test_malformed_values_read_empty() {
        let manager = manager();
        for raw in [
            "session=no-separator",
            "session=!!!not-base64|sig",
            "session=|",
            "session=aGVsbG8=|wrong",
        ] {
            assert_eq!(manager.read_cookie(&request_with(raw), "session"), "", "{raw}");
        }
    }

    #[test]
    fn test_non_utf8_payload_reads_empty() {
        let manager = manager();
        let payload = [0xff, 0xfe, 0xfd];
        let raw = format!(
            "blob={}|{}",
            URL_SAFE.encode(payload),
            manager.signer().sign(&payload)
        );
        assert_eq!(manager.read_cookie(&request_with(&raw), "blob"), "");
    }

    #[test]
    fn test_signed_with_other_key_reads_empty() {
        let other = CookieManager::new(SecretKey::new(b"a different key that is long enough".to_vec()));
        let raw = format!("session={}", other.encode_value("v"));
        assert_eq!(manager().read_cookie(&request_with(&raw), "session"), "");
    }

    #[test]
    fn test_first_cookie_with_name_wins() {
        let manager = manager();
        let raw = format!(
            "theme={}; theme={}",
            manager.encode_value("dark"),
            manager.encode_value("light")
        );
        assert_eq!(manager.read_cookie(&request_with(&raw), "theme"), "dark");
    }

    #[test]
    fn test_quoted_value_is_trimmed() {
        let manager = manager();
        let raw = format!("session=\"{}\"", manager.encode_value("quoted"));
        assert_eq!(manager.read_cookie(&request_with(&raw), "session"), "quoted");
    }

    #[test]
    fn test_del_cookie_expires_in_the_past() {
        let mut response = HeaderMap::new();
        manager().del_cookie(&mut response, "session");

        let header = response[SET_COOKIE].to_str().unwrap();
        let cookie = Cookie::parse(header.to_string()).unwrap();
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        assert_eq!(cookie.expires_datetime(), Some(OffsetDateTime::UNIX_EPOCH));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_read_flash_deletes_even_when_invalid() {
        let manager = manager();
        let mut response = HeaderMap::new();
        let value = manager.read_flash(&request_with("notice=garbage"), &mut response, "notice");

        assert_eq!(value, "");
        let header = response[SET_COOKIE].to_str().unwrap();
        assert!(header.starts_with("notice=;"));
    }

    #[test]
    fn test_read_flash_returns_value_and_deletes() {
        let manager = manager();
        let mut set = HeaderMap::new();
        manager.set_cookie(&mut set, "notice", "Saved!", 60);

        let mut response = HeaderMap::new();
        let value = manager.read_flash(&echo(&set), &mut response, "notice");
        assert_eq!(value, "Saved!");

        // The client applies the removal; nothing is left to read
        let after = echo(&response);
        assert_eq!(manager.read_flash(&after, &mut HeaderMap::new(), "notice"), "");
    }

    #[test]
    fn test_negative_max_age_is_clamped() {
        let cookie = manager().build_cookie("c", "v", -5);
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }
}
