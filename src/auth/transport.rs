//! Moving the session token between client and server.
//!
//! The session service only deals in token strings; this module is the
//! boundary that reads them from a request and writes them to a response.

use axum::http::{
    header::{AUTHORIZATION, COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use tracing::warn;

use crate::config::SessionConfig;

pub trait TokenTransport {
    /// The bearer token presented by the caller, if any.
    fn read_token(&self) -> Option<String>;
    /// Deliver a freshly issued token to the caller.
    fn attach_token(&mut self, token: &str);
    /// Tell the caller to forget its token.
    fn clear_token(&mut self);
}

/// Attributes of the session cookie.
#[derive(Debug, Clone)]
pub struct SessionCookie {
    pub name: String,
    pub max_age_secs: u64,
    pub secure: bool,
}

impl SessionCookie {
    pub fn from_config(cfg: &SessionConfig) -> Self {
        Self {
            name: cfg.cookie_name.clone(),
            max_age_secs: u64::from(cfg.max_age_days) * 24 * 60 * 60,
            secure: cfg.secure,
        }
    }

    fn header(&self, value: &str, max_age_secs: u64) -> String {
        let mut cookie = format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            self.name, value, max_age_secs
        );
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    pub fn set_header(&self, token: &str) -> String {
        self.header(token, self.max_age_secs)
    }

    pub fn clear_header(&self) -> String {
        self.header("", 0)
    }
}

/// Cookie transport over axum headers. Reads the session cookie first and
/// falls back to `Authorization: Bearer`.
pub struct CookieTransport<'a> {
    cookie: &'a SessionCookie,
    inbound: Option<&'a HeaderMap>,
    outbound: HeaderMap,
}

impl<'a> CookieTransport<'a> {
    pub fn new(cookie: &'a SessionCookie, inbound: &'a HeaderMap) -> Self {
        Self {
            cookie,
            inbound: Some(inbound),
            outbound: HeaderMap::new(),
        }
    }

    /// Transport that only writes, for responses to unauthenticated requests.
    pub fn outbound(cookie: &'a SessionCookie) -> Self {
        Self {
            cookie,
            inbound: None,
            outbound: HeaderMap::new(),
        }
    }

    pub fn into_headers(self) -> HeaderMap {
        self.outbound
    }

    fn push_set_cookie(&mut self, value: String) {
        match HeaderValue::from_str(&value) {
            Ok(v) => {
                self.outbound.append(SET_COOKIE, v);
            }
            Err(_) => {
                warn!(cookie = %self.cookie.name, "session cookie is not a valid header value")
            }
        }
    }

    fn cookie_token(&self, headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, value)| *name == self.cookie.name && !value.is_empty())
            .map(|(_, value)| value.to_string())
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = auth
        .strip_prefix("Bearer ")
        .or_else(|| auth.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| token.to_string())
}

impl TokenTransport for CookieTransport<'_> {
    fn read_token(&self) -> Option<String> {
        let headers = self.inbound?;
        self.cookie_token(headers).or_else(|| bearer_token(headers))
    }

    fn attach_token(&mut self, token: &str) {
        let value = self.cookie.set_header(token);
        self.push_set_cookie(value);
    }

    fn clear_token(&mut self) {
        let value = self.cookie.clear_header();
        self.push_set_cookie(value);
    }
}
