//! Request and response model seen by the agent
//!
//! Requests carry a method and an absolute URL; the cache key is the
//! method plus the URL with any fragment removed. Responses are plain
//! owned values, so "cloning before returning" is an ordinary `Clone`.

use crate::error::{ShellcacheError, ShellcacheResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::{Origin, Url};

/// HTTP request method
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
    /// Any other token, stored upper-cased
    Other(String),
}

impl Method {
    /// Only GET is treated as read-only by the agent
    pub fn is_read_only(&self) -> bool {
        matches!(self, Self::Get)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Get => "GET",
            Self::Head => "HEAD",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Other(token) => token,
        }
    }
}

impl FromStr for Method {
    type Err = ShellcacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim().to_ascii_uppercase();
        if token.is_empty() || !token.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ShellcacheError::User(format!("Invalid HTTP method: {}", s)));
        }
        Ok(match token.as_str() {
            "GET" => Self::Get,
            "HEAD" => Self::Head,
            "POST" => Self::Post,
            "PUT" => Self::Put,
            "PATCH" => Self::Patch,
            "DELETE" => Self::Delete,
            "OPTIONS" => Self::Options,
            _ => Self::Other(token),
        })
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An intercepted outgoing request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub url: Url,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url }
    }

    /// Build a GET request
    pub fn get(url: Url) -> Self {
        Self::new(Method::Get, url)
    }

    /// Parse an absolute URL into a request
    pub fn parse(method: Method, url: &str) -> ShellcacheResult<Self> {
        let url = parse_url(url)?;
        Ok(Self::new(method, url))
    }

    /// Origin (scheme, host, port) of the request URL
    pub fn origin(&self) -> Origin {
        self.url.origin()
    }

    /// Key used for exact method+URL lookups in a cache store
    pub fn cache_key(&self) -> String {
        let mut url = self.url.clone();
        url.set_fragment(None);
        format!("{} {}", self.method, url)
    }
}

/// Parse an absolute URL, mapping the error into ours
pub fn parse_url(input: &str) -> ShellcacheResult<Url> {
    Url::parse(input).map_err(|source| ShellcacheError::InvalidUrl {
        input: input.to_string(),
        source,
    })
}

/// A response, either from the network or from a cache store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// URL the response was produced for
    pub url: String,
    pub status: u16,
    pub headers: Vec<(String, String)>,
    #[serde(with = "hex_body")]
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(url: impl Into<String>, status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: url.into(),
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Status is exactly 200, the only status written back on a miss
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Any 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Bodies are stored as hex strings so entries stay valid JSON
mod hex_body {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        hex::decode(encoded).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_parsing() {
        assert_eq!("get".parse::<Method>().unwrap(), Method::Get);
        assert_eq!("Post".parse::<Method>().unwrap(), Method::Post);
        assert_eq!(
            "purge".parse::<Method>().unwrap(),
            Method::Other("PURGE".to_string())
        );
        assert!("".parse::<Method>().is_err());
        assert!("G E T".parse::<Method>().is_err());
    }

    #[test]
    fn only_get_is_read_only() {
        assert!(Method::Get.is_read_only());
        assert!(!Method::Head.is_read_only());
        assert!(!Method::Post.is_read_only());
    }

    #[test]
    fn cache_key_ignores_fragment() {
        let a = Request::parse(Method::Get, "https://p.test/apps/a1/index.html#top").unwrap();
        let b = Request::parse(Method::Get, "https://p.test/apps/a1/index.html").unwrap();
        assert_eq!(a.cache_key(), b.cache_key());
        assert_eq!(a.cache_key(), "GET https://p.test/apps/a1/index.html");
    }

    #[test]
    fn cache_key_keeps_query() {
        let a = Request::parse(Method::Get, "https://p.test/a?v=1").unwrap();
        let b = Request::parse(Method::Get, "https://p.test/a?v=2").unwrap();
        assert_ne!(a.cache_key(), b.cache_key());
    }

    #[test]
    fn origin_includes_port() {
        let a = Request::parse(Method::Get, "https://p.test/x").unwrap();
        let b = Request::parse(Method::Get, "https://p.test:8443/x").unwrap();
        let c = Request::parse(Method::Get, "https://p.test:443/y").unwrap();
        assert_ne!(a.origin(), b.origin());
        assert_eq!(a.origin(), c.origin());
    }

    #[test]
    fn invalid_url() {
        let err = Request::parse(Method::Get, "/relative/path").unwrap_err();
        assert!(matches!(err, ShellcacheError::InvalidUrl { .. }));
    }

    #[test]
    fn response_status_classes() {
        assert!(Response::new("u", 200, "").is_ok());
        assert!(!Response::new("u", 204, "").is_ok());
        assert!(Response::new("u", 204, "").is_success());
        assert!(!Response::new("u", 404, "").is_success());
    }

    #[test]
    fn response_serializes_body_as_hex() {
        let resp = Response::new("https://p.test/a", 200, b"hi".to_vec())
            .with_header("Content-Type", "text/plain");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"6869\""));

        let parsed: Response = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, resp);
        assert_eq!(parsed.header("content-type"), Some("text/plain"));
    }
}
