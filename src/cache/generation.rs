//! Cache generation naming and versioning
//!
//! A generation name is `<namespace>-app-<app-id>-v<version>`. All
//! generations of one app share the `<namespace>-app-<app-id>-v` prefix,
//! so stale-generation detection is a prefix match on that segment.

use crate::error::{ShellcacheError, ShellcacheResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed namespace shared by every generation name
pub const NAMESPACE: &str = "pufferfishes";

/// Opaque application identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AppId(String);

impl AppId {
    /// Validate an app id
    ///
    /// Hyphens are rejected: `app-a` followed by `-b-v1` would otherwise be
    /// indistinguishable from app `a-b`.
    pub fn new(id: impl Into<String>) -> ShellcacheResult<Self> {
        let id = id.into();
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(ShellcacheError::InvalidAppId(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Root path every asset of this app lives under
    pub fn scope(&self) -> String {
        format!("/apps/{}/", self.0)
    }

    /// Offline document served when the network hard-fails
    pub fn fallback_path(&self) -> String {
        format!("/apps/{}/index.html", self.0)
    }
}

impl TryFrom<String> for AppId {
    type Error = ShellcacheError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AppId> for String {
    fn from(id: AppId) -> Self {
        id.0
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Build timestamp in milliseconds since the Unix epoch
///
/// Two builds stamped in the same millisecond get the same token; nothing
/// here prevents that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(u64);

impl VersionToken {
    pub fn new(millis: u64) -> Self {
        Self(millis)
    }

    /// Stamp a new build with the current time
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    /// Token for a given build time; times before the epoch clamp to zero
    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self(u64::try_from(at.timestamp_millis()).unwrap_or(0))
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl FromStr for VersionToken {
    type Err = ShellcacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ShellcacheError::InvalidVersion(s.to_string()));
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| ShellcacheError::InvalidVersion(s.to_string()))
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One versioned cache generation of an app
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Generation {
    pub app_id: AppId,
    pub version: VersionToken,
}

impl Generation {
    pub fn new(app_id: AppId, version: VersionToken) -> Self {
        Self { app_id, version }
    }

    /// Prefix shared by every generation of this app (`<ns>-app-<id>`)
    pub fn app_prefix(&self) -> String {
        format!("{}-app-{}", NAMESPACE, self.app_id)
    }

    /// Full store name (`<ns>-app-<id>-v<version>`)
    pub fn name(&self) -> String {
        format!("{}-v{}", self.app_prefix(), self.version)
    }

    /// Whether `name` is another generation of this same app
    ///
    /// The match includes the `-v` separator after the app id, so stores of
    /// other apps sharing the namespace are never considered.
    pub fn is_stale_sibling(&self, name: &str) -> bool {
        let sibling_prefix = format!("{}-v", self.app_prefix());
        name.starts_with(&sibling_prefix) && name != self.name()
    }

    /// Parse a store name back into a generation
    pub fn parse(name: &str) -> ShellcacheResult<Self> {
        let invalid = || ShellcacheError::InvalidGenerationName(name.to_string());

        let rest = name
            .strip_prefix(NAMESPACE)
            .and_then(|r| r.strip_prefix("-app-"))
            .ok_or_else(invalid)?;
        let (app_id, version) = rest.rsplit_once("-v").ok_or_else(invalid)?;

        let app_id = AppId::new(app_id).map_err(|_| invalid())?;
        let version = version.parse().map_err(|_| invalid())?;
        Ok(Self { app_id, version })
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn generation(app: &str, version: u64) -> Generation {
        Generation::new(AppId::new(app).unwrap(), VersionToken::new(version))
    }

    #[test]
    fn app_id_validation() {
        assert!(AppId::new("abc123").is_ok());
        assert!(AppId::new("my_app").is_ok());
        assert!(AppId::new("").is_err());
        assert!(AppId::new("a-b").is_err());
        assert!(AppId::new("a/b").is_err());
    }

    #[test]
    fn app_paths() {
        let id = AppId::new("abc123").unwrap();
        assert_eq!(id.scope(), "/apps/abc123/");
        assert_eq!(id.fallback_path(), "/apps/abc123/index.html");
    }

    #[test]
    fn generation_name() {
        let gen = generation("abc123", 1700000000000);
        assert_eq!(gen.name(), "pufferfishes-app-abc123-v1700000000000");
        assert_eq!(gen.app_prefix(), "pufferfishes-app-abc123");
    }

    #[test]
    fn generation_parse() {
        let gen = Generation::parse("pufferfishes-app-abc123-v42").unwrap();
        assert_eq!(gen, generation("abc123", 42));

        assert!(Generation::parse("pufferfishes-app-abc123").is_err());
        assert!(Generation::parse("pufferfishes-app-abc123-vx").is_err());
        assert!(Generation::parse("other-app-abc123-v1").is_err());
    }

    #[test]
    fn stale_sibling_same_app() {
        let current = generation("abc", 2);
        assert!(current.is_stale_sibling("pufferfishes-app-abc-v1"));
        assert!(!current.is_stale_sibling("pufferfishes-app-abc-v2"));
    }

    #[test]
    fn stale_sibling_never_matches_other_apps() {
        let current = generation("abc", 2);
        assert!(!current.is_stale_sibling("pufferfishes-app-abcd-v1"));
        assert!(!current.is_stale_sibling("pufferfishes-app-xyz-v1"));
        assert!(!current.is_stale_sibling("pufferfishes-app-ab-v1"));
        assert!(!current.is_stale_sibling("unrelated-cache"));
    }

    #[test]
    fn version_token_from_datetime() {
        let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap();
        assert_eq!(VersionToken::from_datetime(at).get(), 1705312800000);
    }

    #[test]
    fn version_token_parse() {
        assert_eq!("17".parse::<VersionToken>().unwrap().get(), 17);
        assert!("".parse::<VersionToken>().is_err());
        assert!("-1".parse::<VersionToken>().is_err());
        assert!("1.5".parse::<VersionToken>().is_err());
    }

    #[test]
    fn app_id_serde_validates() {
        let ok: AppId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(ok.as_str(), "abc");
        assert!(serde_json::from_str::<AppId>("\"a-b\"").is_err());
    }
}
