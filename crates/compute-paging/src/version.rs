use core::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// A compute API microversion, ordered by major then minor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ApiVersion {
    pub major: u16,
    pub minor: u16,
}

impl ApiVersion {
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }
}

/// The highest microversion this crate knows how to talk
pub const CLIENT_MAX_VERSION: ApiVersion = ApiVersion::new(2, 60);
/// The version used by servers that do not report microversions
pub const BASE_VERSION: ApiVersion = ApiVersion::new(2, 1);

fn re_version() -> &'static regex::Regex {
    static RE: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();
    RE.get_or_init(|| regex::Regex::new(r"^v?(?<major>[0-9]+)\.(?<minor>[0-9]+)$").unwrap())
}

impl FromStr for ApiVersion {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let capts = re_version()
            .captures(s.trim())
            .ok_or_else(|| Error::InvalidApiVersion(s.to_owned()))?;
        let major = capts["major"]
            .parse()
            .map_err(|_| Error::InvalidApiVersion(s.to_owned()))?;
        let minor = capts["minor"]
            .parse()
            .map_err(|_| Error::InvalidApiVersion(s.to_owned()))?;
        Ok(Self { major, minor })
    }
}
impl TryFrom<&str> for ApiVersion {
    type Error = Error;
    fn try_from(value: &str) -> Result<Self> {
        ApiVersion::from_str(value)
    }
}
impl Display for ApiVersion {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}
impl Serialize for ApiVersion {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> core::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
impl<'de> Deserialize<'de> for ApiVersion {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> core::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ApiVersion::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// What the server reports about the microversions it supports
///
/// An empty `version` means the server does not support microversions at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionInfo {
    pub id: String,
    #[serde(default)]
    pub status: String,
    /// Maximum microversion supported by the server
    #[serde(default, deserialize_with = "deserialize_opt_version")]
    pub version: Option<ApiVersion>,
    /// Minimum microversion supported by the server
    #[serde(default, deserialize_with = "deserialize_opt_version")]
    pub min_version: Option<ApiVersion>,
}

fn deserialize_opt_version<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> core::result::Result<Option<ApiVersion>, D::Error> {
    let s = Option::<String>::deserialize(deserializer)?;
    match s.as_deref() {
        None | Some("") => Ok(None),
        Some(s) => ApiVersion::from_str(s)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

impl VersionInfo {
    /// Pick the microversion used for the rest of the session
    ///
    /// # Errors
    ///
    /// Returns [Error::UnsupportedApiVersion] if the server minimum version is
    /// above [CLIENT_MAX_VERSION].
    pub fn negotiate(&self) -> Result<ApiVersion> {
        if let Some(server_min) = self.min_version {
            if server_min > CLIENT_MAX_VERSION {
                return Err(Error::UnsupportedApiVersion {
                    server_min,
                    client_max: CLIENT_MAX_VERSION,
                });
            }
        }
        Ok(match self.version {
            Some(server_max) => server_max.min(CLIENT_MAX_VERSION),
            None => BASE_VERSION,
        })
    }
}

/// Behaviours of the compute API that only exist starting at a given microversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    /// Servers expose their `locked` status
    LockedAttribute,
    /// Servers have a free form description
    InstanceDescription,
    /// Usage reports are paginated with a marker
    UsagePagination,
    /// Volumes can be attached to several servers
    Multiattach,
}

impl Feature {
    pub fn min_version(&self) -> ApiVersion {
        match self {
            Feature::LockedAttribute => ApiVersion::new(2, 9),
            Feature::InstanceDescription => ApiVersion::new(2, 19),
            Feature::UsagePagination => ApiVersion::new(2, 40),
            Feature::Multiattach => ApiVersion::new(2, 60),
        }
    }
}

impl ApiVersion {
    pub fn supports(&self, feature: Feature) -> bool {
        *self >= feature.min_version()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let v = ApiVersion::from_str("2.40").unwrap();
        assert_eq!(v, ApiVersion::new(2, 40));
        assert_eq!(v.to_string(), "2.40");
        assert_eq!(ApiVersion::from_str("v2.1").unwrap(), ApiVersion::new(2, 1));
        assert!(ApiVersion::from_str("2").is_err());
        assert!(ApiVersion::from_str("latest").is_err());
        assert!(ApiVersion::from_str("2.x").is_err());
        assert!(ApiVersion::from_str("2.99999999").is_err());
    }

    #[test]
    fn ordering_is_numeric() {
        assert!(ApiVersion::new(2, 9) < ApiVersion::new(2, 40));
        assert!(ApiVersion::from_str("2.10").unwrap() > ApiVersion::from_str("2.9").unwrap());
        assert!(ApiVersion::new(3, 0) > ApiVersion::new(2, 60));
    }

    #[test]
    fn features() {
        assert!(!ApiVersion::new(2, 1).supports(Feature::UsagePagination));
        assert!(ApiVersion::new(2, 40).supports(Feature::UsagePagination));
        assert!(ApiVersion::new(2, 45).supports(Feature::LockedAttribute));
        assert!(!ApiVersion::new(2, 45).supports(Feature::Multiattach));
    }

    #[test]
    fn negotiate() {
        let info: VersionInfo = serde_json::from_value(serde_json::json!({
            "id": "v2.1",
            "status": "CURRENT",
            "version": "2.45",
            "min_version": "2.1"
        }))
        .unwrap();
        assert_eq!(info.negotiate().unwrap(), ApiVersion::new(2, 45));

        let info = VersionInfo {
            version: Some(ApiVersion::new(2, 90)),
            ..info
        };
        assert_eq!(info.negotiate().unwrap(), CLIENT_MAX_VERSION);

        let legacy: VersionInfo = serde_json::from_value(serde_json::json!({
            "id": "v2.0",
            "status": "SUPPORTED",
            "version": "",
            "min_version": ""
        }))
        .unwrap();
        assert_eq!(legacy.negotiate().unwrap(), BASE_VERSION);

        let too_new = VersionInfo {
            id: "v3.0".to_owned(),
            status: "CURRENT".to_owned(),
            version: Some(ApiVersion::new(3, 5)),
            min_version: Some(ApiVersion::new(3, 0)),
        };
        assert!(matches!(
            too_new.negotiate(),
            Err(Error::UnsupportedApiVersion { .. })
        ));
    }
}
