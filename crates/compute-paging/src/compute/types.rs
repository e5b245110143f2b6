use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::paginate::{Marked, Marker};

pub type ExtraSpecs = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
}

/// A compute instance as returned by the server listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Server {
    pub id: String,
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub tenant_id: String,
    #[serde(default)]
    pub user_id: String,
    /// None when the server was booted from a volume
    #[serde(default, deserialize_with = "deserialize_image_ref")]
    pub image: Option<ImageRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor: Option<FlavorRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// Only reported starting at microversion 2.9
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    /// Only reported starting at microversion 2.19
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}
impl Marked for Server {
    fn marker(&self) -> Marker {
        Marker(self.id.clone())
    }
}

/// The API reports a booted-from-volume server with an empty string instead of an image
fn deserialize_image_ref<'de, D: serde::Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<ImageRef>, D::Error> {
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(s)) if s.is_empty() => Ok(None),
        Some(value) => ImageRef::deserialize(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flavor {
    pub id: String,
    pub name: String,
    pub ram: u64,
    pub vcpus: u32,
    pub disk: u64,
    #[serde(default, deserialize_with = "deserialize_swap")]
    pub swap: u64,
    #[serde(rename = "OS-FLV-EXT-DATA:ephemeral", default)]
    pub ephemeral: u64,
    #[serde(rename = "os-flavor-access:is_public", default = "default_true")]
    pub is_public: bool,
    #[serde(default = "default_rxtx_factor")]
    pub rxtx_factor: f64,
    /// Only present when explicitly requested
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_specs: Option<ExtraSpecs>,
}
impl Marked for Flavor {
    fn marker(&self) -> Marker {
        Marker(self.id.clone())
    }
}
fn default_true() -> bool {
    true
}
fn default_rxtx_factor() -> f64 {
    1.0
}

/// The API reports "no swap" as an empty string
fn deserialize_swap<'de, D: serde::Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| serde::de::Error::custom(format!("invalid swap size {n}"))),
        serde_json::Value::String(s) if s.is_empty() => Ok(0),
        serde_json::Value::Null => Ok(0),
        other => Err(serde::de::Error::custom(format!("invalid swap size {other}"))),
    }
}
