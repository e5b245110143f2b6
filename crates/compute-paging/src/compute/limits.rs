use core::{fmt::Display, ops::Deref};
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One absolute limit as reported by the compute API, -1 meaning unlimited
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbsoluteLimit {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitValue {
    Finite(u64),
    Unlimited,
}
impl LimitValue {
    pub fn is_unlimited(&self) -> bool {
        matches!(self, LimitValue::Unlimited)
    }
    /// Returns true if `amount` can be consumed without going over the limit
    pub fn allows(&self, amount: u64) -> bool {
        match self {
            LimitValue::Finite(max) => amount <= *max,
            LimitValue::Unlimited => true,
        }
    }
}
impl Display for LimitValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LimitValue::Finite(v) => v.fmt(f),
            LimitValue::Unlimited => f.write_str("unlimited"),
        }
    }
}
impl Serialize for LimitValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LimitValue::Finite(v) => serializer.serialize_u64(*v),
            LimitValue::Unlimited => serializer.serialize_str("unlimited"),
        }
    }
}

/// Absolute limits of a tenant, keyed by limit name
///
/// Built from the raw [AbsoluteLimit]s: a negative `total*Used` counter is
/// reported as 0, any other negative value is [LimitValue::Unlimited].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AbsoluteLimits(BTreeMap<String, LimitValue>);

impl AbsoluteLimits {
    pub fn get(&self, name: &str) -> Option<LimitValue> {
        self.0.get(name).copied()
    }
}
impl Deref for AbsoluteLimits {
    type Target = BTreeMap<String, LimitValue>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

fn is_usage_counter(name: &str) -> bool {
    name.starts_with("total") && name.ends_with("Used")
}

impl FromIterator<AbsoluteLimit> for AbsoluteLimits {
    fn from_iter<I: IntoIterator<Item = AbsoluteLimit>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|AbsoluteLimit { name, value }| {
                    let value = match u64::try_from(value) {
                        Ok(v) => LimitValue::Finite(v),
                        // Usage counters are sometimes reported negative, they mean "nothing used"
                        Err(_) if is_usage_counter(&name) => LimitValue::Finite(0),
                        Err(_) => LimitValue::Unlimited,
                    };
                    (name, value)
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(values: &[(&str, i64)]) -> AbsoluteLimits {
        values
            .iter()
            .map(|(name, value)| AbsoluteLimit {
                name: name.to_string(),
                value: *value,
            })
            .collect()
    }

    #[test]
    fn handle_unlimited() {
        let l = limits(&[("maxTotalCores", -1), ("maxTotalInstances", 10)]);
        assert_eq!(l.get("maxTotalCores"), Some(LimitValue::Unlimited));
        assert_eq!(l.get("maxTotalInstances"), Some(LimitValue::Finite(10)));
        assert_eq!(l.get("maxTotalRAMSize"), None);
    }

    #[test]
    fn negative_used_counters_are_zero() {
        let l = limits(&[
            ("maxTotalCores", -1),
            ("maxTotalInstances", 10),
            ("totalInstancesUsed", -1),
            ("totalCoresUsed", -1),
            ("totalRAMUsed", -2048),
            ("totalSecurityGroupsUsed", 1),
            ("totalFloatingIpsUsed", 0),
        ]);
        assert_eq!(l.get("maxTotalCores"), Some(LimitValue::Unlimited));
        assert_eq!(l.get("maxTotalInstances"), Some(LimitValue::Finite(10)));
        assert_eq!(l.get("totalInstancesUsed"), Some(LimitValue::Finite(0)));
        assert_eq!(l.get("totalCoresUsed"), Some(LimitValue::Finite(0)));
        assert_eq!(l.get("totalRAMUsed"), Some(LimitValue::Finite(0)));
        assert_eq!(l.get("totalSecurityGroupsUsed"), Some(LimitValue::Finite(1)));
        assert_eq!(l.get("totalFloatingIpsUsed"), Some(LimitValue::Finite(0)));
    }

    #[test]
    fn serialization() {
        let l = limits(&[("maxTotalCores", -1), ("maxTotalInstances", 10)]);
        assert_eq!(
            serde_json::to_value(&l).unwrap(),
            serde_json::json!({"maxTotalCores": "unlimited", "maxTotalInstances": 10})
        );
        assert_eq!(LimitValue::Unlimited.to_string(), "unlimited");
        assert!(LimitValue::Unlimited.allows(u64::MAX));
        assert!(!LimitValue::Finite(10).allows(11));
    }
}
