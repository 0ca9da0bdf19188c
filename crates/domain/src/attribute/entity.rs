use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::entity::digest_parts;

/// Kind of value an attribute carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttrType {
    #[serde(rename = "ipaddr")]
    IpAddr,
    #[serde(rename = "domain")]
    DomainName,
    #[serde(rename = "username")]
    UserName,
    #[serde(rename = "filehash")]
    FileHash,
    #[serde(rename = "json")]
    Json,
    #[serde(rename = "url")]
    Url,
}

impl AttrType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::IpAddr => "ipaddr",
            Self::DomainName => "domain",
            Self::UserName => "username",
            Self::FileHash => "filehash",
            Self::Json => "json",
            Self::Url => "url",
        }
    }
}

impl std::fmt::Display for AttrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AttrType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ipaddr" => Ok(Self::IpAddr),
            "domain" => Ok(Self::DomainName),
            "username" => Ok(Self::UserName),
            "filehash" => Ok(Self::FileHash),
            "json" => Ok(Self::Json),
            "url" => Ok(Self::Url),
            _ => Err(format!(
                "invalid attribute type '{s}': expected ipaddr|domain|username|filehash|json|url"
            )),
        }
    }
}

/// Role an attribute plays in the alert it was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttrContext {
    Remote,
    Local,
    Subject,
    Object,
    Client,
    Server,
}

/// A typed key/value fact extracted from an alert or produced by an
/// inspector.
///
/// Identity is `(type, key, value)`: `context` and `timestamp` are carried
/// along but never participate in [`Attribute::hash`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub attr_type: AttrType,
    pub key: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<AttrContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl Attribute {
    pub fn new(attr_type: AttrType, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            attr_type,
            key: key.into(),
            value: value.into(),
            context: Vec::new(),
            timestamp: None,
        }
    }

    #[must_use]
    pub fn with_context(mut self, context: AttrContext) -> Self {
        self.context.push(context);
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Deterministic content hash used as the dedup anchor.
    pub fn hash(&self) -> String {
        digest_parts(&["attribute", self.attr_type.as_str(), &self.key, &self.value])
    }

    pub fn has_context(&self, context: AttrContext) -> bool {
        self.context.contains(&context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ip(key: &str, value: &str) -> Attribute {
        Attribute::new(AttrType::IpAddr, key, value)
    }

    #[test]
    fn hash_ignores_context_and_timestamp() {
        let plain = ip("dst", "1.2.3.4");
        let decorated = ip("dst", "1.2.3.4")
            .with_context(AttrContext::Remote)
            .with_context(AttrContext::Server)
            .with_timestamp(Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap());
        assert_eq!(plain.hash(), decorated.hash());
    }

    #[test]
    fn hash_changes_with_type_key_or_value() {
        let base = ip("dst", "1.2.3.4");
        let other_type = Attribute::new(AttrType::DomainName, "dst", "1.2.3.4");
        let other_key = ip("src", "1.2.3.4");
        let other_value = ip("dst", "1.2.3.5");
        assert_ne!(base.hash(), other_type.hash());
        assert_ne!(base.hash(), other_key.hash());
        assert_ne!(base.hash(), other_value.hash());
    }

    #[test]
    fn hash_has_no_concatenation_collisions() {
        let a = Attribute::new(AttrType::UserName, "ab", "c");
        let b = Attribute::new(AttrType::UserName, "a", "bc");
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn hash_distinct_over_small_alphabet() {
        let mut seen = std::collections::HashSet::new();
        for t in [AttrType::IpAddr, AttrType::DomainName, AttrType::Url] {
            for k in ["", "a", "b", "ab"] {
                for v in ["", "a", "b", "ab"] {
                    assert!(seen.insert(Attribute::new(t, k, v).hash()));
                }
            }
        }
        assert_eq!(seen.len(), 3 * 4 * 4);
    }

    #[test]
    fn wire_format_uses_type_field() {
        let attr = ip("dst", "1.2.3.4").with_context(AttrContext::Remote);
        let json = serde_json::to_value(&attr).unwrap();
        assert_eq!(json["type"], "ipaddr");
        assert_eq!(json["key"], "dst");
        assert_eq!(json["context"][0], "remote");
        assert!(json.get("timestamp").is_none());
    }

    #[test]
    fn timestamp_is_rfc3339_on_the_wire() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();
        let attr = ip("dst", "1.2.3.4").with_timestamp(ts);
        let json = serde_json::to_string(&attr).unwrap();
        assert!(json.contains("2024-05-06T07:08:09Z"), "got: {json}");
        let back: Attribute = serde_json::from_str(&json).unwrap();
        assert_eq!(back.timestamp, Some(ts));
    }

    #[test]
    fn attr_type_from_str() {
        assert_eq!("IPADDR".parse::<AttrType>().unwrap(), AttrType::IpAddr);
        assert_eq!("domain".parse::<AttrType>().unwrap(), AttrType::DomainName);
        assert!("mac".parse::<AttrType>().is_err());
    }

    #[test]
    fn unknown_type_rejected_on_decode() {
        let err = serde_json::from_str::<Attribute>(r#"{"type":"mac","key":"k","value":"v"}"#);
        assert!(err.is_err());
    }
}
