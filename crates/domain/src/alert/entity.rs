use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::AlertError;
use crate::attribute::entity::Attribute;
use crate::common::entity::sha256_hex;

/// Security alert delivered by an external detector.
///
/// Deliveries are at-least-once: the same alert may arrive several times,
/// possibly concurrently. `(detector, rule_id, alert_key)` is its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub detector: String,
    pub rule_id: String,
    pub rule_name: String,
    /// Detector-supplied discriminator for alerts sharing a rule.
    #[serde(default)]
    pub alert_key: String,
    #[serde(default)]
    pub description: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    /// Raw detector payload, kept verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
}

impl Alert {
    /// Stable identity of the alert across redeliveries: SHA-256 hex of
    /// `deepinspect:{detector}:{rule_id}:{alert_key}`. External producers
    /// compute the same value.
    pub fn alert_id(&self) -> String {
        let material = format!(
            "deepinspect:{}:{}:{}",
            self.detector, self.rule_id, self.alert_key
        );
        sha256_hex(material.as_bytes())
    }

    pub fn validate(&self) -> Result<(), AlertError> {
        if self.detector.is_empty() {
            return Err(AlertError::MissingField("detector"));
        }
        if self.rule_id.is_empty() {
            return Err(AlertError::MissingField("rule_id"));
        }
        if self.rule_name.is_empty() {
            return Err(AlertError::MissingField("rule_name"));
        }
        for attr in &self.attributes {
            if attr.key.is_empty() {
                return Err(AlertError::InvalidAttribute {
                    field: "key",
                    attribute: attr.value.clone(),
                });
            }
            if attr.value.is_empty() {
                return Err(AlertError::InvalidAttribute {
                    field: "value",
                    attribute: attr.key.clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::entity::AttrType;
    use chrono::TimeZone;

    fn sample_alert() -> Alert {
        Alert {
            detector: "guardduty".to_string(),
            rule_id: "UnauthorizedAccess:EC2/SSHBruteForce".to_string(),
            rule_name: "SSH brute force".to_string(),
            alert_key: "i-0123".to_string(),
            description: "ssh brute force against instance".to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            attributes: vec![Attribute::new(AttrType::IpAddr, "src", "198.51.100.7")],
            body: None,
        }
    }

    #[test]
    fn alert_id_stable_across_deliveries() {
        let a = sample_alert();
        let mut b = sample_alert();
        b.description = "redelivered".to_string();
        b.timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap();
        b.attributes.clear();
        assert_eq!(a.alert_id(), b.alert_id());
    }

    #[test]
    fn alert_id_depends_on_identity_fields() {
        let a = sample_alert();
        let mut b = sample_alert();
        b.alert_key = "i-0456".to_string();
        let mut c = sample_alert();
        c.detector = "falco".to_string();
        assert_ne!(a.alert_id(), b.alert_id());
        assert_ne!(a.alert_id(), c.alert_id());
    }

    #[test]
    fn alert_id_matches_published_formula() {
        assert_eq!(
            sample_alert().alert_id(),
            "f76e3eff724ddeb11703600646cb163642b06c4f6354d1560a9bc73e00b42dcf"
        );

        let mut minimal = sample_alert();
        minimal.detector = "d".to_string();
        minimal.rule_id = "r".to_string();
        minimal.alert_key.clear();
        assert_eq!(
            minimal.alert_id(),
            "9628fff12865cc83a84fe92f657c48ac055a251d368bbaf0591fada87e032676"
        );
    }

    #[test]
    fn validate_accepts_complete_alert() {
        assert!(sample_alert().validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_fields() {
        let mut a = sample_alert();
        a.detector.clear();
        assert!(matches!(
            a.validate(),
            Err(AlertError::MissingField("detector"))
        ));

        let mut b = sample_alert();
        b.rule_name.clear();
        assert!(matches!(
            b.validate(),
            Err(AlertError::MissingField("rule_name"))
        ));
    }

    #[test]
    fn validate_rejects_empty_attribute_value() {
        let mut a = sample_alert();
        a.attributes
            .push(Attribute::new(AttrType::DomainName, "query", ""));
        assert!(matches!(
            a.validate(),
            Err(AlertError::InvalidAttribute { field: "value", .. })
        ));
    }

    #[test]
    fn decodes_minimal_json() {
        let alert: Alert = serde_json::from_str(
            r#"{"detector":"d","rule_id":"r","rule_name":"n","timestamp":"2024-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert!(alert.attributes.is_empty());
        assert!(alert.alert_key.is_empty());
        assert!(alert.body.is_none());
    }
}
