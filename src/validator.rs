use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::{self, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;

use crate::error::DomainSaleError;

const MAX_PAYLOAD_BYTES: usize = 255;
const PREFIX: &str = "v=FORSALE1;";

const ALLOWED_KEYS: &[&str] = &["v", "price", "url", "contact", "expires"];
const REQUIRED_KEYS: &[&str] = &["v", "price", "url", "contact"];

static PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}:[0-9]+(\.[0-9]{1,2})?$").unwrap());
static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

/// A TXT payload that has cleared every gate below. Constructed per
/// record, consumed by the API facade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRecord {
    pub price: String,
    pub url: String,
    pub contact: String,
    pub expires: Option<String>,
}

/// A JSON object deserialized with duplicate-key detection. `serde_json`'s
/// default map deserialization keeps the last value for a repeated key
/// silently; this visitor errors instead. Only `visit_map` is implemented,
/// so any non-object root (array, string, number, ...) fails to
/// deserialize structurally rather than needing a separate check.
struct StrictObject(BTreeMap<String, Value>);

impl<'de> Deserialize<'de> for StrictObject {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct StrictObjectVisitor;

        impl<'de> Visitor<'de> for StrictObjectVisitor {
            type Value = StrictObject;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a JSON object with no duplicate keys")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut out = BTreeMap::new();
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    if out.insert(key.clone(), value).is_some() {
                        return Err(de::Error::custom(format!("duplicate key: {key}")));
                    }
                }
                Ok(StrictObject(out))
            }
        }

        deserializer.deserialize_map(StrictObjectVisitor)
    }
}

/// Runs one candidate TXT string through every gate. Returns `Ok(None)`
/// when the string simply isn't one of ours (missing the version prefix,
/// so other TXT records on the same name are left alone). Returns `Err`
/// for anything that looked like ours but failed a gate; the caller
/// accumulates these and keeps scanning subsequent records.
pub fn extract(
    txt: &str,
    today: NaiveDate,
) -> Result<Option<ValidatedRecord>, DomainSaleError> {
    if txt.len() > MAX_PAYLOAD_BYTES {
        return Err(DomainSaleError::SizeExceeded(txt.len()));
    }

    let Some(json_part) = txt.strip_prefix(PREFIX) else {
        return Ok(None);
    };

    let parsed: StrictObject = serde_json::from_str(json_part)
        .map_err(|e| DomainSaleError::SchemaValidation(e.to_string()))?;
    let obj = parsed.0;

    for key in obj.keys() {
        if !ALLOWED_KEYS.contains(&key.as_str()) {
            return Err(DomainSaleError::SchemaValidation(format!(
                "unexpected field: {key}"
            )));
        }
    }
    for key in REQUIRED_KEYS {
        if !obj.contains_key(*key) {
            return Err(DomainSaleError::SchemaValidation(format!(
                "missing field: {key}"
            )));
        }
    }

    let v = as_str(&obj, "v")?;
    if v != "1" {
        return Err(DomainSaleError::FieldValidation {
            field: "v".to_string(),
            reason: format!("unsupported version: {v}"),
        });
    }

    let price = as_str(&obj, "price")?;
    if !PRICE_RE.is_match(price) {
        return Err(DomainSaleError::FieldValidation {
            field: "price".to_string(),
            reason: "does not match CCY:amount format".to_string(),
        });
    }

    let url_raw = as_str(&obj, "url")?;
    validate_https_url(url_raw)?;

    let contact_raw = as_str(&obj, "contact")?;
    validate_mailto(contact_raw)?;

    let expires = match obj.get("expires") {
        Some(Value::String(s)) => {
            if !DATE_RE.is_match(s) {
                return Err(DomainSaleError::FieldValidation {
                    field: "expires".to_string(),
                    reason: "does not match YYYY-MM-DD".to_string(),
                });
            }
            let parsed_date = NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| {
                DomainSaleError::FieldValidation {
                    field: "expires".to_string(),
                    reason: "not a real calendar date".to_string(),
                }
            })?;
            if parsed_date < today {
                return Err(DomainSaleError::FieldValidation {
                    field: "expires".to_string(),
                    reason: "already expired".to_string(),
                });
            }
            Some(s.clone())
        }
        Some(_) => {
            return Err(DomainSaleError::FieldValidation {
                field: "expires".to_string(),
                reason: "must be a string".to_string(),
            })
        }
        None => None,
    };

    Ok(Some(ValidatedRecord {
        price: price.to_string(),
        url: url_raw.to_string(),
        contact: contact_raw.to_string(),
        expires,
    }))
}

fn as_str<'a>(obj: &'a BTreeMap<String, Value>, key: &str) -> Result<&'a str, DomainSaleError> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(DomainSaleError::FieldValidation {
            field: key.to_string(),
            reason: "must be a string".to_string(),
        }),
        None => Err(DomainSaleError::SchemaValidation(format!(
            "missing field: {key}"
        ))),
    }
}

/// Scheme check happens on the raw string, before `url::Url::parse`:
/// `url` normalizes the parsed scheme to lowercase, so a post-parse
/// comparison would accept `HTTPS://...`, which must be rejected.
fn validate_https_url(raw: &str) -> Result<(), DomainSaleError> {
    if !raw.starts_with("https://") {
        return Err(DomainSaleError::FieldValidation {
            field: "url".to_string(),
            reason: "scheme must be exactly https".to_string(),
        });
    }
    let parsed = url::Url::parse(raw).map_err(|e| DomainSaleError::FieldValidation {
        field: "url".to_string(),
        reason: e.to_string(),
    })?;
    match parsed.host_str() {
        Some(h) if !h.is_empty() => Ok(()),
        _ => Err(DomainSaleError::FieldValidation {
            field: "url".to_string(),
            reason: "empty host".to_string(),
        }),
    }
}

fn validate_mailto(raw: &str) -> Result<(), DomainSaleError> {
    if !raw.starts_with("mailto:") {
        return Err(DomainSaleError::FieldValidation {
            field: "contact".to_string(),
            reason: "scheme must be exactly mailto".to_string(),
        });
    }
    let parsed = url::Url::parse(raw).map_err(|e| DomainSaleError::FieldValidation {
        field: "contact".to_string(),
        reason: e.to_string(),
    })?;
    if parsed.path().is_empty() {
        return Err(DomainSaleError::FieldValidation {
            field: "contact".to_string(),
            reason: "empty path".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 7, 28).unwrap()
    }

    fn valid_payload() -> String {
        r#"v=FORSALE1;{"v":"1","price":"USD:1000","url":"https://sale.example","contact":"mailto:o@example.com"}"#.to_string()
    }

    #[test]
    fn accepts_valid_record() {
        let record = extract(&valid_payload(), today()).unwrap().unwrap();
        assert_eq!(record.price, "USD:1000");
        assert_eq!(record.url, "https://sale.example");
        assert_eq!(record.contact, "mailto:o@example.com");
        assert_eq!(record.expires, None);
    }

    #[test]
    fn missing_prefix_is_not_an_error() {
        let result = extract("some other unrelated TXT value", today()).unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let payload = format!("v=FORSALE1;{}", "x".repeat(260));
        let err = extract(&payload, today()).unwrap_err();
        assert!(matches!(err, DomainSaleError::SizeExceeded(_)));
    }

    #[test]
    fn unknown_field_is_a_schema_violation() {
        let payload = r#"v=FORSALE1;{"v":"1","price":"USD:1000","url":"https://sale.example","contact":"mailto:o@example.com","extra":"nope"}"#;
        let err = extract(payload, today()).unwrap_err();
        assert!(matches!(err, DomainSaleError::SchemaValidation(_)));
    }

    #[test]
    fn duplicate_key_is_a_schema_violation() {
        let payload = r#"v=FORSALE1;{"v":"1","v":"1","price":"USD:1000","url":"https://sale.example","contact":"mailto:o@example.com"}"#;
        let err = extract(payload, today()).unwrap_err();
        assert!(matches!(err, DomainSaleError::SchemaValidation(_)));
    }

    #[test]
    fn http_scheme_is_rejected() {
        let payload = r#"v=FORSALE1;{"v":"1","price":"USD:1000","url":"http://sale.example","contact":"mailto:o@example.com"}"#;
        let err = extract(payload, today()).unwrap_err();
        assert!(matches!(err, DomainSaleError::FieldValidation { ref field, .. } if field == "url"));
    }

    #[test]
    fn uppercase_https_scheme_is_rejected() {
        let payload = r#"v=FORSALE1;{"v":"1","price":"USD:1000","url":"HTTPS://sale.example","contact":"mailto:o@example.com"}"#;
        let err = extract(payload, today()).unwrap_err();
        assert!(matches!(err, DomainSaleError::FieldValidation { ref field, .. } if field == "url"));
    }

    #[test]
    fn javascript_scheme_is_rejected() {
        let payload = r#"v=FORSALE1;{"v":"1","price":"USD:1000","url":"javascript:alert(1)","contact":"mailto:o@x"}"#;
        let err = extract(payload, today()).unwrap_err();
        assert!(matches!(err, DomainSaleError::FieldValidation { ref field, .. } if field == "url"));
    }

    #[test]
    fn non_mailto_contact_is_rejected() {
        let payload = r#"v=FORSALE1;{"v":"1","price":"USD:1000","url":"https://sale.example","contact":"tel:+15555550100"}"#;
        let err = extract(payload, today()).unwrap_err();
        assert!(matches!(err, DomainSaleError::FieldValidation { ref field, .. } if field == "contact"));
    }

    #[test]
    fn bad_price_format_is_rejected() {
        let payload = r#"v=FORSALE1;{"v":"1","price":"$1000","url":"https://sale.example","contact":"mailto:o@x"}"#;
        let err = extract(payload, today()).unwrap_err();
        assert!(matches!(err, DomainSaleError::FieldValidation { ref field, .. } if field == "price"));
    }

    #[test]
    fn future_version_is_rejected() {
        let payload = r#"v=FORSALE1;{"v":"2","price":"USD:1000","url":"https://sale.example","contact":"mailto:o@x"}"#;
        let err = extract(payload, today()).unwrap_err();
        assert!(matches!(err, DomainSaleError::FieldValidation { ref field, .. } if field == "v"));
    }

    #[test]
    fn expired_date_is_rejected() {
        let payload = r#"v=FORSALE1;{"v":"1","price":"USD:1000","url":"https://sale.example","contact":"mailto:o@x","expires":"2020-01-01"}"#;
        let err = extract(payload, today()).unwrap_err();
        assert!(matches!(err, DomainSaleError::FieldValidation { ref field, .. } if field == "expires"));
    }

    #[test]
    fn today_expiry_is_accepted() {
        let payload = r#"v=FORSALE1;{"v":"1","price":"USD:1000","url":"https://sale.example","contact":"mailto:o@x","expires":"2026-07-28"}"#;
        let record = extract(payload, today()).unwrap().unwrap();
        assert_eq!(record.expires.as_deref(), Some("2026-07-28"));
    }

    #[test]
    fn trailing_garbage_is_rejected() {
        let payload = r#"v=FORSALE1;{"v":"1","price":"USD:1000","url":"https://sale.example","contact":"mailto:o@x"} garbage"#;
        let err = extract(payload, today()).unwrap_err();
        assert!(matches!(err, DomainSaleError::SchemaValidation(_)));
    }
}
