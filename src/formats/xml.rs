//! XML codec.
//!
//! Values are written as one element per field under a `<config>` root.
//! Unset fields are left out entirely, since an empty element reads back as
//! an empty string rather than a missing value.

use super::{ConfigFormat, FormatTag, Snapshot, kind_of, utf8};
use crate::error::{ConfigError, Result};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Root element written around encoded values; ignored when reading.
const ROOT_ELEMENT: &str = "config";

/// Keys quick-xml uses for element text content.
const TEXT_KEYS: [&str; 2] = ["$text", "$value"];

/// XML configuration files (`.xml`).
pub struct Xml;

impl ConfigFormat for Xml {
    const TAG: FormatTag = FormatTag::Xml;

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        quick_xml::de::from_str(utf8(Self::TAG, bytes)?)
            .map_err(|e| ConfigError::format(Self::TAG, e))
    }

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
        let value = serde_json::to_value(value).map_err(|e| ConfigError::format(Self::TAG, e))?;
        quick_xml::se::to_string_with_root(ROOT_ELEMENT, &without_nulls(value))
            .map(String::into_bytes)
            .map_err(|e| ConfigError::format(Self::TAG, e))
    }

    fn decode_map(bytes: &[u8]) -> Result<Snapshot> {
        match flatten_text(Self::decode::<Value>(bytes)?) {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Snapshot::new()),
            // A root with text only has no fields
            Value::String(text) if text.trim().is_empty() => Ok(Snapshot::new()),
            other => Err(ConfigError::TypeMismatch(format!(
                "{} document root is {}, expected a mapping",
                Self::TAG,
                kind_of(&other)
            ))),
        }
    }
}

/// Remove `null` entries from every mapping.
fn without_nulls(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k, without_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(without_nulls).collect()),
        other => other,
    }
}

/// Replace text-only elements (`{"$text": "100"}`) with their text.
fn flatten_text(value: Value) -> Value {
    match value {
        Value::Object(mut map) => {
            if map.len() == 1 {
                for key in TEXT_KEYS {
                    if let Some(text) = map.remove(key) {
                        return flatten_text(text);
                    }
                }
            }
            Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, flatten_text(v)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(flatten_text).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Server {
        port: u16,
        host: String,
    }

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Limits {
        max_requests: u32,
        burst: Option<u32>,
    }

    #[test]
    fn test_decode_typed() {
        let server: Server =
            Xml::decode(b"<config><port>8080</port><host>localhost</host></config>").unwrap();
        assert_eq!(
            server,
            Server {
                port: 8080,
                host: "localhost".into()
            }
        );
    }

    #[test]
    fn test_encode_uses_config_root() {
        let bytes = Xml::encode(&Server {
            port: 1,
            host: "h".into(),
        })
        .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("<config>"));
        assert!(text.contains("<port>1</port>"));
    }

    #[test]
    fn test_unset_field_round_trips() {
        let limits = Limits {
            max_requests: 300,
            burst: None,
        };
        let text = String::from_utf8(Xml::encode(&limits).unwrap()).unwrap();
        assert!(!text.contains("burst"));

        let back: Limits = Xml::decode(text.as_bytes()).unwrap();
        assert_eq!(back, limits);

        let limits = Limits {
            max_requests: 300,
            burst: Some(20),
        };
        let back: Limits = Xml::decode(&Xml::encode(&limits).unwrap()).unwrap();
        assert_eq!(back, limits);
    }

    #[test]
    fn test_decode_map_yields_plain_values() {
        let map = Xml::decode_map(b"<config><port>8080</port><host>localhost</host></config>")
            .unwrap();
        assert_eq!(map["port"], json!("8080"));
        assert_eq!(map["host"], json!("localhost"));
    }

    #[test]
    fn test_decode_map_flattens_nested_elements() {
        let map = Xml::decode_map(
            b"<config><server><port>8080</port></server><name>edge</name></config>",
        )
        .unwrap();
        assert_eq!(map["server"], json!({"port": "8080"}));
        assert_eq!(map["name"], json!("edge"));
    }

    #[test]
    fn test_flatten_text_keeps_attributes() {
        let value = json!({"@id": "1", "$text": "x"});
        assert_eq!(flatten_text(value.clone()), value);
        assert_eq!(flatten_text(json!({"$text": "x"})), json!("x"));
    }
}
