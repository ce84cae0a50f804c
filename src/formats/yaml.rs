//! YAML codec.

use super::{ConfigFormat, FormatTag, utf8};
use crate::error::{ConfigError, Result};
use serde::{Serialize, de::DeserializeOwned};

/// YAML configuration files (`.yaml`, `.yml`).
pub struct Yaml;

impl ConfigFormat for Yaml {
    const TAG: FormatTag = FormatTag::Yaml;

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        serde_yaml::from_str(utf8(Self::TAG, bytes)?).map_err(|e| ConfigError::format(Self::TAG, e))
    }

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
        serde_yaml::to_string(value)
            .map(String::into_bytes)
            .map_err(|e| ConfigError::format(Self::TAG, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_map() {
        let map = Yaml::decode_map(
            br#"
server:
  port: 8080
  hosts: [a, b]
debug: false
"#,
        )
        .unwrap();
        assert_eq!(map["server"], json!({"port": 8080, "hosts": ["a", "b"]}));
        assert_eq!(map["debug"], json!(false));
    }

    #[test]
    fn test_scalar_root_is_type_mismatch() {
        let err = Yaml::decode_map(b"just a string").unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch(_)));
    }
}
