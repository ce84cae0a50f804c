//! JSON codec.

use super::{ConfigFormat, FormatTag};
use crate::error::{ConfigError, Result};
use serde::{Serialize, de::DeserializeOwned};

/// JSON configuration files (`.json`).
pub struct Json;

impl ConfigFormat for Json {
    const TAG: FormatTag = FormatTag::Json;

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        serde_json::from_slice(bytes).map_err(|e| ConfigError::format(Self::TAG, e))
    }

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut out =
            serde_json::to_vec_pretty(value).map_err(|e| ConfigError::format(Self::TAG, e))?;
        out.push(b'\n');
        Ok(out)
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

    #[test]
    fn test_decode_typed() {
        let server: Server = Json::decode(br#"{"port": 8080, "host": "localhost"}"#).unwrap();
        assert_eq!(server.port, 8080);
        assert_eq!(server.host, "localhost");
    }

    #[test]
    fn test_decode_map_keeps_nesting() {
        let map = Json::decode_map(br#"{"server": {"port": 8080}, "debug": true}"#).unwrap();
        assert_eq!(map["server"], json!({"port": 8080}));
        assert_eq!(map["debug"], json!(true));
    }

    #[test]
    fn test_encode_is_readable_back() {
        let server = Server {
            port: 9090,
            host: "0.0.0.0".into(),
        };
        let bytes = Json::encode(&server).unwrap();
        assert_eq!(Json::decode::<Server>(&bytes).unwrap(), server);
    }

    #[test]
    fn test_malformed_input() {
        let err = Json::decode::<Server>(b"{ port: ").unwrap_err();
        assert!(matches!(err, ConfigError::Format { format: FormatTag::Json, .. }));
    }
}
