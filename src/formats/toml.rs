//! TOML codec.

use super::{ConfigFormat, FormatTag, utf8};
use crate::error::{ConfigError, Result};
use serde::{Serialize, de::DeserializeOwned};

/// TOML configuration files (`.toml`).
pub struct Toml;

impl ConfigFormat for Toml {
    const TAG: FormatTag = FormatTag::Toml;

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        ::toml::from_str(utf8(Self::TAG, bytes)?).map_err(|e| ConfigError::format(Self::TAG, e))
    }

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
        ::toml::to_string_pretty(value)
            .map(String::into_bytes)
            .map_err(|e| ConfigError::format(Self::TAG, e))
    }
}
