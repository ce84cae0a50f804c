//! Format-specific readers and writers.
//!
//! Every supported format implements [`ConfigFormat`]: decode raw bytes into a
//! typed value, decode them into an untyped [`Snapshot`], and encode a typed
//! value back to bytes. [`FormatTag`] is resolved once when a configuration is
//! registered and dispatches to the matching codec afterwards.

#[cfg(feature = "ini")]
mod ini;
#[cfg(feature = "json")]
mod json;
#[cfg(feature = "toml")]
mod toml;
#[cfg(feature = "xml")]
mod xml;
#[cfg(feature = "yaml")]
mod yaml;

#[cfg(feature = "ini")]
pub use self::ini::Ini;
#[cfg(feature = "json")]
pub use self::json::Json;
#[cfg(feature = "toml")]
pub use self::toml::Toml;
#[cfg(feature = "xml")]
pub use self::xml::Xml;
#[cfg(feature = "yaml")]
pub use self::yaml::Yaml;

use crate::error::{ConfigError, Result};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};
use std::fmt;
use std::path::Path;

/// Untyped key/value view of a configuration, used for diffing.
pub type Snapshot = Map<String, Value>;

/// Prefix marking a "managed" variant of a format tag, e.g. `.mk.json`.
const MANAGED_PREFIX: &str = "mk.";

/// A serialization format with typed and untyped decoding.
pub trait ConfigFormat {
    /// The tag this codec is registered under.
    const TAG: FormatTag;

    /// Decode raw content into a typed value.
    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T>;

    /// Encode a typed value into raw content.
    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>>;

    /// Decode raw content into an untyped key/value snapshot.
    ///
    /// Empty documents decode to an empty snapshot. A document whose root is
    /// not a mapping is a [`ConfigError::TypeMismatch`].
    fn decode_map(bytes: &[u8]) -> Result<Snapshot> {
        match Self::decode::<Value>(bytes)? {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Snapshot::new()),
            other => Err(ConfigError::TypeMismatch(format!(
                "{} document root is {}, expected a mapping",
                Self::TAG,
                kind_of(&other)
            ))),
        }
    }
}

/// The configuration formats understood by the registry.
///
/// Tags are matched case-insensitively, with or without a leading dot, and
/// accept the managed `.mk.<ext>` variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatTag {
    /// `.json`
    Json,
    /// `.yaml` / `.yml`
    Yaml,
    /// `.xml`
    Xml,
    /// `.toml`
    Toml,
    /// `.ini`
    Ini,
}

impl FormatTag {
    /// Resolve a format tag such as `.json`, `YML` or `.mk.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedFormat`] for unknown tags.
    pub fn parse(tag: &str) -> Result<Self> {
        let lowered = tag.trim().to_ascii_lowercase();
        let bare = lowered.strip_prefix('.').unwrap_or(&lowered);
        let bare = bare.strip_prefix(MANAGED_PREFIX).unwrap_or(bare);

        match bare {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            "xml" => Ok(Self::Xml),
            "toml" => Ok(Self::Toml),
            "ini" => Ok(Self::Ini),
            _ => Err(ConfigError::UnsupportedFormat(tag.to_string())),
        }
    }

    /// Split a file name like `app.mk.yaml` into its base name (`app`) and
    /// format tag (`.mk.yaml`).
    ///
    /// # Errors
    ///
    /// Fails when the file has no extension or the extension is unsupported.
    pub fn split_file_name(file_name: &str) -> Result<(String, String)> {
        let path = Path::new(file_name);
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| {
                ConfigError::UnsupportedFormat(format!(
                    "unable to determine format for '{}'",
                    file_name
                ))
            })?;
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();

        let (base, tag) = match stem.rsplit_once('.') {
            Some((base, marker)) if marker.eq_ignore_ascii_case("mk") => {
                (base, format!(".{}.{}", marker, ext))
            }
            _ => (stem, format!(".{}", ext)),
        };
        Self::parse(&tag)?;
        Ok((base.to_string(), tag))
    }

    /// Canonical file extension, including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => ".json",
            Self::Yaml => ".yaml",
            Self::Xml => ".xml",
            Self::Toml => ".toml",
            Self::Ini => ".ini",
        }
    }

    /// Decode raw content into a typed value using this format.
    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T> {
        match self {
            #[cfg(feature = "json")]
            Self::Json => Json::decode(bytes),
            #[cfg(feature = "yaml")]
            Self::Yaml => Yaml::decode(bytes),
            #[cfg(feature = "xml")]
            Self::Xml => Xml::decode(bytes),
            #[cfg(feature = "toml")]
            Self::Toml => Toml::decode(bytes),
            #[cfg(feature = "ini")]
            Self::Ini => Ini::decode(bytes),
            #[allow(unreachable_patterns)]
            _ => Err(self.disabled()),
        }
    }

    /// Decode raw content into an untyped snapshot using this format.
    pub fn decode_map(&self, bytes: &[u8]) -> Result<Snapshot> {
        match self {
            #[cfg(feature = "json")]
            Self::Json => Json::decode_map(bytes),
            #[cfg(feature = "yaml")]
            Self::Yaml => Yaml::decode_map(bytes),
            #[cfg(feature = "xml")]
            Self::Xml => Xml::decode_map(bytes),
            #[cfg(feature = "toml")]
            Self::Toml => Toml::decode_map(bytes),
            #[cfg(feature = "ini")]
            Self::Ini => Ini::decode_map(bytes),
            #[allow(unreachable_patterns)]
            _ => Err(self.disabled()),
        }
    }

    /// Encode a typed value using this format.
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>> {
        match self {
            #[cfg(feature = "json")]
            Self::Json => Json::encode(value),
            #[cfg(feature = "yaml")]
            Self::Yaml => Yaml::encode(value),
            #[cfg(feature = "xml")]
            Self::Xml => Xml::encode(value),
            #[cfg(feature = "toml")]
            Self::Toml => Toml::encode(value),
            #[cfg(feature = "ini")]
            Self::Ini => Ini::encode(value),
            #[allow(unreachable_patterns)]
            _ => Err(self.disabled()),
        }
    }

    /// Fail early if the codec for this format was compiled out.
    pub(crate) fn ensure_enabled(&self) -> Result<()> {
        let enabled = match self {
            Self::Json => cfg!(feature = "json"),
            Self::Yaml => cfg!(feature = "yaml"),
            Self::Xml => cfg!(feature = "xml"),
            Self::Toml => cfg!(feature = "toml"),
            Self::Ini => cfg!(feature = "ini"),
        };
        if enabled { Ok(()) } else { Err(self.disabled()) }
    }

    fn disabled(&self) -> ConfigError {
        ConfigError::FeatureNotEnabled(match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Xml => "xml",
            Self::Toml => "toml",
            Self::Ini => "ini",
        })
    }
}

impl fmt::Display for FormatTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Json => "JSON",
            Self::Yaml => "YAML",
            Self::Xml => "XML",
            Self::Toml => "TOML",
            Self::Ini => "INI",
        };
        f.write_str(name)
    }
}

/// Interpret raw bytes as UTF-8 text for text-based parsers.
pub(crate) fn utf8(format: FormatTag, bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes).map_err(|e| ConfigError::format(format, e))
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_tags() {
        assert_eq!(FormatTag::parse(".json").unwrap(), FormatTag::Json);
        assert_eq!(FormatTag::parse(".yaml").unwrap(), FormatTag::Yaml);
        assert_eq!(FormatTag::parse(".yml").unwrap(), FormatTag::Yaml);
        assert_eq!(FormatTag::parse(".xml").unwrap(), FormatTag::Xml);
        assert_eq!(FormatTag::parse(".toml").unwrap(), FormatTag::Toml);
        assert_eq!(FormatTag::parse(".ini").unwrap(), FormatTag::Ini);
    }

    #[test]
    fn test_parse_is_case_insensitive_and_accepts_managed_prefix() {
        assert_eq!(FormatTag::parse(".JSON").unwrap(), FormatTag::Json);
        assert_eq!(FormatTag::parse("yml").unwrap(), FormatTag::Yaml);
        assert_eq!(FormatTag::parse(".mk.toml").unwrap(), FormatTag::Toml);
        assert_eq!(FormatTag::parse(".MK.Ini").unwrap(), FormatTag::Ini);
    }

    #[test]
    fn test_parse_unknown_tag() {
        let err = FormatTag::parse(".txt").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(tag) if tag == ".txt"));
        assert!(FormatTag::parse(".mk.").is_err());
    }

    #[test]
    fn test_split_file_name() {
        assert_eq!(
            FormatTag::split_file_name("app.yaml").unwrap(),
            ("app".to_string(), ".yaml".to_string())
        );
        assert_eq!(
            FormatTag::split_file_name("app.mk.json").unwrap(),
            ("app".to_string(), ".mk.json".to_string())
        );
        assert!(FormatTag::split_file_name("README").is_err());
    }

    #[test]
    fn test_split_file_name_managed_marker_any_case() {
        assert_eq!(
            FormatTag::split_file_name("app.Mk.json").unwrap(),
            ("app".to_string(), ".Mk.json".to_string())
        );
        assert_eq!(
            FormatTag::split_file_name("app.MK.YAML").unwrap(),
            ("app".to_string(), ".MK.YAML".to_string())
        );
        assert_eq!(
            FormatTag::parse(".Mk.json").unwrap(),
            FormatTag::Json
        );
        assert!(FormatTag::split_file_name("notes.txt").is_err());
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_decode_map_rejects_non_mapping_root() {
        let err = FormatTag::Json.decode_map(b"[1, 2, 3]").unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch(_)));
    }
}
