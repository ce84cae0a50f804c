//! INI codec.
//!
//! Both directions use `rust-ini`, so keys keep the case written in the file.
//! On read, the general section maps to top-level fields and each
//! `[section]` to a nested mapping. Values are text; they are coerced to the
//! numeric, boolean or string type the target asks for, and an empty value
//! reads as an unset optional field. On write, unset fields are omitted and
//! anything nested deeper than one section is stored as JSON text.

use super::{ConfigFormat, FormatTag, utf8};
use crate::error::{ConfigError, Result};
use ::ini::Ini as IniDocument;
use serde::de::value::{Error as ValueError, MapDeserializer};
use serde::de::{self, Deserializer, IntoDeserializer, Visitor};
use serde::{Serialize, de::DeserializeOwned, forward_to_deserialize_any};
use serde_json::Value;

/// INI configuration files (`.ini`).
pub struct Ini;

impl ConfigFormat for Ini {
    const TAG: FormatTag = FormatTag::Ini;

    fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
        let doc = IniDocument::load_from_str(utf8(Self::TAG, bytes)?)
            .map_err(|e| ConfigError::format(Self::TAG, e))?;

        let mut root = Vec::new();
        for (section, properties) in doc.iter() {
            let entries: Vec<_> = properties
                .iter()
                .map(|(key, value)| (key, Node::Text(value)))
                .collect();
            match section {
                None => root.extend(entries),
                Some(name) => root.push((name, Node::Table(entries))),
            }
        }

        T::deserialize(Node::Table(root)).map_err(|e| ConfigError::format(Self::TAG, e))
    }

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
        let root = serde_json::to_value(value).map_err(|e| ConfigError::format(Self::TAG, e))?;
        let Value::Object(root) = root else {
            return Err(ConfigError::TypeMismatch(format!(
                "INI output needs a mapping at the root, got {}",
                super::kind_of(&root)
            )));
        };

        let mut doc = IniDocument::new();
        // General-section keys first, so they are not read back as part of a section
        for (key, value) in &root {
            if !value.is_object() && !value.is_null() {
                doc.with_general_section().set(key.as_str(), scalar_text(value));
            }
        }
        for (key, value) in &root {
            if let Value::Object(section) = value {
                for (field, item) in section.iter().filter(|(_, item)| !item.is_null()) {
                    doc.with_section(Some(key.as_str()))
                        .set(field.as_str(), scalar_text(item));
                }
            }
        }

        let mut out = Vec::new();
        doc.write_to(&mut out)
            .map_err(|e| ConfigError::format(Self::TAG, e))?;
        Ok(out)
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Parsed INI content, borrowed from the document.
enum Node<'a> {
    Text(&'a str),
    Table(Vec<(&'a str, Node<'a>)>),
}

impl<'a> Node<'a> {
    /// Interpret a text value by its shape, for targets that accept anything.
    fn visit_text<'de, V: Visitor<'de>>(
        text: &'a str,
        visitor: V,
    ) -> std::result::Result<V::Value, ValueError> {
        let trimmed = text.trim();
        if trimmed.starts_with('[') || trimmed.starts_with('{') {
            if let Ok(json) = serde_json::from_str::<Value>(trimmed) {
                return json.deserialize_any(visitor).map_err(de::Error::custom);
            }
        }
        if let Ok(flag) = trimmed.parse::<bool>() {
            return visitor.visit_bool(flag);
        }
        if let Ok(int) = trimmed.parse::<i64>() {
            return visitor.visit_i64(int);
        }
        if let Ok(uint) = trimmed.parse::<u64>() {
            return visitor.visit_u64(uint);
        }
        let numeric = trimmed.bytes().any(|b| b.is_ascii_digit())
            && trimmed
                .bytes()
                .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'-' | b'+' | b'e' | b'E'));
        if numeric {
            if let Ok(float) = trimmed.parse::<f64>() {
                return visitor.visit_f64(float);
            }
        }
        visitor.visit_str(text)
    }
}

impl<'de, 'a> IntoDeserializer<'de, ValueError> for Node<'a> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

impl<'de, 'a> Deserializer<'de> for Node<'a> {
    type Error = ValueError;

    fn deserialize_any<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> std::result::Result<V::Value, ValueError> {
        match self {
            Node::Text(text) => Node::visit_text(text, visitor),
            Node::Table(entries) => {
                let mut map: MapDeserializer<'de, _, ValueError> =
                    MapDeserializer::new(entries.into_iter());
                let value = visitor.visit_map(&mut map)?;
                map.end()?;
                Ok(value)
            }
        }
    }

    fn deserialize_str<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> std::result::Result<V::Value, ValueError> {
        match self {
            Node::Text(text) => visitor.visit_str(text),
            table => table.deserialize_any(visitor),
        }
    }

    fn deserialize_string<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> std::result::Result<V::Value, ValueError> {
        self.deserialize_str(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(
        self,
        visitor: V,
    ) -> std::result::Result<V::Value, ValueError> {
        match self {
            Node::Text(text) if text.trim().is_empty() => visitor.visit_none(),
            node => visitor.visit_some(node),
        }
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> std::result::Result<V::Value, ValueError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> std::result::Result<V::Value, ValueError> {
        match self {
            Node::Text(text) => visitor.visit_enum(text.trim().into_deserializer()),
            table => table.deserialize_any(visitor),
        }
    }

    forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char bytes byte_buf
        unit unit_struct seq tuple tuple_struct map struct identifier ignored_any
    }
}
