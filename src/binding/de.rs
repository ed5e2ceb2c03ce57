//! A lenient `serde` deserializer over configuration values.
//!
//! Configuration values mostly arrive as strings (environment variables,
//! in-memory pairs), so scalars convert on demand: `"60"` binds to an `i32`,
//! `"TRUE"` to a `bool`, `42` to a `String`. Struct fields and enum variants
//! match ignoring case and `_`/`-`.

use std::fmt;

use serde::de::{
    self, value::StringDeserializer, DeserializeSeed, Deserializer, EnumAccess, IntoDeserializer,
    MapAccess, SeqAccess, Unexpected, VariantAccess, Visitor,
};
use thiserror::Error;
use toml::{Table, Value};

use crate::config::key_eq;

/// A value could not be converted to the target field's type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}{}", render_path(.path))]
pub struct BindError {
    message: String,
    path: Vec<String>,
}

impl BindError {
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Dotted key path of the offending value, empty for the section itself.
    pub fn path(&self) -> String {
        self.path.join(".")
    }

    fn within(mut self, key: impl Into<String>) -> Self {
        self.path.insert(0, key.into());
        self
    }
}

impl de::Error for BindError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self {
            message: msg.to_string(),
            path: Vec::new(),
        }
    }
}

fn render_path(path: &[String]) -> String {
    if path.is_empty() {
        String::new()
    } else {
        format!(" (at '{}')", path.join("."))
    }
}

fn key_deserializer(key: String) -> StringDeserializer<BindError> {
    key.into_deserializer()
}

fn parse_bool(s: &str) -> Option<bool> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Turns a table keyed `0..n` into a sequence ordered by index.
fn indexed_items(table: Table) -> Result<Vec<Value>, Table> {
    if !table.keys().all(|k| k.parse::<usize>().is_ok()) {
        return Err(table);
    }
    let mut items: Vec<(usize, Value)> = table
        .into_iter()
        .filter_map(|(k, v)| k.parse().ok().map(|index| (index, v)))
        .collect();
    items.sort_by_key(|(index, _)| *index);
    Ok(items.into_iter().map(|(_, v)| v).collect())
}

pub(crate) struct SectionDeserializer {
    value: Value,
}

impl SectionDeserializer {
    pub(crate) fn new(value: Value) -> Self {
        Self { value }
    }
}

macro_rules! deserialize_integer {
    ($($method:ident)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
            match self.value {
                Value::Integer(i) => visitor.visit_i64(i),
                Value::String(s) => {
                    let trimmed = s.trim();
                    if let Ok(i) = trimmed.parse::<i64>() {
                        visitor.visit_i64(i)
                    } else if let Ok(u) = trimmed.parse::<u64>() {
                        visitor.visit_u64(u)
                    } else {
                        Err(de::Error::invalid_value(Unexpected::Str(&s), &visitor))
                    }
                }
                other => SectionDeserializer::new(other).deserialize_any(visitor),
            }
        }
    )*};
}

macro_rules! deserialize_float {
    ($($method:ident)*) => {$(
        fn $method<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
            match self.value {
                Value::Float(f) => visitor.visit_f64(f),
                Value::Integer(i) => visitor.visit_i64(i),
                Value::String(s) => match s.trim().parse::<f64>() {
                    Ok(f) => visitor.visit_f64(f),
                    Err(_) => Err(de::Error::invalid_value(Unexpected::Str(&s), &visitor)),
                },
                other => SectionDeserializer::new(other).deserialize_any(visitor),
            }
        }
    )*};
}

impl<'de> Deserializer<'de> for SectionDeserializer {
    type Error = BindError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        match self.value {
            Value::String(s) => visitor.visit_string(s),
            Value::Integer(i) => visitor.visit_i64(i),
            Value::Float(f) => visitor.visit_f64(f),
            Value::Boolean(b) => visitor.visit_bool(b),
            Value::Datetime(dt) => visitor.visit_string(dt.to_string()),
            Value::Array(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            Value::Table(table) => visitor.visit_map(TableDeserializer::new(table, &[])),
        }
    }

    fn deserialize_bool<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        match self.value {
            Value::Boolean(b) => visitor.visit_bool(b),
            Value::String(s) => match parse_bool(&s) {
                Some(b) => visitor.visit_bool(b),
                None => Err(de::Error::invalid_value(Unexpected::Str(&s), &visitor)),
            },
            other => SectionDeserializer::new(other).deserialize_any(visitor),
        }
    }

    deserialize_integer! {
        deserialize_i8 deserialize_i16 deserialize_i32 deserialize_i64 deserialize_i128
        deserialize_u8 deserialize_u16 deserialize_u32 deserialize_u64 deserialize_u128
    }

    deserialize_float! { deserialize_f32 deserialize_f64 }

    fn deserialize_string<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        match self.value {
            Value::String(s) => visitor.visit_string(s),
            Value::Integer(i) => visitor.visit_string(i.to_string()),
            Value::Float(f) => visitor.visit_string(f.to_string()),
            Value::Boolean(b) => visitor.visit_string(b.to_string()),
            Value::Datetime(dt) => visitor.visit_string(dt.to_string()),
            other => SectionDeserializer::new(other).deserialize_any(visitor),
        }
    }

    fn deserialize_str<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        self.deserialize_string(visitor)
    }

    fn deserialize_char<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        self.deserialize_string(visitor)
    }

    fn deserialize_identifier<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        self.deserialize_string(visitor)
    }

    fn deserialize_bytes<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        self.deserialize_any(visitor)
    }

    fn deserialize_byte_buf<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        self.deserialize_any(visitor)
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_some(self)
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_unit()
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, BindError> {
        visitor.visit_unit()
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, BindError> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        match self.value {
            Value::Array(items) => visitor.visit_seq(SeqDeserializer::new(items)),
            Value::Table(table) => match indexed_items(table) {
                Ok(items) => visitor.visit_seq(SeqDeserializer::new(items)),
                Err(table) => visitor.visit_map(TableDeserializer::new(table, &[])),
            },
            other => SectionDeserializer::new(other).deserialize_any(visitor),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, BindError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, BindError> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        self.deserialize_any(visitor)
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, BindError> {
        match self.value {
            Value::Table(table) => visitor.visit_map(TableDeserializer::new(table, fields)),
            other => SectionDeserializer::new(other).deserialize_any(visitor),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, BindError> {
        match self.value {
            Value::String(s) => {
                let variant = variants
                    .iter()
                    .find(|v| key_eq(v, s.trim()))
                    .ok_or_else(|| <BindError as de::Error>::unknown_variant(&s, variants))?;
                visitor.visit_enum(TableEnum {
                    variant: (*variant).to_string(),
                    value: None,
                })
            }
            Value::Table(table) if table.len() == 1 => {
                let Some((key, value)) = table.into_iter().next() else {
                    return Err(de::Error::invalid_length(0, &"a single variant"));
                };
                let variant = variants
                    .iter()
                    .find(|v| key_eq(v, &key))
                    .map_or(key, |v| (*v).to_string());
                visitor.visit_enum(TableEnum {
                    variant,
                    value: Some(value),
                })
            }
            other => SectionDeserializer::new(other).deserialize_any(visitor),
        }
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, BindError> {
        visitor.visit_unit()
    }
}

struct SeqDeserializer {
    items: std::vec::IntoIter<Value>,
    index: usize,
}

impl SeqDeserializer {
    fn new(items: Vec<Value>) -> Self {
        Self {
            items: items.into_iter(),
            index: 0,
        }
    }
}

impl<'de> SeqAccess<'de> for SeqDeserializer {
    type Error = BindError;

    fn next_element_seed<S: DeserializeSeed<'de>>(
        &mut self,
        seed: S,
    ) -> Result<Option<S::Value>, BindError> {
        let Some(value) = self.items.next() else {
            return Ok(None);
        };
        let index = self.index;
        self.index += 1;
        seed.deserialize(SectionDeserializer::new(value))
            .map(Some)
            .map_err(|e| e.within(index.to_string()))
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.items.len())
    }
}

/// Walks a table, renaming keys to the struct field they match.
struct TableDeserializer {
    entries: toml::map::IntoIter,
    fields: &'static [&'static str],
    pending: Option<(String, Value)>,
}

impl TableDeserializer {
    fn new(table: Table, fields: &'static [&'static str]) -> Self {
        Self {
            entries: table.into_iter(),
            fields,
            pending: None,
        }
    }
}

impl<'de> MapAccess<'de> for TableDeserializer {
    type Error = BindError;

    fn next_key_seed<S: DeserializeSeed<'de>>(
        &mut self,
        seed: S,
    ) -> Result<Option<S::Value>, BindError> {
        let Some((key, value)) = self.entries.next() else {
            return Ok(None);
        };
        let name = self
            .fields
            .iter()
            .find(|field| key_eq(field, &key))
            .map_or_else(|| key.clone(), |field| (*field).to_string());
        self.pending = Some((key, value));
        seed.deserialize(key_deserializer(name)).map(Some)
    }

    fn next_value_seed<S: DeserializeSeed<'de>>(&mut self, seed: S) -> Result<S::Value, BindError> {
        let (key, value) = self
            .pending
            .take()
            .ok_or_else(|| <BindError as de::Error>::custom("value requested before its key"))?;
        seed.deserialize(SectionDeserializer::new(value))
            .map_err(|e| e.within(key))
    }
}

struct TableEnum {
    variant: String,
    value: Option<Value>,
}

impl<'de> EnumAccess<'de> for TableEnum {
    type Error = BindError;
    type Variant = VariantDeserializer;

    fn variant_seed<S: DeserializeSeed<'de>>(
        self,
        seed: S,
    ) -> Result<(S::Value, Self::Variant), BindError> {
        let tag = seed.deserialize(key_deserializer(self.variant.clone()))?;
        Ok((
            tag,
            VariantDeserializer {
                variant: self.variant,
                value: self.value,
            },
        ))
    }
}

struct VariantDeserializer {
    variant: String,
    value: Option<Value>,
}

impl VariantDeserializer {
    fn content(self) -> Result<SectionDeserializer, BindError> {
        match self.value {
            Some(value) => Ok(SectionDeserializer::new(value)),
            None => Err(de::Error::invalid_type(
                Unexpected::UnitVariant,
                &"a variant with content",
            )),
        }
    }
}

impl<'de> VariantAccess<'de> for VariantDeserializer {
    type Error = BindError;

    fn unit_variant(self) -> Result<(), BindError> {
        Ok(())
    }

    fn newtype_variant_seed<S: DeserializeSeed<'de>>(self, seed: S) -> Result<S::Value, BindError> {
        let variant = self.variant.clone();
        seed.deserialize(self.content()?)
            .map_err(|e| e.within(variant))
    }

    fn tuple_variant<V: Visitor<'de>>(self, _len: usize, visitor: V) -> Result<V::Value, BindError> {
        let variant = self.variant.clone();
        Deserializer::deserialize_seq(self.content()?, visitor).map_err(|e| e.within(variant))
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, BindError> {
        let variant = self.variant.clone();
        Deserializer::deserialize_struct(self.content()?, "", fields, visitor)
            .map_err(|e| e.within(variant))
    }
}
