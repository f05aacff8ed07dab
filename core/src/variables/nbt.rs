//! file: core/src/variables/nbt.rs
//! description: structured values written to runtime storage.
//!
//! `NbtValue` mirrors the target's tag types and may hold `Deferred`
//! leaves anywhere. A value holding a placeholder has no literal form:
//! `to_snbt` and serde serialization both refuse it.

use std::fmt;

use indexmap::IndexMap;
use serde::ser::{Error as _, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::error::{CoreError, Result};
use crate::variables::resolve::Deferred;

/// Numeric representation of a stored register value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericType {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl NumericType {
    pub fn as_str(self) -> &'static str {
        match self {
            NumericType::Byte => "byte",
            NumericType::Short => "short",
            NumericType::Int => "int",
            NumericType::Long => "long",
            NumericType::Float => "float",
            NumericType::Double => "double",
        }
    }

    pub fn zero(self) -> &'static str {
        match self {
            NumericType::Byte => "0b",
            NumericType::Short => "0s",
            NumericType::Int => "0",
            NumericType::Long => "0L",
            NumericType::Float => "0f",
            NumericType::Double => "0d",
        }
    }
}

impl fmt::Display for NumericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sequence a register array is rebuilt as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequenceKind {
    ByteArray,
    IntArray,
    LongArray,
    List(NumericType),
}

impl SequenceKind {
    pub fn element(self) -> NumericType {
        match self {
            SequenceKind::ByteArray => NumericType::Byte,
            SequenceKind::IntArray => NumericType::Int,
            SequenceKind::LongArray => NumericType::Long,
            SequenceKind::List(numeric) => numeric,
        }
    }

    pub fn empty(self) -> &'static str {
        match self {
            SequenceKind::ByteArray => "[B;]",
            SequenceKind::IntArray => "[I;]",
            SequenceKind::LongArray => "[L;]",
            SequenceKind::List(_) => "[]",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NbtValue {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    List(Vec<NbtValue>),
    Compound(IndexMap<String, NbtValue>),
    ByteArray(Vec<i8>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
    Deferred(Deferred),
}

impl NbtValue {
    pub fn compound<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, NbtValue)>,
    {
        NbtValue::Compound(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn list(items: impl IntoIterator<Item = NbtValue>) -> Self {
        NbtValue::List(items.into_iter().collect())
    }

    pub fn is_container(&self) -> bool {
        matches!(self, NbtValue::Compound(_) | NbtValue::List(_))
    }

    pub fn shape(&self) -> String {
        match self {
            NbtValue::Byte(_) => "byte".into(),
            NbtValue::Short(_) => "short".into(),
            NbtValue::Int(_) => "int".into(),
            NbtValue::Long(_) => "long".into(),
            NbtValue::Float(_) => "float".into(),
            NbtValue::Double(_) => "double".into(),
            NbtValue::String(_) => "string".into(),
            NbtValue::List(_) => "list".into(),
            NbtValue::Compound(_) => "compound".into(),
            NbtValue::ByteArray(_) => "byte array".into(),
            NbtValue::IntArray(_) => "int array".into(),
            NbtValue::LongArray(_) => "long array".into(),
            NbtValue::Deferred(deferred) => deferred.shape(),
        }
    }

    /// Render as stringified NBT. NaN and infinite floats have no SNBT form.
    pub fn to_snbt(&self) -> Result<String> {
        self.snbt_at("")
    }

    fn snbt_at(&self, path: &str) -> Result<String> {
        let text = match self {
            NbtValue::Byte(v) => format!("{}b", v),
            NbtValue::Short(v) => format!("{}s", v),
            NbtValue::Int(v) => v.to_string(),
            NbtValue::Long(v) => format!("{}L", v),
            NbtValue::Float(v) if !v.is_finite() => return Err(non_finite(path, "float")),
            NbtValue::Float(v) => format!("{}f", v),
            NbtValue::Double(v) if !v.is_finite() => return Err(non_finite(path, "double")),
            NbtValue::Double(v) => format!("{}d", v),
            NbtValue::String(v) => quote(v),
            NbtValue::List(items) => {
                let parts = items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| item.snbt_at(&format!("{}[{}]", path, i)))
                    .collect::<Result<Vec<_>>>()?;
                format!("[{}]", parts.join(","))
            }
            NbtValue::Compound(entries) => {
                let mut parts = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let sub = if path.is_empty() { key.clone() } else { format!("{}.{}", path, key) };
                    parts.push(format!("{}:{}", snbt_key(key), value.snbt_at(&sub)?));
                }
                format!("{{{}}}", parts.join(","))
            }
            NbtValue::ByteArray(items) => typed_array("B", items.iter().map(|v| format!("{}b", v))),
            NbtValue::IntArray(items) => typed_array("I", items.iter().map(|v| v.to_string())),
            NbtValue::LongArray(items) => typed_array("L", items.iter().map(|v| format!("{}L", v))),
            NbtValue::Deferred(_) => return Err(CoreError::PlaceholderNotSerializable),
        };
        Ok(text)
    }

    /// Convert a JSON document. `null` has no tag equivalent.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        Self::from_json_at(value, "")
    }

    fn from_json_at(value: &serde_json::Value, path: &str) -> Result<Self> {
        use serde_json::Value;

        Ok(match value {
            Value::Null => {
                return Err(CoreError::UnsupportedValueType {
                    path: display_path(path),
                    shape: "null".to_string(),
                });
            }
            Value::Bool(b) => NbtValue::Byte(i8::from(*b)),
            Value::Number(n) => match n.as_i64() {
                Some(i) => match i32::try_from(i) {
                    Ok(small) => NbtValue::Int(small),
                    Err(_) => NbtValue::Long(i),
                },
                None => NbtValue::Double(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => NbtValue::String(s.clone()),
            Value::Array(items) => NbtValue::List(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| Self::from_json_at(item, &format!("{}[{}]", path, i)))
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Object(entries) => {
                let mut out = IndexMap::with_capacity(entries.len());
                for (key, item) in entries {
                    let sub = if path.is_empty() { key.clone() } else { format!("{}.{}", path, key) };
                    out.insert(key.clone(), Self::from_json_at(item, &sub)?);
                }
                NbtValue::Compound(out)
            }
        })
    }

    /// The value with every placeholder removed. Compound entries holding
    /// a placeholder are dropped, list elements too, so later indexed
    /// inserts land on their authored positions.
    pub fn skeleton(&self) -> NbtValue {
        match self {
            NbtValue::Compound(entries) => NbtValue::Compound(
                entries
                    .iter()
                    .filter(|(_, v)| !matches!(v, NbtValue::Deferred(_)))
                    .map(|(k, v)| (k.clone(), v.skeleton()))
                    .collect(),
            ),
            NbtValue::List(items) => NbtValue::List(
                items
                    .iter()
                    .filter(|v| !matches!(v, NbtValue::Deferred(_)))
                    .map(NbtValue::skeleton)
                    .collect(),
            ),
            other => other.clone(),
        }
    }
}

fn typed_array(prefix: &str, items: impl Iterator<Item = String>) -> String {
    let items: Vec<String> = items.collect();
    format!("[{};{}]", prefix, items.join(","))
}

pub(crate) fn quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

pub(crate) fn is_bare_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+' | '.'))
}

fn display_path(path: &str) -> String {
    if path.is_empty() { "<root>".to_string() } else { path.to_string() }
}

fn non_finite(path: &str, kind: &str) -> CoreError {
    CoreError::UnsupportedValueType {
        path: display_path(path),
        shape: format!("non-finite {}", kind),
    }
}

fn snbt_key(key: &str) -> String {
    if is_bare_key(key) { key.to_string() } else { quote(key) }
}

impl Serialize for NbtValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            NbtValue::Byte(v) => serializer.serialize_i8(*v),
            NbtValue::Short(v) => serializer.serialize_i16(*v),
            NbtValue::Int(v) => serializer.serialize_i32(*v),
            NbtValue::Long(v) => serializer.serialize_i64(*v),
            NbtValue::Float(v) => serializer.serialize_f32(*v),
            NbtValue::Double(v) => serializer.serialize_f64(*v),
            NbtValue::String(v) => serializer.serialize_str(v),
            NbtValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            NbtValue::Compound(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (key, value) in entries {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
            NbtValue::ByteArray(items) => items.serialize(serializer),
            NbtValue::IntArray(items) => items.serialize(serializer),
            NbtValue::LongArray(items) => items.serialize(serializer),
            NbtValue::Deferred(_) => Err(S::Error::custom(CoreError::PlaceholderNotSerializable)),
        }
    }
}

impl From<i8> for NbtValue {
    fn from(v: i8) -> Self {
        NbtValue::Byte(v)
    }
}

impl From<i16> for NbtValue {
    fn from(v: i16) -> Self {
        NbtValue::Short(v)
    }
}

impl From<i32> for NbtValue {
    fn from(v: i32) -> Self {
        NbtValue::Int(v)
    }
}

impl From<i64> for NbtValue {
    fn from(v: i64) -> Self {
        NbtValue::Long(v)
    }
}

impl From<f32> for NbtValue {
    fn from(v: f32) -> Self {
        NbtValue::Float(v)
    }
}

impl From<f64> for NbtValue {
    fn from(v: f64) -> Self {
        NbtValue::Double(v)
    }
}

impl From<bool> for NbtValue {
    fn from(v: bool) -> Self {
        NbtValue::Byte(i8::from(v))
    }
}

impl From<&str> for NbtValue {
    fn from(v: &str) -> Self {
        NbtValue::String(v.to_string())
    }
}

impl From<String> for NbtValue {
    fn from(v: String) -> Self {
        NbtValue::String(v)
    }
}

impl From<Vec<NbtValue>> for NbtValue {
    fn from(v: Vec<NbtValue>) -> Self {
        NbtValue::List(v)
    }
}

impl From<IndexMap<String, NbtValue>> for NbtValue {
    fn from(v: IndexMap<String, NbtValue>) -> Self {
        NbtValue::Compound(v)
    }
}

impl From<Deferred> for NbtValue {
    fn from(v: Deferred) -> Self {
        NbtValue::Deferred(v)
    }
}
