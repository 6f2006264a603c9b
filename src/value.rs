use quartz_nbt::NbtTag;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Plain-data view of a parsed NBT tag, one variant per tag family.
///
/// Conversion from [`NbtTag`] is total, so a new tag kind in the wire format
/// fails to compile here instead of falling through at runtime.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    ByteArray(Vec<i8>),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
    List(Vec<Value>),
    Compound(FxHashMap<String, Value>),
}

impl Value {
    /// Widen any integer-like variant to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Byte(v) => Some(*v as i64),
            Value::Short(v) => Some(*v as i64),
            Value::Int(v) => Some(*v as i64),
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&NbtTag> for Value {
    fn from(tag: &NbtTag) -> Self {
        match tag {
            NbtTag::Byte(v) => Value::Byte(*v),
            NbtTag::Short(v) => Value::Short(*v),
            NbtTag::Int(v) => Value::Int(*v),
            NbtTag::Long(v) => Value::Long(*v),
            NbtTag::Float(v) => Value::Float(*v),
            NbtTag::Double(v) => Value::Double(*v),
            NbtTag::String(s) => Value::String(s.clone()),
            NbtTag::ByteArray(arr) => Value::ByteArray(arr.clone()),
            NbtTag::IntArray(arr) => Value::IntArray(arr.clone()),
            NbtTag::LongArray(arr) => Value::LongArray(arr.clone()),
            NbtTag::List(list) => Value::List(list.iter().map(Value::from).collect()),
            NbtTag::Compound(compound) => Value::Compound(
                compound
                    .inner()
                    .iter()
                    .map(|(key, tag)| (key.clone(), Value::from(tag)))
                    .collect(),
            ),
        }
    }
}
