use std::fmt;

use serde::{Deserialize, Serialize};

/// The primitive kinds a serialized field can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    Bool,
    Int32,
    String,
    Float,
    Double,
}

impl PrimitiveKind {
    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Bool => "bool",
            Self::Int32 => "int",
            Self::String => "string",
            Self::Float => "float",
            Self::Double => "double",
        }
    }

    /// The value a freshly created field of this kind holds.
    pub fn default_value(&self) -> PrimitiveValue {
        match *self {
            Self::Bool => PrimitiveValue::Bool(false),
            Self::Int32 => PrimitiveValue::Int32(0),
            Self::String => PrimitiveValue::String(String::new()),
            Self::Float => PrimitiveValue::Float(0.0),
            Self::Double => PrimitiveValue::Double(0.0),
        }
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PrimitiveValue {
    Bool(bool),
    Int32(i32),
    String(String),
    Float(f32),
    Double(f64),
}

impl PrimitiveValue {
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Self::Bool(_) => PrimitiveKind::Bool,
            Self::Int32(_) => PrimitiveKind::Int32,
            Self::String(_) => PrimitiveKind::String,
            Self::Float(_) => PrimitiveKind::Float,
            Self::Double(_) => PrimitiveKind::Double,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Self::Int32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for PrimitiveValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int32(v) => write!(f, "{v}"),
            Self::String(v) => write!(f, "{v:?}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Double(v) => write!(f, "{v}"),
        }
    }
}
