//! Seed-free key hashing that matches the engine runtime's dictionary.
//!
//! Integer keys hash to themselves. String keys use the runtime's legacy
//! string hash, computed over UTF-16 code units, from before per-process hash
//! randomization existed. Both are masked to 31 bits before being stored or
//! reduced modulo the bucket count.

use std::fmt;

use crate::core_api::{CoreError, CoreErrorCode};
use crate::primitive::{PrimitiveKind, PrimitiveValue};

const HASH_MASK: i32 = 0x7FFF_FFFF;
const LEGACY_SEED: i32 = (5381 << 16) + 5381;
const LEGACY_LANE_MULTIPLIER: i32 = 1_566_083_941;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Int32,
    String,
}

impl KeyKind {
    pub fn from_primitive(kind: PrimitiveKind) -> Result<Self, CoreError> {
        match kind {
            PrimitiveKind::Int32 => Ok(Self::Int32),
            PrimitiveKind::String => Ok(Self::String),
            other => Err(CoreError::new(
                CoreErrorCode::UnsupportedKeyKind,
                format!("keys of type {other} are not supported"),
            )),
        }
    }

    pub fn primitive(&self) -> PrimitiveKind {
        match *self {
            Self::Int32 => PrimitiveKind::Int32,
            Self::String => PrimitiveKind::String,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Int(i32),
    Str(String),
}

impl Key {
    pub fn kind(&self) -> KeyKind {
        match self {
            Self::Int(_) => KeyKind::Int32,
            Self::Str(_) => KeyKind::String,
        }
    }

    /// Zero and the empty string mark slots the runtime reserved but never used.
    pub fn is_sentinel(&self) -> bool {
        match self {
            Self::Int(v) => *v == 0,
            Self::Str(s) => s.is_empty(),
        }
    }

    pub fn from_primitive(value: &PrimitiveValue) -> Result<Self, CoreError> {
        match value {
            PrimitiveValue::Int32(v) => Ok(Self::Int(*v)),
            PrimitiveValue::String(s) => Ok(Self::Str(s.clone())),
            other => Err(CoreError::new(
                CoreErrorCode::UnsupportedKeyKind,
                format!("keys of type {} are not supported", other.kind()),
            )),
        }
    }

    pub fn to_primitive(&self) -> PrimitiveValue {
        match self {
            Self::Int(v) => PrimitiveValue::Int32(*v),
            Self::Str(s) => PrimitiveValue::String(s.clone()),
        }
    }

    /// Parses a JSON object key. Integer keys must be the canonical decimal
    /// rendering of an `i32` so that export and import agree exactly.
    pub fn parse(kind: KeyKind, text: &str) -> Result<Self, CoreError> {
        match kind {
            KeyKind::String => Ok(Self::Str(text.to_string())),
            KeyKind::Int32 => {
                let value: i32 = text.parse().map_err(|e| {
                    CoreError::new(
                        CoreErrorCode::InvalidKey,
                        format!("key {text:?} is not a 32-bit integer: {e}"),
                    )
                })?;
                if value.to_string() != text {
                    return Err(CoreError::new(
                        CoreErrorCode::InvalidKey,
                        format!("key {text:?} is not in canonical form (expected {value:?})"),
                    ));
                }
                Ok(Self::Int(value))
            }
        }
    }

    /// The hash code the runtime stores for this key.
    pub fn hash_code(&self) -> i32 {
        match self {
            Self::Int(v) => v & HASH_MASK,
            Self::Str(s) => legacy_string_hash(s) & HASH_MASK,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(s) => f.write_str(s),
        }
    }
}

/// The unmasked legacy string hash. Two lanes of djb2-xor run over
/// alternating UTF-16 code units and are folded together at the end.
///
/// The runtime walks the string as a NUL-terminated buffer, so hashing stops
/// at the first U+0000 code unit and anything after it is ignored.
pub fn legacy_string_hash(s: &str) -> i32 {
    let mut units = s.encode_utf16();
    let mut hash1 = LEGACY_SEED;
    let mut hash2 = LEGACY_SEED;

    while let Some(first) = units.next().filter(|&c| c != 0) {
        hash1 = (hash1 << 5).wrapping_add(hash1) ^ i32::from(first);
        let Some(second) = units.next().filter(|&c| c != 0) else {
            break;
        };
        hash2 = (hash2 << 5).wrapping_add(hash2) ^ i32::from(second);
    }

    hash1.wrapping_add(hash2.wrapping_mul(LEGACY_LANE_MULTIPLIER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn odd_length_strings_leave_second_lane_untouched() {
        // "a" only feeds the first lane.
        let expected =
            ((LEGACY_SEED << 5).wrapping_add(LEGACY_SEED) ^ 'a' as i32)
                .wrapping_add(LEGACY_SEED.wrapping_mul(LEGACY_LANE_MULTIPLIER));
        assert_eq!(legacy_string_hash("a"), expected);
    }

    #[test]
    fn embedded_nul_ends_the_hash() {
        assert_eq!(legacy_string_hash("a\0b"), legacy_string_hash("a"));
        assert_eq!(legacy_string_hash("ab\0cd"), legacy_string_hash("ab"));
        assert_eq!(legacy_string_hash("\0abc"), legacy_string_hash(""));
    }

    #[test]
    fn int_hash_clears_sign_bit() {
        assert_eq!(Key::Int(-1).hash_code(), HASH_MASK);
        assert_eq!(Key::Int(i32::MIN).hash_code(), 0);
        assert_eq!(Key::Int(42).hash_code(), 42);
    }
}
