//! Value records and their JSON form.
//!
//! A record's schema comes from the serialized value template, never from the
//! JSON being imported; the codec neither invents nor drops fields.

use serde_json::{Map as JsonMap, Number as JsonNumber, Value as JsonValue};

use crate::core_api::{CoreError, CoreErrorCode};
use crate::primitive::{PrimitiveKind, PrimitiveValue};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: PrimitiveKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordSchema {
    pub fields: Vec<FieldSpec>,
}

impl RecordSchema {
    pub fn new(fields: impl IntoIterator<Item = (String, PrimitiveKind)>) -> Self {
        Self {
            fields: fields
                .into_iter()
                .map(|(name, kind)| FieldSpec { name, kind })
                .collect(),
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn default_record(&self) -> Record {
        Record {
            fields: self
                .fields
                .iter()
                .map(|f| (f.name.clone(), f.kind.default_value()))
                .collect(),
        }
    }
}

/// Field values in schema order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Record {
    pub fields: Vec<(String, PrimitiveValue)>,
}

impl Record {
    pub fn new(fields: impl IntoIterator<Item = (String, PrimitiveValue)>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&PrimitiveValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn to_json(&self) -> Result<JsonMap<String, JsonValue>, CoreError> {
        let mut out = JsonMap::new();
        for (name, value) in &self.fields {
            out.insert(name.clone(), primitive_to_json(name, value)?);
        }
        Ok(out)
    }

    pub fn from_json(value: &JsonValue, schema: &RecordSchema) -> Result<Self, CoreError> {
        let JsonValue::Object(object) = value else {
            return Err(CoreError::new(
                CoreErrorCode::TypeMismatch,
                format!("expected a JSON object for the record, got {}", json_kind(value)),
            ));
        };

        if let Some(unknown) = object.keys().find(|k| schema.field(k).is_none()) {
            return Err(CoreError::new(
                CoreErrorCode::UnknownField,
                format!("unknown JSON property: {unknown}"),
            ));
        }

        let mut fields = Vec::with_capacity(schema.fields.len());
        for spec in &schema.fields {
            let Some(property) = object.get(&spec.name) else {
                return Err(CoreError::new(
                    CoreErrorCode::MissingField,
                    format!("missing JSON property: {}", spec.name),
                ));
            };
            fields.push((spec.name.clone(), primitive_from_json(spec, property)?));
        }
        Ok(Self { fields })
    }
}

fn primitive_to_json(name: &str, value: &PrimitiveValue) -> Result<JsonValue, CoreError> {
    let non_finite = || {
        CoreError::new(
            CoreErrorCode::NonFiniteFloat,
            format!("field {name} holds {value}, which JSON cannot represent"),
        )
    };

    Ok(match value {
        PrimitiveValue::Bool(v) => JsonValue::Bool(*v),
        PrimitiveValue::Int32(v) => JsonValue::from(*v),
        PrimitiveValue::String(v) => JsonValue::String(v.clone()),
        // Widen through the shortest decimal so 0.1f32 is written as 0.1.
        PrimitiveValue::Float(v) => {
            let widened: f64 = v.to_string().parse().map_err(|_| non_finite())?;
            JsonValue::Number(JsonNumber::from_f64(widened).ok_or_else(non_finite)?)
        }
        PrimitiveValue::Double(v) => {
            JsonValue::Number(JsonNumber::from_f64(*v).ok_or_else(non_finite)?)
        }
    })
}

fn primitive_from_json(spec: &FieldSpec, value: &JsonValue) -> Result<PrimitiveValue, CoreError> {
    let parsed = match (spec.kind, value) {
        (PrimitiveKind::Bool, JsonValue::Bool(v)) => Some(PrimitiveValue::Bool(*v)),
        (PrimitiveKind::Int32, JsonValue::Number(n)) => n
            .as_i64()
            .and_then(|v| i32::try_from(v).ok())
            .map(PrimitiveValue::Int32),
        (PrimitiveKind::String, JsonValue::String(s)) => Some(PrimitiveValue::String(s.clone())),
        (PrimitiveKind::String, JsonValue::Null) => Some(PrimitiveValue::String(String::new())),
        (PrimitiveKind::Float, JsonValue::Number(n)) => {
            n.as_f64()
                .map(|v| v as f32)
                .filter(|v| v.is_finite())
                .map(PrimitiveValue::Float)
        }
        (PrimitiveKind::Double, JsonValue::Number(n)) => n.as_f64().map(PrimitiveValue::Double),
        _ => None,
    };

    parsed.ok_or_else(|| {
        CoreError::new(
            CoreErrorCode::TypeMismatch,
            format!(
                "field {} expects {} but JSON holds {} ({value})",
                spec.name,
                spec.kind,
                json_kind(value)
            ),
        )
    })
}

fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}
