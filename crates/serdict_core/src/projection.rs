//! Moves a [`Table`] in and out of the dictionary node of a field tree.
//!
//! The dictionary node holds five parallel arrays and three scalars:
//!
//! ```text
//! dict
//!   buckets.Array          int[capacity]
//!   entriesHashCode.Array  int[n]
//!   entriesKey.Array       int|string[n]
//!   entriesNext.Array      int[n]
//!   entriesValue.Array     record[n]
//!   count, freeCount, freeList
//! ```

use tracing::debug;

use crate::core_api::{CoreError, CoreErrorCode};
use crate::field_tree::FieldTree;
use crate::hasher::{Key, KeyKind};
use crate::primitive::PrimitiveValue;
use crate::record::{Record, RecordSchema};
use crate::table::{Entry, Table};

pub const BUCKETS_FIELD: &str = "buckets.Array";
pub const ENTRIES_HASH_CODE_FIELD: &str = "entriesHashCode.Array";
pub const ENTRIES_KEY_FIELD: &str = "entriesKey.Array";
pub const ENTRIES_NEXT_FIELD: &str = "entriesNext.Array";
pub const ENTRIES_VALUE_FIELD: &str = "entriesValue.Array";
pub const COUNT_FIELD: &str = "count";
pub const FREE_COUNT_FIELD: &str = "freeCount";
pub const FREE_LIST_FIELD: &str = "freeList";

const SCALAR_FIELDS: [&str; 3] = [COUNT_FIELD, FREE_COUNT_FIELD, FREE_LIST_FIELD];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionarySchema {
    pub key_kind: KeyKind,
    pub record: RecordSchema,
}

/// Reads the key type and value record layout from the array templates.
pub fn discover_schema<T: FieldTree>(dict: &T) -> Result<DictionarySchema, CoreError> {
    let key_template = template_of(dict, ENTRIES_KEY_FIELD)?;
    let key_kind = key_template.kind().ok_or_else(|| {
        CoreError::new(
            CoreErrorCode::ShapeMismatch,
            format!("{ENTRIES_KEY_FIELD} elements are not primitive fields"),
        )
    })?;
    let key_kind = KeyKind::from_primitive(key_kind)?;

    let value_template = template_of(dict, ENTRIES_VALUE_FIELD)?;
    if value_template.children().is_empty() {
        return Err(CoreError::new(
            CoreErrorCode::ShapeMismatch,
            format!("{ENTRIES_VALUE_FIELD} elements have no fields"),
        ));
    }
    let mut fields = Vec::with_capacity(value_template.children().len());
    for field in value_template.children() {
        let kind = field.kind().ok_or_else(|| {
            CoreError::new(
                CoreErrorCode::ShapeMismatch,
                format!("value field {} is not a primitive field", field.name()),
            )
        })?;
        fields.push((field.name().to_string(), kind));
    }

    Ok(DictionarySchema {
        key_kind,
        record: RecordSchema::new(fields),
    })
}

pub fn read_table<T: FieldTree>(dict: &T) -> Result<Table, CoreError> {
    let buckets = read_ints(dict, BUCKETS_FIELD)?;
    let hash_codes = read_ints(dict, ENTRIES_HASH_CODE_FIELD)?;
    let nexts = read_ints(dict, ENTRIES_NEXT_FIELD)?;

    let keys = dict
        .lookup(ENTRIES_KEY_FIELD)?
        .children()
        .iter()
        .enumerate()
        .map(|(i, node)| {
            let value = primitive_of(node, ENTRIES_KEY_FIELD, i)?;
            Key::from_primitive(value).map_err(|e| e.with_context(format!("{ENTRIES_KEY_FIELD}[{i}]")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let values = dict
        .lookup(ENTRIES_VALUE_FIELD)?
        .children()
        .iter()
        .enumerate()
        .map(|(i, node)| read_record(node, i))
        .collect::<Result<Vec<_>, _>>()?;

    let n = keys.len();
    if hash_codes.len() != n || nexts.len() != n || values.len() != n {
        return Err(CoreError::new(
            CoreErrorCode::ShapeMismatch,
            format!(
                "entry arrays differ in length: {ENTRIES_HASH_CODE_FIELD}={}, \
                 {ENTRIES_KEY_FIELD}={n}, {ENTRIES_NEXT_FIELD}={}, {ENTRIES_VALUE_FIELD}={}",
                hash_codes.len(),
                nexts.len(),
                values.len()
            ),
        ));
    }

    let entries = hash_codes
        .into_iter()
        .zip(nexts)
        .zip(keys.into_iter().zip(values))
        .map(|((hash_code, next), (key, value))| Entry {
            hash_code,
            next,
            key,
            value,
        })
        .collect();

    Ok(Table::from_parts(
        buckets,
        entries,
        read_int(dict, COUNT_FIELD)?,
        read_int(dict, FREE_COUNT_FIELD)?,
        read_int(dict, FREE_LIST_FIELD)?,
    ))
}

/// Replaces all five arrays and the three scalars with `table`.
///
/// Every new element is built and checked before the tree is touched, so a
/// failure leaves `dict` exactly as it was.
pub fn write_table<T: FieldTree>(dict: &mut T, table: &Table) -> Result<(), CoreError> {
    let entries = table.entries();

    let buckets = build_array(
        dict,
        BUCKETS_FIELD,
        table.buckets().iter().map(|&b| PrimitiveValue::Int32(b)),
    )?;
    let hash_codes = build_array(
        dict,
        ENTRIES_HASH_CODE_FIELD,
        entries.iter().map(|e| PrimitiveValue::Int32(e.hash_code)),
    )?;
    let keys = build_array(
        dict,
        ENTRIES_KEY_FIELD,
        entries.iter().map(|e| e.key.to_primitive()),
    )?;
    let nexts = build_array(
        dict,
        ENTRIES_NEXT_FIELD,
        entries.iter().map(|e| PrimitiveValue::Int32(e.next)),
    )?;
    let values = build_records(dict, entries)?;

    for name in SCALAR_FIELDS {
        let node = dict.lookup(name)?;
        if node.value().and_then(PrimitiveValue::as_i32).is_none() {
            return Err(CoreError::new(
                CoreErrorCode::TypeMismatch,
                format!("scalar field {name} is not an int field"),
            ));
        }
    }

    dict.lookup_mut(BUCKETS_FIELD)?.replace_children(buckets);
    dict.lookup_mut(ENTRIES_HASH_CODE_FIELD)?
        .replace_children(hash_codes);
    dict.lookup_mut(ENTRIES_KEY_FIELD)?.replace_children(keys);
    dict.lookup_mut(ENTRIES_NEXT_FIELD)?.replace_children(nexts);
    dict.lookup_mut(ENTRIES_VALUE_FIELD)?.replace_children(values);

    dict.lookup_mut(COUNT_FIELD)?
        .set_value(PrimitiveValue::Int32(table.count()))?;
    dict.lookup_mut(FREE_COUNT_FIELD)?
        .set_value(PrimitiveValue::Int32(table.free_count()))?;
    dict.lookup_mut(FREE_LIST_FIELD)?
        .set_value(PrimitiveValue::Int32(table.free_list()))?;

    debug!(
        buckets = table.capacity(),
        entries = entries.len(),
        "wrote dictionary arrays"
    );
    Ok(())
}

fn template_of<T: FieldTree>(dict: &T, path: &str) -> Result<T, CoreError> {
    dict.lookup(path)?.element_template().ok_or_else(|| {
        CoreError::new(
            CoreErrorCode::ShapeMismatch,
            format!("{path} has neither elements nor an element template"),
        )
    })
}

fn build_array<T, I>(dict: &T, path: &str, values: I) -> Result<Vec<T>, CoreError>
where
    T: FieldTree,
    I: IntoIterator<Item = PrimitiveValue>,
{
    let template = template_of(dict, path)?;
    values
        .into_iter()
        .enumerate()
        .map(|(i, value)| {
            let mut element = template.clone();
            element
                .set_value(value)
                .map_err(|e| e.with_context(format!("{path}[{i}]")))?;
            Ok(element)
        })
        .collect()
}

fn build_records<T: FieldTree>(dict: &T, entries: &[Entry<Record>]) -> Result<Vec<T>, CoreError> {
    let template = template_of(dict, ENTRIES_VALUE_FIELD)?;
    entries
        .iter()
        .map(|entry| {
            let mut element = template.clone();
            for field in element.children_mut() {
                let value = entry.value.get(field.name()).ok_or_else(|| {
                    CoreError::new(
                        CoreErrorCode::MissingField,
                        format!("record for key {} has no field {}", entry.key, field.name()),
                    )
                })?;
                field
                    .set_value(value.clone())
                    .map_err(|e| e.with_context(format!("key {}", entry.key)))?;
            }
            Ok(element)
        })
        .collect()
}

fn read_record<T: FieldTree>(node: &T, index: usize) -> Result<Record, CoreError> {
    node.children()
        .iter()
        .map(|field| {
            let value = field.value().ok_or_else(|| {
                CoreError::new(
                    CoreErrorCode::ShapeMismatch,
                    format!(
                        "{ENTRIES_VALUE_FIELD}[{index}].{} is not a primitive field",
                        field.name()
                    ),
                )
            })?;
            Ok((field.name().to_string(), value.clone()))
        })
        .collect::<Result<Vec<_>, CoreError>>()
        .map(Record::new)
}

fn primitive_of<'a, T: FieldTree>(
    node: &'a T,
    path: &str,
    index: usize,
) -> Result<&'a PrimitiveValue, CoreError> {
    node.value().ok_or_else(|| {
        CoreError::new(
            CoreErrorCode::ShapeMismatch,
            format!("{path}[{index}] is not a primitive field"),
        )
    })
}

fn read_ints<T: FieldTree>(dict: &T, path: &str) -> Result<Vec<i32>, CoreError> {
    dict.lookup(path)?
        .children()
        .iter()
        .enumerate()
        .map(|(i, node)| {
            primitive_of(node, path, i)?.as_i32().ok_or_else(|| {
                CoreError::new(
                    CoreErrorCode::TypeMismatch,
                    format!("{path}[{i}] is not an int field"),
                )
            })
        })
        .collect()
}

fn read_int<T: FieldTree>(dict: &T, name: &str) -> Result<i32, CoreError> {
    dict.lookup(name)?
        .value()
        .and_then(PrimitiveValue::as_i32)
        .ok_or_else(|| {
            CoreError::new(
                CoreErrorCode::TypeMismatch,
                format!("scalar field {name} is not an int field"),
            )
        })
}
