use std::collections::HashSet;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::{debug, info};

use crate::field_tree::FieldTree;
use crate::hasher::Key;
use crate::projection;
use crate::record::Record;
use crate::table::Table;

use super::error::{CoreError, CoreErrorCode};
use super::types::{EditorOptions, ExportSummary, ImportSummary};

/// Export and import of one serialized dictionary field.
#[derive(Debug, Default, Clone)]
pub struct Editor {
    options: EditorOptions,
}

impl Editor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: EditorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    /// Renders the live entries of the dictionary under `base` as one JSON
    /// object keyed by the dictionary keys.
    pub fn export_json<T: FieldTree>(&self, base: &T) -> Result<JsonValue, CoreError> {
        self.export(base).map(|(json, _)| json)
    }

    /// Rebuilds the dictionary under `base` from `document`.
    ///
    /// Nothing under `base` changes unless the whole import succeeds. A
    /// `JsonValue` has already collapsed repeated object keys; use
    /// [`Editor::import_str`] or [`Editor::import_from_path`] to have them
    /// reported.
    pub fn import_json<T: FieldTree>(
        &self,
        base: &mut T,
        document: &JsonValue,
    ) -> Result<ImportSummary, CoreError> {
        let JsonValue::Object(object) = document else {
            return Err(CoreError::new(
                CoreErrorCode::Json,
                "expected a JSON object at the top level",
            ));
        };
        let entries: Vec<(&str, &JsonValue)> =
            object.iter().map(|(k, v)| (k.as_str(), v)).collect();
        self.import_entries(base, &entries)
    }

    /// Parses `text` and rebuilds the dictionary under `base` from it. A key
    /// that appears twice in the top-level object is a `DuplicateKey` error.
    pub fn import_str<T: FieldTree>(
        &self,
        base: &mut T,
        text: &str,
    ) -> Result<ImportSummary, CoreError> {
        let document: Document = serde_json::from_str(text)?;
        self.import_document(base, &document)
    }

    fn import_document<T: FieldTree>(
        &self,
        base: &mut T,
        document: &Document,
    ) -> Result<ImportSummary, CoreError> {
        let mut seen = HashSet::with_capacity(document.0.len());
        for (key, _) in &document.0 {
            if !seen.insert(key.as_str()) {
                return Err(CoreError::new(
                    CoreErrorCode::DuplicateKey,
                    format!("key {key} appears more than once in the JSON document"),
                ));
            }
        }
        let entries: Vec<(&str, &JsonValue)> =
            document.0.iter().map(|(k, v)| (k.as_str(), v)).collect();
        self.import_entries(base, &entries)
    }

    fn import_entries<T: FieldTree>(
        &self,
        base: &mut T,
        entries: &[(&str, &JsonValue)],
    ) -> Result<ImportSummary, CoreError> {
        if entries.is_empty() {
            return Err(CoreError::new(
                CoreErrorCode::EmptyDictionary,
                "the JSON dictionary has no entries",
            ));
        }

        let schema = projection::discover_schema(self.dict(base)?)?;
        debug!(key_kind = ?schema.key_kind, fields = schema.record.fields.len(), "discovered dictionary schema");

        let mut pairs: Vec<(Key, Record)> = Vec::with_capacity(entries.len());
        for &(text, value) in entries {
            let key = Key::parse(schema.key_kind, text)?;
            let record = Record::from_json(value, &schema.record)
                .map_err(|e| e.with_context(format!("key {text}")))?;
            pairs.push((key, record));
        }
        let skipped_sentinels = pairs.iter().filter(|(k, _)| k.is_sentinel()).count();

        let table = Table::build(pairs, schema.key_kind)?;
        table.validate()?;

        let dict = base.lookup_mut(&self.options.dict_field)?;
        projection::write_table(dict, &table)?;

        let summary = ImportSummary {
            count: table.entries().len(),
            capacity: table.capacity(),
            skipped_sentinels,
        };
        info!(
            count = summary.count,
            capacity = summary.capacity,
            skipped = summary.skipped_sentinels,
            "imported dictionary"
        );
        Ok(summary)
    }

    pub fn export_to_path<T: FieldTree>(
        &self,
        base: &T,
        path: impl AsRef<Path>,
    ) -> Result<ExportSummary, CoreError> {
        let path = path.as_ref();
        let (json, summary) = self.export(base)?;

        let file = File::create(path)
            .map_err(|e| CoreError::from(e).with_context(path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &json)?;
        writer
            .flush()
            .map_err(|e| CoreError::from(e).with_context(path.display()))?;
        Ok(summary)
    }

    pub fn import_from_path<T: FieldTree>(
        &self,
        base: &mut T,
        path: impl AsRef<Path>,
    ) -> Result<ImportSummary, CoreError> {
        let path = path.as_ref();
        let document: Document = {
            let file =
                File::open(path).map_err(|e| CoreError::from(e).with_context(path.display()))?;
            serde_json::from_reader(BufReader::new(file))
                .map_err(|e| CoreError::from(e).with_context(path.display()))?
        };
        self.import_document(base, &document)
    }

    fn dict<'a, T: FieldTree>(&self, base: &'a T) -> Result<&'a T, CoreError> {
        base.lookup(&self.options.dict_field)
    }

    fn export<T: FieldTree>(&self, base: &T) -> Result<(JsonValue, ExportSummary), CoreError> {
        let table = projection::read_table(self.dict(base)?)?;

        let mut out = JsonMap::new();
        for entry in table.live_entries() {
            let name = entry.key.to_string();
            if out.contains_key(&name) {
                return Err(CoreError::new(
                    CoreErrorCode::DuplicateKey,
                    format!("key {name} is stored more than once"),
                ));
            }
            let record = entry
                .value
                .to_json()
                .map_err(|e| e.with_context(format!("key {name}")))?;
            out.insert(name, JsonValue::Object(record));
        }

        let summary = ExportSummary {
            exported: out.len(),
            unused_slots: table.entries().len() - out.len(),
        };
        debug!(
            exported = summary.exported,
            unused = summary.unused_slots,
            "exported dictionary"
        );
        Ok((JsonValue::Object(out), summary))
    }
}

/// A top-level JSON object read entry by entry, so repeated keys survive
/// parsing instead of overwriting each other.
struct Document(Vec<(String, JsonValue)>);

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DocumentVisitor;

        impl<'de> Visitor<'de> for DocumentVisitor {
            type Value = Document;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a JSON object at the top level")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, JsonValue>()? {
                    entries.push((key, value));
                }
                Ok(Document(entries))
            }
        }

        deserializer.deserialize_map(DocumentVisitor)
    }
}
