use serde::{Deserialize, Serialize};

pub const DEFAULT_DICT_FIELD: &str = "dict";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EditorOptions {
    /// Dotted path from the asset's base field to the dictionary node.
    pub dict_field: String,
}

impl Default for EditorOptions {
    fn default() -> Self {
        Self {
            dict_field: DEFAULT_DICT_FIELD.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportSummary {
    pub exported: usize,
    pub unused_slots: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImportSummary {
    pub count: usize,
    pub capacity: usize,
    pub skipped_sentinels: usize,
}
