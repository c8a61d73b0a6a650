mod editor;
mod error;
mod types;

pub use editor::Editor;
pub use error::{CoreError, CoreErrorCode, ErrorCategory};
pub use types::{DEFAULT_DICT_FIELD, EditorOptions, ExportSummary, ImportSummary};
