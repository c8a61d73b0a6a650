//! The host's typed field tree, seen through the few operations this crate
//! needs, plus an owned implementation that can be dumped to and loaded from
//! JSON.

use serde::{Deserialize, Serialize};

use crate::core_api::{CoreError, CoreErrorCode};
use crate::primitive::{PrimitiveKind, PrimitiveValue};

pub const ARRAY_FIELD: &str = "Array";

pub trait FieldTree: Clone {
    fn name(&self) -> &str;

    /// `None` for compound nodes.
    fn value(&self) -> Option<&PrimitiveValue>;

    /// Stores `value`, refusing anything whose kind differs from the node's.
    fn set_value(&mut self, value: PrimitiveValue) -> Result<(), CoreError>;

    fn children(&self) -> &[Self];

    fn children_mut(&mut self) -> &mut [Self];

    fn replace_children(&mut self, children: Vec<Self>);

    /// A default-valued element for an array node.
    fn element_template(&self) -> Option<Self>;

    fn kind(&self) -> Option<PrimitiveKind> {
        self.value().map(PrimitiveValue::kind)
    }

    fn child(&self, name: &str) -> Option<&Self> {
        self.children().iter().find(|c| c.name() == name)
    }

    fn child_mut(&mut self, name: &str) -> Option<&mut Self> {
        self.children_mut().iter_mut().find(|c| c.name() == name)
    }

    /// Resolves a dotted path such as `entriesKey.Array`.
    fn lookup(&self, path: &str) -> Result<&Self, CoreError> {
        let mut node = self;
        for part in path.split('.') {
            node = node
                .child(part)
                .ok_or_else(|| missing_child(self.name(), path, part))?;
        }
        Ok(node)
    }

    fn lookup_mut(&mut self, path: &str) -> Result<&mut Self, CoreError> {
        let mut node = self;
        for part in path.split('.') {
            node = match node.child_mut(part) {
                Some(child) => child,
                None => return Err(missing_child("", path, part)),
            };
        }
        Ok(node)
    }
}

fn missing_child(parent: &str, path: &str, part: &str) -> CoreError {
    let at = if parent.is_empty() {
        String::new()
    } else {
        format!(" under {parent}")
    };
    CoreError::new(
        CoreErrorCode::ShapeMismatch,
        format!("field {path}{at} not found (no child named {part})"),
    )
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueField {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<PrimitiveValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ValueField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<Box<ValueField>>,
}

impl ValueField {
    pub fn primitive(name: impl Into<String>, value: PrimitiveValue) -> Self {
        Self {
            name: name.into(),
            value: Some(value),
            children: Vec::new(),
            template: None,
        }
    }

    pub fn compound(name: impl Into<String>, children: Vec<ValueField>) -> Self {
        Self {
            name: name.into(),
            value: None,
            children,
            template: None,
        }
    }

    /// An `Array` node whose new elements are cloned from `template`.
    pub fn array(template: ValueField, children: Vec<ValueField>) -> Self {
        Self {
            name: ARRAY_FIELD.to_string(),
            value: None,
            children,
            template: Some(Box::new(template)),
        }
    }

    fn reset_to_default(&mut self) {
        if let Some(value) = &mut self.value {
            *value = value.kind().default_value();
        }
        for child in &mut self.children {
            child.reset_to_default();
        }
    }
}

impl FieldTree for ValueField {
    fn name(&self) -> &str {
        &self.name
    }

    fn value(&self) -> Option<&PrimitiveValue> {
        self.value.as_ref()
    }

    fn set_value(&mut self, value: PrimitiveValue) -> Result<(), CoreError> {
        let Some(current) = &mut self.value else {
            return Err(CoreError::new(
                CoreErrorCode::ShapeMismatch,
                format!("field {} is not a primitive field", self.name),
            ));
        };
        if current.kind() != value.kind() {
            return Err(CoreError::new(
                CoreErrorCode::TypeMismatch,
                format!(
                    "field {} holds {} and cannot store {} {value}",
                    self.name,
                    current.kind(),
                    value.kind()
                ),
            ));
        }
        *current = value;
        Ok(())
    }

    fn children(&self) -> &[Self] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut [Self] {
        &mut self.children
    }

    fn replace_children(&mut self, children: Vec<Self>) {
        self.children = children;
    }

    fn element_template(&self) -> Option<Self> {
        if let Some(template) = &self.template {
            return Some(template.as_ref().clone());
        }
        let mut element = self.children.first()?.clone();
        element.reset_to_default();
        Some(element)
    }
}
