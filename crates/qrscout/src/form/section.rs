//! Named, ordered groups of fields.

use serde::{Deserialize, Serialize};

use super::field::{Field, Provenance};

/// A named group of fields rendered under one heading.
///
/// Field order is the column order of the encoded record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Unique section name, also the display heading.
    pub name: String,

    /// Whether a form reset leaves this section's values alone.
    #[serde(rename = "preserveDataOnReset", default)]
    pub preserve_data_on_reset: bool,

    /// Fields in display and encoding order.
    pub fields: Vec<Field>,
}

impl Section {
    /// Create an empty section that is cleared on reset.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            preserve_data_on_reset: false,
            fields: Vec::new(),
        }
    }

    /// Keep this section's values across resets.
    #[must_use]
    pub fn preserving(mut self) -> Self {
        self.preserve_data_on_reset = true;
        self
    }

    /// Append a field.
    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Look up a field by code.
    #[must_use]
    pub fn field(&self, code: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.code == code)
    }

    /// Look up a field by code for mutation.
    pub fn field_mut(&mut self, code: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.code == code)
    }

    /// Restore every field to its default and make it editable again.
    pub fn apply_defaults(&mut self) {
        for field in &mut self.fields {
            field.reset();
            field.provenance = Provenance::Editable;
        }
    }

    /// Restore every field to its default value, keeping provenance.
    pub fn reset_values(&mut self) {
        for field in &mut self.fields {
            tracing::trace!(
                field = %field.title,
                from = ?field.value,
                to = ?field.default_value,
                "Resetting field"
            );
            field.reset();
        }
    }
}
