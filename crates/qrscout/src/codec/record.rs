//! Tab-separated record and header encoding.
//!
//! A record is one line: every field value in encoding order, joined by a
//! single tab. The header is the same line built from field titles, for
//! pasting above the records in a spreadsheet.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::form::{FieldValue, FormModel};

/// Column separator.
pub const SEPARATOR: char = '\t';

/// Text written for unset values in [`MissingValue::Literal`] mode.
pub const UNDEFINED_LITERAL: &str = "undefined";

/// How an unset field value is written into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingValue {
    /// An empty column.
    #[default]
    Empty,
    /// The text `undefined`, as older spreadsheet imports expect.
    Literal,
}

/// Render one value as record text.
#[must_use]
pub fn render_value(value: Option<&FieldValue>, missing: MissingValue) -> String {
    match (value, missing) {
        (Some(value), _) => sanitize(&value.to_string()).into_owned(),
        (None, MissingValue::Empty) => String::new(),
        (None, MissingValue::Literal) => UNDEFINED_LITERAL.to_string(),
    }
}

/// Encode the current values of every field as one tab-separated line.
#[must_use]
pub fn encode_record(model: &FormModel, missing: MissingValue) -> String {
    join(
        model
            .fields()
            .map(|f| render_value(f.value.as_ref(), missing)),
    )
}

/// Encode every field title as one tab-separated line.
#[must_use]
pub fn encode_header(model: &FormModel) -> String {
    join(model.fields().map(|f| sanitize(&f.title).into_owned()))
}

fn join(columns: impl Iterator<Item = String>) -> String {
    columns.collect::<Vec<_>>().join(&SEPARATOR.to_string())
}

/// Replace characters that would split a column or a line.
fn sanitize(text: &str) -> Cow<'_, str> {
    if text.contains(['\t', '\n', '\r']) {
        Cow::Owned(text.replace(['\t', '\n', '\r'], " "))
    } else {
        Cow::Borrowed(text)
    }
}
