//! Form document import/export.
//!
//! Documents are JSON. Export strips every current value so the document can
//! be handed to other stations as a template; import ignores any values the
//! document carries and applies defaults.

use tracing::{info, warn};

use crate::error::Result;
use crate::form::{builtin_form, FormModel};
use crate::storage::{KeyValueStore, USER_CONFIG_KEY};

/// File name suggested for exported documents.
pub const EXPORT_FILE_NAME: &str = "QRScout_config.json";

/// Parse a document and load it with defaults applied.
///
/// # Errors
///
/// Returns [`crate::Error::FormParse`] if the text is not a form document and
/// [`crate::Error::FormShape`] if it breaks a structural rule.
pub fn parse_document(raw: &str) -> Result<FormModel> {
    let document: FormModel = serde_json::from_str(raw)?;
    FormModel::load(document)
}

/// A value-free copy of the model, suitable for redistribution.
#[must_use]
pub fn export_config(model: &FormModel) -> FormModel {
    let mut document = model.clone();
    for field in document.sections.iter_mut().flat_map(|s| s.fields.iter_mut()) {
        field.value = None;
    }
    document
}

/// [`export_config`] serialized as pretty JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn export_config_json(model: &FormModel) -> Result<String> {
    Ok(serde_json::to_string_pretty(&export_config(model))?)
}

/// Parse a user-supplied document and persist its text as the form for
/// future sessions.
///
/// Nothing is persisted if the document is rejected. A failed write is
/// logged; the parsed model is still returned.
///
/// # Errors
///
/// Returns the parse or shape error if the document is rejected.
pub fn import_config<S: KeyValueStore + ?Sized>(raw: &str, store: &mut S) -> Result<FormModel> {
    let model = parse_document(raw)?;
    if let Err(e) = store.set(USER_CONFIG_KEY, raw) {
        warn!(error = %e, "Failed to persist imported form");
    }
    info!(
        title = %model.title,
        fields = model.field_count(),
        "Imported form"
    );
    Ok(model)
}

/// The form a new session starts with: the persisted user form if one is
/// stored and readable, otherwise the bundled form.
pub fn default_config<S: KeyValueStore + ?Sized>(store: &S) -> FormModel {
    match store.get(USER_CONFIG_KEY) {
        Ok(Some(raw)) => parse_document(&raw).unwrap_or_else(|e| {
            warn!(error = %e, "Stored form is unusable, using built-in form");
            builtin_form()
        }),
        Ok(None) => builtin_form(),
        Err(e) => {
            warn!(error = %e, "Failed to read stored form, using built-in form");
            builtin_form()
        }
    }
}

/// Forget the persisted user form. Returns `true` if one was stored.
///
/// # Errors
///
/// Returns an error if the store cannot be written.
pub fn clear_user_config<S: KeyValueStore + ?Sized>(store: &mut S) -> Result<bool> {
    store.remove(USER_CONFIG_KEY)
}
