//! Encoders for the form: the tab-separated record carried by the QR code,
//! and the JSON form document used for distribution and persistence.

pub mod document;
pub mod record;

pub use document::{
    clear_user_config, default_config, export_config, export_config_json, import_config,
    parse_document, EXPORT_FILE_NAME,
};
pub use record::{encode_header, encode_record, render_value, MissingValue, SEPARATOR};
