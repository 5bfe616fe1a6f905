//! Configuration-driven form model.
//!
//! A [`FormModel`] is an ordered list of [`Section`]s, each an ordered list of
//! [`Field`]s. The flattened field order (section order, then field order) is
//! the column order used by every encoder, so lookups and exports all walk
//! fields the same way.

mod builtin;
mod field;
mod model;
mod section;

pub use builtin::{builtin_form, BUILTIN_PAGE_TITLE, BUILTIN_TITLE};
pub use field::{Field, FieldType, FieldValue, Provenance};
pub use model::FormModel;
pub use section::Section;
