//! The form model: every section of one scouting form.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::builtin::builtin_form;
use super::field::{Field, FieldValue};
use super::section::Section;
use crate::error::{Error, Result};

/// The full, ordered configuration of one scouting form.
///
/// The same type doubles as the persisted form document; `value` and
/// provenance never reach the serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormModel {
    /// Browser/window title.
    #[serde(default)]
    pub title: String,

    /// Heading shown above the form.
    #[serde(default)]
    pub page_title: String,

    /// Sections in display and encoding order.
    pub sections: Vec<Section>,
}

impl FormModel {
    /// Build a model from a document, setting every value to its default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FormShape`] if section names or field codes are not
    /// unique, or a field code is empty.
    pub fn load(mut document: FormModel) -> Result<Self> {
        document.validate()?;
        for section in &mut document.sections {
            section.apply_defaults();
        }
        debug!(
            title = %document.title,
            sections = document.sections.len(),
            fields = document.field_count(),
            "Loaded form"
        );
        Ok(document)
    }

    /// Like [`FormModel::load`], falling back to the bundled form on failure.
    #[must_use]
    pub fn load_or_builtin(document: FormModel) -> Self {
        Self::load(document).unwrap_or_else(|e| {
            warn!(error = %e, "Form document rejected, using built-in form");
            builtin_form()
        })
    }

    /// Check the structural rules a usable form must satisfy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FormShape`] describing the first broken rule.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        let mut codes = HashSet::new();

        for section in &self.sections {
            if !names.insert(section.name.as_str()) {
                return Err(Error::form_shape(format!(
                    "duplicate section name '{}'",
                    section.name
                )));
            }
            for field in &section.fields {
                if field.code.is_empty() {
                    return Err(Error::form_shape(format!(
                        "field '{}' in section '{}' has an empty code",
                        field.title, section.name
                    )));
                }
                if !codes.insert(field.code.as_str()) {
                    return Err(Error::form_shape(format!(
                        "duplicate field code '{}'",
                        field.code
                    )));
                }
            }
        }
        Ok(())
    }

    /// Every field, in section order then field order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.sections.iter().flat_map(|s| s.fields.iter())
    }

    /// Total number of fields, i.e. the number of record columns.
    #[must_use]
    pub fn field_count(&self) -> usize {
        self.sections.iter().map(|s| s.fields.len()).sum()
    }

    /// Look up a section by name.
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Look up a section by name for mutation.
    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| s.name == name)
    }

    /// Look up a field by section name and code.
    ///
    /// # Errors
    ///
    /// Returns a lookup error naming whichever of the two was not found.
    pub fn field(&self, section_name: &str, code: &str) -> Result<&Field> {
        self.section(section_name)
            .ok_or_else(|| Error::section_not_found(section_name))?
            .field(code)
            .ok_or_else(|| Error::field_not_found(section_name, code))
    }

    /// Set the value of one field.
    ///
    /// On a lookup failure the model is left unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SectionNotFound`] or [`Error::FieldNotFound`].
    pub fn update_value(
        &mut self,
        section_name: &str,
        code: &str,
        value: Option<FieldValue>,
    ) -> Result<()> {
        let section = self
            .section_mut(section_name)
            .ok_or_else(|| Error::section_not_found(section_name))?;
        let field = section
            .field_mut(code)
            .ok_or_else(|| Error::field_not_found(section_name, code))?;
        field.value = value;
        Ok(())
    }

    /// Required fields that are unset or empty, in encoding order.
    ///
    /// A record may only be committed while this is empty.
    #[must_use]
    pub fn missing_required_fields(&self) -> Vec<&Field> {
        self.fields().filter(|f| f.is_missing()).collect()
    }

    /// The value of the first field with this code, in encoding order.
    #[must_use]
    pub fn field_value(&self, code: &str) -> Option<&FieldValue> {
        self.fields().find(|f| f.code == code)?.value.as_ref()
    }

    /// Restore defaults in every section not marked `preserveDataOnReset`.
    pub fn reset_sections(&mut self) {
        for section in self
            .sections
            .iter_mut()
            .filter(|s| !s.preserve_data_on_reset)
        {
            section.reset_values();
        }
        debug!("Form reset");
    }

    /// Replace the section with the same name, or insert it first.
    ///
    /// Other sections are not touched. Field codes stay unique across the
    /// form, so a section reusing a code owned by another section is refused.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FormShape`] naming the clashing code; the model is
    /// left unchanged.
    pub fn replace_section(&mut self, section: Section) -> Result<()> {
        let clash = self
            .sections
            .iter()
            .filter(|s| s.name != section.name)
            .flat_map(|s| s.fields.iter().map(move |f| (s, f)))
            .find(|(_, f)| section.field(&f.code).is_some());
        if let Some((owner, field)) = clash {
            return Err(Error::form_shape(format!(
                "field code '{}' in section '{}' is already used by section '{}'",
                field.code, section.name, owner.name
            )));
        }

        if let Some(existing) = self.section_mut(&section.name) {
            *existing = section;
        } else {
            self.sections.insert(0, section);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::field::{FieldType, Provenance};

    fn sample_document() -> FormModel {
        FormModel {
            title: "Test".to_string(),
            page_title: "Test Form".to_string(),
            sections: vec![
                Section::new("Metadata")
                    .preserving()
                    .with_field(Field::new("scouter", "Scouter", FieldType::Text).required())
                    .with_field(
                        Field::new("matchNumber", "Match", FieldType::Number)
                            .required()
                            .with_min(0.0),
                    ),
                Section::new("Auto")
                    .with_field(
                        Field::new("mobility", "Mobility", FieldType::Boolean).with_default(false),
                    )
                    .with_field(Field::new("cones", "Cones", FieldType::Counter).with_default(0_i64)),
            ],
        }
    }

    fn sample() -> FormModel {
        FormModel::load(sample_document()).unwrap()
    }

    #[test]
    fn test_load_applies_defaults() {
        let mut doc = sample_document();
        doc.sections[1].fields[1].value = Some(FieldValue::from(99_i64));
        doc.sections[1].fields[1].provenance = Provenance::Locked;

        let model = FormModel::load(doc).unwrap();
        let cones = model.field("Auto", "cones").unwrap();
        assert_eq!(cones.value, Some(FieldValue::from(0_i64)));
        assert!(!cones.is_locked());
        assert_eq!(model.field("Metadata", "scouter").unwrap().value, None);
    }

    #[test]
    fn test_load_rejects_duplicate_codes_across_sections() {
        let mut doc = sample_document();
        doc.sections[1]
            .fields
            .push(Field::new("scouter", "Dup", FieldType::Text));
        let err = FormModel::load(doc).unwrap_err();
        assert!(err.to_string().contains("duplicate field code 'scouter'"));
    }

    #[test]
    fn test_load_rejects_duplicate_sections() {
        let mut doc = sample_document();
        doc.sections.push(Section::new("Auto"));
        assert!(FormModel::load(doc).unwrap_err().is_form_error());
    }

    #[test]
    fn test_load_rejects_empty_code() {
        let mut doc = sample_document();
        doc.sections[0].fields[0].code = String::new();
        assert!(FormModel::load(doc).is_err());
    }

    #[test]
    fn test_load_or_builtin_falls_back() {
        let mut doc = sample_document();
        doc.sections.push(Section::new("Metadata"));
        let model = FormModel::load_or_builtin(doc);
        assert_eq!(model, builtin_form());
    }

    #[test]
    fn test_update_value() {
        let mut model = sample();
        model
            .update_value("Metadata", "matchNumber", Some(FieldValue::from(5_i64)))
            .unwrap();
        assert_eq!(
            model.field_value("matchNumber"),
            Some(&FieldValue::from(5_i64))
        );
    }

    #[test]
    fn test_update_value_unknown_section_leaves_model() {
        let mut model = sample();
        let before = model.clone();
        let err = model
            .update_value("Teleop", "cones", Some(FieldValue::from(1_i64)))
            .unwrap_err();
        assert!(matches!(err, Error::SectionNotFound { .. }));
        assert_eq!(model, before);
    }

    #[test]
    fn test_update_value_unknown_field_leaves_model() {
        let mut model = sample();
        let before = model.clone();
        let err = model
            .update_value("Auto", "scouter", Some(FieldValue::from("x")))
            .unwrap_err();
        assert!(matches!(err, Error::FieldNotFound { .. }));
        assert_eq!(model, before);
    }

    #[test]
    fn test_missing_required_fields_in_order() {
        let mut model = sample();
        let missing: Vec<_> = model
            .missing_required_fields()
            .iter()
            .map(|f| f.code.clone())
            .collect();
        assert_eq!(missing, vec!["scouter", "matchNumber"]);

        model
            .update_value("Metadata", "scouter", Some(FieldValue::from("")))
            .unwrap();
        model
            .update_value("Metadata", "matchNumber", Some(FieldValue::from(3_i64)))
            .unwrap();
        let missing = model.missing_required_fields();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].code, "scouter");

        model
            .update_value("Metadata", "scouter", Some(FieldValue::from("abc")))
            .unwrap();
        assert!(model.missing_required_fields().is_empty());
    }

    #[test]
    fn test_field_value_unknown_code() {
        let model = sample();
        assert!(model.field_value("robot").is_none());
        assert_eq!(model.field_value("mobility"), Some(&FieldValue::Bool(false)));
    }

    #[test]
    fn test_reset_sections_respects_preserve_flag() {
        let mut model = sample();
        model
            .update_value("Metadata", "scouter", Some(FieldValue::from("abc")))
            .unwrap();
        model
            .update_value("Auto", "cones", Some(FieldValue::from(6_i64)))
            .unwrap();
        model
            .update_value("Auto", "mobility", Some(FieldValue::Bool(true)))
            .unwrap();

        model.reset_sections();

        assert_eq!(model.field_value("scouter"), Some(&FieldValue::from("abc")));
        for field in &model.section("Auto").unwrap().fields {
            assert_eq!(field.value, field.default_value);
        }
    }

    #[test]
    fn test_replace_section_in_place() {
        let mut model = sample();
        let replacement = Section::new("Auto").with_field(Field::new(
            "leave",
            "Leave",
            FieldType::Boolean,
        ));
        model.replace_section(replacement).unwrap();

        assert_eq!(model.sections.len(), 2);
        assert_eq!(model.sections[1].name, "Auto");
        assert_eq!(model.sections[1].fields.len(), 1);
        assert_eq!(model.sections[0].name, "Metadata");
    }

    #[test]
    fn test_replace_section_inserts_first_when_absent() {
        let mut model = sample();
        model.replace_section(Section::new("Pit")).unwrap();
        assert_eq!(model.sections[0].name, "Pit");
        assert_eq!(model.sections.len(), 3);
    }

    #[test]
    fn test_replace_section_refuses_code_owned_elsewhere() {
        let mut model = sample();
        let before = model.clone();
        let clashing = Section::new("Info")
            .with_field(Field::new("mobility", "Mobility", FieldType::Boolean));

        let err = model.replace_section(clashing).unwrap_err();
        assert!(err.is_form_error());
        assert!(err.to_string().contains("'mobility'"));
        assert_eq!(model, before);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_replace_section_may_reuse_its_own_codes() {
        let mut model = sample();
        let replacement = Section::new("Metadata")
            .with_field(Field::new("scouter", "Scout", FieldType::Text));
        model.replace_section(replacement).unwrap();
        assert_eq!(model.section("Metadata").unwrap().fields.len(), 1);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_metadata_edit_lands_in_record() {
        let mut model = builtin_form();
        model
            .update_value("Metadata", "matchNumber", Some(FieldValue::from(5_i64)))
            .unwrap();
        assert_eq!(
            model.field_value("matchNumber"),
            Some(&FieldValue::from(5_i64))
        );

        let column = model
            .fields()
            .position(|f| f.code == "matchNumber")
            .unwrap();
        let record = crate::codec::encode_record(&model, crate::codec::MissingValue::Empty);
        assert_eq!(record.split('\t').nth(column), Some("5"));
    }

    #[test]
    fn test_field_count() {
        assert_eq!(sample().field_count(), 4);
    }

    #[test]
    fn test_document_uses_wire_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["page_title"], "Test Form");
        assert_eq!(json["sections"][0]["preserveDataOnReset"], true);
        assert!(json["sections"][1]["fields"][0].get("value").is_none());
        assert_eq!(json["sections"][1]["fields"][0]["defaultValue"], false);
    }
}
