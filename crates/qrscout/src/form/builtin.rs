//! The form shipped with the binary, used when no user form is stored.

use super::field::{Field, FieldType};
use super::model::FormModel;
use super::section::Section;
use crate::handshake::metadata;

/// Title of the bundled form.
pub const BUILTIN_TITLE: &str = "QRScout";

/// Page heading of the bundled form.
pub const BUILTIN_PAGE_TITLE: &str = "Charged Up Subjective Scouting";

const DOCKING_CHOICES: [(&str, &str); 4] = [
    ("No", "Not attempted"),
    ("F", "Failed"),
    ("D", "Docked"),
    ("E", "Engaged"),
];

const RATING_CHOICES: [(&str, &str); 5] = [
    ("1", "Poor"),
    ("2", "Below average"),
    ("3", "Average"),
    ("4", "Good"),
    ("5", "Excellent"),
];

/// Build the bundled form with every value at its default.
#[must_use]
pub fn builtin_form() -> FormModel {
    let mut form = FormModel {
        title: BUILTIN_TITLE.to_string(),
        page_title: BUILTIN_PAGE_TITLE.to_string(),
        sections: vec![
            metadata::template(),
            autonomous(),
            teleop(),
            endgame(),
            additional(),
        ],
    };
    for section in &mut form.sections {
        section.apply_defaults();
    }
    form
}

fn autonomous() -> Section {
    Section::new("Autonomous")
        .with_field(Field::new("autoMobility", "Mobility", FieldType::Boolean).with_default(false))
        .with_field(Field::new("autoCones", "Auto Cones", FieldType::Counter).with_default(0_i64))
        .with_field(Field::new("autoCubes", "Auto Cubes", FieldType::Counter).with_default(0_i64))
        .with_field(
            Field::new("autoDocking", "Auto Charge Station", FieldType::Select)
                .with_choices(DOCKING_CHOICES)
                .with_default("No"),
        )
}

fn teleop() -> Section {
    Section::new("Teleop")
        .with_field(Field::new("teleCones", "Teleop Cones", FieldType::Counter).with_default(0_i64))
        .with_field(Field::new("teleCubes", "Teleop Cubes", FieldType::Counter).with_default(0_i64))
        .with_field(
            Field::new("defense", "Defense Rating", FieldType::Select)
                .with_choices(RATING_CHOICES)
                .with_default("3"),
        )
}

fn endgame() -> Section {
    Section::new("Endgame")
        .with_field(
            Field::new("endDocking", "Endgame Charge Station", FieldType::Select)
                .with_choices(DOCKING_CHOICES)
                .with_default("No"),
        )
        .with_field(Field::new("dockTime", "Time to Dock", FieldType::Timer).with_default(0_i64))
}

fn additional() -> Section {
    Section::new("Additional")
        .with_field(
            Field::new("driverSkill", "Driver Skill", FieldType::Select)
                .with_choices(RATING_CHOICES)
                .with_default("3"),
        )
        .with_field(Field::new("tipped", "Tipped Over", FieldType::Boolean).with_default(false))
        .with_field(Field::new("comments", "Comments", FieldType::Text).with_default(""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::field::FieldValue;

    #[test]
    fn test_builtin_form_is_valid() {
        let form = builtin_form();
        assert!(form.validate().is_ok());
        assert_eq!(form.title, BUILTIN_TITLE);
    }

    #[test]
    fn test_builtin_form_starts_with_metadata() {
        let form = builtin_form();
        let metadata = &form.sections[0];
        assert_eq!(metadata.name, metadata::METADATA_SECTION);
        assert!(metadata.preserve_data_on_reset);
    }

    #[test]
    fn test_builtin_form_values_are_defaults() {
        let form = builtin_form();
        for field in form.fields() {
            assert_eq!(field.value, field.default_value, "field {}", field.code);
        }
        assert_eq!(form.field_value("basic"), Some(&FieldValue::from("S")));
    }

    #[test]
    fn test_builtin_form_load_is_stable() {
        let form = builtin_form();
        assert_eq!(FormModel::load(form.clone()).unwrap(), form);
    }

    #[test]
    fn test_builtin_only_metadata_is_required() {
        let form = builtin_form();
        for section in &form.sections[1..] {
            assert!(section.fields.iter().all(|f| !f.required));
        }
    }
}
