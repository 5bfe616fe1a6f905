//! The Metadata section and the variants the handshake installs.

use crate::form::{Field, FieldType, FieldValue, Provenance, Section};

use super::payload::LeaderPayload;

/// Name of the section the handshake replaces.
pub const METADATA_SECTION: &str = "Metadata";

/// Alliance position codes and their labels.
pub const ROBOT_CHOICES: [(&str, &str); 6] = [
    ("r1", "Red 1"),
    ("r2", "Red 2"),
    ("r3", "Red 3"),
    ("b1", "Blue 1"),
    ("b2", "Blue 2"),
    ("b3", "Blue 3"),
];

/// Codes the leader fills in and locks on accept.
const LOCKED_CODES: [&str; 4] = ["basic", "scouter", "matchNumber", "robot"];

/// The Metadata section with defaults but no values.
#[must_use]
pub fn template() -> Section {
    let team = |n: u8| {
        Field::new(
            format!("teamNumber{n}"),
            format!("Team Number {n}"),
            FieldType::Number,
        )
        .required()
        .with_min(0.0)
    };

    Section::new(METADATA_SECTION)
        .preserving()
        .with_field(
            Field::new("basic", "Data Type", FieldType::Select)
                .required()
                .with_choices([("S", "Subjective")])
                .with_default("S"),
        )
        .with_field(Field::new("scouter", "Scouter ID", FieldType::Text).required())
        .with_field(
            Field::new("matchNumber", "Match Number", FieldType::Number)
                .required()
                .with_min(0.0),
        )
        .with_field(
            Field::new("robot", "Alliance", FieldType::Select)
                .required()
                .with_choices(ROBOT_CHOICES),
        )
        .with_field(team(1))
        .with_field(team(2))
        .with_field(team(3))
}

/// Metadata for a station that skipped the leader scan: every value unset,
/// every field editable.
#[must_use]
pub fn manual_section() -> Section {
    let mut section = template();
    for field in &mut section.fields {
        field.value = None;
        field.provenance = Provenance::Editable;
    }
    section
}

/// Metadata pre-filled from a confirmed leader payload.
///
/// `basic`, `scouter`, `matchNumber` and the derived `robot` code are locked
/// when the leader sent a value for them. Team numbers are filled in but stay
/// editable. A value the leader sent as `null` is left unset and editable.
#[must_use]
pub fn leader_section(payload: &LeaderPayload) -> Section {
    let mut section = manual_section();
    for field in &mut section.fields {
        field.value = match field.code.as_str() {
            "basic" => payload.basic.clone(),
            "scouter" => payload.scouter.clone(),
            "matchNumber" => payload.match_number.clone(),
            "robot" => payload.robot_code().map(FieldValue::Text),
            "teamNumber1" => payload.team_number1.clone(),
            "teamNumber2" => payload.team_number2.clone(),
            "teamNumber3" => payload.team_number3.clone(),
            _ => None,
        };
        if field.value.is_some() && LOCKED_CODES.contains(&field.code.as_str()) {
            field.provenance = Provenance::Locked;
        }
    }
    section
}

/// Derive the alliance position code from an FMS driver station label.
///
/// `r` if the label mentions red, otherwise `b`; then `1` or `2` if the label
/// contains that digit, otherwise `3`.
#[must_use]
pub fn alliance_code(fms_robot: &str) -> String {
    let label = fms_robot.to_lowercase();
    let alliance = if label.contains("red") { 'r' } else { 'b' };
    let position = if label.contains('1') {
        '1'
    } else if label.contains('2') {
        '2'
    } else {
        '3'
    };
    format!("{alliance}{position}")
}
