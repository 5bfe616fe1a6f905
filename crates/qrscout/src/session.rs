//! One scouting session at a station.
//!
//! A [`Session`] owns the form model, the leader handshake and the store the
//! form document is persisted to. The store is touched only when the session
//! starts and on explicit import or clear.

use tracing::{debug, info, warn};

use crate::codec::{self, MissingValue};
use crate::error::{Error, Result};
use crate::form::{Field, FieldValue, FormModel};
use crate::handshake::{LeaderHandshake, ScanOutcome};
use crate::storage::KeyValueStore;

/// A record ready to be shown as a QR code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    /// Display title, `"{robot} - {matchNumber}"`.
    pub title: String,
    /// The tab-separated record.
    pub payload: String,
}

/// The form, its handshake and its backing store.
#[derive(Debug)]
pub struct Session<S: KeyValueStore> {
    model: FormModel,
    handshake: LeaderHandshake,
    store: S,
    missing_value: MissingValue,
}

impl<S: KeyValueStore> Session<S> {
    /// Start a session with the stored form, or the bundled one.
    pub fn start(store: S, missing_value: MissingValue) -> Self {
        let model = codec::default_config(&store);
        info!(
            title = %model.title,
            sections = model.sections.len(),
            fields = model.field_count(),
            "Session started"
        );
        Self {
            model,
            handshake: LeaderHandshake::new(),
            store,
            missing_value,
        }
    }

    /// The current form.
    #[must_use]
    pub fn model(&self) -> &FormModel {
        &self.model
    }

    /// The leader handshake.
    #[must_use]
    pub fn handshake(&self) -> &LeaderHandshake {
        &self.handshake
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// How unset values are encoded.
    #[must_use]
    pub fn missing_value(&self) -> MissingValue {
        self.missing_value
    }

    /// Set a field's value.
    ///
    /// Unknown sections or codes and locked fields are logged and the edit is
    /// dropped. Returns `true` if the value was stored.
    pub fn update_value(&mut self, section: &str, code: &str, value: Option<FieldValue>) -> bool {
        match self.try_update(section, code, value) {
            Ok(()) => true,
            Err(e) => {
                warn!(section, code, error = %e, "Dropping field update");
                false
            }
        }
    }

    /// Parse `text` for the field's type and store it.
    ///
    /// # Errors
    ///
    /// Returns a lookup error, [`Error::FieldLocked`], or
    /// [`Error::InvalidValue`] if the text does not fit the field type. The
    /// model is unchanged on error.
    pub fn set_from_text(&mut self, section: &str, code: &str, text: &str) -> Result<()> {
        let value = self.model.field(section, code)?.parse_input(text)?;
        self.try_update(section, code, value)
    }

    fn try_update(&mut self, section: &str, code: &str, value: Option<FieldValue>) -> Result<()> {
        if self.model.field(section, code)?.is_locked() {
            return Err(Error::FieldLocked {
                code: code.to_string(),
            });
        }
        self.model.update_value(section, code, value)
    }

    /// Restore defaults in every section not marked to preserve its data.
    pub fn reset(&mut self) {
        self.model.reset_sections();
    }

    /// Required fields still blocking a commit.
    #[must_use]
    pub fn missing_required(&self) -> Vec<&Field> {
        self.model.missing_required_fields()
    }

    /// Whether every required field is filled in.
    #[must_use]
    pub fn can_commit(&self) -> bool {
        self.missing_required().is_empty()
    }

    /// Encode the record, or `None` while required fields are missing.
    #[must_use]
    pub fn commit(&self) -> Option<Commit> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            debug!(missing = missing.len(), "Commit blocked");
            return None;
        }
        let robot = codec::render_value(self.model.field_value("robot"), self.missing_value);
        let match_number =
            codec::render_value(self.model.field_value("matchNumber"), self.missing_value);
        Some(Commit {
            title: format!("{robot} - {match_number}"),
            payload: codec::encode_record(&self.model, self.missing_value),
        })
    }

    /// The spreadsheet header line.
    #[must_use]
    pub fn header(&self) -> String {
        codec::encode_header(&self.model)
    }

    /// The current form as a value-free JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn export_config_json(&self) -> Result<String> {
        codec::export_config_json(&self.model)
    }

    /// Replace the form with a user-supplied document and persist it.
    ///
    /// A rejected document is logged and the current form is kept.
    ///
    /// # Errors
    ///
    /// Returns the parse or shape error.
    pub fn import_config(&mut self, raw: &str) -> Result<()> {
        match codec::import_config(raw, &mut self.store) {
            Ok(model) => {
                self.model = model;
                self.handshake = LeaderHandshake::new();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Import rejected, keeping current form");
                Err(e)
            }
        }
    }

    /// Forget the persisted form. The current form is unchanged.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub fn clear_user_config(&mut self) -> Result<bool> {
        codec::clear_user_config(&mut self.store)
    }

    /// Scout without a leader.
    pub fn choose_manual(&mut self) -> bool {
        self.handshake.choose_manual(&mut self.model)
    }

    /// Begin scanning for a leader payload.
    pub fn start_scanning(&mut self) -> bool {
        self.handshake.start_scanning()
    }

    /// Feed the payloads decoded from one frame.
    pub fn on_scan<'a, I>(&mut self, batch: I) -> ScanOutcome
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.handshake.on_batch(batch)
    }

    /// Mutable access to the handshake, for driving a scan loop.
    pub fn handshake_mut(&mut self) -> &mut LeaderHandshake {
        &mut self.handshake
    }

    /// Confirm the pending leader payload.
    pub fn accept(&mut self) -> bool {
        self.handshake.accept(&mut self.model)
    }

    /// Discard the pending leader payload and resume scanning.
    pub fn reject(&mut self) -> bool {
        self.handshake.reject()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::builtin_form;
    use crate::handshake::{HandshakeState, METADATA_SECTION};
    use crate::logging::init_test_logging;
    use crate::storage::{MemoryStore, Storage, USER_CONFIG_KEY};

    const RED_2: &str = r#"{"basic":"S","scouter":"abc","name":"x","matchNumber":12,"teamNumber1":1,"teamNumber2":2,"teamNumber3":3,"fmsRobot":"Red 2"}"#;

    const PIT: &str = r#"{
        "title": "Pit",
        "page_title": "Pit",
        "sections": [{"name": "Robot", "fields": [
            {"title": "Team", "type": "number", "required": true, "code": "team"}
        ]}]
    }"#;

    fn session() -> Session<MemoryStore> {
        init_test_logging();
        Session::start(MemoryStore::new(), MissingValue::Empty)
    }

    fn fill_required(session: &mut Session<MemoryStore>) {
        let codes: Vec<String> = session
            .missing_required()
            .iter()
            .map(|f| f.code.clone())
            .collect();
        for code in codes {
            let section = session
                .model()
                .sections
                .iter()
                .find(|s| s.field(&code).is_some())
                .map(|s| s.name.clone())
                .unwrap();
            let value = match code.as_str() {
                "robot" => FieldValue::from("r1"),
                "scouter" => FieldValue::from("abc"),
                _ => FieldValue::from(1_i64),
            };
            assert!(session.update_value(&section, &code, Some(value)));
        }
    }

    #[test]
    fn test_start_uses_builtin_form() {
        let session = session();
        assert_eq!(session.model(), &builtin_form());
        assert_eq!(session.handshake().state(), &HandshakeState::AwaitingRoleChoice);
    }

    #[test]
    fn test_start_uses_stored_form() {
        let session = Session::start(
            MemoryStore::with_entry(USER_CONFIG_KEY, PIT),
            MissingValue::Empty,
        );
        assert_eq!(session.model().title, "Pit");
    }

    #[test]
    fn test_commit_gate() {
        let mut session = session();
        assert!(!session.can_commit());
        assert!(session.commit().is_none());

        fill_required(&mut session);
        assert!(session.can_commit());
        assert!(session.commit().is_some());
    }

    #[test]
    fn test_unknown_update_is_dropped() {
        let mut session = session();
        let before = session.model().clone();
        assert!(!session.update_value("Nope", "x", Some("y".into())));
        assert!(!session.update_value(METADATA_SECTION, "nope", Some("y".into())));
        assert_eq!(session.model(), &before);
    }

    #[test]
    fn test_set_from_text() {
        let mut session = session();
        session
            .set_from_text("Teleop", "teleCones", "7")
            .unwrap();
        assert_eq!(
            session.model().field_value("teleCones"),
            Some(&FieldValue::from(7_i64))
        );

        let err = session
            .set_from_text("Teleop", "teleCones", "seven")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidValue { .. }));
        assert_eq!(
            session.model().field_value("teleCones"),
            Some(&FieldValue::from(7_i64))
        );
    }

    #[test]
    fn test_locked_fields_refuse_edits() {
        let mut session = session();
        session.start_scanning();
        session.on_scan([RED_2]);
        assert!(session.accept());

        assert!(!session.update_value(METADATA_SECTION, "scouter", Some("zzz".into())));
        assert!(matches!(
            session.set_from_text(METADATA_SECTION, "robot", "b1"),
            Err(Error::FieldLocked { .. })
        ));
        assert!(session.update_value(METADATA_SECTION, "teamNumber1", Some(254_i64.into())));
        assert_eq!(
            session.model().field_value("scouter"),
            Some(&FieldValue::from("abc"))
        );
    }

    #[test]
    fn test_leader_session_end_to_end() {
        let mut session = session();
        assert!(session.start_scanning());
        assert_eq!(session.on_scan(["garbage", "{}"]), ScanOutcome::Ignored);
        assert_eq!(session.on_scan([RED_2]), ScanOutcome::Captured);
        assert!(session.accept());
        assert_eq!(session.handshake().state(), &HandshakeState::Applied);

        fill_required(&mut session);
        let commit = session.commit().unwrap();
        assert_eq!(commit.title, "r2 - 12");
        assert!(commit.payload.starts_with("S\tabc\t12\tr2\t1\t2\t3"));
        assert_eq!(
            commit.payload.split('\t').count(),
            session.model().field_count()
        );
    }

    #[test]
    fn test_manual_session() {
        let mut session = session();
        assert!(session.choose_manual());
        let metadata = session.model().section(METADATA_SECTION).unwrap();
        assert!(metadata.fields.iter().all(|f| f.value.is_none() && !f.is_locked()));
        assert!(!session.start_scanning());
        assert!(!session.accept());
        assert!(!session.reject());
    }

    #[test]
    fn test_reset_keeps_metadata() {
        let mut session = session();
        session.choose_manual();
        session.update_value(METADATA_SECTION, "scouter", Some("abc".into()));
        session.update_value("Teleop", "teleCones", Some(5_i64.into()));

        session.reset();

        assert_eq!(
            session.model().field_value("scouter"),
            Some(&FieldValue::from("abc"))
        );
        assert_eq!(
            session.model().field_value("teleCones"),
            builtin_form().field_value("teleCones")
        );
    }

    #[test]
    fn test_import_replaces_and_persists() {
        let mut session = session();
        session.import_config(PIT).unwrap();
        assert_eq!(session.model().title, "Pit");
        assert_eq!(
            session.store().get(USER_CONFIG_KEY).unwrap().as_deref(),
            Some(PIT)
        );
    }

    #[test]
    fn test_failed_import_keeps_form() {
        let mut session = session();
        session.update_value("Teleop", "teleCones", Some(3_i64.into()));
        let before = session.model().clone();

        assert!(session.import_config("{\"sections\": true}").is_err());
        assert_eq!(session.model(), &before);
        assert_eq!(session.store().get(USER_CONFIG_KEY).unwrap(), None);
    }

    #[test]
    fn test_export_has_no_values() {
        let mut session = session();
        session.update_value("Teleop", "teleCones", Some(3_i64.into()));
        let json = session.export_config_json().unwrap();
        assert!(!json.contains("\"value\""));
    }

    #[test]
    fn test_clear_user_config() {
        let mut session = Session::start(
            MemoryStore::with_entry(USER_CONFIG_KEY, PIT),
            MissingValue::Empty,
        );
        assert!(session.clear_user_config().unwrap());
        assert_eq!(session.model().title, "Pit");
        assert_eq!(session.store().get(USER_CONFIG_KEY).unwrap(), None);
    }

    #[test]
    fn test_literal_missing_values() {
        let mut session = Session::start(MemoryStore::new(), MissingValue::Literal);
        fill_required(&mut session);
        session.update_value("Additional", "comments", None);
        let commit = session.commit().unwrap();
        assert!(commit.payload.ends_with("\tundefined"));
    }

    #[test]
    fn test_session_on_sqlite() {
        let mut storage = Storage::open_in_memory().unwrap();
        storage.set(USER_CONFIG_KEY, PIT).unwrap();

        let session = Session::start(storage, MissingValue::Empty);
        assert_eq!(session.model().title, "Pit");
        assert_eq!(session.header(), "Team");
    }
}
