//! The leader metadata payload and its structural validation.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::form::FieldValue;

const BASIC: &str = "basic";
const SCOUTER: &str = "scouter";
const MATCH_NUMBER: &str = "matchNumber";
const TEAM_NUMBER1: &str = "teamNumber1";
const TEAM_NUMBER2: &str = "teamNumber2";
const TEAM_NUMBER3: &str = "teamNumber3";
const FMS_ROBOT: &str = "fmsRobot";

/// Keys a scanned payload must carry to be accepted as a leader broadcast.
pub const REQUIRED_KEYS: [&str; 7] = [
    BASIC,
    SCOUTER,
    MATCH_NUMBER,
    TEAM_NUMBER1,
    TEAM_NUMBER2,
    TEAM_NUMBER3,
    FMS_ROBOT,
];

/// Why a scanned payload was not taken as a leader broadcast.
///
/// Rejections are expected while scanning (partial frames, unrelated codes)
/// and are never surfaced as errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadRejection {
    /// The payload is not JSON.
    #[error("payload is not JSON")]
    NotJson,

    /// The payload is JSON but not an object.
    #[error("payload is not a JSON object")]
    NotObject,

    /// A required key is absent.
    #[error("payload is missing '{0}'")]
    MissingKey(&'static str),
}

/// Match metadata broadcast by a leader station.
///
/// Every required key is present on the wire, but a leader may send `null`
/// for values it does not know yet (typically the team list). Those are
/// `None` here and stay unset on the follower.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderPayload {
    /// Data type code, e.g. `S` for subjective.
    pub basic: Option<FieldValue>,
    /// Scouter identity.
    pub scouter: Option<FieldValue>,
    /// Display name of the scouter; informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<FieldValue>,
    /// Match number.
    pub match_number: Option<FieldValue>,
    /// First alliance team.
    pub team_number1: Option<FieldValue>,
    /// Second alliance team.
    pub team_number2: Option<FieldValue>,
    /// Third alliance team.
    pub team_number3: Option<FieldValue>,
    /// Driver station label from the field management system, e.g. `Red 2`.
    pub fms_robot: Option<String>,
}

impl LeaderPayload {
    /// Validate a decoded scan.
    ///
    /// Only key presence is checked. Extra keys are ignored. A present key
    /// holding `null`, an array or an object yields `None` for that value.
    ///
    /// # Errors
    ///
    /// Returns the [`PayloadRejection`] explaining why the scan is not a
    /// leader payload.
    pub fn from_scan(raw: &str) -> std::result::Result<Self, PayloadRejection> {
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|_| PayloadRejection::NotJson)?;
        let object = value.as_object().ok_or(PayloadRejection::NotObject)?;

        if let Some(key) = REQUIRED_KEYS.iter().find(|k| !object.contains_key(**k)) {
            return Err(PayloadRejection::MissingKey(*key));
        }

        let scalar = |key: &str| object.get(key).and_then(FieldValue::from_json);

        Ok(Self {
            basic: scalar(BASIC),
            scouter: scalar(SCOUTER),
            name: scalar("name"),
            match_number: scalar(MATCH_NUMBER),
            team_number1: scalar(TEAM_NUMBER1),
            team_number2: scalar(TEAM_NUMBER2),
            team_number3: scalar(TEAM_NUMBER3),
            fms_robot: scalar(FMS_ROBOT).map(|v| v.to_string()),
        })
    }

    /// Encode for broadcast from a leader station.
    ///
    /// Unknown values are written as `null` so every required key is present.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The alliance position code derived from [`LeaderPayload::fms_robot`],
    /// or `None` when the leader sent no driver station.
    #[must_use]
    pub fn robot_code(&self) -> Option<String> {
        self.fms_robot.as_deref().map(super::metadata::alliance_code)
    }
}
