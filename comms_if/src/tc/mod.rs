//! # Telecommand module
//!
//! This module provides telecommand functionality to the communications
//! interface.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod guidance;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};
use serde_json::{self, Value};
use thiserror::Error;

// Internal
use guidance::{GuidanceCmd, TrajectorySpec};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A position report, i.e. the vehicle's current progress along the route.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    /// Downtrack distance along the route in meters.
    pub downtrack_m: f64,
}

// ---------------------------------------------------------------------------
// STATICS
// ---------------------------------------------------------------------------

static TYPE_HAS_NO_PAYLOAD: [TcType; 2] = [TcType::Heartbeat, TcType::Abort];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// A telecommand, i.e. an instruction sent to guidance by a planner, the
/// position feed, or a script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Tc {
    Heartbeat,
    Position(PositionReport),
    Guidance(GuidanceCmd),
}

/// Telecommand types.
///
/// The type is used to identify the purpose of the telecommand, and should be
/// used by the telecommand processor to determine where to send the command.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub enum TcType {
    Heartbeat,
    Position,
    Submit,
    Abort,
}

/// Possible parsing errors.
#[derive(Debug, Error)]
pub enum TcParseError {
    #[error("TC contains invalid JSON: {0}")]
    InvalidJson(serde_json::Error),

    #[error("TC has an invalid type ({0})")]
    InvalidType(String),

    #[error("TC of type {0:?} is expected to have a payload but it doesn't")]
    MissingPayload(TcType),

    #[error("TC of type {0:?} has an invalid payload: {1}")]
    InvalidPayload(TcType, serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Tc {
    /// Parse a new TC from a JSON packet.
    ///
    /// Packets look like `{"type": "POS", "payload": {"downtrack_m": 12.5}}`.
    pub fn from_json(json_str: &str) -> Result<Self, TcParseError> {
        // Parse the JSON string into a value
        let val: Value = serde_json::from_str(json_str).map_err(TcParseError::InvalidJson)?;

        // Get the type of the TC
        let type_str = match val["type"].as_str() {
            Some(s) => s,
            None => {
                return Err(TcParseError::InvalidType(String::from(
                    "Expected \"type\" to be a string",
                )))
            }
        };
        let tc_type = match TcType::from_str(type_str) {
            Some(t) => t,
            None => {
                return Err(TcParseError::InvalidType(format!(
                    "{} is not a recognised TC type",
                    type_str
                )))
            }
        };

        // Get the payload. If it's null and the type does not have a payload
        // then an error is returned
        let payload = &val["payload"];
        if payload.is_null() && !TYPE_HAS_NO_PAYLOAD.contains(&tc_type) {
            return Err(TcParseError::MissingPayload(tc_type));
        }

        Ok(match tc_type {
            TcType::Heartbeat => Tc::Heartbeat,
            TcType::Abort => Tc::Guidance(GuidanceCmd::Abort),
            TcType::Position => Tc::Position(
                PositionReport::deserialize(payload)
                    .map_err(|e| TcParseError::InvalidPayload(tc_type, e))?,
            ),
            TcType::Submit => Tc::Guidance(GuidanceCmd::Submit(
                TrajectorySpec::deserialize(payload)
                    .map_err(|e| TcParseError::InvalidPayload(tc_type, e))?,
            )),
        })
    }
}

impl TcType {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "HEARTBEAT" => Some(TcType::Heartbeat),
            "POS" => Some(TcType::Position),
            "SUBMIT" => Some(TcType::Submit),
            "ABORT" => Some(TcType::Abort),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::guidance::ManeuverKind;
    use super::*;

    #[test]
    fn test_parse_position() {
        let tc = Tc::from_json(r#"{"type": "POS", "payload": {"downtrack_m": 12.5}}"#).unwrap();
        assert_eq!(tc, Tc::Position(PositionReport { downtrack_m: 12.5 }));
    }

    #[test]
    fn test_parse_abort_without_payload() {
        let tc = Tc::from_json(r#"{"type": "ABORT"}"#).unwrap();
        assert_eq!(tc, Tc::Guidance(GuidanceCmd::Abort));
    }

    #[test]
    fn test_parse_submit() {
        let tc = Tc::from_json(
            r#"{
                "type": "SUBMIT",
                "payload": {
                    "start_m": 0.0,
                    "end_m": 100.0,
                    "maneuvers": [
                        {"start_m": 0.0, "end_m": 100.0, "kind": {"SteadySpeed": {"speed_mps": 11.0, "max_accel_mps2": 2.0}}},
                        {"start_m": 20.0, "end_m": 60.0, "kind": {"LaneChange": {"target_lane": 1}}}
                    ]
                }
            }"#,
        )
        .unwrap();

        let spec = match tc {
            Tc::Guidance(GuidanceCmd::Submit(s)) => s,
            t => panic!("Expected a submit TC, got {:?}", t),
        };

        assert_eq!(spec.maneuvers.len(), 2);
        assert_eq!(
            spec.maneuvers[0].kind,
            ManeuverKind::SteadySpeed {
                speed_mps: 11.0,
                max_accel_mps2: 2.0
            }
        );
        assert_eq!(
            spec.maneuvers[1].kind,
            ManeuverKind::LaneChange { target_lane: 1 }
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            Tc::from_json("{not json"),
            Err(TcParseError::InvalidJson(_))
        ));
        assert!(matches!(
            Tc::from_json(r#"{"type": "WARP"}"#),
            Err(TcParseError::InvalidType(_))
        ));
        assert!(matches!(
            Tc::from_json(r#"{"type": "POS"}"#),
            Err(TcParseError::MissingPayload(TcType::Position))
        ));
        assert!(matches!(
            Tc::from_json(r#"{"type": "POS", "payload": {"speed": 1}}"#),
            Err(TcParseError::InvalidPayload(TcType::Position, _))
        ));
    }
}
