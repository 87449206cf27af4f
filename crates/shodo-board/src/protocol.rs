//! Wire Protocol Messages
//!
//! This module defines the envelope format exchanged over the board's
//! push channel. Every frame is a single JSON object tagged by `type`,
//! carrying either a stroke creation or a stroke deletion.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A single point on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate in canvas pixels
    pub x: f64,
    /// Vertical coordinate in canvas pixels
    pub y: f64,
}

/// A drawn stroke: an ordered path of points plus display hints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stroke {
    /// Server-assigned id; 0 until the stroke has been persisted
    #[serde(default)]
    pub id: i64,

    /// Ordered points defining the drawing path
    #[serde(default)]
    pub points: Vec<Point>,

    /// Display color (opaque to the hub)
    #[serde(default)]
    pub color: String,

    /// Stroke width in pixels
    #[serde(default)]
    pub width: i32,

    /// Client-assigned correlation id, echoed back unmodified so the
    /// drawing client can reconcile its local stroke with the server id
    #[serde(default)]
    pub client_id: String,

    /// Client-local creation time, milliseconds since epoch (0 = unset)
    #[serde(default)]
    pub started_at_unix_ms: i64,
}

/// A single wire message: either a stroke creation or a deletion by id
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    /// A new stroke to persist and relay
    Stroke(Stroke),
    /// Delete the stroke with this server-assigned id
    Delete(i64),
}

/// Raw wire form of an [`Envelope`]. The tag and the populated field must
/// agree; decode rejects frames where they do not.
#[derive(Debug, Serialize, Deserialize)]
struct WireEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stroke: Option<Stroke>,
    #[serde(skip_serializing_if = "Option::is_none")]
    delete: Option<i64>,
}

impl Envelope {
    /// Decode a text frame.
    ///
    /// Returns `Ok(None)` for frames with an unrecognized `type` (ignored
    /// by contract), and `Err` for malformed JSON or frames whose tag
    /// disagrees with the populated field.
    pub fn decode(text: &str) -> Result<Option<Self>> {
        let wire: WireEnvelope =
            serde_json::from_str(text).map_err(|e| Error::invalid_message(e.to_string()))?;

        match wire.kind.as_str() {
            "stroke" => match wire.stroke {
                Some(stroke) => Ok(Some(Self::Stroke(stroke))),
                None => Err(Error::invalid_message("stroke envelope without stroke")),
            },
            "delete" => match wire.delete {
                Some(id) => Ok(Some(Self::Delete(id))),
                None => Err(Error::invalid_message("delete envelope without id")),
            },
            _ => Ok(None),
        }
    }

    /// Encode to the JSON wire form.
    pub fn encode(&self) -> Result<String> {
        let wire = match self {
            Self::Stroke(stroke) => WireEnvelope {
                kind: "stroke".to_string(),
                stroke: Some(stroke.clone()),
                delete: None,
            },
            Self::Delete(id) => WireEnvelope {
                kind: "delete".to_string(),
                stroke: None,
                delete: Some(*id),
            },
        };
        serde_json::to_string(&wire).map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_stroke_envelope() {
        let text = r##"{"type":"stroke","stroke":{"id":0,"points":[{"x":10,"y":20}],"color":"#1d4ed8","width":4,"clientId":"abc123","startedAtUnixMs":1690000000000}}"##;
        let env = Envelope::decode(text).unwrap().unwrap();
        match env {
            Envelope::Stroke(stroke) => {
                assert_eq!(stroke.id, 0);
                assert_eq!(stroke.points, vec![Point { x: 10.0, y: 20.0 }]);
                assert_eq!(stroke.color, "#1d4ed8");
                assert_eq!(stroke.width, 4);
                assert_eq!(stroke.client_id, "abc123");
                assert_eq!(stroke.started_at_unix_ms, 1_690_000_000_000);
            }
            other => unreachable!("expected stroke envelope, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_delete_envelope() {
        let env = Envelope::decode(r#"{"type":"delete","delete":123}"#)
            .unwrap()
            .unwrap();
        assert_eq!(env, Envelope::Delete(123));
    }

    #[test]
    fn test_decode_unknown_type_is_ignored() {
        let env = Envelope::decode(r#"{"type":"presence","delete":1}"#).unwrap();
        assert!(env.is_none());
    }

    #[test]
    fn test_decode_rejects_tag_field_disagreement() {
        assert!(Envelope::decode(r#"{"type":"stroke","delete":5}"#).is_err());
        assert!(Envelope::decode(r#"{"type":"delete","stroke":{}}"#).is_err());
    }

    #[test]
    fn test_decode_rejects_malformed_json() {
        assert!(Envelope::decode("not json").is_err());
    }

    #[test]
    fn test_encode_stroke_wire_shape() {
        let env = Envelope::Stroke(Stroke {
            id: 7,
            points: vec![Point { x: 1.0, y: 2.0 }],
            color: "#000".to_string(),
            width: 2,
            client_id: "c1".to_string(),
            started_at_unix_ms: 1000,
        });
        let json = env.encode().unwrap();
        assert!(json.contains(r#""type":"stroke""#));
        assert!(json.contains(r#""clientId":"c1""#));
        assert!(json.contains(r#""startedAtUnixMs":1000"#));
        assert!(!json.contains("delete"));

        let back = Envelope::decode(&json).unwrap().unwrap();
        assert_eq!(back, env);
    }

    #[test]
    fn test_encode_delete_wire_shape() {
        let json = Envelope::Delete(42).encode().unwrap();
        assert_eq!(json, r#"{"type":"delete","delete":42}"#);
    }

    #[test]
    fn test_stroke_defaults_for_missing_fields() {
        let env = Envelope::decode(r#"{"type":"stroke","stroke":{"points":[]}}"#)
            .unwrap()
            .unwrap();
        match env {
            Envelope::Stroke(stroke) => {
                assert_eq!(stroke.id, 0);
                assert!(stroke.points.is_empty());
                assert_eq!(stroke.started_at_unix_ms, 0);
            }
            other => unreachable!("expected stroke envelope, got {:?}", other),
        }
    }
}
