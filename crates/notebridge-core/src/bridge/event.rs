//! Host event types
//!
//! The host calls back into the client through a single entry point with a
//! type tag, a primary payload and an optional secondary payload. Newer hosts
//! wrap the same triple in a JSON [`Envelope`] carrying the correlation token
//! of the request being answered.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::pending::RequestToken;
use super::BridgeError;

/// Discriminant of a host event, with its wire tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "IMPORT_MD_RESULT")]
    ImportMdResult,
    #[serde(rename = "PICK_IMAGE_RESULT")]
    PickImageResult,
    #[serde(rename = "EXPORT_SUCCESS")]
    ExportSuccess,
    #[serde(rename = "ERROR")]
    Error,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::ImportMdResult => "IMPORT_MD_RESULT",
            EventKind::PickImageResult => "PICK_IMAGE_RESULT",
            EventKind::ExportSuccess => "EXPORT_SUCCESS",
            EventKind::Error => "ERROR",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IMPORT_MD_RESULT" => Ok(EventKind::ImportMdResult),
            "PICK_IMAGE_RESULT" => Ok(EventKind::PickImageResult),
            "EXPORT_SUCCESS" => Ok(EventKind::ExportSuccess),
            "ERROR" => Ok(EventKind::Error),
            other => Err(BridgeError::UnknownEventKind(other.to_string())),
        }
    }
}

/// An asynchronous result or notice from the host shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// A picked markdown file, read natively
    ImportMdResult {
        content: String,
        filename: Option<String>,
    },
    /// A picked image, already copied into the managed image directory
    ///
    /// Hosts without filesystem access may send a `data:` URL instead.
    PickImageResult { filename: String },
    /// Export finished; the payload is a path or message to show
    ExportSuccess { message: String },
    /// Anything went wrong on the host side
    Error { message: String },
}

impl HostEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            HostEvent::ImportMdResult { .. } => EventKind::ImportMdResult,
            HostEvent::PickImageResult { .. } => EventKind::PickImageResult,
            HostEvent::ExportSuccess { .. } => EventKind::ExportSuccess,
            HostEvent::Error { .. } => EventKind::Error,
        }
    }

    /// Build an event from the raw callback arguments
    pub fn from_parts(kind: &str, data: String, extra: Option<String>) -> Result<Self, BridgeError> {
        let extra = extra.filter(|e| !e.trim().is_empty());

        match kind.parse::<EventKind>()? {
            EventKind::ImportMdResult => Ok(HostEvent::ImportMdResult {
                content: data,
                filename: extra,
            }),
            EventKind::PickImageResult => {
                if data.trim().is_empty() {
                    return Err(BridgeError::MissingPayload(EventKind::PickImageResult.as_str()));
                }
                Ok(HostEvent::PickImageResult { filename: data })
            }
            EventKind::ExportSuccess => Ok(HostEvent::ExportSuccess { message: data }),
            EventKind::Error => Ok(HostEvent::Error { message: data }),
        }
    }

    /// Split into the raw callback arguments
    pub fn into_parts(self) -> (EventKind, String, Option<String>) {
        match self {
            HostEvent::ImportMdResult { content, filename } => {
                (EventKind::ImportMdResult, content, filename)
            }
            HostEvent::PickImageResult { filename } => (EventKind::PickImageResult, filename, None),
            HostEvent::ExportSuccess { message } => (EventKind::ExportSuccess, message, None),
            HostEvent::Error { message } => (EventKind::Error, message, None),
        }
    }
}

/// A host event as delivered to the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    /// Token of the request this answers; `None` from legacy hosts
    pub token: Option<RequestToken>,
    pub event: HostEvent,
}

impl InboundEvent {
    pub fn new(token: Option<RequestToken>, event: HostEvent) -> Self {
        Self { token, event }
    }

    pub fn to_json(&self) -> Result<String, BridgeError> {
        let (kind, data, extra) = self.event.clone().into_parts();
        let envelope = Envelope {
            kind: kind.as_str().to_string(),
            data,
            extra,
            token: self.token,
        };
        Ok(serde_json::to_string(&envelope)?)
    }
}

/// JSON wire form of a host event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<RequestToken>,
}

impl Envelope {
    pub fn parse(json: &str) -> Result<InboundEvent, BridgeError> {
        let envelope: Envelope = serde_json::from_str(json)?;
        let token = envelope.token;
        Ok(InboundEvent::new(token, envelope.into_event()?))
    }

    pub fn into_event(self) -> Result<HostEvent, BridgeError> {
        HostEvent::from_parts(&self.kind, self.data, self.extra)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts() {
        let event = HostEvent::from_parts(
            "IMPORT_MD_RESULT",
            "# Hi".to_string(),
            Some("Hi.md".to_string()),
        )
        .unwrap();
        assert_eq!(
            event,
            HostEvent::ImportMdResult {
                content: "# Hi".to_string(),
                filename: Some("Hi.md".to_string())
            }
        );
        assert_eq!(event.kind(), EventKind::ImportMdResult);
    }

    #[test]
    fn test_blank_extra_is_none() {
        let event =
            HostEvent::from_parts("IMPORT_MD_RESULT", "x".to_string(), Some("  ".to_string()))
                .unwrap();
        assert!(matches!(event, HostEvent::ImportMdResult { filename: None, .. }));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let err = HostEvent::from_parts("SHARE_RESULT", String::new(), None).unwrap_err();
        assert!(matches!(err, BridgeError::UnknownEventKind(ref k) if k == "SHARE_RESULT"));
    }

    #[test]
    fn test_pick_image_requires_filename() {
        let err = HostEvent::from_parts("PICK_IMAGE_RESULT", " ".to_string(), None).unwrap_err();
        assert!(matches!(err, BridgeError::MissingPayload(_)));
    }

    #[test]
    fn test_envelope_parse_with_token() {
        let token = RequestToken::new();
        let json = format!(
            r#"{{"type":"EXPORT_SUCCESS","data":"/tmp/A.md","token":"{}"}}"#,
            token
        );
        let inbound = Envelope::parse(&json).unwrap();
        assert_eq!(inbound.token, Some(token));
        assert_eq!(
            inbound.event,
            HostEvent::ExportSuccess {
                message: "/tmp/A.md".to_string()
            }
        );
    }

    #[test]
    fn test_envelope_to_json_shape() {
        let inbound = InboundEvent::new(
            None,
            HostEvent::Error {
                message: "boom".to_string(),
            },
        );
        let value: serde_json::Value = serde_json::from_str(&inbound.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "ERROR");
        assert_eq!(value["data"], "boom");
        assert!(value.get("token").is_none());
    }

    #[test]
    fn test_envelope_malformed() {
        assert!(matches!(
            Envelope::parse("{not json"),
            Err(BridgeError::Malformed(_))
        ));
    }
}
