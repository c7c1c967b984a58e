use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// `type` value reserved for join/leave notifications.
pub const PRESENCE_TYPE: &str = "presence";

/// Identity attached to presence events.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PresenceUser {
    pub email: String,
    pub id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PresenceAction {
    Join,
    Leave,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PresenceMessage {
    pub action: PresenceAction,
    pub user: PresenceUser,
}

/// Frames the relay writes on its own behalf.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum SystemMessage {
    #[serde(rename = "presence")]
    Presence(PresenceMessage),
}

impl SystemMessage {
    pub fn join(user: PresenceUser) -> Self {
        SystemMessage::Presence(PresenceMessage {
            action: PresenceAction::Join,
            user,
        })
    }

    pub fn leave(user: PresenceUser) -> Self {
        SystemMessage::Presence(PresenceMessage {
            action: PresenceAction::Leave,
            user,
        })
    }

    /// Render as a text frame.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("frame is not a JSON object with a string `type` field: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("frame is not a JSON object")]
    NotAnObject,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvelopeKind {
    Presence,
    Application(String),
}

/// An inbound frame: its discriminator plus the untouched text.
///
/// Only `type` is decoded. Everything else stays opaque and is forwarded
/// exactly as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub kind: EnvelopeKind,
    pub raw: String,
}

#[derive(Deserialize)]
struct Discriminator<'a> {
    #[serde(rename = "type", borrow)]
    kind: Cow<'a, str>,
}

impl Envelope {
    pub fn decode(raw: String) -> Result<Self, DecodeError> {
        if !raw.trim_start().starts_with('{') {
            return Err(DecodeError::NotAnObject);
        }
        let kind = {
            let discriminator: Discriminator<'_> = serde_json::from_str(&raw)?;
            if discriminator.kind == PRESENCE_TYPE {
                EnvelopeKind::Presence
            } else {
                EnvelopeKind::Application(discriminator.kind.into_owned())
            }
        };
        Ok(Envelope { kind, raw })
    }

    pub fn type_name(&self) -> &str {
        match &self.kind {
            EnvelopeKind::Presence => PRESENCE_TYPE,
            EnvelopeKind::Application(kind) => kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_application_frame_keeps_raw_text() {
        let raw = r#"{"type":"cursor", "pos": 5, "extra": {"nested": [1,2]}}"#.to_string();
        let envelope = Envelope::decode(raw.clone()).unwrap();
        assert_eq!(envelope.kind, EnvelopeKind::Application("cursor".to_string()));
        assert_eq!(envelope.raw, raw);
        assert_eq!(envelope.type_name(), "cursor");
    }

    #[test]
    fn test_decode_client_presence() {
        let raw = r##"{"type":"presence","action":"join","user":{"name":"kim","color":"#ff0000"}}"##;
        let envelope = Envelope::decode(raw.to_string()).unwrap();
        assert_eq!(envelope.kind, EnvelopeKind::Presence);
    }

    #[test]
    fn test_decode_rejects_malformed_frames() {
        assert!(Envelope::decode("not json".to_string()).is_err());
        assert!(Envelope::decode(r#"{"pos":5}"#.to_string()).is_err());
        assert!(Envelope::decode(r#"{"type":5}"#.to_string()).is_err());
        assert!(Envelope::decode(r#"["cursor"]"#.to_string()).is_err());
        assert!(Envelope::decode(r#"{"type":"cursor""#.to_string()).is_err());
    }

    #[test]
    fn test_presence_frame_shape() {
        let user = PresenceUser {
            email: "a@x.com".to_string(),
            id: "abc".to_string(),
        };
        let frame = SystemMessage::join(user.clone()).to_frame().unwrap();
        let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "presence",
                "action": "join",
                "user": {"email": "a@x.com", "id": "abc"}
            })
        );

        let leave: SystemMessage =
            serde_json::from_str(&SystemMessage::leave(user.clone()).to_frame().unwrap()).unwrap();
        assert_eq!(leave, SystemMessage::leave(user));
    }
}
