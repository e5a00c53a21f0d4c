use crate::HuskError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The single self-contained result value every entry point produces.
/// Absent fields are elided from the wire form.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Payload {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_line: Option<String>,
}

impl Payload {
    pub fn success(message: impl Into<String>) -> Payload {
        Payload {
            success: true,
            message: Some(message.into()),
            ..Default::default()
        }
    }

    pub fn with_data(data: Value) -> Payload {
        Payload {
            success: true,
            data: Some(data),
            ..Default::default()
        }
    }

    pub fn failure(err: &HuskError) -> Payload {
        Payload {
            success: false,
            error: Some(err.to_string()),
            details: Some(err.kind().to_string()),
            ..Default::default()
        }
    }
}

impl From<HuskError> for Payload {
    fn from(err: HuskError) -> Payload {
        Payload::failure(&err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_fields_are_elided() {
        let json = serde_json::to_string(&Payload::success("VM started")).unwrap();
        assert_eq!(json, r#"{"success":true,"message":"VM started"}"#);
    }

    #[test]
    fn failure_carries_kind_in_details() {
        let payload = Payload::failure(&HuskError::Validation("no disk path given".into()));
        assert!(!payload.success);
        assert_eq!(payload.details.as_deref(), Some("validation"));
        assert_eq!(payload.error.as_deref(), Some("no disk path given"));
    }
}
