use serde::{Deserialize, Serialize};

use crate::{domain::Step, error::ProtocolError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Init {
        steps: Vec<Step>,
    },
    Update {
        step: Step,
    },
    Remove {
        #[serde(rename = "taskId")]
        task_id: String,
        #[serde(
            rename = "projectId",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        project_id: Option<String>,
    },
}

impl ServerMessage {
    pub fn from_json(raw: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn from_slice(raw: &[u8]) -> Result<Self, ProtocolError> {
        let text = std::str::from_utf8(raw).map_err(|_| ProtocolError::NotUtf8)?;
        Self::from_json(text)
    }

    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Init { .. } => "init",
            ServerMessage::Update { .. } => "update",
            ServerMessage::Remove { .. } => "remove",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StepStatus;

    fn step_json(task_id: &str, status: &str) -> serde_json::Value {
        serde_json::json!({
            "taskId": task_id,
            "projectId": "demo",
            "phase": "research",
            "description": "Analyze existing codebase structure",
            "status": status,
            "majorVersion": 1,
            "minorVersion": 1
        })
    }

    #[test]
    fn decodes_init_message() {
        let raw = serde_json::json!({
            "type": "init",
            "steps": [step_json("01-01", "completed"), step_json("01-02", "pending")]
        })
        .to_string();

        let ServerMessage::Init { steps } = ServerMessage::from_json(&raw).expect("init") else {
            panic!("expected init");
        };
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].status, StepStatus::Completed);
    }

    #[test]
    fn decodes_update_message() {
        let raw = serde_json::json!({ "type": "update", "step": step_json("01-01", "in_progress") })
            .to_string();
        let message = ServerMessage::from_json(&raw).expect("update");
        assert_eq!(message.kind(), "update");
        let ServerMessage::Update { step } = message else {
            panic!("expected update");
        };
        assert_eq!(step.status, StepStatus::InProgress);
    }

    #[test]
    fn decodes_remove_with_and_without_project() {
        let with_project =
            ServerMessage::from_json(r#"{"type":"remove","taskId":"01-02","projectId":"demo"}"#)
                .expect("remove");
        assert_eq!(
            with_project,
            ServerMessage::Remove {
                task_id: "01-02".into(),
                project_id: Some("demo".into()),
            }
        );

        let bare = ServerMessage::from_json(r#"{"type":"remove","taskId":"01-02"}"#)
            .expect("remove without project");
        assert_eq!(
            bare,
            ServerMessage::Remove {
                task_id: "01-02".into(),
                project_id: None,
            }
        );
    }

    #[test]
    fn rejects_unknown_type_and_garbage() {
        assert!(matches!(
            ServerMessage::from_json(r#"{"type":"rename","taskId":"01-02"}"#),
            Err(ProtocolError::Malformed(_))
        ));
        assert!(ServerMessage::from_json("not json").is_err());
        assert!(ServerMessage::from_json(r#"{"steps":[]}"#).is_err());
        assert!(ServerMessage::from_json(r#"{"type":"update"}"#).is_err());
        assert!(matches!(
            ServerMessage::from_slice(&[0xff, 0xfe]),
            Err(ProtocolError::NotUtf8)
        ));
    }

    #[test]
    fn encoded_messages_use_the_producer_shape() {
        let remove = ServerMessage::Remove {
            task_id: "02-01".into(),
            project_id: None,
        };
        let value: serde_json::Value =
            serde_json::from_str(&remove.to_json().expect("json")).expect("value");
        assert_eq!(value, serde_json::json!({ "type": "remove", "taskId": "02-01" }));
    }

    #[test]
    fn preview_truncates_long_frames() {
        let long = "x".repeat(500);
        let preview = ProtocolError::preview(&long);
        assert!(preview.chars().count() <= 121);
        assert_eq!(ProtocolError::preview("short"), "short");
    }
}
