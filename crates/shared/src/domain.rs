use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Skipped,
}

impl StepStatus {
    pub fn label(&self) -> &'static str {
        match self {
            StepStatus::Pending => "pending",
            StepStatus::InProgress => "in_progress",
            StepStatus::Completed => "completed",
            StepStatus::Failed => "failed",
            StepStatus::Skipped => "skipped",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            StepStatus::Completed | StepStatus::Failed | StepStatus::Skipped
        )
    }
}

/// One workflow unit as emitted by the producer. Missing versions are
/// recovered from a `MM-NN` task identifier at decode time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StepWire")]
pub struct Step {
    pub task_id: String,
    pub project_id: String,
    pub phase: String,
    pub description: String,
    pub status: StepStatus,
    pub major_version: u32,
    pub minor_version: u32,
}

impl Step {
    pub fn sort_key(&self) -> (u32, u32, &str) {
        (self.major_version, self.minor_version, self.task_id.as_str())
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == StepStatus::InProgress
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StepWire {
    task_id: String,
    project_id: String,
    phase: String,
    #[serde(default)]
    description: String,
    status: StepStatus,
    #[serde(default)]
    major_version: u32,
    #[serde(default)]
    minor_version: u32,
}

impl From<StepWire> for Step {
    fn from(wire: StepWire) -> Self {
        let (major_version, minor_version) = if wire.major_version == 0 && wire.minor_version == 0
        {
            parse_task_versions(&wire.task_id).unwrap_or((0, 0))
        } else {
            (wire.major_version, wire.minor_version)
        };
        Self {
            task_id: wire.task_id,
            project_id: wire.project_id,
            phase: wire.phase,
            description: wire.description,
            status: wire.status,
            major_version,
            minor_version,
        }
    }
}

pub fn parse_task_versions(task_id: &str) -> Option<(u32, u32)> {
    let (major, minor) = task_id.split_once('-')?;
    if minor.contains('-') {
        return None;
    }
    Some((major.parse().ok()?, minor.parse().ok()?))
}
