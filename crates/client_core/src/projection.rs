use std::collections::BTreeMap;

use shared::domain::{Step, StepStatus};

use crate::collection::StepCollection;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseGroup {
    pub major_version: u32,
    pub phase: String,
    pub steps: Vec<Step>,
}

impl PhaseGroup {
    pub fn status_counts(&self) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for step in &self.steps {
            counts.record(step.status);
        }
        counts
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusCounts {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub failed: usize,
    pub skipped: usize,
    terminal: usize,
}

impl StatusCounts {
    fn record(&mut self, status: StepStatus) {
        if status.is_terminal() {
            self.terminal += 1;
        }
        match status {
            StepStatus::Pending => self.pending += 1,
            StepStatus::InProgress => self.in_progress += 1,
            StepStatus::Completed => self.completed += 1,
            StepStatus::Failed => self.failed += 1,
            StepStatus::Skipped => self.skipped += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.pending + self.in_progress + self.completed + self.failed + self.skipped
    }

    pub fn finished(&self) -> usize {
        self.terminal
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepView {
    Empty,
    Phases {
        groups: Vec<PhaseGroup>,
        active: Option<String>,
    },
}

impl StepView {
    pub fn groups(&self) -> &[PhaseGroup] {
        match self {
            StepView::Empty => &[],
            StepView::Phases { groups, .. } => groups,
        }
    }

    pub fn active(&self) -> Option<&str> {
        match self {
            StepView::Empty => None,
            StepView::Phases { active, .. } => active.as_deref(),
        }
    }

    pub fn is_active(&self, task_id: &str) -> bool {
        self.active() == Some(task_id)
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, StepView::Empty)
    }

    pub fn step_count(&self) -> usize {
        self.groups().iter().map(|group| group.steps.len()).sum()
    }
}

pub fn project(collection: &StepCollection) -> StepView {
    if collection.is_empty() {
        return StepView::Empty;
    }

    let mut ordered: Vec<&Step> = collection.iter().collect();
    ordered.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    let active = ordered
        .iter()
        .find(|step| step.is_in_progress())
        .map(|step| step.task_id.clone());

    let mut by_major: BTreeMap<u32, Vec<Step>> = BTreeMap::new();
    for step in ordered {
        by_major
            .entry(step.major_version)
            .or_default()
            .push(step.clone());
    }

    let groups = by_major
        .into_iter()
        .map(|(major_version, steps)| PhaseGroup {
            major_version,
            phase: steps
                .first()
                .map(|step| step.phase.clone())
                .unwrap_or_default(),
            steps,
        })
        .collect();

    StepView::Phases { groups, active }
}
