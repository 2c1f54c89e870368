use shared::protocol::ServerMessage;

use crate::collection::StepCollection;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    Replaced { count: usize },
    Inserted,
    Updated,
    Removed,
    Unchanged,
}

pub fn reconcile(collection: StepCollection, message: ServerMessage) -> StepCollection {
    reconcile_with_outcome(collection, message).0
}

pub fn reconcile_with_outcome(
    mut collection: StepCollection,
    message: ServerMessage,
) -> (StepCollection, Reconciled) {
    match message {
        ServerMessage::Init { steps } => {
            let next = StepCollection::from_steps(steps);
            let count = next.len();
            (next, Reconciled::Replaced { count })
        }
        ServerMessage::Update { step } => {
            let outcome = match collection.insert(step) {
                Some(_) => Reconciled::Updated,
                None => Reconciled::Inserted,
            };
            (collection, outcome)
        }
        ServerMessage::Remove { task_id, .. } => {
            let outcome = match collection.remove(&task_id) {
                Some(_) => Reconciled::Removed,
                None => Reconciled::Unchanged,
            };
            (collection, outcome)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::{Step, StepStatus};

    fn step(task_id: &str, status: StepStatus) -> Step {
        let (major_version, minor_version) =
            shared::domain::parse_task_versions(task_id).unwrap_or((0, 0));
        Step {
            task_id: task_id.into(),
            project_id: "demo".into(),
            phase: "implement".into(),
            description: format!("step {task_id}"),
            status,
            major_version,
            minor_version,
        }
    }

    fn update(step: Step) -> ServerMessage {
        ServerMessage::Update { step }
    }

    #[test]
    fn init_replaces_instead_of_merging() {
        let prior = StepCollection::from_steps([
            step("01-01", StepStatus::Completed),
            step("01-02", StepStatus::Pending),
        ]);
        let next = reconcile(
            prior,
            ServerMessage::Init {
                steps: vec![step("01-01", StepStatus::InProgress)],
            },
        );
        assert_eq!(next.len(), 1);
        assert_eq!(
            next.get("01-01").map(|s| s.status),
            Some(StepStatus::InProgress)
        );
        assert!(!next.contains("01-02"));
    }

    #[test]
    fn init_with_no_steps_clears_collection() {
        let prior = StepCollection::from_steps([step("01-01", StepStatus::Pending)]);
        let (next, outcome) =
            reconcile_with_outcome(prior, ServerMessage::Init { steps: Vec::new() });
        assert!(next.is_empty());
        assert_eq!(outcome, Reconciled::Replaced { count: 0 });
    }

    #[test]
    fn update_of_known_step_replaces_in_place() {
        let prior = StepCollection::from_steps([
            step("01-01", StepStatus::Pending),
            step("01-02", StepStatus::Pending),
        ]);
        let (next, outcome) =
            reconcile_with_outcome(prior, update(step("01-02", StepStatus::Completed)));
        assert_eq!(outcome, Reconciled::Updated);
        assert_eq!(next.len(), 2);
        assert_eq!(
            next.get("01-02").map(|s| s.status),
            Some(StepStatus::Completed)
        );
    }

    #[test]
    fn update_of_unknown_step_appends() {
        let prior = StepCollection::from_steps([step("01-01", StepStatus::Pending)]);
        let (next, outcome) =
            reconcile_with_outcome(prior, update(step("02-01", StepStatus::Pending)));
        assert_eq!(outcome, Reconciled::Inserted);
        assert_eq!(next.len(), 2);
    }

    #[test]
    fn repeated_update_is_idempotent() {
        let prior = StepCollection::from_steps([step("01-01", StepStatus::Pending)]);
        let message = update(step("01-01", StepStatus::InProgress));

        let once = reconcile(prior.clone(), message.clone());
        let twice = reconcile(reconcile(prior, message.clone()), message);
        assert_eq!(once, twice);
    }

    #[test]
    fn last_update_wins() {
        let next = [
            update(step("01-01", StepStatus::InProgress)),
            update(step("01-01", StepStatus::Failed)),
        ]
        .into_iter()
        .fold(StepCollection::new(), reconcile);
        assert_eq!(next.get("01-01").map(|s| s.status), Some(StepStatus::Failed));
    }

    #[test]
    fn remove_of_unknown_id_is_a_noop() {
        let prior = StepCollection::from_steps([
            step("01-01", StepStatus::Pending),
            step("01-02", StepStatus::Pending),
        ]);
        let (next, outcome) = reconcile_with_outcome(
            prior.clone(),
            ServerMessage::Remove {
                task_id: "09-09".into(),
                project_id: Some("demo".into()),
            },
        );
        assert_eq!(outcome, Reconciled::Unchanged);
        assert_eq!(next, prior);
    }

    #[test]
    fn remove_matches_on_task_id_alone() {
        let prior = StepCollection::from_steps([
            step("01-01", StepStatus::Pending),
            step("01-02", StepStatus::Pending),
        ]);
        let (next, outcome) = reconcile_with_outcome(
            prior,
            ServerMessage::Remove {
                task_id: "01-01".into(),
                project_id: Some("some-other-project".into()),
            },
        );
        assert_eq!(outcome, Reconciled::Removed);
        assert_eq!(next.len(), 1);
        assert!(!next.contains("01-01"));
    }
}
