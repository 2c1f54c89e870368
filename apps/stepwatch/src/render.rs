use std::fmt::Write as _;

use client_core::{ConnectionStatus, StepView};
use shared::domain::{Step, StepStatus};

fn marker(status: StepStatus) -> &'static str {
    match status {
        StepStatus::Pending => "[ ]",
        StepStatus::InProgress => "[~]",
        StepStatus::Completed => "[x]",
        StepStatus::Failed => "[!]",
        StepStatus::Skipped => "[-]",
    }
}

fn render_step(out: &mut String, step: &Step, active: bool) {
    let cursor = if active { ">" } else { " " };
    let _ = write!(
        out,
        "  {cursor} {} {} {}",
        marker(step.status),
        step.task_id,
        step.status.label()
    );
    if !step.description.is_empty() {
        let _ = write!(out, "  {}", step.description);
    }
    out.push('\n');
}

/// Plain-text rendering of the projected steps, one line per step.
pub fn render(status: ConnectionStatus, view: &StepView) -> String {
    let mut out = format!("-- {} --\n", status.label());
    if view.is_empty() {
        out.push_str("  (no steps yet)\n");
        return out;
    }

    for group in view.groups() {
        let counts = group.status_counts();
        let _ = writeln!(
            out,
            "{:02} {} ({}/{} done)",
            group.major_version,
            group.phase,
            counts.finished(),
            counts.total()
        );
        for step in &group.steps {
            render_step(&mut out, step, view.is_active(&step.task_id));
        }
    }
    out
}
