use serde::Serialize;

use crate::types::{ActorOutcome, ActorReport};

/// Counts of actor outcomes for one run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub actors: usize,
    pub posted: usize,
    pub baselines: usize,
    pub dry_runs: usize,
    pub aborted: usize,
}

impl RunSummary {
    pub fn from_reports(reports: &[ActorReport]) -> Self {
        let mut summary = Self {
            actors: reports.len(),
            ..Self::default()
        };
        for report in reports {
            match report.outcome {
                ActorOutcome::Posted { .. } => summary.posted += 1,
                ActorOutcome::Baseline { .. } => summary.baselines += 1,
                ActorOutcome::DryRun { .. } => summary.dry_runs += 1,
                ActorOutcome::Aborted { .. } => summary.aborted += 1,
            }
        }
        summary
    }
}

/// Emit an actor report as a single JSON line to stdout.
pub fn report_actor(report: &ActorReport) {
    if let Ok(json) = serde_json::to_string(report) {
        println!("{json}");
    }
}
