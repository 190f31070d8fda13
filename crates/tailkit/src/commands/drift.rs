//! Drift check: refresh an applied-state snapshot and report differences.
//!
//! Nothing is written back. A non-zero exit signals drift or a failed
//! refresh so the command can gate scripts.

use tabled::Tabled;
use tailkit_core::{AppliedState, DriftEntry, DriftStatus, Severity, Tailnet};

use crate::cli::{DriftArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DriftRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl From<&DriftEntry> for DriftRow {
    fn from(e: &DriftEntry) -> Self {
        let (status, detail) = match &e.status {
            DriftStatus::InSync => ("in sync", String::new()),
            DriftStatus::Drifted { drift } => (
                "drifted",
                drift
                    .changes
                    .iter()
                    .map(|c| c.path.to_string())
                    .collect::<Vec<_>>()
                    .join(", "),
            ),
            DriftStatus::Gone { reason } => ("gone", reason.clone()),
            DriftStatus::Failed { diagnostic } => ("failed", diagnostic.summary.clone()),
        };
        Self {
            kind: e.kind.to_string(),
            id: e.id.clone(),
            status: status.into(),
            detail,
        }
    }
}

fn status_word(e: &DriftEntry) -> &'static str {
    match e.status {
        DriftStatus::InSync => "in_sync",
        DriftStatus::Drifted { .. } => "drifted",
        DriftStatus::Gone { .. } => "gone",
        DriftStatus::Failed { .. } => "failed",
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(tailnet: &Tailnet, args: DriftArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let state: AppliedState = util::read_json_file(&args.state)?;
    let report = tailnet.reconciler().check(&state).await;

    let out = output::render_list(
        global.output,
        &report.entries,
        |e| DriftRow::from(e),
        |e| format!("{}\t{}\t{}", e.kind, e.id, status_word(e)),
    )?;
    output::print_output(&out, global.quiet);

    let diagnostics = report.diagnostics();
    for diag in diagnostics.iter().filter(|d| d.severity == Severity::Error) {
        output::warn(&diag.to_string());
    }

    if diagnostics.is_empty() {
        output::status("No drift detected", global.quiet);
        Ok(())
    } else {
        Err(CliError::Drift {
            count: diagnostics.len(),
        })
    }
}
