// * Progress Reporter
// * Sole owner of presentation state. Fed by events; holds no pipeline logic.

use std::path::PathBuf;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::pipeline::events::{PipelineEvent, RunSummary};
use crate::report::html::render_html;

pub const INITIAL_STATUS: &str = "Starting...";
const FAILURE_MARKER: &str = "[generation failed]";

/// What the operator sees for one processed record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordBlock {
    pub index: usize,
    pub title: String,
    pub group: String,
    pub reference: String,
    pub text: Option<String>,
    pub provider: Option<String>,
    /// `(ok, detail)` of the paste attempt, when one was made
    pub paste: Option<(bool, String)>,
}

#[derive(Debug, Clone)]
pub struct Reporter {
    status: String,
    log: Vec<String>,
    blocks: Vec<RecordBlock>,
    summary: Option<RunSummary>,
    finished: bool,
    dismissed: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Reporter {
    pub fn new() -> Self {
        Self {
            status: INITIAL_STATUS.to_string(),
            log: Vec::new(),
            blocks: Vec::new(),
            summary: None,
            finished: false,
            dismissed: false,
        }
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    /// Every status line so far, oldest first
    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn blocks(&self) -> &[RecordBlock] {
        &self.blocks
    }

    pub fn summary(&self) -> Option<RunSummary> {
        self.summary
    }

    /// True once a terminal event (summary, none-found, redirect, abort) arrived
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissed
    }

    /// Hides the overlay. Has no effect on the run.
    pub fn dismiss(&mut self) {
        self.dismissed = true;
    }

    fn set_status(&mut self, line: String) {
        self.log.push(line.clone());
        self.status = line;
    }

    /// Folds one event into the view. Append-only.
    pub fn apply(&mut self, event: &PipelineEvent) {
        match event {
            PipelineEvent::Status(line) => self.set_status(line.clone()),
            PipelineEvent::Redirecting { to, .. } => {
                self.set_status(format!("Not on a to-do list. Opening {to}, run again once it loads."));
                self.finished = true;
            }
            PipelineEvent::Excluded { title, reason } => {
                self.log.push(format!("Skipped \"{title}\" ({reason})"));
            }
            PipelineEvent::Discovered { found, eligible, .. } => {
                self.set_status(format!("Found {found} item(s), {eligible} to draft."));
            }
            PipelineEvent::NoneFound { hint } => {
                self.set_status(hint.clone());
                self.finished = true;
            }
            PipelineEvent::RecordStarted { index, total, title } => {
                self.set_status(format!("Drafting {index} of {total}: {title}"));
            }
            PipelineEvent::RecordOutcome { index, total, outcome } => {
                let record = outcome.record();
                self.blocks.push(RecordBlock {
                    index: *index,
                    title: record.title().to_string(),
                    group: record.group().to_string(),
                    reference: record.reference().to_string(),
                    text: outcome.text().map(str::to_string),
                    provider: outcome.provider_used().map(str::to_string),
                    paste: None,
                });
                let verdict = if outcome.failed() { "failed" } else { "done" };
                self.log.push(format!("{index}/{total} {verdict}: {}", record.title()));
            }
            PipelineEvent::PasteResult { index, ok, detail, .. } => {
                if let Some(block) = self.blocks.iter_mut().rev().find(|b| b.index == *index) {
                    block.paste = Some((*ok, detail.clone()));
                }
                let verdict = if *ok { "pasted" } else { "paste failed" };
                self.log.push(format!("{index}: {verdict} ({detail})"));
            }
            PipelineEvent::Summary(summary) => {
                self.summary = Some(*summary);
                self.set_status(format!(
                    "Done. {} processed, {} drafted, {} failed.",
                    summary.processed, summary.succeeded, summary.failed
                ));
                self.finished = true;
            }
            PipelineEvent::Aborted { reason } => {
                self.set_status(format!("Stopped: {reason}"));
                self.finished = true;
            }
        }
    }

    /// Plain terminal view: status line plus one block per record
    pub fn render_text(&self) -> String {
        let mut out = format!("Status: {}\n", self.status);
        for block in &self.blocks {
            out.push_str(&format!("\n[{}] {}", block.index, block.title));
            if !block.group.is_empty() {
                out.push_str(&format!(" ({})", block.group));
            }
            out.push('\n');
            out.push_str(&format!("Link: {}\n", block.reference));
            match &block.text {
                Some(text) => out.push_str(&format!("{text}\n")),
                None => out.push_str(&format!("{FAILURE_MARKER}\n")),
            }
        }
        out
    }

    /// Final per-record listing printed after the run
    pub fn delivery_summary(&self) -> String {
        let mut out = String::from("\n=== Delivery Summary ===\n");
        if self.blocks.is_empty() {
            out.push_str("No items were processed in this run.\n");
        }
        for block in &self.blocks {
            out.push_str(&format!("{}. {}\n", block.index, block.title));
            out.push_str(&format!("   Item: {}\n", block.reference));
            let draft = match (&block.text, &block.provider) {
                (Some(text), Some(provider)) => format!("{} chars via {}", text.chars().count(), provider),
                (Some(text), None) => format!("{} chars", text.chars().count()),
                _ => "failed".to_string(),
            };
            out.push_str(&format!("   Draft: {draft}\n"));
            let paste = match &block.paste {
                Some((true, _)) => "pasted".to_string(),
                Some((false, detail)) => format!("failed ({detail})"),
                None => "not attempted".to_string(),
            };
            out.push_str(&format!("   Paste: {paste}\n"));
        }
        out.push_str(&format!("Status: {}\n", self.status));
        out.push_str("========================\n");
        out
    }

    pub fn render_html(&self) -> String {
        render_html(self)
    }
}

/// Runs the reporter on its own task so emitting never waits on rendering.
/// Returns the final view once every sender is gone.
pub fn spawn_reporter(
    mut rx: mpsc::UnboundedReceiver<PipelineEvent>,
    html_path: Option<PathBuf>,
) -> JoinHandle<Reporter> {
    tokio::spawn(async move {
        let mut reporter = Reporter::new();
        write_overlay(&reporter, html_path.as_ref()).await;

        while let Some(event) = rx.recv().await {
            let before = reporter.log().len();
            reporter.apply(&event);
            for line in &reporter.log()[before..] {
                info!(target: "study_flow::report", line = %line, "Progress");
                eprintln!("{line}");
            }
            write_overlay(&reporter, html_path.as_ref()).await;
        }

        debug!("Reporter channel closed");
        reporter
    })
}

async fn write_overlay(reporter: &Reporter, path: Option<&PathBuf>) {
    let Some(path) = path else {
        return;
    };
    if let Err(e) = tokio::fs::write(path, reporter.render_html()).await {
        warn!(path = %path.display(), error = %e, "Failed to write report overlay");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::CandidateRecord;
    use crate::generation::{GenerationOutcome, Generated};
    use std::sync::Arc;

    fn outcome(title: &str, text: Option<&str>) -> GenerationOutcome {
        let record = Arc::new(CandidateRecord::new(title, "Biology", format!("https://x.test/{title}"), "").unwrap());
        GenerationOutcome::from_generated(
            record,
            text.map(|t| Generated {
                text: t.into(),
                endpoint: "m1".into(),
            }),
        )
    }

    #[test]
    fn test_renders_before_any_event() {
        let reporter = Reporter::new();
        assert_eq!(reporter.status(), INITIAL_STATUS);
        assert!(reporter.render_text().starts_with("Status: Starting..."));
        assert!(reporter.render_html().contains("Starting..."));
    }

    #[test]
    fn test_outcomes_become_blocks_in_order() {
        let mut reporter = Reporter::new();
        reporter.apply(&PipelineEvent::RecordOutcome {
            index: 1,
            total: 2,
            outcome: outcome("first", Some("draft one")),
        });
        reporter.apply(&PipelineEvent::RecordOutcome {
            index: 2,
            total: 2,
            outcome: outcome("second", None),
        });
        let titles: Vec<&str> = reporter.blocks().iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["first", "second"]);
        assert!(reporter.render_text().contains(FAILURE_MARKER));
        assert!(reporter.delivery_summary().contains("Draft: 9 chars via m1"));
    }

    #[test]
    fn test_dismiss_is_cosmetic() {
        let mut reporter = Reporter::new();
        reporter.dismiss();
        reporter.apply(&PipelineEvent::Status("still collecting".into()));
        assert!(reporter.is_dismissed());
        assert_eq!(reporter.status(), "still collecting");
    }

    #[test]
    fn test_paste_result_attaches_to_block() {
        let mut reporter = Reporter::new();
        reporter.apply(&PipelineEvent::RecordOutcome {
            index: 1,
            total: 1,
            outcome: outcome("only", Some("x")),
        });
        reporter.apply(&PipelineEvent::PasteResult {
            index: 1,
            reference: "https://x.test/only".into(),
            ok: false,
            detail: "no editor".into(),
        });
        assert_eq!(reporter.blocks()[0].paste, Some((false, "no editor".to_string())));
        assert!(reporter.delivery_summary().contains("Paste: failed (no editor)"));
    }

    #[tokio::test]
    async fn test_spawned_reporter_returns_final_view() {
        let (tx, rx) = mpsc::unbounded_channel();
        let dir = tempfile::tempdir().unwrap();
        let html = dir.path().join("report.html");
        let handle = spawn_reporter(rx, Some(html.clone()));

        tx.send(PipelineEvent::Aborted { reason: "missing key".into() }).unwrap();
        drop(tx);

        let reporter = handle.await.unwrap();
        assert!(reporter.is_finished());
        assert_eq!(reporter.status(), "Stopped: missing key");
        assert!(std::fs::read_to_string(html).unwrap().contains("Stopped: missing key"));
    }
}
