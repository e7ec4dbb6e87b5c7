// * Pipeline Orchestrator
// * Discovery -> filtering -> one generation at a time, in discovery order, with a fixed
// * pause between calls. Talks to the operator only through the event sink.

use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::{PipelineSettings, RuleSettings};
use crate::engine::page_source::{PageSource, SourceError};
use crate::extractor::{CandidateRecord, Discovery, RecordExtractor};
use crate::generation::{clean_generated_text, GenerationOutcome, PromptBuilder, TextGenerator};
use crate::pipeline::errors::PipelineError;
use crate::pipeline::events::{EventSink, PipelineEvent, RunSummary};
use crate::pipeline::pacing::{DelayKind, Pacer, TokioPacer};
use crate::rules::ClassificationRules;

const NONE_FOUND_HINT: &str =
    "No eligible items on this page. Open the to-do list (Assigned tab) and run again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Discovering,
    Redirecting,
    Filtering,
    Generating { index: usize, total: usize },
    Summarizing,
    Done,
}

/// Timing and optional steps of a run
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub settle_delay: Duration,
    pub pacing_interval: Duration,
    pub snapshot_timeout: Duration,
    pub detail_timeout: Duration,
    pub paste_timeout: Duration,
    pub listing_url: String,
    pub enrich_details: bool,
    pub paste_drafts: bool,
}

impl From<&PipelineSettings> for OrchestratorConfig {
    fn from(settings: &PipelineSettings) -> Self {
        Self {
            settle_delay: Duration::from_millis(settings.settle_delay_ms),
            pacing_interval: Duration::from_millis(settings.pacing_interval_ms),
            snapshot_timeout: Duration::from_millis(settings.snapshot_timeout_ms),
            detail_timeout: Duration::from_millis(settings.detail_timeout_ms),
            paste_timeout: Duration::from_millis(settings.paste_timeout_ms),
            listing_url: settings.listing_url.clone(),
            enrich_details: settings.enrich_details,
            paste_drafts: settings.paste_drafts,
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from(&PipelineSettings::default())
    }
}

/// Records that survived filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibleRecords {
    pub records: Vec<CandidateRecord>,
    pub found: usize,
    pub excluded: usize,
}

/// Result of discovery + filtering
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryStage {
    /// Operator was sent to the listing view; nothing else happens this invocation
    Redirected { location: String },
    Eligible(EligibleRecords),
}

/// How a run ended when nothing aborted it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Redirected { location: String },
    NoneFound,
    Completed(RunSummary),
}

pub struct Orchestrator {
    extractor: RecordExtractor,
    rules: ClassificationRules,
    prompts: PromptBuilder,
    pacer: Arc<dyn Pacer>,
    config: OrchestratorConfig,
    state: RunState,
}

impl Orchestrator {
    pub fn new(
        extractor: RecordExtractor,
        rules: ClassificationRules,
        prompts: PromptBuilder,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            extractor,
            rules,
            prompts,
            pacer: Arc::new(TokioPacer),
            config,
            state: RunState::Idle,
        }
    }

    /// Default extractor and rules built from rule settings
    pub fn from_rules(
        rules: &RuleSettings,
        prompts: PromptBuilder,
        config: OrchestratorConfig,
    ) -> Result<Self, PipelineError> {
        Ok(Self::new(
            RecordExtractor::new(rules)?,
            ClassificationRules::new(rules)?,
            prompts,
            config,
        ))
    }

    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        info!(from = ?self.state, to = ?next, "Pipeline state");
        self.state = next;
    }

    /// Full run. Any abort is also reported to the sink as a status line.
    pub async fn run(
        &mut self,
        source: &dyn PageSource,
        generator: &dyn TextGenerator,
        sink: &dyn EventSink,
    ) -> Result<RunOutcome, PipelineError> {
        let result = self.run_inner(source, generator, sink).await;
        if let Err(e) = &result {
            warn!(error = %e, "Run aborted");
            sink.emit(PipelineEvent::Aborted { reason: e.to_string() });
            self.transition(RunState::Done);
        }
        result
    }

    /// Discovery and filtering only; never calls a generator
    pub async fn scan(
        &mut self,
        source: &dyn PageSource,
        sink: &dyn EventSink,
    ) -> Result<DiscoveryStage, PipelineError> {
        let result = self.discover(source, sink).await;
        match &result {
            Ok(DiscoveryStage::Eligible(eligible)) if eligible.records.is_empty() => {
                sink.emit(PipelineEvent::NoneFound {
                    hint: NONE_FOUND_HINT.to_string(),
                });
            }
            Err(e) => sink.emit(PipelineEvent::Aborted { reason: e.to_string() }),
            _ => {}
        }
        self.transition(RunState::Done);
        result
    }

    async fn run_inner(
        &mut self,
        source: &dyn PageSource,
        generator: &dyn TextGenerator,
        sink: &dyn EventSink,
    ) -> Result<RunOutcome, PipelineError> {
        let eligible = match self.discover(source, sink).await? {
            DiscoveryStage::Redirected { location } => return Ok(RunOutcome::Redirected { location }),
            DiscoveryStage::Eligible(eligible) => eligible,
        };

        if eligible.records.is_empty() {
            sink.emit(PipelineEvent::NoneFound {
                hint: NONE_FOUND_HINT.to_string(),
            });
            self.transition(RunState::Done);
            return Ok(RunOutcome::NoneFound);
        }

        let mut summary = RunSummary {
            excluded: eligible.excluded,
            ..RunSummary::default()
        };
        let total = eligible.records.len();

        for (i, record) in eligible.records.into_iter().enumerate() {
            let index = i + 1;
            self.transition(RunState::Generating { index, total });
            sink.emit(PipelineEvent::RecordStarted {
                index,
                total,
                title: record.title().to_string(),
            });

            let record = Arc::new(record);
            let detail = self.fetch_detail(source, &record).await;
            let prompt = self.prompts.build(&record, detail.as_deref());

            let generated = generator.generate(&prompt).await.map(|mut g| {
                g.text = clean_generated_text(&g.text);
                g
            });
            let outcome = GenerationOutcome::from_generated(record.clone(), generated);

            summary.processed += 1;
            if outcome.failed() {
                summary.failed += 1;
                warn!(index, total, reference = record.reference(), "Generation failed for record");
            } else {
                summary.succeeded += 1;
            }

            let paste_text = outcome.text().map(str::to_string);
            sink.emit(PipelineEvent::RecordOutcome { index, total, outcome });

            if self.config.paste_drafts {
                if let Some(text) = paste_text {
                    if self.paste(source, sink, index, &record, &text).await {
                        summary.pasted += 1;
                    }
                }
            }

            if index < total {
                self.pacer.pause(DelayKind::Pacing, self.config.pacing_interval).await;
            }
        }

        self.transition(RunState::Summarizing);
        info!(
            processed = summary.processed,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Run finished"
        );
        sink.emit(PipelineEvent::Summary(summary));
        self.transition(RunState::Done);
        Ok(RunOutcome::Completed(summary))
    }

    async fn discover(
        &mut self,
        source: &dyn PageSource,
        sink: &dyn EventSink,
    ) -> Result<DiscoveryStage, PipelineError> {
        self.transition(RunState::Discovering);
        sink.emit(PipelineEvent::Status("Scanning page for pending items...".to_string()));

        self.pacer.pause(DelayKind::Settle, self.config.settle_delay).await;

        let snapshot = tokio::time::timeout(self.config.snapshot_timeout, source.snapshot())
            .await
            .map_err(|_| SourceError::Timeout(self.config.snapshot_timeout.as_millis() as u64))??;

        let (records, tier) = match self.extractor.discover(&snapshot) {
            Discovery::NotReady { location } => {
                self.transition(RunState::Redirecting);
                sink.emit(PipelineEvent::Redirecting {
                    from: location.clone(),
                    to: self.config.listing_url.clone(),
                });
                // * Fire-and-forget: the operator re-invokes after the page loads
                match tokio::time::timeout(self.config.snapshot_timeout, source.navigate(&self.config.listing_url)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => warn!(error = %e, "Redirect to listing view failed"),
                    Err(_) => warn!("Redirect to listing view timed out"),
                }
                return Ok(DiscoveryStage::Redirected { location });
            }
            Discovery::Records { records, tier } => (records, tier),
        };

        self.transition(RunState::Filtering);
        let found = records.len();
        let mut eligible = Vec::with_capacity(found);
        for record in records {
            match self.rules.evaluate(record.title(), record.group()) {
                Some(reason) => {
                    info!(title = record.title(), %reason, "Excluded");
                    sink.emit(PipelineEvent::Excluded {
                        title: record.title().to_string(),
                        reason: reason.to_string(),
                    });
                }
                None => eligible.push(record),
            }
        }

        let excluded = found - eligible.len();
        sink.emit(PipelineEvent::Discovered {
            found,
            eligible: eligible.len(),
            tier,
        });

        Ok(DiscoveryStage::Eligible(EligibleRecords {
            records: eligible,
            found,
            excluded,
        }))
    }

    // * Bounded and best-effort: any failure leaves the prompt on the card text
    async fn fetch_detail(&self, source: &dyn PageSource, record: &CandidateRecord) -> Option<String> {
        if !self.config.enrich_details {
            return None;
        }
        match tokio::time::timeout(self.config.detail_timeout, source.detail_text(record.reference())).await {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(reference = record.reference(), error = %e, "Detail fetch failed");
                None
            }
            Err(_) => {
                warn!(reference = record.reference(), "Detail fetch timed out");
                None
            }
        }
    }

    // * One shot, never retried; the result is reported either way
    async fn paste(
        &self,
        source: &dyn PageSource,
        sink: &dyn EventSink,
        index: usize,
        record: &CandidateRecord,
        text: &str,
    ) -> bool {
        let result = tokio::time::timeout(self.config.paste_timeout, source.paste(record.reference(), text))
            .await
            .unwrap_or(Err(SourceError::Timeout(self.config.paste_timeout.as_millis() as u64)));

        let (ok, detail) = match result {
            Ok(()) => (true, "Pasted into answer field".to_string()),
            Err(e) => {
                warn!(index, reference = record.reference(), error = %e, "Paste failed");
                (false, e.to_string())
            }
        };
        sink.emit(PipelineEvent::PasteResult {
            index,
            reference: record.reference().to_string(),
            ok,
            detail,
        });
        ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::page_source::{PageSnapshot, StaticPageSource};
    use crate::generation::{GenerateFuture, Generated};
    use crate::pipeline::events::MemorySink;
    use crate::pipeline::pacing::RecordingPacer;

    struct Echo;

    impl TextGenerator for Echo {
        fn generate<'a>(&'a self, _prompt: &'a str) -> GenerateFuture<'a> {
            Box::pin(async {
                Some(Generated {
                    text: "Answer; with  semicolon".into(),
                    endpoint: "echo".into(),
                })
            })
        }
    }

    fn orchestrator(pacer: Arc<RecordingPacer>) -> Orchestrator {
        Orchestrator::from_rules(&RuleSettings::default(), PromptBuilder::default(), OrchestratorConfig::default())
            .unwrap()
            .with_pacer(pacer)
    }

    #[tokio::test]
    async fn test_state_ends_done_and_text_is_cleaned() {
        let source = StaticPageSource::new(PageSnapshot::new(
            "https://classroom.google.com/u/0/a/not-turned-in/all",
            r#"<ul><li><a href="/c/A/a/B/details">Essay</a><div>English 10</div></li></ul>"#,
        ));
        let sink = MemorySink::new();
        let mut orch = orchestrator(Arc::new(RecordingPacer::new()));
        assert_eq!(orch.state(), RunState::Idle);

        let outcome = orch.run(&source, &Echo, &sink).await.unwrap();
        assert!(matches!(outcome, RunOutcome::Completed(s) if s.processed == 1 && s.succeeded == 1));
        assert_eq!(orch.state(), RunState::Done);

        let text = sink.events().into_iter().find_map(|e| match e {
            PipelineEvent::RecordOutcome { outcome, .. } => outcome.text().map(str::to_string),
            _ => None,
        });
        assert_eq!(text.as_deref(), Some("Answer, with semicolon"));
    }

    #[tokio::test]
    async fn test_snapshot_timeout_aborts_with_status() {
        struct Stuck;
        impl PageSource for Stuck {
            fn snapshot(&self) -> crate::engine::page_source::SourceFuture<'_, PageSnapshot> {
                Box::pin(std::future::pending())
            }
            fn navigate<'a>(&'a self, _url: &'a str) -> crate::engine::page_source::SourceFuture<'a, ()> {
                Box::pin(async { Ok(()) })
            }
        }

        let config = OrchestratorConfig {
            snapshot_timeout: Duration::from_millis(20),
            ..OrchestratorConfig::default()
        };
        let mut orch = Orchestrator::from_rules(&RuleSettings::default(), PromptBuilder::default(), config)
            .unwrap()
            .with_pacer(Arc::new(RecordingPacer::new()));
        let sink = MemorySink::new();

        let err = orch.run(&Stuck, &Echo, &sink).await.unwrap_err();
        assert!(matches!(err, PipelineError::Source(SourceError::Timeout(20))));
        assert!(matches!(sink.events().last(), Some(PipelineEvent::Aborted { .. })));
    }
}
