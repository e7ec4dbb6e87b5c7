// * Application wiring
// * Builds every component from Settings once, then hands control to the orchestrator.

use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::config::Settings;
use crate::engine::browser::BrowserPageSource;
use crate::engine::page_source::{PageSource, StaticPageSource};
use crate::generation::{resolve_style_examples, GenerationClient, PromptBuilder, ProviderSpec};
use crate::network::HttpClient;
use crate::pipeline::{DiscoveryStage, EventSink, Orchestrator, PipelineError, PipelineEvent, RunOutcome};

/// Where the page comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceChoice {
    /// Saved markup plus the URL it was saved from
    Snapshot { path: PathBuf, url: String },
    /// DevTools websocket of an already running, signed-in Chrome
    Cdp(String),
    /// Launch Chrome on a persistent profile
    Launch(PathBuf),
}

pub async fn open_source(choice: &SourceChoice, settings: &Settings) -> Result<Box<dyn PageSource>, PipelineError> {
    let settle = Duration::from_millis(settings.pipeline.settle_delay_ms);
    let detail = Duration::from_millis(settings.pipeline.detail_timeout_ms);
    let paste = Duration::from_millis(settings.pipeline.paste_timeout_ms);
    let source: Box<dyn PageSource> = match choice {
        SourceChoice::Snapshot { path, url } => Box::new(StaticPageSource::from_file(path, url.clone())?),
        SourceChoice::Cdp(ws_url) => Box::new(
            BrowserPageSource::connect(ws_url, settle)
                .await?
                .with_tab_timeouts(detail, paste),
        ),
        SourceChoice::Launch(dir) => Box::new(
            BrowserPageSource::launch(dir, settle)
                .await?
                .with_tab_timeouts(detail, paste),
        ),
    };
    Ok(source)
}

/// Fails fast on a missing or placeholder credential, leaving an `Aborted` status for the reporter.
/// Call before opening a page source.
pub fn ensure_credentials(settings: &Settings, sink: &dyn EventSink) -> Result<(), PipelineError> {
    settings.validate_credentials().map_err(|e| {
        let err = PipelineError::FatalPrecondition(e);
        sink.emit(PipelineEvent::Aborted { reason: err.to_string() });
        err
    })
}

/// Full pipeline. The credential is checked before any page or network access.
pub async fn run(settings: &Settings, source: &dyn PageSource, sink: &dyn EventSink) -> Result<RunOutcome, PipelineError> {
    ensure_credentials(settings, sink)?;

    let (mut orchestrator, client) = match build(settings) {
        Ok(parts) => parts,
        Err(e) => {
            sink.emit(PipelineEvent::Aborted { reason: e.to_string() });
            return Err(e);
        }
    };

    info!(
        provider = client.spec().name(),
        endpoints = client.spec().endpoints().len(),
        "Pipeline ready"
    );
    orchestrator.run(source, &client, sink).await
}

/// Discovery and filtering only. Needs no credential.
pub async fn scan(settings: &Settings, source: &dyn PageSource, sink: &dyn EventSink) -> Result<DiscoveryStage, PipelineError> {
    let mut orchestrator = match Orchestrator::from_rules(&settings.rules, PromptBuilder::default(), (&settings.pipeline).into()) {
        Ok(o) => o,
        Err(e) => {
            sink.emit(PipelineEvent::Aborted { reason: e.to_string() });
            return Err(e);
        }
    };
    orchestrator.scan(source, sink).await
}

fn build(settings: &Settings) -> Result<(Orchestrator, GenerationClient), PipelineError> {
    let spec = ProviderSpec::from_settings(&settings.provider)?;
    let http = HttpClient::new(settings.generation.request_timeout())?;
    let client = GenerationClient::new(http, spec, settings.api_key.clone(), (&settings.generation).into());

    let prompts = PromptBuilder::new(resolve_style_examples(settings.style.samples_dir.as_deref()));
    let orchestrator = Orchestrator::from_rules(&settings.rules, prompts, (&settings.pipeline).into())?;
    Ok((orchestrator, client))
}
