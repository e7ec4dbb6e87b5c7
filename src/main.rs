use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use study_flow::app::{self, SourceChoice};
use study_flow::config::Settings;
use study_flow::ops::{init_with_format, LogFormat};
use study_flow::pipeline::{ChannelSink, DiscoveryStage};
use study_flow::report::spawn_reporter;

#[derive(Parser, Debug)]
#[command(name = "study-flow", version, about = "Drafts responses for pending Classroom items")]
struct Cli {
    /// TOML settings file
    #[arg(long, global = true, env = "STUDYFLOW_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Json)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Discover, filter and draft every pending item
    Run {
        #[command(flatten)]
        source: SourceArgs,

        /// Write the HTML overlay here while the run progresses
        #[arg(long)]
        report: Option<PathBuf>,

        /// Paste each draft into the item's answer field (browser sources only)
        #[arg(long)]
        paste: bool,
    },
    /// Discover and filter only; no drafting, no credential needed
    Scan {
        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Saved page HTML
    #[arg(long, conflicts_with_all = ["cdp", "user_data_dir"])]
    snapshot: Option<PathBuf>,

    /// URL the snapshot was saved from (defaults to the listing URL)
    #[arg(long, requires = "snapshot")]
    page_url: Option<String>,

    /// DevTools websocket URL of a running Chrome
    #[arg(long, conflicts_with = "user_data_dir")]
    cdp: Option<String>,

    /// Chrome profile directory to launch with
    #[arg(long)]
    user_data_dir: Option<PathBuf>,
}

impl SourceArgs {
    fn choice(&self, settings: &Settings) -> Option<SourceChoice> {
        if let Some(path) = &self.snapshot {
            return Some(SourceChoice::Snapshot {
                path: path.clone(),
                url: self
                    .page_url
                    .clone()
                    .unwrap_or_else(|| settings.pipeline.listing_url.clone()),
            });
        }
        if let Some(ws) = &self.cdp {
            return Some(SourceChoice::Cdp(ws.clone()));
        }
        self.user_data_dir.clone().map(SourceChoice::Launch)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_with_format(cli.log_format);

    let mut settings = match Settings::resolve(cli.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::from(2);
        }
    };

    let (source_args, report, paste) = match &cli.command {
        Command::Run { source, report, paste } => (source, report.clone(), *paste),
        Command::Scan { source } => (source, None, false),
    };
    if paste {
        settings.pipeline.paste_drafts = true;
    }

    let Some(choice) = source_args.choice(&settings) else {
        Cli::command()
            .error(
                clap::error::ErrorKind::MissingRequiredArgument,
                "one of --snapshot, --cdp or --user-data-dir is required",
            )
            .exit();
    };

    let (sink, rx) = ChannelSink::channel();
    let reporter = spawn_reporter(rx, report);

    // * No browser is opened or attached without a usable credential
    if matches!(cli.command, Command::Run { .. }) && app::ensure_credentials(&settings, &sink).is_err() {
        drop(sink);
        if let Ok(view) = reporter.await {
            println!("{}", view.status());
        }
        return ExitCode::from(2);
    }

    let source = match app::open_source(&choice, &settings).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Cannot open page source: {e}");
            return ExitCode::FAILURE;
        }
    };

    let exit = match &cli.command {
        Command::Run { .. } => match app::run(&settings, source.as_ref(), &sink).await {
            Ok(outcome) => {
                tracing::info!(?outcome, "Run ended");
                ExitCode::SUCCESS
            }
            Err(e) if e.is_fatal_precondition() => ExitCode::from(2),
            Err(_) => ExitCode::FAILURE,
        },
        Command::Scan { .. } => match app::scan(&settings, source.as_ref(), &sink).await {
            Ok(DiscoveryStage::Eligible(eligible)) => {
                for (i, record) in eligible.records.iter().enumerate() {
                    println!("{}. {} | {} | {}", i + 1, record.title(), record.group(), record.reference());
                }
                ExitCode::SUCCESS
            }
            Ok(DiscoveryStage::Redirected { .. }) => ExitCode::SUCCESS,
            Err(_) => ExitCode::FAILURE,
        },
    };

    drop(sink);
    drop(source);
    if let Ok(view) = reporter.await {
        if matches!(cli.command, Command::Run { .. }) {
            println!("{}", view.render_text());
            println!("{}", view.delivery_summary());
        } else {
            println!("{}", view.status());
        }
    }

    exit
}
