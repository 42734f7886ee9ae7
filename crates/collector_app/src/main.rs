//! Collector CLI: run one paginated collection against a configured source
//! and write the accepted records as JSON lines.

mod config;
mod logging;

use std::env;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use collector_engine::{
    CancelFlag, Collector, FetchSettings, FieldIdentity, JsonLinesSink, NullProgressSink,
    RecordSink, ReqwestPageFetcher, RunSummary,
};
use collector_logging::{collect_error, collect_info};

use crate::logging::LogDestination;

const USAGE: &str =
    "usage: collector_app <profile.ron> [--output FILE] [--param KEY=VALUE]... [--log-file]";

#[derive(Debug, PartialEq, Eq)]
struct CliArgs {
    profile: PathBuf,
    output: Option<PathBuf>,
    params: Vec<(String, String)>,
    log_file: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<CliArgs> {
    let mut profile = None;
    let mut output = None;
    let mut params = Vec::new();
    let mut log_file = false;

    while let Some(arg) = args.next() {
        if arg == "--output" {
            let path = args.next().context("--output needs a path")?;
            output = Some(PathBuf::from(path));
        } else if arg == "--param" {
            let raw = args.next().context("--param needs KEY=VALUE")?;
            let (key, value) = raw
                .split_once('=')
                .with_context(|| format!("--param needs KEY=VALUE, got `{raw}`"))?;
            params.push((key.to_string(), value.to_string()));
        } else if arg == "--log-file" {
            log_file = true;
        } else if arg == "--help" || arg == "-h" {
            bail!("{USAGE}");
        } else if arg.starts_with('-') {
            bail!("unexpected option `{arg}`\n{USAGE}");
        } else if profile.is_none() {
            profile = Some(PathBuf::from(arg));
        } else {
            bail!("unexpected argument `{arg}`\n{USAGE}");
        }
    }

    Ok(CliArgs {
        profile: profile.context(USAGE)?,
        output,
        params,
        log_file,
    })
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<()> {
    let args = parse_args(env::args().skip(1))?;
    logging::initialize(if args.log_file {
        LogDestination::Both
    } else {
        LogDestination::Terminal
    });

    let profile = config::load_profile(&args.profile)?;
    collect_info!("collecting `{}` from {}", profile.name, profile.url);

    let fetcher = ReqwestPageFetcher::new(profile.endpoint(), FetchSettings::default())
        .map_err(|err| anyhow::anyhow!("building fetcher for `{}`: {err}", profile.name))?;
    let collector = Collector::new(
        fetcher,
        FieldIdentity::new(profile.identity_key.clone()),
        profile.run_settings(),
    );
    let query = profile.query(&args.params);
    let cancel = CancelFlag::new();

    let summary = match &args.output {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("creating {}", path.display()))?;
            let mut sink = JsonLinesSink::new(BufWriter::new(file));
            let summary = collect(&collector, &query, &mut sink, &cancel)?;
            sink.finish().context("flushing output file")?;
            collect_info!("wrote {} records to {}", summary.records_accepted, path.display());
            summary
        }
        None => {
            // Records on stdout, logs on stderr.
            let stdout = io::stdout();
            let mut sink = JsonLinesSink::new(BufWriter::new(stdout.lock()));
            let summary = collect(&collector, &query, &mut sink, &cancel)?;
            let mut out = sink.finish().context("flushing stdout")?;
            out.flush().context("flushing stdout")?;
            summary
        }
    };

    collect_info!(
        "done: {} records accepted of {} fetched over {} pages ({} retries)",
        summary.records_accepted,
        summary.records_fetched,
        summary.pages_fetched,
        summary.retries
    );
    Ok(())
}

fn collect<F, I>(
    collector: &Collector<F, I>,
    query: &collector_core::Query,
    sink: &mut dyn RecordSink,
    cancel: &CancelFlag,
) -> Result<RunSummary>
where
    F: collector_engine::PageFetcher,
    I: collector_core::Identify<collector_engine::RawRecord>,
{
    collector
        .run_blocking(query, sink, &NullProgressSink, cancel)
        .map_err(|err| {
            // Partial results are real progress; say what made it out.
            collect_error!("run failed after {} delivered records: {err}", err.yielded());
            anyhow::anyhow!(
                "collection failed after {} records were delivered: {err}",
                err.yielded()
            )
        })
}
