use anyhow::{Context, Result};
use clap::{error::ErrorKind, Parser};
use floorscraper::{
    browser::ChromeBrowser,
    config::{builtin_names, TargetConfig},
    criteria::Criteria,
    observe::TracingObserver,
    run::{self, RunOutcome, RunRequest},
    sink::SinkFormat,
};
use std::{ffi::OsString, path::PathBuf, process::ExitCode};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Scrape one day of a paginated floorsheet into a CSV or Parquet file.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Built-in target name
    #[arg(long, default_value = "merolagani", conflicts_with = "target_file")]
    target: String,

    /// Target definition in YAML, instead of a built-in one
    #[arg(long)]
    target_file: Option<PathBuf>,

    /// Trading date as mm/dd/yyyy or yyyy-mm-dd; omit for the latest day
    #[arg(long)]
    date: Option<String>,

    /// Directory the output file is written to
    #[arg(long, default_value = "data")]
    out_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = SinkFormat::Csv)]
    format: SinkFormat,

    /// Show the browser window
    #[arg(long)]
    headful: bool,

    /// Print the run outcome as one JSON line on stdout
    #[arg(long)]
    summary: bool,

    /// List built-in targets and exit
    #[arg(long)]
    list_targets: bool,
}

/// Exit code when the site had no records for the criteria. clap uses 2
/// for usage errors, which are mapped to 1 here like every other failure.
const EXIT_EMPTY: u8 = 3;

/// Parse the command line. `Err` carries the code to exit with after clap
/// has printed help, version or a usage error.
fn parse_args<I, T>(argv: I) -> std::result::Result<Args, ExitCode>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    Args::try_parse_from(argv).map_err(|err| {
        let _ = err.print();
        match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
            _ => ExitCode::FAILURE,
        }
    })
}

fn main() -> ExitCode {
    // ─── init logging ────────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(env)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .init();

    let args = match parse_args(std::env::args_os()) {
        Ok(args) => args,
        Err(code) => return code,
    };
    match real_main(args) {
        Ok(code) => code,
        Err(err) => {
            error!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn real_main(args: Args) -> Result<ExitCode> {
    if args.list_targets {
        for name in builtin_names() {
            println!("{}", name);
        }
        return Ok(ExitCode::SUCCESS);
    }

    let target = match &args.target_file {
        Some(path) => TargetConfig::load(path)
            .with_context(|| format!("loading target from {}", path.display()))?,
        None => TargetConfig::builtin(&args.target)?,
    };
    let criteria = Criteria::parse(args.date.as_deref())?;
    let label = criteria.label(&target.date_format);
    info!(target = %target.name, criteria = %label, format = ?args.format, "startup");

    let browser = ChromeBrowser::launch(!args.headful, target.timeouts.page_load())
        .context("launching chrome")?;
    let observer = TracingObserver::new(&target.name, &label);
    let request = RunRequest {
        target,
        criteria,
        out_dir: args.out_dir,
        format: args.format,
    };

    let outcome = run::execute(Box::new(browser), &request, &observer)
        .with_context(|| format!("scraping {} for {}", request.target.name, label))?;
    if args.summary {
        println!("{}", serde_json::to_string(&outcome)?);
    }

    Ok(match outcome {
        RunOutcome::Persisted { path, rows } => {
            info!(path = %path.display(), rows, "done");
            ExitCode::SUCCESS
        }
        RunOutcome::Empty => {
            info!("no records for {}; nothing written", label);
            ExitCode::from(EXIT_EMPTY)
        }
    })
}
