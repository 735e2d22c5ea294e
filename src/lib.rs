use clap::error::ErrorKind;
use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod credentials;
mod error;
pub mod mysql;
pub mod query;
pub mod report;
mod status;
pub mod threshold;

pub use config::{CheckArgs, ConnectionParams, MetricArgs};
pub use error::CheckError;
pub use mysql::MySqlExecutor;
pub use query::{QueryExecutor, QueryResult};
pub use report::{CheckReporter, MetricReporter, PluginOutput, Reporter};
pub use status::Classification;
pub use threshold::{classify, Thresholds};

/// Run the query once and decide its status against `thresholds`.
pub async fn check<E: QueryExecutor>(
    executor: &E,
    query: &str,
    count_rows: bool,
    thresholds: &Thresholds,
) -> Result<(Classification, QueryResult), CheckError> {
    let result = query::execute(executor, query, count_rows).await?;
    let classification = thresholds.classify(result.value());
    tracing::debug!(%result, %classification, "classified query result");
    Ok((classification, result))
}

/// Parse the command line, turning usage errors into `UNKNOWN` instead of
/// clap's exit code 2, which a scheduler would read as `CRITICAL`.
pub fn parse_args<A: Parser>(name: &str) -> A {
    A::try_parse().unwrap_or_else(|err| match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => err.exit(),
        _ => {
            eprintln!("{err}");
            usage_error(name, &err).exit()
        }
    })
}

/// One-line `UNKNOWN` for a usage error, keeping the offending arguments and
/// dropping clap's usage and help hints.
pub fn usage_error(name: &str, err: &clap::Error) -> PluginOutput {
    let text = err.to_string();
    let summary = text
        .lines()
        .take_while(|line| !line.starts_with("Usage:"))
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    PluginOutput::unknown(name, summary.trim_start_matches("error: "))
}

/// Log to stderr, filtered by `RUST_LOG`; stdout belongs to the plugin line.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
