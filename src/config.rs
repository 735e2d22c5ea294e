//! Command-line configuration for both plugins.
//!
//! `-h` is the database host, as in the `mysql` client, so help is only
//! available as `--help`.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser};

use crate::credentials::{self, Credentials};
use crate::CheckError;

/// Connection flags shared by the check and metric plugins.
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// MySQL user
    #[arg(short, long)]
    pub user: Option<String>,

    /// MySQL password
    #[arg(short, long)]
    pub password: Option<String>,

    /// my.cnf style ini file with a [client] section holding user and password
    #[arg(short, long, value_name = "PATH")]
    pub ini: Option<PathBuf>,

    /// Hostname to log in to
    #[arg(short = 'h', long, default_value = "localhost")]
    pub hostname: String,

    /// Database schema to connect to
    #[arg(short, long, default_value = "test")]
    pub database: String,

    /// Port to connect to
    #[arg(
        short = 'P',
        long,
        default_value_t = 3306,
        value_parser = clap::value_parser!(u16).range(1..)
    )]
    pub port: u16,

    /// Unix socket to use instead of TCP
    #[arg(short, long)]
    pub socket: Option<PathBuf>,

    /// Query to run
    #[arg(short, long)]
    pub query: String,

    /// Use the number of tuples (rows) returned by the query as the value
    #[arg(short = 't', long = "tuples")]
    pub count_tuples: bool,
}

impl ConnectionArgs {
    pub fn resolve(&self) -> Result<ConnectionParams, CheckError> {
        let credentials = credentials::resolve(
            self.ini.as_deref(),
            self.user.as_deref(),
            self.password.as_deref(),
        )?;

        Ok(ConnectionParams {
            hostname: self.hostname.clone(),
            port: self.port,
            socket: self.socket.clone(),
            database: self.database.clone(),
            credentials,
        })
    }
}

/// Everything needed to open the one connection of an invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub hostname: String,
    pub port: u16,
    pub socket: Option<PathBuf>,
    pub database: String,
    pub credentials: Credentials,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "check-mysql-query",
    version,
    about = "Alert when the result of a MySQL query crosses a threshold",
    disable_help_flag = true
)]
pub struct CheckArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Warning threshold expression, e.g. 'value > 5'
    #[arg(short, long)]
    pub warning: String,

    /// Critical threshold expression, e.g. 'value > 10'
    #[arg(short, long)]
    pub critical: String,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "metric-mysql-query",
    version,
    about = "Emit the result of a MySQL query as a metric",
    disable_help_flag = true
)]
pub struct MetricArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Metric naming scheme, text to prepend to the metric name
    #[arg(long, default_value = "mysql")]
    pub scheme: String,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    pub help: Option<bool>,
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;

    use super::*;

    #[test]
    fn check_defaults() {
        let args = CheckArgs::try_parse_from([
            "check-mysql-query",
            "-q",
            "select 1",
            "-w",
            "value > 5",
            "-c",
            "value > 10",
        ])
        .unwrap();
        let conn = &args.connection;
        assert_eq!(conn.hostname, "localhost");
        assert_eq!(conn.database, "test");
        assert_eq!(conn.port, 3306);
        assert!(!conn.count_tuples);
        assert!(conn.socket.is_none());
        assert_eq!(args.warning, "value > 5");
        assert_eq!(args.critical, "value > 10");
    }

    #[test]
    fn check_short_flags() {
        let args = CheckArgs::try_parse_from([
            "check-mysql-query",
            "-u",
            "sensu",
            "-p",
            "pw",
            "-h",
            "db1",
            "-d",
            "app",
            "-P",
            "3307",
            "-s",
            "/run/mysqld/mysqld.sock",
            "-q",
            "select id from jobs",
            "-t",
            "-w",
            "value > 5",
            "-c",
            "value > 10",
        ])
        .unwrap();
        let conn = &args.connection;
        assert_eq!(conn.user.as_deref(), Some("sensu"));
        assert_eq!(conn.password.as_deref(), Some("pw"));
        assert_eq!(conn.hostname, "db1");
        assert_eq!(conn.database, "app");
        assert_eq!(conn.port, 3307);
        assert!(conn.count_tuples);

        let params = conn.resolve().unwrap();
        assert_eq!(params.credentials.user, "sensu");
        assert_eq!(
            params.socket,
            Some(PathBuf::from("/run/mysqld/mysqld.sock"))
        );
    }

    #[test]
    fn check_requires_query_and_thresholds() {
        let err = CheckArgs::try_parse_from(["check-mysql-query", "-q", "select 1"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn port_zero_is_rejected() {
        let err = MetricArgs::try_parse_from(["metric-mysql-query", "-q", "select 1", "-P", "0"])
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn help_is_long_only() {
        let err = MetricArgs::try_parse_from(["metric-mysql-query", "--help"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn metric_scheme_defaults_to_mysql() {
        let args = MetricArgs::try_parse_from(["metric-mysql-query", "-q", "select 1"]).unwrap();
        assert_eq!(args.scheme, "mysql");

        let args = MetricArgs::try_parse_from([
            "metric-mysql-query",
            "-q",
            "select 1",
            "--scheme",
            "db1.jobs",
            "--tuples",
        ])
        .unwrap();
        assert_eq!(args.scheme, "db1.jobs");
        assert!(args.connection.count_tuples);
    }

    #[test]
    fn clap_definitions_are_consistent() {
        use clap::CommandFactory;
        CheckArgs::command().debug_assert();
        MetricArgs::command().debug_assert();
    }
}
