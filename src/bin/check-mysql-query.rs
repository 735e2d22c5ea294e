use color_eyre::eyre::{Report, WrapErr};
use mysql_query_check::{
    parse_args, CheckArgs, CheckReporter, MySqlExecutor, PluginOutput, Reporter, Thresholds,
};

const NAME: &str = "CheckMySQLQuery";

fn run(args: &CheckArgs, reporter: &CheckReporter) -> Result<PluginOutput, Report> {
    color_eyre::install()?;
    let thresholds =
        Thresholds::parse(Some(args.warning.as_str()), Some(args.critical.as_str()))?;
    let params = args.connection.resolve()?;
    let executor = MySqlExecutor::new(&params);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("building async runtime")?;
    let conn = &args.connection;
    let (classification, result) = rt.block_on(mysql_query_check::check(
        &executor,
        &conn.query,
        conn.count_tuples,
        &thresholds,
    ))?;

    Ok(reporter.report(classification, &result))
}

fn main() {
    let args: CheckArgs = parse_args(NAME);
    mysql_query_check::init_logging();

    let reporter = CheckReporter::new(NAME);
    run(&args, &reporter)
        .unwrap_or_else(|e| reporter.report_error(&e))
        .exit()
}
