use color_eyre::eyre::{Report, WrapErr};
use mysql_query_check::{
    parse_args, query, Classification, MetricArgs, MetricReporter, MySqlExecutor, PluginOutput,
    Reporter,
};

const NAME: &str = "MetricMySQLQuery";

fn run(args: &MetricArgs, reporter: &MetricReporter) -> Result<PluginOutput, Report> {
    color_eyre::install()?;
    let params = args.connection.resolve()?;
    let executor = MySqlExecutor::new(&params);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .wrap_err("building async runtime")?;
    let conn = &args.connection;
    let result = rt.block_on(query::execute(&executor, &conn.query, conn.count_tuples))?;

    Ok(reporter.report(Classification::Ok, &result))
}

fn main() {
    let args: MetricArgs = parse_args(NAME);
    mysql_query_check::init_logging();

    let reporter = MetricReporter::new(NAME, &args.scheme);
    run(&args, &reporter)
        .unwrap_or_else(|e| reporter.report_error(&e))
        .exit()
}
