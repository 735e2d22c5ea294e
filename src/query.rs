//! Run the check query and reduce its rows to a single number.

use std::fmt;

use crate::CheckError;

/// The number a check is decided on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryResult {
    /// First field of the first row.
    Scalar(f64),
    /// Number of rows returned.
    RowCount(u64),
}

impl QueryResult {
    pub fn value(&self) -> f64 {
        match *self {
            Self::Scalar(v) => v,
            Self::RowCount(n) => n as f64,
        }
    }

    /// Suffix used for the metric name.
    pub fn metric_name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "value",
            Self::RowCount(_) => "rows",
        }
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(v) => write!(f, "{v}"),
            Self::RowCount(n) => write!(f, "{n}"),
        }
    }
}

/// A single decoded database field.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Null,
    Number(f64),
    Text(String),
}

impl Field {
    /// Lenient numeric coercion: text yields its leading number, or 0 when it
    /// has none, and NULL is 0.
    pub fn coerce(&self) -> f64 {
        match self {
            Self::Null => 0.,
            Self::Number(n) => *n,
            Self::Text(s) => leading_number(s),
        }
    }
}

fn leading_number(text: &str) -> f64 {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let count_digits = |from: usize| {
        bytes
            .get(from..)
            .unwrap_or_default()
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_digits = count_digits(end);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(end + 1);
        if frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }
    if int_digits + frac_digits == 0 {
        return 0.;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp = end + 1;
        if matches!(bytes.get(exp), Some(b'+' | b'-')) {
            exp += 1;
        }
        let exp_digits = count_digits(exp);
        if exp_digits > 0 {
            end = exp + exp_digits;
        }
    }

    s[..end].parse().unwrap_or(0.)
}

/// What the driver hands back from one query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub row_count: u64,
    /// `None` when no rows came back.
    pub first_field: Option<Field>,
}

impl ResultSet {
    pub fn into_result(
        self,
        count_rows: bool,
        database: &str,
        query: &str,
    ) -> Result<QueryResult, CheckError> {
        if count_rows {
            return Ok(QueryResult::RowCount(self.row_count));
        }
        match self.first_field {
            Some(field) => Ok(QueryResult::Scalar(field.coerce())),
            None => Err(CheckError::EmptyResult {
                database: database.to_owned(),
                query: query.to_owned(),
            }),
        }
    }
}

/// A connection target able to run one query.
#[allow(async_fn_in_trait)]
pub trait QueryExecutor {
    fn database(&self) -> &str;

    async fn run(&self, query: &str) -> Result<ResultSet, CheckError>;
}

pub async fn execute<E: QueryExecutor>(
    executor: &E,
    query: &str,
    count_rows: bool,
) -> Result<QueryResult, CheckError> {
    let rows = executor.run(query).await?;
    tracing::debug!(rows = rows.row_count, count_rows, "query finished");
    rows.into_result(count_rows, executor.database(), query)
}
