use std::path::PathBuf;

use crate::threshold::ExpressionError;

/// Every way a single invocation can fail. All of them end in `UNKNOWN`.
#[derive(Debug, thiserror::Error)]
pub enum CheckError {
    #[error("Unable to read credentials from {}: {message}", path.display())]
    Config { path: PathBuf, message: String },

    #[error("Unable to query. Database: {database}, Query: {query}, Error: {message}")]
    Query {
        database: String,
        query: String,
        message: String,
    },

    #[error("Query returned no rows. Database: {database}, Query: {query}")]
    EmptyResult { database: String, query: String },

    #[error("Invalid {level} threshold {expression:?}")]
    ExpressionSyntax {
        level: &'static str,
        expression: String,
        #[source]
        source: ExpressionError,
    },
}

impl CheckError {
    pub(crate) fn config(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Config {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
