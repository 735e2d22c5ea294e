//! MySQL driver behind [`QueryExecutor`], one connection per query.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::mysql::{MySqlConnectOptions, MySqlRow};
use sqlx::{Column, ConnectOptions, Connection, Row, TypeInfo, ValueRef};

use crate::config::ConnectionParams;
use crate::query::{Field, QueryExecutor, ResultSet};
use crate::CheckError;

pub struct MySqlExecutor {
    options: MySqlConnectOptions,
    database: String,
}

impl MySqlExecutor {
    pub fn new(params: &ConnectionParams) -> Self {
        let mut options = MySqlConnectOptions::new()
            .host(&params.hostname)
            .port(params.port)
            .username(&params.credentials.user)
            .password(&params.credentials.password)
            .database(&params.database);
        if let Some(socket) = &params.socket {
            options = options.socket(socket);
        }

        Self {
            options,
            database: params.database.clone(),
        }
    }

    fn query_error(&self, query: &str, err: sqlx::Error) -> CheckError {
        let message = match err {
            sqlx::Error::Database(db) => db.message().to_owned(),
            other => other.to_string(),
        };
        CheckError::Query {
            database: self.database.clone(),
            query: query.to_owned(),
            message,
        }
    }
}

impl QueryExecutor for MySqlExecutor {
    fn database(&self) -> &str {
        &self.database
    }

    async fn run(&self, query: &str) -> Result<ResultSet, CheckError> {
        let mut conn = self
            .options
            .connect()
            .await
            .map_err(|e| self.query_error(query, e))?;

        let rows = sqlx::query(query).fetch_all(&mut conn).await;
        if let Err(e) = conn.close().await {
            tracing::debug!(error = %e, "closing connection");
        }
        let rows = rows.map_err(|e| self.query_error(query, e))?;

        Ok(ResultSet {
            row_count: rows.len() as u64,
            first_field: rows.first().map(first_field),
        })
    }
}

/// How a column is read, chosen from its MySQL type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decoding {
    Bool,
    Signed,
    Unsigned,
    Float,
    Double,
    Decimal,
    Text,
}

impl Decoding {
    fn for_type(type_name: &str) -> Self {
        match type_name {
            "BOOLEAN" | "BOOL" => Self::Bool,
            t if t.ends_with(" UNSIGNED") => Self::Unsigned,
            "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "INTEGER" | "BIGINT" => Self::Signed,
            "FLOAT" => Self::Float,
            "DOUBLE" | "DOUBLE PRECISION" | "REAL" => Self::Double,
            "DECIMAL" | "NUMERIC" => Self::Decimal,
            _ => Self::Text,
        }
    }
}

/// Decode column 0 by its declared type. Anything undecodable reads as NULL.
fn first_field(row: &MySqlRow) -> Field {
    let Some(column) = row.columns().first() else {
        return Field::Null;
    };
    match row.try_get_raw(0) {
        Ok(raw) if !raw.is_null() => {}
        _ => return Field::Null,
    }

    let type_name = column.type_info().name();
    let field = match Decoding::for_type(type_name) {
        Decoding::Bool => row
            .try_get::<bool, _>(0)
            .ok()
            .map(|b| Field::Number(if b { 1. } else { 0. })),
        Decoding::Signed => row.try_get::<i64, _>(0).ok().map(|v| Field::Number(v as f64)),
        Decoding::Unsigned => row.try_get::<u64, _>(0).ok().map(|v| Field::Number(v as f64)),
        Decoding::Float => row
            .try_get::<f32, _>(0)
            .ok()
            .map(|v| Field::Number(f64::from(v))),
        Decoding::Double => row.try_get::<f64, _>(0).ok().map(Field::Number),
        Decoding::Decimal => row
            .try_get::<Decimal, _>(0)
            .ok()
            .and_then(|v| v.to_f64())
            .map(Field::Number),
        Decoding::Text => row
            .try_get::<String, _>(0)
            .map(Field::Text)
            .or_else(|_| {
                row.try_get::<Vec<u8>, _>(0)
                    .map(|v| Field::Text(String::from_utf8_lossy(&v).into_owned()))
            })
            .ok(),
    };

    field.unwrap_or_else(|| {
        tracing::debug!(
            column = column.name(),
            type_name,
            "undecodable column, reading as NULL"
        );
        Field::Null
    })
}
