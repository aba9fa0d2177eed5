//! Injection-safe construction of dynamic SQL fragments.
//!
//! Every value reaches Postgres through a positional placeholder. A
//! [`ParamList`] hands out the placeholder at the moment the value is pushed,
//! so the `$n` index and the parameter position can't drift apart no matter
//! which optional inputs were present. The only text ever spliced into a
//! fragment is a column name taken from a fixed allow-list.

pub mod filter;
pub mod patch;

use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::Postgres;
use uuid::Uuid;

use crate::models::TaskPriority;

pub use filter::{compile_filter, SortColumn, SortDirection, SortOrder, TaskFilter};
pub use patch::{compile_patch, PatchError};

/// Typed bind value for a compiled fragment.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Int(i32),
    BigInt(i64),
    Bool(bool),
    Text(String),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Priority(TaskPriority),
    Uuid(Uuid),
}

/// A SQL fragment and the values for its placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

#[derive(Debug, Default)]
pub(crate) struct ParamList {
    params: Vec<SqlParam>,
}

impl ParamList {
    /// Appends `value` and returns the placeholder that refers to it.
    pub(crate) fn push(&mut self, value: SqlParam) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    pub(crate) fn into_inner(self) -> Vec<SqlParam> {
        self.params
    }
}

/// Binds compiled parameters onto a sqlx `QueryAs` in placeholder order.
pub fn bind_params<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    params: Vec<SqlParam>,
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for param in params {
        query = match param {
            SqlParam::Int(v) => query.bind(v),
            SqlParam::BigInt(v) => query.bind(v),
            SqlParam::Bool(v) => query.bind(v),
            SqlParam::Text(v) => query.bind(v),
            SqlParam::Timestamp(v) => query.bind(v),
            SqlParam::TimestampTz(v) => query.bind(v),
            SqlParam::Priority(v) => query.bind(v),
            SqlParam::Uuid(v) => query.bind(v),
        };
    }
    query
}
