//! Source descriptors: what a profiling run reads from.

use crate::error::{CoreError, CoreResult};
use crate::sql_utils::quote_parts;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The input of a profiling run: a named relation or a free-form query.
///
/// Construction through [`SourceDescriptor::from_parts`] enforces that exactly
/// one of the two is present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum SourceDescriptor {
    /// An existing relation addressed by `database.schema.table`
    Table {
        database: String,
        schema: String,
        table: String,
    },
    /// A query to be materialized into a temporary relation
    Query { sql: String },
}

/// Treat `None`, empty and whitespace-only strings alike.
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl SourceDescriptor {
    /// Build a descriptor from the loose invocation fields.
    ///
    /// `dataset` is only used for error messages.
    pub fn from_parts(
        dataset: &str,
        database: Option<&str>,
        schema: Option<&str>,
        table: Option<&str>,
        custom_query: Option<&str>,
    ) -> CoreResult<Self> {
        let invalid = |reason: &str| CoreError::InvalidSource {
            dataset: dataset.to_string(),
            reason: reason.to_string(),
        };

        match (present(table), present(custom_query)) {
            (Some(_), Some(_)) => Err(invalid(
                "both a table and a custom query were supplied; provide exactly one",
            )),
            (None, None) => Err(invalid(
                "neither a table nor a custom query was supplied; provide exactly one",
            )),
            (None, Some(sql)) => Ok(Self::Query {
                sql: sql.trim_end_matches(';').trim_end().to_string(),
            }),
            (Some(table), None) => {
                let database = present(database)
                    .ok_or_else(|| invalid("table mode requires a database"))?;
                let schema =
                    present(schema).ok_or_else(|| invalid("table mode requires a schema"))?;
                Ok(Self::Table {
                    database: database.to_string(),
                    schema: schema.to_string(),
                    table: table.to_string(),
                })
            }
        }
    }

    /// Short mode label used in logs.
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Table { .. } => "table",
            Self::Query { .. } => "query",
        }
    }

    pub fn database(&self) -> Option<&str> {
        match self {
            Self::Table { database, .. } => Some(database),
            Self::Query { .. } => None,
        }
    }

    pub fn schema(&self) -> Option<&str> {
        match self {
            Self::Table { schema, .. } => Some(schema),
            Self::Query { .. } => None,
        }
    }

    pub fn table(&self) -> Option<&str> {
        match self {
            Self::Table { table, .. } => Some(table),
            Self::Query { .. } => None,
        }
    }

    pub fn custom_query(&self) -> Option<&str> {
        match self {
            Self::Table { .. } => None,
            Self::Query { sql } => Some(sql),
        }
    }
}

/// Catalog coordinates of the physical relation being profiled.
///
/// In table mode this is the source table; in query mode it is the
/// temporary relation the query was materialized into.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetadataKey {
    pub database: String,
    pub schema: String,
    pub relation: String,
}

impl MetadataKey {
    pub fn new(
        database: impl Into<String>,
        schema: impl Into<String>,
        relation: impl Into<String>,
    ) -> Self {
        Self {
            database: database.into(),
            schema: schema.into(),
            relation: relation.into(),
        }
    }

    /// Fully quoted `"database"."schema"."relation"` reference.
    pub fn quoted(&self) -> String {
        quote_parts(&[&self.database, &self.schema, &self.relation])
    }
}

impl fmt::Display for MetadataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.database, self.schema, self.relation)
    }
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;
