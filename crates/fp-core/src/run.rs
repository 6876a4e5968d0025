//! The ephemeral description of one profiling invocation.

use crate::error::CoreResult;
use crate::ids::{DatasetId, RunId};
use crate::source::SourceDescriptor;
use serde::{Deserialize, Serialize};

/// One profiling invocation: who asked, for which dataset, reading what.
///
/// Never persisted as its own record; its fields are copied onto audit rows
/// and result rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileRun {
    pub run_id: RunId,
    pub dataset_id: DatasetId,
    pub dataset_name: String,
    pub source: SourceDescriptor,
}

impl ProfileRun {
    /// Validate the loose invocation fields into a run.
    ///
    /// Fails with a configuration error when an id is blank or when the
    /// table/query exclusivity rule is broken.
    pub fn from_invocation(
        run_id: &str,
        dataset_id: &str,
        dataset_name: &str,
        database: Option<&str>,
        schema: Option<&str>,
        table: Option<&str>,
        custom_query: Option<&str>,
    ) -> CoreResult<Self> {
        let run_id = RunId::try_from(run_id)?;
        let dataset_id = DatasetId::try_from(dataset_id)?;
        let source =
            SourceDescriptor::from_parts(dataset_name, database, schema, table, custom_query)?;
        Ok(Self {
            run_id,
            dataset_id,
            dataset_name: dataset_name.to_string(),
            source,
        })
    }
}
