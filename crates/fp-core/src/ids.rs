//! Strongly-typed run and dataset identifiers.

use crate::newtype_string::define_newtype_string;

define_newtype_string! {
    /// Caller-supplied identifier of one profiling invocation.
    ///
    /// Scopes audit rows and distinguishes appended result rows between runs.
    pub struct RunId;
}

define_newtype_string! {
    /// Caller-supplied identifier of the dataset being profiled.
    pub struct DatasetId;
}

impl RunId {
    /// Lowercase alphanumeric form of the id, safe to embed in a relation name.
    pub fn sanitized(&self) -> String {
        self.0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect()
    }
}
