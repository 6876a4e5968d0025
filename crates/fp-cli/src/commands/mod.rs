//! CLI command implementations

pub(crate) mod audit;
pub(crate) mod common;
pub(crate) mod profile;
