//! Per-call write options.

use crate::condition::Condition;
use optilock_types::Version;

/// Versions computed at the `called` stage for the request stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionContext {
    /// The next version of a single-item write.
    Single(Version),
    /// One next version per batch item, in input order.
    Batch(Vec<Version>),
}

/// Options of a write call. Hooks may replace them at the `called` stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteOptions {
    /// Caller-supplied condition on the stored item.
    pub condition: Option<Condition>,
    /// Version context handed from `called` to `request:pre`.
    pub version: Option<VersionContext>,
}

impl WriteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }
}
