//! Step trail recorded during a single transformation.
//!
//! Every sanitize, upgrade and downgrade the engine attempts is appended
//! here before the callback runs, so a failing trail always ends with the
//! step that failed.

use crate::VersionTag;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of step attempted on a version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepKind {
    Sanitize,
    Upgrade,
    Downgrade,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepKind::Sanitize => write!(f, "sanitize"),
            StepKind::Upgrade => write!(f, "upgrade"),
            StepKind::Downgrade => write!(f, "downgrade"),
        }
    }
}

/// A single attempted step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step<M> {
    /// What was attempted
    pub kind: StepKind,
    /// Version whose transformer ran the step
    pub version: VersionTag,
    /// Snapshot of the value handed to the step, if snapshots are enabled
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<M>,
}

/// Ordered, append-only log of steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trail<M> {
    steps: Vec<Step<M>>,
}

impl<M> Default for Trail<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M> Trail<M> {
    /// Create an empty trail.
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub(crate) fn record(&mut self, kind: StepKind, version: &str, data: Option<M>) {
        self.steps.push(Step {
            kind,
            version: version.to_string(),
            data,
        });
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step<M>> {
        self.steps.iter()
    }

    /// The most recent step, which is the failing one on an error trail.
    pub fn last(&self) -> Option<&Step<M>> {
        self.steps.last()
    }

    /// Step kinds in the order they were attempted.
    pub fn kinds(&self) -> Vec<StepKind> {
        self.steps.iter().map(|s| s.kind).collect()
    }

    /// Versions touched, in order, with consecutive repeats collapsed.
    ///
    /// A sanitize followed by an upgrade on the same version shows up once.
    pub fn versions(&self) -> Vec<&str> {
        let mut versions: Vec<&str> = Vec::new();
        for step in &self.steps {
            if versions.last() != Some(&step.version.as_str()) {
                versions.push(&step.version);
            }
        }
        versions
    }

    pub fn into_steps(self) -> Vec<Step<M>> {
        self.steps
    }
}

impl<M: Serialize> Trail<M> {
    /// Render the trail as JSON for diagnostics.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

impl<'a, M> IntoIterator for &'a Trail<M> {
    type Item = &'a Step<M>;
    type IntoIter = std::slice::Iter<'a, Step<M>>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}

impl<M> IntoIterator for Trail<M> {
    type Item = Step<M>;
    type IntoIter = std::vec::IntoIter<Step<M>>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}
