//! Per-version transformer units.
//!
//! A [`Transformer`] knows one version of a model: how to recognize it, how
//! to clean it up, and how to step it to the adjacent newer or older version.
//! Units are configured once with builder methods and are immutable after
//! they are handed to an engine.
//!
//! Anything not overridden keeps an explicit default:
//! - no recognizer: the unit never takes part in fast-path detection
//! - no sanitize: the step is skipped and not recorded
//! - no upgrade/downgrade: the transition always returns `None` (unsupported)

use crate::fault::{guard, guard_infallible};
use crate::{Fault, VersionTag};
use std::fmt;

type Recognizer<M> = Box<dyn Fn(&M) -> bool + Send + Sync>;
type SanitizeFn<M> = Box<dyn Fn(M) -> Result<M, Fault> + Send + Sync>;
type StepFn<M> = Box<dyn Fn(M) -> Result<Option<M>, Fault> + Send + Sync>;

/// One version of a model and the transitions to its neighbours.
pub struct Transformer<M> {
    version: VersionTag,
    previous: Option<VersionTag>,
    next: Option<VersionTag>,
    recognizer: Option<Recognizer<M>>,
    sanitize: Option<SanitizeFn<M>>,
    upgrade: StepFn<M>,
    downgrade: StepFn<M>,
}

impl<M: 'static> Transformer<M> {
    /// Create a unit for `version` that refuses both transitions.
    pub fn new(version: impl Into<VersionTag>) -> Self {
        Self {
            version: version.into(),
            previous: None,
            next: None,
            recognizer: None,
            sanitize: None,
            upgrade: Box::new(|_| Ok(None)),
            downgrade: Box::new(|_| Ok(None)),
        }
    }

    /// Declare the version this unit downgrades to. Checked against the
    /// chain when validation is enabled.
    pub fn previous(mut self, version: impl Into<VersionTag>) -> Self {
        self.previous = Some(version.into());
        self
    }

    /// Declare the version this unit upgrades to.
    pub fn next(mut self, version: impl Into<VersionTag>) -> Self {
        self.next = Some(version.into());
        self
    }

    /// Predicate telling whether raw data is plausibly this version's model.
    pub fn recognize_with<F>(mut self, recognizer: F) -> Self
    where
        F: Fn(&M) -> bool + Send + Sync + 'static,
    {
        self.recognizer = Some(Box::new(recognizer));
        self
    }

    /// Idempotent cleanup run every time a walk visits this version.
    pub fn sanitize_with<F>(mut self, sanitize: F) -> Self
    where
        F: Fn(M) -> M + Send + Sync + 'static,
    {
        self.sanitize = Some(Box::new(move |model| Ok(sanitize(model))));
        self
    }

    /// Fallible variant of [`sanitize_with`](Self::sanitize_with).
    pub fn try_sanitize_with<F, E>(mut self, sanitize: F) -> Self
    where
        F: Fn(M) -> Result<M, E> + Send + Sync + 'static,
        E: Into<Fault>,
    {
        self.sanitize = Some(Box::new(move |model| sanitize(model).map_err(Into::into)));
        self
    }

    /// Step to the next version. Return `None` to refuse the transition.
    pub fn upgrade_with<F>(mut self, upgrade: F) -> Self
    where
        F: Fn(M) -> Option<M> + Send + Sync + 'static,
    {
        self.upgrade = Box::new(move |model| Ok(upgrade(model)));
        self
    }

    pub fn try_upgrade_with<F, E>(mut self, upgrade: F) -> Self
    where
        F: Fn(M) -> Result<Option<M>, E> + Send + Sync + 'static,
        E: Into<Fault>,
    {
        self.upgrade = Box::new(move |model| upgrade(model).map_err(Into::into));
        self
    }

    /// Step to the previous version. Return `None` to refuse the transition.
    pub fn downgrade_with<F>(mut self, downgrade: F) -> Self
    where
        F: Fn(M) -> Option<M> + Send + Sync + 'static,
    {
        self.downgrade = Box::new(move |model| Ok(downgrade(model)));
        self
    }

    pub fn try_downgrade_with<F, E>(mut self, downgrade: F) -> Self
    where
        F: Fn(M) -> Result<Option<M>, E> + Send + Sync + 'static,
        E: Into<Fault>,
    {
        self.downgrade = Box::new(move |model| downgrade(model).map_err(Into::into));
        self
    }
}

impl<M> Transformer<M> {
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn declared_previous(&self) -> Option<&str> {
        self.previous.as_deref()
    }

    pub fn declared_next(&self) -> Option<&str> {
        self.next.as_deref()
    }

    pub fn has_recognizer(&self) -> bool {
        self.recognizer.is_some()
    }

    pub fn has_sanitize(&self) -> bool {
        self.sanitize.is_some()
    }

    /// Run the recognizer. `None` when the unit has none.
    pub fn recognizes(&self, data: &M) -> Option<bool> {
        self.recognizer.as_ref().map(|recognize| recognize(data))
    }

    /// Sanitize a model of this version. Identity when no sanitize is set.
    ///
    /// Panics inside the callback are returned as a [`Panicked`](crate::Panicked) fault.
    pub fn sanitize(&self, model: M) -> Result<M, Fault> {
        match &self.sanitize {
            Some(sanitize) => guard(|| sanitize(model)),
            None => guard_infallible(|| model),
        }
    }

    /// Upgrade a model of this version to the next one.
    pub fn upgrade(&self, model: M) -> Result<Option<M>, Fault> {
        guard(|| (self.upgrade)(model))
    }

    /// Downgrade a model of this version to the previous one.
    pub fn downgrade(&self, model: M) -> Result<Option<M>, Fault> {
        guard(|| (self.downgrade)(model))
    }
}

impl<M> fmt::Debug for Transformer<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transformer")
            .field("version", &self.version)
            .field("previous", &self.previous)
            .field("next", &self.next)
            .field("recognizer", &self.recognizer.is_some())
            .field("sanitize", &self.sanitize.is_some())
            .finish_non_exhaustive()
    }
}
