//! The chain-walking transformer.
//!
//! # Algorithm
//!
//! 1. Resolve `from` and `to` to chain positions (`from` first)
//! 2. Pick a direction: upgrade if `from` sits before `to`, downgrade otherwise
//! 3. Visit every position from `from` to `to` inclusive:
//!    - sanitize with the visited unit, if it has one
//!    - unless this is the target, step one position with the visited unit
//! 4. Return the working value once the target has been visited
//!
//! When `from == to` the loop still visits that single position, so its
//! sanitize always runs. No version is ever skipped.
//!
//! # Ownership
//!
//! The model is moved into the walk and threaded from step to step; the
//! engine never clones the working value itself. The only copies made are
//! trail snapshots, controlled by [`EngineConfig::record_snapshots`]. When
//! `M` is a shared handle, callbacks that mutate through it affect every
//! holder, so the same handle must not be passed to concurrent calls.

use crate::chain::Chain;
use crate::error;
use crate::{EngineConfig, StepKind, Trail, TransformError, Transformer, VersionTag};
use serde::{Deserialize, Serialize};

/// Successful walk: the final value and every step taken to reach it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Walk<M> {
    pub value: M,
    pub trail: Trail<M>,
}

/// Converts models between any two versions of an ordered chain.
pub struct ModelTransformer<M> {
    chain: Chain<M>,
    config: EngineConfig,
}

impl<M> ModelTransformer<M> {
    /// Create an engine with the default configuration.
    pub fn new(units: Vec<Transformer<M>>) -> error::Result<Self> {
        Self::with_config(units, EngineConfig::default())
    }

    /// Create an engine with an explicit configuration.
    pub fn with_config(units: Vec<Transformer<M>>, config: EngineConfig) -> error::Result<Self> {
        let chain = Chain::build(units, config.validate_chain)?;
        tracing::debug!(
            versions = chain.order.len(),
            validated = config.validate_chain,
            "model transformer built"
        );
        Ok(Self { chain, config })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Look up the unit registered for a version.
    pub fn transformer(&self, version: &str) -> Option<&Transformer<M>> {
        self.chain.transformers.get(version)
    }

    /// Versions in chain order.
    pub fn versions(&self) -> &[VersionTag] {
        &self.chain.order
    }

    /// Position of a version in the chain.
    pub fn position_of(&self, version: &str) -> Option<usize> {
        self.chain.position_of(version)
    }

    /// Iterate over registered units, one per distinct version.
    pub fn transformers(&self) -> impl Iterator<Item = &Transformer<M>> {
        self.chain.transformers.values()
    }
}

/// `Clone` is needed only to snapshot the working value into the trail. It
/// is required even with [`EngineConfig::record_snapshots`] off; models that
/// cannot be cloned go through [`walk_unrecorded`](ModelTransformer::walk_unrecorded)
/// instead.
impl<M: Clone> ModelTransformer<M> {
    /// Transform a model whose version is known.
    ///
    /// Data that does not actually match `from` is handed to the units as
    /// is; what happens then is up to their own logic.
    pub fn transform_from(&self, model: M, from: &str, to: &str) -> Result<M, TransformError<M>> {
        self.walk(model, from, to).map(|walk| walk.value)
    }

    /// Like [`transform_from`](Self::transform_from), also returning the
    /// trail of a successful walk.
    pub fn walk(&self, model: M, from: &str, to: &str) -> Result<Walk<M>, TransformError<M>> {
        let record = self.config.record_snapshots;
        self.walk_with(model, from, to, |data: &M| record.then(|| data.clone()))
    }
}

impl<M> ModelTransformer<M> {
    /// Walk without ever cloning the model. Trail steps carry no data,
    /// whatever the configuration says.
    pub fn walk_unrecorded(
        &self,
        model: M,
        from: &str,
        to: &str,
    ) -> Result<Walk<M>, TransformError<M>> {
        self.walk_with(model, from, to, |_: &M| None)
    }

    fn walk_with(
        &self,
        model: M,
        from: &str,
        to: &str,
        snapshot: impl Fn(&M) -> Option<M>,
    ) -> Result<Walk<M>, TransformError<M>> {
        let start = self
            .position_of(from)
            .ok_or_else(|| TransformError::FromInvalidVersion {
                from: from.to_string(),
            })?;
        let end = self
            .position_of(to)
            .ok_or_else(|| TransformError::ToInvalidVersion { to: to.to_string() })?;

        let span = tracing::debug_span!("transform_from", from, to);
        let _enter = span.enter();

        let is_upgrade = start < end;
        let step_kind = if is_upgrade {
            StepKind::Upgrade
        } else {
            StepKind::Downgrade
        };

        let mut trail = Trail::new();
        let mut data = model;
        let mut i = start;

        loop {
            let version = &self.chain.order[i];

            let Some(transformer) = self.transformer(version) else {
                tracing::warn!(version = %version, "no transformer for version in chain");
                return Err(TransformError::UnknownTransformer {
                    version: version.clone(),
                    trail,
                });
            };

            if transformer.has_sanitize() {
                trail.record(StepKind::Sanitize, version, snapshot(&data));
                tracing::trace!(version = %version, "sanitize");

                data = match transformer.sanitize(data) {
                    Ok(sanitized) => sanitized,
                    Err(fault) => {
                        tracing::warn!(version = %version, error = %fault, "sanitize failed");
                        return Err(TransformError::SanitizeFailed {
                            version: version.clone(),
                            fault,
                            trail,
                        });
                    }
                };
            }

            if i == end {
                break;
            }

            trail.record(step_kind, version, snapshot(&data));
            tracing::trace!(version = %version, step = %step_kind, "transform");

            let stepped = if is_upgrade {
                transformer.upgrade(data)
            } else {
                transformer.downgrade(data)
            };

            data = match stepped {
                Ok(Some(next)) => next,
                Ok(None) => {
                    tracing::debug!(version = %version, step = %step_kind, "transition unsupported");
                    let version = version.clone();
                    return Err(if is_upgrade {
                        TransformError::UpgradeUnsupported { version, trail }
                    } else {
                        TransformError::DowngradeUnsupported { version, trail }
                    });
                }
                Err(fault) => {
                    tracing::warn!(version = %version, step = %step_kind, error = %fault, "transform failed");
                    return Err(TransformError::TransformFailed {
                        version: version.clone(),
                        fault,
                        trail,
                    });
                }
            };

            i = if is_upgrade { i + 1 } else { i - 1 };
        }

        tracing::debug!(steps = trail.len(), "transform complete");
        Ok(Walk { value: data, trail })
    }

}

impl<M> std::fmt::Debug for ModelTransformer<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelTransformer")
            .field("versions", &self.chain.order)
            .field("config", &self.config)
            .finish()
    }
}
