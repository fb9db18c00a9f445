//! Error types for the modelshift engine.

use crate::{Fault, Trail, VersionTag};
use thiserror::Error;

/// Failures of [`ModelTransformer::transform_from`](crate::ModelTransformer::transform_from).
///
/// Every variant that happens after the walk has started carries the trail
/// of steps attempted so far.
#[derive(Debug, Error)]
pub enum TransformError<M> {
    #[error("version to transform from is not in the chain: {from}")]
    FromInvalidVersion { from: VersionTag },

    #[error("version to transform to is not in the chain: {to}")]
    ToInvalidVersion { to: VersionTag },

    #[error("no transformer registered for version {version}")]
    UnknownTransformer { version: VersionTag, trail: Trail<M> },

    #[error("sanitize failed at version {version}")]
    SanitizeFailed {
        version: VersionTag,
        #[source]
        fault: Fault,
        trail: Trail<M>,
    },

    #[error("transform failed at version {version}")]
    TransformFailed {
        version: VersionTag,
        #[source]
        fault: Fault,
        trail: Trail<M>,
    },

    #[error("upgrade from version {version} is not supported")]
    UpgradeUnsupported { version: VersionTag, trail: Trail<M> },

    #[error("downgrade from version {version} is not supported")]
    DowngradeUnsupported { version: VersionTag, trail: Trail<M> },
}

impl<M> TransformError<M> {
    /// Stable snake_case identifier of the failure.
    pub fn code(&self) -> &'static str {
        match self {
            TransformError::FromInvalidVersion { .. } => "from_invalid_version",
            TransformError::ToInvalidVersion { .. } => "to_invalid_version",
            TransformError::UnknownTransformer { .. } => "unknown_transformer",
            TransformError::SanitizeFailed { .. } => "sanitize_failed",
            TransformError::TransformFailed { .. } => "transform_failed",
            TransformError::UpgradeUnsupported { .. } => "upgrade_unsupported",
            TransformError::DowngradeUnsupported { .. } => "downgrade_unsupported",
        }
    }

    /// Steps attempted before the failure. `None` for the precondition
    /// failures, which happen before any transformer runs.
    pub fn trail(&self) -> Option<&Trail<M>> {
        match self {
            TransformError::FromInvalidVersion { .. } | TransformError::ToInvalidVersion { .. } => {
                None
            }
            TransformError::UnknownTransformer { trail, .. }
            | TransformError::SanitizeFailed { trail, .. }
            | TransformError::TransformFailed { trail, .. }
            | TransformError::UpgradeUnsupported { trail, .. }
            | TransformError::DowngradeUnsupported { trail, .. } => Some(trail),
        }
    }

    /// The fault raised by a user callback, if that is what aborted the walk.
    pub fn fault(&self) -> Option<&Fault> {
        match self {
            TransformError::SanitizeFailed { fault, .. }
            | TransformError::TransformFailed { fault, .. } => Some(fault),
            _ => None,
        }
    }
}

/// Failures of version detection.
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("unable to determine the version of the model")]
    UnknownVersion,

    #[error("version detector failed")]
    DetectorFailed {
        #[source]
        fault: Fault,
    },
}

impl DetectionError {
    /// Stable snake_case identifier of the failure.
    pub fn code(&self) -> &'static str {
        match self {
            DetectionError::UnknownVersion => "unknown_version",
            DetectionError::DetectorFailed { .. } => "detector_failed",
        }
    }
}

/// Failures of [`DynamicModelTransformer::transform`](crate::DynamicModelTransformer::transform):
/// either detection or the walk that follows it.
#[derive(Debug, Error)]
pub enum DynamicTransformError<M> {
    #[error(transparent)]
    Detection(#[from] DetectionError),

    #[error(transparent)]
    Transform(#[from] TransformError<M>),
}

impl<M> DynamicTransformError<M> {
    pub fn code(&self) -> &'static str {
        match self {
            DynamicTransformError::Detection(e) => e.code(),
            DynamicTransformError::Transform(e) => e.code(),
        }
    }

    pub fn trail(&self) -> Option<&Trail<M>> {
        match self {
            DynamicTransformError::Detection(_) => None,
            DynamicTransformError::Transform(e) => e.trail(),
        }
    }
}

/// Inconsistencies found when validating a chain at construction.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("version appears more than once in the chain: {version}")]
    DuplicateVersion { version: VersionTag },

    #[error("transformer {version} declares previous version {declared:?}, chain has {actual:?}")]
    PreviousMismatch {
        version: VersionTag,
        declared: VersionTag,
        actual: Option<VersionTag>,
    },

    #[error("transformer {version} declares next version {declared:?}, chain has {actual:?}")]
    NextMismatch {
        version: VersionTag,
        declared: VersionTag,
        actual: Option<VersionTag>,
    },
}

/// Result type for chain construction.
pub type Result<T> = std::result::Result<T, ChainError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn error_display() {
        let err = TransformError::<()>::FromInvalidVersion { from: "v9".into() };
        assert_eq!(
            err.to_string(),
            "version to transform from is not in the chain: v9"
        );

        let err = TransformError::<()>::UpgradeUnsupported {
            version: "v4".into(),
            trail: Trail::new(),
        };
        assert_eq!(err.to_string(), "upgrade from version v4 is not supported");

        let err = ChainError::NextMismatch {
            version: "2".into(),
            declared: "3".into(),
            actual: None,
        };
        assert_eq!(
            err.to_string(),
            "transformer 2 declares next version \"3\", chain has None"
        );
    }

    #[test]
    fn codes_are_snake_case() {
        let err = TransformError::<()>::DowngradeUnsupported {
            version: "2".into(),
            trail: Trail::new(),
        };
        assert_eq!(err.code(), "downgrade_unsupported");
        assert_eq!(DetectionError::UnknownVersion.code(), "unknown_version");

        let err: DynamicTransformError<()> = DetectionError::UnknownVersion.into();
        assert_eq!(err.code(), "unknown_version");
    }

    #[test]
    fn fault_is_the_source() {
        let err = TransformError::<()>::SanitizeFailed {
            version: "1".into(),
            fault: "negative id".into(),
            trail: Trail::new(),
        };
        assert_eq!(err.source().unwrap().to_string(), "negative id");
        assert!(err.fault().is_some());
        assert!(err.trail().unwrap().is_empty());
    }

    #[test]
    fn construction_result_carries_chain_errors() {
        fn reject(version: &str) -> Result<()> {
            Err(ChainError::DuplicateVersion {
                version: version.into(),
            })
        }

        fn build() -> Result<usize> {
            reject("3")?;
            Ok(1)
        }

        assert_eq!(
            build(),
            Err(ChainError::DuplicateVersion {
                version: "3".into()
            })
        );
    }

    #[test]
    fn precondition_failures_have_no_trail() {
        let err = TransformError::<()>::ToInvalidVersion { to: "x".into() };
        assert!(err.trail().is_none());
        assert!(err.fault().is_none());
    }
}
