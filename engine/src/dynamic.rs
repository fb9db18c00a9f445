//! Transformation with version detection.
//!
//! [`DynamicModelTransformer`] wraps a [`ModelTransformer`] and works out the
//! version of incoming data before walking the chain:
//!
//! 1. Run every unit's recognizer. If exactly one matches, that is the version.
//! 2. Otherwise (no match for raw data, several for overlapping shapes) ask the
//!    user-supplied detector.
//! 3. Without a detector, detection fails with [`DetectionError::UnknownVersion`].

use crate::error;
use crate::fault::guard_infallible;
use crate::{
    DetectionError, DynamicTransformError, EngineConfig, ModelTransformer,
    TransformError, Transformer, VersionTag,
};
use std::fmt;

type DetectorFn<M> = Box<dyn Fn(&M) -> Detection + Send + Sync>;

/// What a detector returns: either a bare version or a full result whose
/// error is passed through untouched.
#[derive(Debug)]
pub enum Detection {
    Version(VersionTag),
    Resolved(Result<VersionTag, DetectionError>),
}

impl From<&str> for Detection {
    fn from(version: &str) -> Self {
        Detection::Version(version.to_string())
    }
}

impl From<String> for Detection {
    fn from(version: String) -> Self {
        Detection::Version(version)
    }
}

impl From<Result<VersionTag, DetectionError>> for Detection {
    fn from(result: Result<VersionTag, DetectionError>) -> Self {
        Detection::Resolved(result)
    }
}

/// A detected version together with the data it was detected on.
#[derive(Debug, Clone, PartialEq)]
pub struct Detected<'a, M> {
    pub version: VersionTag,
    pub data: &'a M,
}

/// A [`ModelTransformer`] that can detect the version of its input.
pub struct DynamicModelTransformer<M> {
    engine: ModelTransformer<M>,
    detector: Option<DetectorFn<M>>,
}

impl<M> DynamicModelTransformer<M> {
    /// Create an engine with the default configuration and no detector.
    pub fn new(units: Vec<Transformer<M>>) -> error::Result<Self> {
        Self::with_config(units, EngineConfig::default())
    }

    pub fn with_config(units: Vec<Transformer<M>>, config: EngineConfig) -> error::Result<Self> {
        Ok(Self::from_engine(ModelTransformer::with_config(units, config)?))
    }

    pub fn from_engine(engine: ModelTransformer<M>) -> Self {
        Self {
            engine,
            detector: None,
        }
    }

    /// Set the fallback detector used when recognizers are inconclusive.
    ///
    /// The detector may return a version (`&str`/`String`) or a
    /// `Result<VersionTag, DetectionError>`.
    pub fn with_detector<F, D>(mut self, detector: F) -> Self
    where
        F: Fn(&M) -> D + Send + Sync + 'static,
        D: Into<Detection>,
    {
        self.detector = Some(Box::new(move |data: &M| detector(data).into()));
        self
    }

    /// The underlying chain walker.
    pub fn engine(&self) -> &ModelTransformer<M> {
        &self.engine
    }

    pub fn transformer(&self, version: &str) -> Option<&Transformer<M>> {
        self.engine.transformer(version)
    }

    pub fn versions(&self) -> &[VersionTag] {
        self.engine.versions()
    }

    /// Determine the version of `data`.
    pub fn version_of<'a>(&self, data: &'a M) -> Result<Detected<'a, M>, DetectionError> {
        let matches: Vec<&str> = self
            .engine
            .transformers()
            .filter(|unit| unit.recognizes(data) == Some(true))
            .map(|unit| unit.version())
            .collect();

        if let [version] = matches.as_slice() {
            tracing::trace!(version = %version, "recognized by a single transformer");
            return Ok(Detected {
                version: version.to_string(),
                data,
            });
        }

        tracing::trace!(
            matches = matches.len(),
            "recognizers inconclusive, falling back to detector"
        );
        self.detect_version_of(data)
    }

    /// Ask the fallback detector directly, skipping the recognizers.
    pub fn detect_version_of<'a>(&self, data: &'a M) -> Result<Detected<'a, M>, DetectionError> {
        let Some(detector) = &self.detector else {
            return Err(DetectionError::UnknownVersion);
        };

        let detection = guard_infallible(|| detector(data)).map_err(|fault| {
            tracing::warn!(error = %fault, "version detector panicked");
            DetectionError::DetectorFailed { fault }
        })?;

        let version = match detection {
            Detection::Version(version) => version,
            Detection::Resolved(result) => result?,
        };

        Ok(Detected { version, data })
    }
}

impl<M: Clone> DynamicModelTransformer<M> {
    /// Transform a model of unknown version to `to`.
    pub fn transform(&self, model: M, to: &str) -> Result<M, DynamicTransformError<M>> {
        let version = self.version_of(&model)?.version;
        tracing::debug!(detected = %version, to, "transforming detected model");
        Ok(self.engine.transform_from(model, &version, to)?)
    }

    /// Transform a model whose version is known.
    pub fn transform_from(&self, model: M, from: &str, to: &str) -> Result<M, TransformError<M>> {
        self.engine.transform_from(model, from, to)
    }
}

impl<M> fmt::Debug for DynamicModelTransformer<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicModelTransformer")
            .field("engine", &self.engine)
            .field("detector", &self.detector.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn get_request_units() -> Vec<Transformer<Value>> {
        vec![
            Transformer::new("1")
                .next("2")
                .upgrade_with(|m: Value| Some(json!({ "newId": m["id"] }))),
            Transformer::new("2")
                .previous("1")
                .downgrade_with(|m: Value| Some(json!({ "id": m["newId"] }))),
        ]
    }

    fn get_request_transformer() -> DynamicModelTransformer<Value> {
        DynamicModelTransformer::new(get_request_units())
            .unwrap()
            .with_detector(|data: &Value| if data.get("id").is_some() { "1" } else { "2" })
    }

    #[test]
    fn detects_the_version() {
        let transformer = get_request_transformer();

        let v1 = json!({"id": "something"});
        assert_eq!(transformer.version_of(&v1).unwrap().version, "1");

        let v2 = json!({"newId": "something"});
        let detected = transformer.version_of(&v2).unwrap();
        assert_eq!(detected.version, "2");
        assert_eq!(detected.data, &v2);
    }

    #[test]
    fn transforms_from_the_detected_version() {
        let transformer = get_request_transformer();
        let result = transformer.transform(json!({"newId": "1222ede"}), "1");
        assert_eq!(result.unwrap(), json!({"id": "1222ede"}));
    }

    #[test]
    fn single_recognizer_match_skips_detector() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let units = vec![
            Transformer::<Value>::new("1").recognize_with(|v: &Value| v.get("id").is_some()),
            Transformer::new("2").recognize_with(|v: &Value| v.get("newId").is_some()),
        ];
        let transformer = DynamicModelTransformer::new(units)
            .unwrap()
            .with_detector(move |_: &Value| {
                counter.fetch_add(1, Ordering::SeqCst);
                "1"
            });

        let recognized = json!({"newId": "x"});
        let detected = transformer.version_of(&recognized).unwrap();
        assert_eq!(detected.version, "2");
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        // Neither recognizer matches: detector decides.
        let unmatched = json!({"other": 1});
        let detected = transformer.version_of(&unmatched).unwrap();
        assert_eq!(detected.version, "1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Both match: ambiguous, detector decides.
        let ambiguous = json!({"id": "a", "newId": "b"});
        let detected = transformer.version_of(&ambiguous).unwrap();
        assert_eq!(detected.version, "1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn no_detector_means_unknown_version() {
        let transformer = DynamicModelTransformer::new(get_request_units()).unwrap();
        let err = transformer.version_of(&json!({})).unwrap_err();
        assert!(matches!(err, DetectionError::UnknownVersion));

        let err = transformer.transform(json!({}), "1").unwrap_err();
        assert_eq!(err.code(), "unknown_version");
        assert!(err.trail().is_none());
    }

    #[test]
    fn detector_result_passes_through() {
        let transformer = DynamicModelTransformer::new(get_request_units())
            .unwrap()
            .with_detector(|data: &Value| -> Result<VersionTag, DetectionError> {
                if data.is_object() {
                    Ok("2".to_string())
                } else {
                    Err(DetectionError::UnknownVersion)
                }
            });

        assert_eq!(transformer.version_of(&json!({})).unwrap().version, "2");
        assert!(matches!(
            transformer.version_of(&json!(3)),
            Err(DetectionError::UnknownVersion)
        ));
    }

    #[test]
    fn panicking_detector_is_captured() {
        let transformer = DynamicModelTransformer::new(get_request_units())
            .unwrap()
            .with_detector(|_: &Value| -> String { panic!("detector crashed") });

        let err = transformer.version_of(&json!({})).unwrap_err();
        assert_eq!(err.code(), "detector_failed");
    }

    #[test]
    fn detected_version_outside_chain_fails_the_walk() {
        let transformer = DynamicModelTransformer::new(get_request_units())
            .unwrap()
            .with_detector(|_: &Value| "7");

        let err = transformer.transform(json!({}), "1").unwrap_err();
        assert!(matches!(
            err,
            DynamicTransformError::Transform(TransformError::FromInvalidVersion { ref from }) if from == "7"
        ));
    }

    #[test]
    fn transform_failures_keep_their_trail() {
        let units = vec![
            Transformer::<Value>::new("1"),
            Transformer::new("2").recognize_with(|v: &Value| v.get("newId").is_some()),
        ];
        let transformer = DynamicModelTransformer::new(units).unwrap();

        let err = transformer.transform(json!({"newId": "z"}), "1").unwrap_err();
        assert_eq!(err.code(), "downgrade_unsupported");
        assert_eq!(err.trail().unwrap().versions(), vec!["2"]);
    }
}
