//! # Modelshift Engine
//!
//! Converts a data model between any two versions of its schema by walking
//! a linear chain of per-version transformers, each of which only knows how
//! to step to its immediate neighbour.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine never persists, sends or inspects models
//! - **Sequential**: every version between source and target is visited, none skipped
//! - **Typed failures**: every outcome a caller branches on is an error value, including
//!   panics raised by transformer callbacks
//! - **Shareable**: engines are `Send + Sync` and immutable after construction
//!
//! ## Core Concepts
//!
//! ### Transformers
//!
//! A [`Transformer`] describes one version: an optional recognizer, an
//! optional sanitize step, and upgrade/downgrade steps that return `None`
//! when the transition is not supported.
//!
//! ### Chain
//!
//! The order units are supplied in *is* the version order. Tags are opaque:
//! `"10"` comes after `"9"` only if it was supplied after it.
//!
//! ### Walking
//!
//! [`ModelTransformer::transform_from`] walks from a known version to a
//! target, sanitizing at every visited version. Failures carry a [`Trail`]
//! of the steps attempted.
//!
//! ### Detection
//!
//! [`DynamicModelTransformer::transform`] first detects the version of the
//! input (recognizers, then a fallback detector) and then walks.
//!
//! ## Quick Start
//!
//! ```rust
//! use modelshift_engine::{ModelTransformer, Transformer, TransformError};
//! use serde_json::json;
//!
//! let engine = ModelTransformer::new(vec![
//!     Transformer::new("v1").upgrade_with(|m: serde_json::Value| {
//!         Some(json!({ "name": m["first"].as_str().unwrap_or_default() }))
//!     }),
//!     Transformer::new("v2")
//!         .sanitize_with(|mut m: serde_json::Value| {
//!             if m["name"].is_null() {
//!                 m["name"] = json!("");
//!             }
//!             m
//!         })
//!         .downgrade_with(|m| Some(json!({ "first": m["name"] }))),
//! ])
//! .unwrap();
//!
//! let upgraded = engine
//!     .transform_from(json!({"first": "Ada"}), "v1", "v2")
//!     .unwrap();
//! assert_eq!(upgraded, json!({"name": "Ada"}));
//!
//! let err = engine.transform_from(upgraded, "v2", "v3").unwrap_err();
//! assert!(matches!(err, TransformError::ToInvalidVersion { .. }));
//! ```

mod chain;
pub mod config;
pub mod dynamic;
pub mod engine;
pub mod error;
pub mod fault;
pub mod trail;
pub mod transformer;

// Re-export main types at crate root
pub use chain::validate_units;
pub use config::{ConfigError, EngineConfig};
pub use dynamic::{Detected, Detection, DynamicModelTransformer};
pub use engine::{ModelTransformer, Walk};
pub use error::{ChainError, DetectionError, DynamicTransformError, TransformError};
pub use fault::{Fault, Panicked};
pub use trail::{Step, StepKind, Trail};
pub use transformer::Transformer;

/// Opaque identifier of a schema version.
pub type VersionTag = String;
