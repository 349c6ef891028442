//! # Default Value Generation Options
//!
//! Controls how the default deriver fills leaves and arrays, and how many
//! nested array levels are populated before a fallback applies. The meta
//! engine reads the same options so that its initial `items` lengths start
//! in lock-step with the derived value tree.
//!
//! ## Wire form
//!
//! ```yaml
//! primitives: sensible          # sensible | undefined | "null"
//! arrays:                       # or a bare method name
//!   method: populate            # empty | undefined | null | populate
//!   length: 3
//!   depth: { max: 2, fallback: empty }
//! ```
//!
//! ## Depth
//!
//! Depth counts enclosing arrays only; objects do not consume depth. The
//! root array is at depth 0, its element array at depth 1, and so on.

use serde::{Deserialize, Serialize};

use crate::error::OptionsError;

/// How leaves without a declared default are filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrimitiveStrategy {
    /// A type-appropriate zero value.
    #[default]
    Sensible,
    /// Leave the leaf absent.
    Undefined,
    /// Fill with `null`.
    Null,
}

/// How an array is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayMethod {
    Empty,
    Undefined,
    Null,
    Populate,
}

/// Limits on which array depths are populated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DepthPolicy {
    /// Arrays at `depth >= max` take the fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<usize>,
    /// Only these depths are processed normally; others take the fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layers: Option<Vec<usize>>,
    /// Method applied outside the allowed depths; `empty` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<ArrayMethod>,
}

impl DepthPolicy {
    /// Whether an array at `depth` is processed normally.
    pub fn allows(&self, depth: usize) -> bool {
        let under_max = self.max.map_or(true, |max| depth < max);
        let in_layers = self
            .layers
            .as_ref()
            .map_or(true, |layers| layers.contains(&depth));
        under_max && in_layers
    }

    pub fn fallback(&self) -> ArrayMethod {
        self.fallback.unwrap_or(ArrayMethod::Empty)
    }
}

/// The structured array strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredArrays {
    pub method: ArrayMethod,
    /// Items generated by `populate`; 1 when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<DepthPolicy>,
}

/// Either a bare method or the structured form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArrayStrategy {
    Flat(ArrayMethod),
    Structured(StructuredArrays),
}

impl Default for ArrayStrategy {
    fn default() -> Self {
        Self::Flat(ArrayMethod::Empty)
    }
}

/// What to produce for one array node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayPlan {
    Empty,
    Undefined,
    Null,
    /// Generate this many element defaults.
    Populate(usize),
}

impl ArrayPlan {
    fn from_method(method: ArrayMethod, length: usize) -> Self {
        match method {
            ArrayMethod::Empty => Self::Empty,
            ArrayMethod::Undefined => Self::Undefined,
            ArrayMethod::Null => Self::Null,
            ArrayMethod::Populate => Self::Populate(length),
        }
    }
}

impl ArrayStrategy {
    /// Decide how to fill an array found at `depth`.
    ///
    /// The depth policy is consulted first. A disallowed depth takes the
    /// fallback, except that a `populate` fallback defers to the strategy's
    /// own method.
    pub fn plan(&self, depth: usize) -> ArrayPlan {
        let (method, length, policy) = match self {
            Self::Flat(method) => (*method, 1, None),
            Self::Structured(s) => (s.method, s.length.unwrap_or(1), s.depth.as_ref()),
        };
        if let Some(policy) = policy {
            if !policy.allows(depth) {
                match policy.fallback() {
                    ArrayMethod::Populate => {}
                    fallback => return ArrayPlan::from_method(fallback, length),
                }
            }
        }
        ArrayPlan::from_method(method, length)
    }

    pub fn depth_policy(&self) -> Option<&DepthPolicy> {
        match self {
            Self::Flat(_) => None,
            Self::Structured(s) => s.depth.as_ref(),
        }
    }
}

/// Options for default derivation and meta-tree creation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DefaultOptions {
    #[serde(default, alias = "method")]
    pub primitives: PrimitiveStrategy,
    #[serde(default)]
    pub arrays: ArrayStrategy,
}

impl DefaultOptions {
    /// Reject policies that constrain nothing.
    pub fn validate(&self) -> Result<(), OptionsError> {
        match self.arrays.depth_policy() {
            Some(policy) if policy.max.is_none() && policy.layers.is_none() => {
                Err(OptionsError::EmptyDepthPolicy)
            }
            _ => Ok(()),
        }
    }

    /// Apply per-call overrides; set fields replace the process-wide value.
    pub fn merge(&self, overrides: &OptionsOverride) -> DefaultOptions {
        DefaultOptions {
            primitives: overrides.primitives.unwrap_or(self.primitives),
            arrays: overrides
                .arrays
                .clone()
                .unwrap_or_else(|| self.arrays.clone()),
        }
    }
}

/// Per-call options; unset fields inherit from the process-wide defaults.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OptionsOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primitives: Option<PrimitiveStrategy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arrays: Option<ArrayStrategy>,
}
