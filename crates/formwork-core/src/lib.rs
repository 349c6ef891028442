//! # formwork-core — Schema Model and Shared Data Types
//!
//! The leaf crate of the formwork workspace. It defines the closed schema
//! node algebra every deriver dispatches over, plus the data types that flow
//! between derivers, the meta engine, and validators.
//!
//! ## Key Design Principles
//!
//! 1. **Closed algebra.** `NodeKind` enumerates every schema kind centrally.
//!    All consumers match exhaustively with no wildcard arm.
//!
//! 2. **Immutable kinds.** A node's kind is private and fixed at
//!    construction. Derivers build sibling nodes instead of mutating inputs.
//!
//! 3. **Absence is `None`.** JSON has no `undefined`; every slot that may be
//!    absent is an `Option<Value>` so that absence and `null` stay distinct.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `formwork-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod error_tree;
pub mod node;
pub mod options;
pub mod path;
pub mod value;

pub use error::{OptionsError, SchemaModelError};
pub use error_tree::ErrorTree;
pub use node::{
    Check, Constraint, CustomCheck, DefaultSupplier, DefaultValue, LazySchema, NodeKind,
    SchemaNode, TransformFn,
};
pub use options::{
    ArrayMethod, ArrayPlan, ArrayStrategy, DefaultOptions, DepthPolicy, OptionsOverride,
    PrimitiveStrategy, StructuredArrays,
};
pub use path::{format_path, Issue, PathSegment};
pub use value::{deep_equal, json_type_name, values_equal};
