//! # Error Types — Schema Model and Options Errors
//!
//! Errors raised while building or loading schema trees and derivation
//! options. Derivation and validation errors live in `formwork-schema`,
//! which depends on this crate.

use thiserror::Error;

/// A schema tree violates a construction-time invariant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaModelError {
    /// A union was declared with no variants.
    #[error("union must declare at least one variant")]
    EmptyUnion,

    /// An enum was declared with no members.
    #[error("enum must declare at least one value")]
    EmptyEnum,

    /// A discriminated union variant is not an object schema.
    #[error("discriminated union variant {index} is a {kind}, expected an object")]
    VariantNotObject {
        /// Position of the offending variant.
        index: usize,
        /// Kind name of the offending variant.
        kind: &'static str,
    },

    /// A discriminated union variant does not declare the discriminator field.
    #[error("discriminated union variant {index} has no '{discriminator}' field")]
    DiscriminatorMissing {
        /// Position of the offending variant.
        index: usize,
        /// The discriminator field name.
        discriminator: String,
    },

    /// The discriminator field is optional in some variant.
    #[error("discriminated union variant {index} declares '{discriminator}' as optional")]
    DiscriminatorOptional {
        /// Position of the offending variant.
        index: usize,
        /// The discriminator field name.
        discriminator: String,
    },

    /// The discriminator field is not a single literal in some variant.
    #[error("discriminated union variant {index} declares '{discriminator}' as {kind}, expected a literal")]
    DiscriminatorNotLiteral {
        /// Position of the offending variant.
        index: usize,
        /// The discriminator field name.
        discriminator: String,
        /// Kind name of the declared field.
        kind: &'static str,
    },

    /// Two variants share a discriminator value.
    #[error("discriminator '{discriminator}' value {value} is declared by more than one variant")]
    DuplicateDiscriminatorValue {
        /// The discriminator field name.
        discriminator: String,
        /// The duplicated literal, JSON-encoded.
        value: String,
    },
}

/// Derivation options are malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionsError {
    /// A depth policy constrains nothing.
    #[error("array depth policy must set 'max' or 'layers'")]
    EmptyDepthPolicy,
}
