//! # formwork-cli — Command-Line Front End
//!
//! Thin wrappers over the library for inspecting schemas from the shell.
//!
//! ## Subcommands
//!
//! - `defaults` — derived default value
//! - `partial` — derived partial schema, as a native node document
//! - `meta` — meta tree, optionally synced against a value
//! - `validate` — full or partial validation; exit status 1 when invalid
//!
//! Schema and value files are JSON, or YAML when the extension is `.yaml`
//! or `.yml`. A schema document carrying a top-level `"$formwork"` key is a
//! native node tree; any other document is routed by the registry's
//! structural probes.
//!
//! ## Crate Policy
//!
//! - Argument parsing is separated from the handlers.
//! - Handlers write to a caller-supplied sink and delegate to the library.

pub mod common;
pub mod defaults;
pub mod meta;
pub mod partial;
pub mod validate;
